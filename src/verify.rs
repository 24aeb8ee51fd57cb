// SPDX-License-Identifier: CC0-1.0

//! Checking that input and output amounts balance before signing.

use core::fmt;

use elements::secp256k1_zkp::{All, Secp256k1};
use elements::{Transaction, TxOut};

use crate::error::{InvalidInputError, TransactionError};
use crate::map::input::{self, Input};

/// Verifies that the amounts of a transaction balance given the outputs it spends.
pub trait AmountVerifier {
    /// Verification failure detail, logged but not returned to the caller.
    type Error: fmt::Debug;

    /// Verifies that `tx` balances, `spent` holds the output spent by each input of `tx`.
    fn verify_amounts(&self, spent: &[TxOut], tx: &Transaction) -> Result<(), Self::Error>;
}

impl<V: AmountVerifier + ?Sized> AmountVerifier for &V {
    type Error = V::Error;

    fn verify_amounts(&self, spent: &[TxOut], tx: &Transaction) -> Result<(), Self::Error> {
        (**self).verify_amounts(spent, tx)
    }
}

/// An [`AmountVerifier`] checking Pedersen commitments, range proofs and surjection proofs.
///
/// Explicit values and assets are committed to with zero blinding factors so unblinded and
/// partially blinded transactions are verified the same way.
pub struct ProofVerifier {
    secp: Secp256k1<All>,
}

impl ProofVerifier {
    /// Creates a new verifier.
    pub fn new() -> Self { ProofVerifier { secp: Secp256k1::new() } }
}

impl Default for ProofVerifier {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for ProofVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("ProofVerifier") }
}

impl AmountVerifier for ProofVerifier {
    type Error = elements::VerificationError;

    fn verify_amounts(&self, spent: &[TxOut], tx: &Transaction) -> Result<(), Self::Error> {
        tx.verify_tx_amt_proofs(&self.secp, spent)
    }
}

/// Collects the output spent by each input of `tx`.
///
/// A non-witness UTXO must be the transaction referenced by the prevout and, if a witness UTXO
/// is also present, agree with it. Without a non-witness UTXO the witness UTXO is used as is.
pub(crate) fn spent_outputs(
    inputs: &[Input],
    tx: &Transaction,
) -> Result<Vec<TxOut>, TransactionError> {
    let mut spent = Vec::with_capacity(inputs.len());
    for (input_index, (input, txin)) in inputs.iter().zip(&tx.input).enumerate() {
        let utxo = match (&input.non_witness_utxo, &input.witness_utxo) {
            (Some(prev_tx), witness_utxo) => {
                let utxo = input::non_witness_output(prev_tx, input_index, &txin.previous_output)?;
                if witness_utxo.as_ref().map_or(false, |w| w != utxo) {
                    return Err(InvalidInputError::WitnessUtxoMismatch { input_index }.into());
                }
                utxo
            }
            (None, Some(utxo)) => utxo,
            (None, None) => {
                return Err(TransactionError::UtxosMissingForBalanceCheck { input_index });
            }
        };
        spent.push(utxo.clone());
    }
    Ok(spent)
}

/// Checks that `tx`, the working copy with confidential output data filled in, balances.
pub(crate) fn check_balance<V: AmountVerifier>(
    verifier: &V,
    inputs: &[Input],
    tx: &Transaction,
) -> Result<(), TransactionError> {
    let spent = spent_outputs(inputs, tx)?;
    verifier.verify_amounts(&spent, tx).map_err(|e| {
        tracing::warn!(error = ?e, "amount verification failed");
        TransactionError::ValueImbalance
    })
}
