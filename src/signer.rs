// SPDX-License-Identifier: CC0-1.0

//! The PSBT signer role.

use elements::sighash::SighashCache;
use elements::{EcdsaSighashType, OutPoint, Transaction};

use crate::error::TransactionError;
use crate::map::{Input, Output};
use crate::options::{BalanceCheck, SignOptions};
use crate::provider::{KeyStore, MetadataOnly, SignatureProvider, Signing};
use crate::psbt::Psbt;
use crate::sighash_type::PsbtSighashType;
use crate::signature::{produce_signature, InputSighasher};
use crate::verify::{self, AmountVerifier};

/// Signs the inputs of a blinded PSBT.
///
/// Signature hashes commit to the confidential output data, which lives in the output maps, so
/// signing happens over a copy of the transaction with that data filled in. The PSBT's own
/// transaction is never modified.
#[derive(Debug)]
pub struct Signer<'a, K, V> {
    keys: &'a K,
    verifier: &'a V,
}

impl<'a, K: KeyStore, V: AmountVerifier> Signer<'a, K, V> {
    /// Creates a signer using `keys`, checking balances with `verifier`.
    pub fn new(keys: &'a K, verifier: &'a V) -> Self { Signer { keys, verifier } }

    /// Signs every input of `psbt` that the key store has keys for.
    ///
    /// Returns true if every input ends up with final script material. With
    /// [`SignOptions::sign`] unset no signatures are created, the return value then tells
    /// whether the PSBT is already complete.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::BlindingRequired`] if an output still needs blinding, `psbt` is left
    ///   untouched.
    /// - [`TransactionError::InvalidPsbt`] if an unsigned input is not sane, whether or not
    ///   balances are checked. `psbt` is left untouched.
    /// - Any error of the balance check, see [`BalanceCheck`].
    /// - [`TransactionError::SighashMismatch`] if an input requires a different sighash type,
    ///   inputs before it keep their new signatures.
    pub fn sign(&self, psbt: &mut Psbt, opts: &SignOptions) -> Result<bool, TransactionError> {
        psbt.check_counts()?;
        if let Some(output_index) = psbt.outputs.iter().position(Output::is_blinding_required) {
            return Err(TransactionError::BlindingRequired { output_index });
        }
        for (input_index, (input, txin)) in psbt.inputs.iter().zip(&psbt.tx.input).enumerate() {
            if !input.is_signed() {
                input.sanity_check(input_index, &txin.previous_output)?;
            }
        }

        let tx = psbt.materialized_tx();
        if opts.balance_check == BalanceCheck::Enforce {
            verify::check_balance(self.verifier, &psbt.inputs, &tx)?;
        }

        let signing = Signing::new(self.keys);
        let metadata = MetadataOnly::new(self.keys, false);
        let requested = PsbtSighashType::from(opts.sighash_type);
        let mut cache = SighashCache::new(&tx);

        let mut complete = true;
        for (input_index, (input, txin)) in psbt.inputs.iter_mut().zip(&tx.input).enumerate() {
            let done = if opts.sign {
                match input.sighash_type {
                    Some(required) if required != requested => {
                        return Err(TransactionError::SighashMismatch {
                            input_index,
                            required,
                            requested,
                        });
                    }
                    _ => {}
                }
                let sighasher = Some((&mut cache, opts.sighash_type));
                sign_input(&signing, input, input_index, &txin.previous_output, sighasher)
            } else {
                sign_input(&metadata, input, input_index, &txin.previous_output, None)
            };
            tracing::debug!(input_index, complete = done, "processed input");
            complete &= done;
        }
        Ok(complete)
    }
}

/// Signs, or with no `sighasher` just fills in scripts and key origins for, a single input.
///
/// Returns true if the input is complete. Spending a witness program replaces the non-witness
/// UTXO with the witness UTXO.
pub(crate) fn sign_input<P: SignatureProvider>(
    provider: &P,
    input: &mut Input,
    input_index: usize,
    previous_output: &OutPoint,
    sighasher: Option<(&mut SighashCache<&Transaction>, EcdsaSighashType)>,
) -> bool {
    if input.is_signed() {
        return true;
    }

    let utxo = match input.spent_output(previous_output) {
        Some(utxo) => utxo.clone(),
        None => {
            tracing::debug!(input_index, "spent output unknown");
            return false;
        }
    };

    let mut sigdata = input.signature_data();
    let mut sighasher = sighasher.map(|(cache, sighash_type)| InputSighasher {
        cache,
        input_index,
        value: utxo.value,
        sighash_type,
    });
    let complete =
        produce_signature(provider, sighasher.as_mut(), &utxo.script_pubkey, &mut sigdata);

    if sigdata.witness {
        input.non_witness_utxo = None;
        input.witness_utxo = Some(utxo);
    }
    input.update_with(sigdata);
    complete
}
