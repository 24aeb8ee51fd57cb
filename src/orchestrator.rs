// SPDX-License-Identifier: CC0-1.0

//! The operations exposed to wallet callers, composed from the fill and sign steps.

use tracing::instrument;

use crate::error::TransactionError;
use crate::fill::{fill_inputs, fill_outputs};
use crate::options::{FillOptions, SignOptions};
use crate::provider::KeyStore;
use crate::psbt::Psbt;
use crate::signer::Signer;
use crate::verify::{AmountVerifier, ProofVerifier};
use crate::wallet::Wallet;

/// Fills in and signs PSBTs on behalf of a wallet.
///
/// Each call reads the wallet once, at the start of the call, and never holds on to it while
/// signing. One orchestrator may serve any number of PSBTs.
#[derive(Debug)]
pub struct Orchestrator<'a, W, K, V = ProofVerifier> {
    wallet: &'a W,
    keys: &'a K,
    verifier: V,
}

impl<'a, W: Wallet, K: KeyStore> Orchestrator<'a, W, K> {
    /// Creates an orchestrator checking balances with a [`ProofVerifier`].
    pub fn new(wallet: &'a W, keys: &'a K) -> Self {
        Orchestrator { wallet, keys, verifier: ProofVerifier::new() }
    }
}

impl<'a, W: Wallet, K: KeyStore, V: AmountVerifier> Orchestrator<'a, W, K, V> {
    /// Replaces the balance verifier.
    pub fn with_verifier<U: AmountVerifier>(self, verifier: U) -> Orchestrator<'a, W, K, U> {
        Orchestrator { wallet: self.wallet, keys: self.keys, verifier }
    }

    /// Adds everything the wallet knows to `psbt` without signing.
    ///
    /// Inputs get their UTXO, blinding data and key origins, outputs their redeem scripts and
    /// key origins.
    ///
    /// # Errors
    ///
    /// [`TransactionError::InvalidPsbt`] if an unsigned input is not sane, inputs before it stay
    /// filled in and outputs are not filled.
    #[instrument(level = "debug", skip_all, err)]
    pub fn fill_data(&self, psbt: &mut Psbt, opts: &FillOptions) -> Result<(), TransactionError> {
        let snapshot = self.wallet.snapshot(&psbt.outpoints());
        fill_inputs(psbt, &snapshot, self.keys, opts.bip32_derivations)?;
        fill_outputs(psbt, self.keys, opts.bip32_derivations);
        Ok(())
    }

    /// Signs `psbt`, which must already carry everything needed.
    ///
    /// Returns true if every input is now complete. See [`Signer::sign`] for errors.
    #[instrument(level = "debug", skip_all, err)]
    pub fn sign(&self, psbt: &mut Psbt, opts: &SignOptions) -> Result<bool, TransactionError> {
        Signer::new(self.keys, &self.verifier).sign(psbt, opts)
    }

    /// Fills in the inputs, signs, then fills in the outputs of `psbt`.
    ///
    /// Stops at the first failing step, see [`Orchestrator::fill_data`] and [`Signer::sign`] for
    /// errors.
    ///
    /// # Balance check
    ///
    /// The balance check follows `opts.balance_check` like in [`Orchestrator::sign`], so
    /// `SignOptions::default()` **enforces** it and an imbalanced PSBT fails with
    /// [`TransactionError::ValueImbalance`]. The combined fill-and-sign call used to skip the
    /// check unconditionally. Pass [`SignOptions::legacy`] to get that behaviour:
    ///
    /// ```ignore
    /// let opts = SignOptions::legacy(EcdsaSighashType::All);
    /// let complete = orchestrator.fill_and_sign(&mut psbt, &opts)?;
    /// ```
    #[instrument(level = "debug", skip_all, err)]
    pub fn fill_and_sign(
        &self,
        psbt: &mut Psbt,
        opts: &SignOptions,
    ) -> Result<bool, TransactionError> {
        let snapshot = self.wallet.snapshot(&psbt.outpoints());
        fill_inputs(psbt, &snapshot, self.keys, opts.bip32_derivations)?;
        let complete = Signer::new(self.keys, &self.verifier).sign(psbt, opts)?;
        fill_outputs(psbt, self.keys, opts.bip32_derivations);
        tracing::debug!(complete, "fill and sign done");
        Ok(complete)
    }
}

#[cfg(test)]
mod tests {
    use elements::{LockTime, Transaction, TxOut};

    use super::*;
    use crate::provider::KeyRing;
    use crate::wallet::MemoryWallet;

    /// Accepts everything, counts nothing.
    struct AlwaysBalanced;

    impl AmountVerifier for AlwaysBalanced {
        type Error = ();

        fn verify_amounts(&self, _: &[TxOut], _: &Transaction) -> Result<(), ()> { Ok(()) }
    }

    #[test]
    fn empty_psbt_is_complete() {
        let wallet = MemoryWallet::new();
        let keys = KeyRing::new();
        let orchestrator = Orchestrator::new(&wallet, &keys).with_verifier(AlwaysBalanced);

        let tx = Transaction { version: 2, lock_time: LockTime::ZERO, input: vec![], output: vec![] };
        let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();

        orchestrator.fill_data(&mut psbt, &FillOptions::default()).unwrap();
        assert_eq!(orchestrator.fill_and_sign(&mut psbt, &SignOptions::default()), Ok(true));
    }
}
