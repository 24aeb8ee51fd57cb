// SPDX-License-Identifier: CC0-1.0

use std::collections::BTreeMap;

use bitcoin::bip32::KeySource;
use bitcoin::PublicKey;
use elements::confidential::{AssetBlindingFactor, ValueBlindingFactor};
use elements::{AssetId, OutPoint, Script, Transaction, TxOut};

use crate::error::InvalidInputError;
use crate::sighash_type::PsbtSighashType;
use crate::signature::SignatureData;
use crate::wallet::BlindingData;

/// A key-value map for an input of the corresponding index in the unsigned transaction.
///
/// The output being spent is referenced by the `previous_output` of the skeleton input at the
/// same index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Input {
    /// The non-witness transaction this input spends from.
    pub non_witness_utxo: Option<Transaction>,
    /// The transaction output this input spends from.
    pub witness_utxo: Option<TxOut>,
    /// A map from public keys to their corresponding signature (DER encoding followed by the
    /// sighash byte).
    pub partial_sigs: BTreeMap<PublicKey, Vec<u8>>,
    /// The sighash type to be used for this input. Signatures for this input must use it.
    pub sighash_type: Option<PsbtSighashType>,
    /// The redeem script for this input.
    pub redeem_script: Option<Script>,
    /// The witness script for this input.
    pub witness_script: Option<Script>,
    /// A map from public keys needed to sign this input to their corresponding master key
    /// fingerprints and derivation paths.
    pub bip32_derivations: BTreeMap<PublicKey, KeySource>,
    /// The finalized, fully-constructed scriptSig.
    pub final_script_sig: Option<Script>,
    /// The finalized, fully-constructed script witness.
    pub final_script_witness: Option<Vec<Vec<u8>>>,
    /// The explicit value of the spent output, if known.
    pub value: Option<u64>,
    /// The blinding factor of the spent output's value commitment.
    pub value_blinding_factor: Option<ValueBlindingFactor>,
    /// The explicit asset of the spent output.
    pub asset: Option<AssetId>,
    /// The blinding factor of the spent output's asset commitment.
    pub asset_blinding_factor: Option<AssetBlindingFactor>,
}

impl Input {
    /// Returns true if this input already carries final script material.
    ///
    /// Filling and signing leave such an input untouched.
    pub fn is_signed(&self) -> bool {
        self.final_script_sig.is_some() || self.final_script_witness.is_some()
    }

    /// Checks that the UTXO representations of this input do not conflict.
    ///
    /// Both representations may be present but then the witness UTXO must be the output that
    /// `previous_output` references in the non-witness UTXO.
    pub fn sanity_check(
        &self,
        input_index: usize,
        previous_output: &OutPoint,
    ) -> Result<(), InvalidInputError> {
        let (tx, witness_utxo) = match (&self.non_witness_utxo, &self.witness_utxo) {
            (Some(tx), Some(utxo)) => (tx, utxo),
            _ => return Ok(()),
        };

        let spent = non_witness_output(tx, input_index, previous_output)?;
        if spent != witness_utxo {
            return Err(InvalidInputError::WitnessUtxoMismatch { input_index });
        }
        Ok(())
    }

    /// Returns true if this input passes [`Input::sanity_check`].
    pub fn is_sane(&self, input_index: usize, previous_output: &OutPoint) -> bool {
        self.sanity_check(input_index, previous_output).is_ok()
    }

    /// Returns the output spent by this input, preferring the non-witness UTXO.
    ///
    /// Returns `None` if no UTXO is present or the non-witness UTXO does not match
    /// `previous_output`.
    pub(crate) fn spent_output(&self, previous_output: &OutPoint) -> Option<&TxOut> {
        match self.non_witness_utxo {
            Some(ref tx) => {
                if tx.txid() != previous_output.txid {
                    return None;
                }
                tx.output.get(previous_output.vout as usize)
            }
            None => self.witness_utxo.as_ref(),
        }
    }

    /// Copies the blinding data known by the wallet into this input.
    ///
    /// An unknown value never overwrites one already present.
    pub(crate) fn set_blinding_data(&mut self, data: &BlindingData) {
        if let Some(value) = data.value {
            self.value = Some(value);
        }
        self.value_blinding_factor = Some(data.value_blinding_factor);
        self.asset = Some(data.asset);
        self.asset_blinding_factor = Some(data.asset_blinding_factor);
    }

    /// Creates a [`SignatureData`] template from the signing fields of this input.
    pub(crate) fn signature_data(&self) -> SignatureData {
        let mut sigdata = SignatureData {
            redeem_script: self.redeem_script.clone(),
            witness_script: self.witness_script.clone(),
            signatures: self.partial_sigs.clone(),
            bip32_derivations: self.bip32_derivations.clone(),
            ..Default::default()
        };
        if let Some(ref script_sig) = self.final_script_sig {
            sigdata.script_sig = script_sig.clone();
            sigdata.complete = true;
        }
        if let Some(ref witness) = self.final_script_witness {
            sigdata.script_witness = witness.clone();
            sigdata.complete = true;
        }
        sigdata
    }

    /// Updates this input from a filled in [`SignatureData`].
    ///
    /// A complete signature set finalizes the input, clearing everything that was only
    /// needed to get there.
    pub(crate) fn update_with(&mut self, sigdata: SignatureData) {
        if sigdata.complete {
            self.partial_sigs.clear();
            self.bip32_derivations.clear();
            self.redeem_script = None;
            self.witness_script = None;

            if !sigdata.script_sig.is_empty() {
                self.final_script_sig = Some(sigdata.script_sig);
            }
            if !sigdata.script_witness.is_empty() {
                self.final_script_witness = Some(sigdata.script_witness);
            }
            return;
        }

        self.partial_sigs.extend(sigdata.signatures);
        self.bip32_derivations.extend(sigdata.bip32_derivations);
        if self.redeem_script.is_none() {
            self.redeem_script = sigdata.redeem_script;
        }
        if self.witness_script.is_none() {
            self.witness_script = sigdata.witness_script;
        }
    }
}

/// Gets the output referenced by `previous_output` out of a non-witness UTXO.
pub(crate) fn non_witness_output<'a>(
    tx: &'a Transaction,
    input_index: usize,
    previous_output: &OutPoint,
) -> Result<&'a TxOut, InvalidInputError> {
    let txid = tx.txid();
    if txid != previous_output.txid {
        return Err(InvalidInputError::NonWitnessUtxoTxidMismatch {
            input_index,
            expected: previous_output.txid,
            got: txid,
        });
    }

    let vout = previous_output.vout as usize;
    tx.output.get(vout).ok_or(InvalidInputError::OutOfBounds {
        input_index,
        vout,
        len: tx.output.len(),
    })
}
