// SPDX-License-Identifier: CC0-1.0

use std::collections::BTreeMap;

use bitcoin::bip32::KeySource;
use bitcoin::{secp256k1, PublicKey};
use elements::confidential::{Asset, Nonce, Value};
use elements::secp256k1_zkp::{RangeProof, SurjectionProof};
use elements::{Script, TxOut};

use crate::signature::SignatureData;

/// A key-value map for an output of the corresponding index in the unsigned transaction.
///
/// Confidential data lives here, not in the transaction skeleton, until the transaction is
/// extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// The value commitment, [`Value::Null`] if not yet blinded.
    pub value_commitment: Value,
    /// The asset commitment, [`Asset::Null`] if not yet blinded.
    pub asset_commitment: Asset,
    /// The ECDH nonce commitment, [`Nonce::Null`] if not yet blinded.
    pub nonce_commitment: Nonce,
    /// The range proof for the value commitment.
    pub range_proof: Option<Box<RangeProof>>,
    /// The surjection proof for the asset commitment.
    pub surjection_proof: Option<Box<SurjectionProof>>,
    /// The receiver's blinding key, present while the output still needs blinding.
    pub blinding_pubkey: Option<secp256k1::PublicKey>,
    /// The redeem script for this output.
    pub redeem_script: Option<Script>,
    /// The witness script for this output.
    pub witness_script: Option<Script>,
    /// A map from public keys needed to spend this output to their corresponding master key
    /// fingerprints and derivation paths.
    pub bip32_derivations: BTreeMap<PublicKey, KeySource>,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            value_commitment: Value::Null,
            asset_commitment: Asset::Null,
            nonce_commitment: Nonce::Null,
            range_proof: None,
            surjection_proof: None,
            blinding_pubkey: None,
            redeem_script: None,
            witness_script: None,
            bip32_derivations: BTreeMap::new(),
        }
    }
}

impl Output {
    /// Creates an output map that still needs blinding to `blinding_pubkey`.
    pub fn needs_blinding(blinding_pubkey: secp256k1::PublicKey) -> Self {
        Output { blinding_pubkey: Some(blinding_pubkey), ..Default::default() }
    }

    /// Returns true if this output is waiting to be blinded.
    pub fn is_blinding_required(&self) -> bool { self.blinding_pubkey.is_some() }

    /// Copies the confidential fields of this map into `txout`.
    ///
    /// Only non-null fields are copied, whatever is in `txout` is kept otherwise.
    pub(crate) fn materialize(&self, txout: &mut TxOut) {
        if !self.value_commitment.is_null() {
            txout.value = self.value_commitment;
        }
        if !self.asset_commitment.is_null() {
            txout.asset = self.asset_commitment;
        }
        if !self.nonce_commitment.is_null() {
            txout.nonce = self.nonce_commitment;
        }
        // Proofs are not covered by the sighash but the balance check needs them.
        if let Some(ref proof) = self.range_proof {
            txout.witness.rangeproof = Some(proof.clone());
        }
        if let Some(ref proof) = self.surjection_proof {
            txout.witness.surjection_proof = Some(proof.clone());
        }
    }

    /// Creates a [`SignatureData`] template from the script fields of this output.
    pub(crate) fn signature_data(&self) -> SignatureData {
        SignatureData {
            redeem_script: self.redeem_script.clone(),
            witness_script: self.witness_script.clone(),
            bip32_derivations: self.bip32_derivations.clone(),
            ..Default::default()
        }
    }

    /// Updates this output's script fields from a filled in [`SignatureData`].
    pub(crate) fn update_with(&mut self, sigdata: SignatureData) {
        if self.redeem_script.is_none() {
            self.redeem_script = sigdata.redeem_script;
        }
        if self.witness_script.is_none() {
            self.witness_script = sigdata.witness_script;
        }
        self.bip32_derivations.extend(sigdata.bip32_derivations);
    }
}
