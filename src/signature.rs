// SPDX-License-Identifier: CC0-1.0

//! Producing signatures and script metadata for a single script.

use std::collections::BTreeMap;

use bitcoin::bip32::KeySource;
use bitcoin::secp256k1::Message;
use bitcoin::PublicKey;
use elements::confidential;
use elements::hashes::Hash;
use elements::script::Builder;
use elements::sighash::SighashCache;
use elements::{EcdsaSighashType, PubkeyHash, Script, ScriptHash, Transaction};

use crate::provider::SignatureProvider;

/// Everything known about how to satisfy a script, collected from and written back into the
/// PSBT maps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureData {
    /// The P2SH redeem script.
    pub redeem_script: Option<Script>,
    /// The P2WSH witness script.
    pub witness_script: Option<Script>,
    /// Signatures collected so far.
    pub signatures: BTreeMap<PublicKey, Vec<u8>>,
    /// Key origins of the keys involved.
    pub bip32_derivations: BTreeMap<PublicKey, KeySource>,
    /// The final scriptSig, set once complete.
    pub script_sig: Script,
    /// The final script witness, set once complete.
    pub script_witness: Vec<Vec<u8>>,
    /// True if the script spends a witness program.
    pub witness: bool,
    /// True if the script is fully satisfied.
    pub complete: bool,
}

/// The script templates we know how to satisfy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum OutputType {
    /// A pay-to-pubkey-hash output (P2PKH).
    Pkh,
    /// A pay-to-witness-pubkey-hash output (P2WPKH).
    Wpkh,
    /// A nested segwit output, pay-to-witness-pubkey-hash nested in a pay-to-script-hash.
    ShWpkh,
}

impl OutputType {
    /// Classifies `script_pubkey`, using `redeem_script` for P2SH outputs.
    ///
    /// Returns `None` for anything we can not sign.
    pub fn from_script(script_pubkey: &Script, redeem_script: Option<&Script>) -> Option<Self> {
        if script_pubkey.is_p2pkh() {
            Some(OutputType::Pkh)
        } else if script_pubkey.is_v0_p2wpkh() {
            Some(OutputType::Wpkh)
        } else if script_pubkey.is_p2sh() && redeem_script.map_or(false, |s| s.is_v0_p2wpkh()) {
            Some(OutputType::ShWpkh)
        } else {
            None
        }
    }

    /// True if spending this output type uses the segwit v0 sighash.
    pub fn is_witness(&self) -> bool { !matches!(self, OutputType::Pkh) }
}

/// Computes signature hashes for one input of a transaction.
pub(crate) struct InputSighasher<'c, 't> {
    pub(crate) cache: &'c mut SighashCache<&'t Transaction>,
    pub(crate) input_index: usize,
    /// The (possibly confidential) value of the output being spent.
    pub(crate) value: confidential::Value,
    pub(crate) sighash_type: EcdsaSighashType,
}

impl InputSighasher<'_, '_> {
    fn message(&mut self, script_code: &Script, witness: bool) -> Message {
        let sighash = if witness {
            self.cache.segwitv0_sighash(self.input_index, script_code, self.value, self.sighash_type)
        } else {
            self.cache.legacy_sighash(self.input_index, script_code, self.sighash_type)
        };
        Message::from_digest(sighash.to_byte_array())
    }
}

/// Attempts to satisfy `script_pubkey`, updating `sigdata` with whatever `provider` knows.
///
/// Without a `sighasher` only scripts and key origins are collected. Returns true if the script
/// is fully satisfied, in which case the final scriptSig and witness are set in `sigdata`.
pub(crate) fn produce_signature<P: SignatureProvider>(
    provider: &P,
    mut sighasher: Option<&mut InputSighasher>,
    script_pubkey: &Script,
    sigdata: &mut SignatureData,
) -> bool {
    if sigdata.complete {
        return true;
    }

    if script_pubkey.is_p2sh() && sigdata.redeem_script.is_none() {
        let hash = ScriptHash::from_slice(&script_pubkey.as_bytes()[2..22]).ok();
        sigdata.redeem_script = hash.and_then(|h| provider.script(&h));
    }

    let output_type = match OutputType::from_script(script_pubkey, sigdata.redeem_script.as_ref()) {
        Some(ty) => ty,
        None => {
            tracing::trace!(script = ?script_pubkey, "not a known template");
            return false;
        }
    };
    sigdata.witness = output_type.is_witness();

    let program = match output_type {
        OutputType::Pkh => &script_pubkey.as_bytes()[3..23],
        OutputType::Wpkh => &script_pubkey.as_bytes()[2..22],
        OutputType::ShWpkh => match sigdata.redeem_script {
            Some(ref redeem_script) => &redeem_script.as_bytes()[2..22],
            None => return false,
        },
    };
    let hash = match PubkeyHash::from_slice(program) {
        Ok(hash) => hash,
        Err(_) => return false,
    };

    let pk = match provider.pubkey(&hash).or_else(|| known_pubkey(sigdata, &hash)) {
        Some(pk) => pk,
        None => return false,
    };
    if let Some(origin) = provider.key_origin(&pk) {
        sigdata.bip32_derivations.insert(pk, origin);
    }

    let sig = match sigdata.signatures.get(&pk) {
        Some(sig) => sig.clone(),
        None => {
            let sighasher = match sighasher.as_mut() {
                Some(sighasher) => sighasher,
                None => return false,
            };
            // P2PKH signs the script pubkey itself, P2WPKH the equivalent P2PKH script.
            let script_code = Script::new_p2pkh(&hash);
            let msg = sighasher.message(&script_code, output_type.is_witness());
            match provider.sign_ecdsa(&pk, &msg) {
                Some(sig) => {
                    let mut bytes = sig.serialize_der().to_vec();
                    bytes.push(sighasher.sighash_type as u8);
                    sigdata.signatures.insert(pk, bytes.clone());
                    bytes
                }
                None => return false,
            }
        }
    };

    match output_type {
        OutputType::Pkh => {
            sigdata.script_sig =
                Builder::new().push_slice(&sig).push_slice(&pk.to_bytes()).into_script();
        }
        OutputType::Wpkh => {
            sigdata.script_witness = vec![sig, pk.to_bytes()];
        }
        OutputType::ShWpkh => {
            let redeem_script = sigdata.redeem_script.as_ref().map(|s| s.as_bytes()).unwrap_or(&[]);
            sigdata.script_sig = Builder::new().push_slice(redeem_script).into_script();
            sigdata.script_witness = vec![sig, pk.to_bytes()];
        }
    }
    sigdata.complete = true;
    true
}

/// Finds a public key hashing to `hash` among the keys already recorded in `sigdata`.
fn known_pubkey(sigdata: &SignatureData, hash: &PubkeyHash) -> Option<PublicKey> {
    sigdata
        .signatures
        .keys()
        .chain(sigdata.bip32_derivations.keys())
        .find(|pk| PubkeyHash::hash(&pk.to_bytes()) == *hash)
        .copied()
}

#[cfg(test)]
mod tests {
    use bitcoin::{Network, PrivateKey};
    use elements::WPubkeyHash;

    use super::*;
    use crate::provider::{KeyRing, KeyStore, MetadataOnly};

    fn keys() -> (KeyRing, PublicKey) {
        let mut keys = KeyRing::new();
        let sk = PrivateKey::from_slice(&[0x02; 32], Network::Regtest).unwrap();
        let pk = keys.insert_key(sk);
        (keys, pk)
    }

    #[test]
    fn classify_output_types() {
        let (_, pk) = keys();
        let wpkh = Script::new_v0_wpkh(&WPubkeyHash::hash(&pk.to_bytes()));
        let pkh = Script::new_p2pkh(&PubkeyHash::hash(&pk.to_bytes()));
        let sh = Script::new_p2sh(&ScriptHash::hash(wpkh.as_bytes()));

        assert_eq!(OutputType::from_script(&wpkh, None), Some(OutputType::Wpkh));
        assert_eq!(OutputType::from_script(&pkh, None), Some(OutputType::Pkh));
        assert_eq!(OutputType::from_script(&sh, None), None);
        assert_eq!(OutputType::from_script(&sh, Some(&wpkh)), Some(OutputType::ShWpkh));
        assert!(!OutputType::Pkh.is_witness());
        assert!(OutputType::ShWpkh.is_witness());
    }

    #[test]
    fn metadata_fills_redeem_script_without_signing() {
        let (keys, pk) = keys();
        let wpkh = Script::new_v0_wpkh(&WPubkeyHash::hash(&pk.to_bytes()));
        let sh = Script::new_p2sh(&ScriptHash::hash(wpkh.as_bytes()));

        let mut sigdata = SignatureData::default();
        let provider = MetadataOnly::new(&keys, true);
        assert!(!produce_signature(&provider, None, &sh, &mut sigdata));

        assert_eq!(sigdata.redeem_script, Some(wpkh));
        assert!(sigdata.witness);
        assert!(sigdata.signatures.is_empty());
        // `keys()` inserts a bare key without an origin.
        assert!(keys.key_origin(&pk).is_none());
        assert!(sigdata.bip32_derivations.is_empty());
    }

    #[test]
    fn existing_signature_completes_script() {
        let (keys, pk) = keys();
        let wpkh = Script::new_v0_wpkh(&WPubkeyHash::hash(&pk.to_bytes()));

        let mut sigdata = SignatureData::default();
        sigdata.signatures.insert(pk, vec![0x30, 0x01]);
        let provider = MetadataOnly::new(&keys, false);
        assert!(produce_signature(&provider, None, &wpkh, &mut sigdata));
        assert_eq!(sigdata.script_witness, vec![vec![0x30, 0x01], pk.to_bytes()]);
        assert!(sigdata.script_sig.is_empty());
    }

    #[test]
    fn unknown_script_is_not_complete() {
        let (keys, _) = keys();
        let provider = MetadataOnly::new(&keys, true);
        let mut sigdata = SignatureData::default();
        assert!(!produce_signature(&provider, None, &Script::new(), &mut sigdata));
        assert!(!sigdata.witness);
    }
}
