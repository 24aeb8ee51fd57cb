// SPDX-License-Identifier: CC0-1.0

//! Key material and the signature providers built on top of it.
//!
//! A [`SignatureProvider`] is handed to the signature production code, it comes in two
//! variants:
//!
//! - [`Signing`]: creates signatures, never reveals key origins.
//! - [`MetadataOnly`]: never signs, optionally reveals key origins.

use core::fmt;
use std::collections::BTreeMap;

use bitcoin::bip32::{self, DerivationPath, KeySource, Xpriv};
use bitcoin::secp256k1::{ecdsa, All, Message, Secp256k1};
use bitcoin::{PrivateKey, PublicKey};
use elements::hashes::Hash;
use elements::{PubkeyHash, Script, ScriptHash, WPubkeyHash};

use crate::error::write_err;

/// Wallet-resident key material.
pub trait KeyStore {
    /// Returns the public key hashing to `hash`, if known.
    fn pubkey(&self, hash: &PubkeyHash) -> Option<PublicKey>;

    /// Returns the private key for `pk`, if known.
    fn private_key(&self, pk: &PublicKey) -> Option<PrivateKey>;

    /// Returns the master key fingerprint and derivation path of `pk`, if known.
    fn key_origin(&self, pk: &PublicKey) -> Option<KeySource>;

    /// Returns the script hashing to `hash`, if known.
    fn script(&self, hash: &ScriptHash) -> Option<Script>;
}

impl<K: KeyStore + ?Sized> KeyStore for &K {
    fn pubkey(&self, hash: &PubkeyHash) -> Option<PublicKey> { (**self).pubkey(hash) }

    fn private_key(&self, pk: &PublicKey) -> Option<PrivateKey> { (**self).private_key(pk) }

    fn key_origin(&self, pk: &PublicKey) -> Option<KeySource> { (**self).key_origin(pk) }

    fn script(&self, hash: &ScriptHash) -> Option<Script> { (**self).script(hash) }
}

/// An in-memory [`KeyStore`].
///
/// Every key added is also registered as a P2SH-P2WPKH redeem script so wrapped segwit outputs
/// can be recognised.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: BTreeMap<PublicKey, PrivateKey>,
    pubkeys: BTreeMap<PubkeyHash, PublicKey>,
    origins: BTreeMap<PublicKey, KeySource>,
    scripts: BTreeMap<ScriptHash, Script>,
}

impl KeyRing {
    /// Creates an empty key ring.
    pub fn new() -> Self { Self::default() }

    /// Adds a private key, returns its public key.
    pub fn insert_key(&mut self, sk: PrivateKey) -> PublicKey {
        let secp = Secp256k1::signing_only();
        let pk = sk.public_key(&secp);
        let hash = PubkeyHash::hash(&pk.to_bytes());

        let redeem_script = Script::new_v0_wpkh(&WPubkeyHash::hash(&pk.to_bytes()));
        self.insert_script(redeem_script);

        self.pubkeys.insert(hash, pk);
        self.keys.insert(pk, sk);
        pk
    }

    /// Adds a public key without its private key, e.g. a watch-only cosigner key.
    pub fn insert_pubkey(&mut self, pk: PublicKey, origin: Option<KeySource>) {
        self.pubkeys.insert(PubkeyHash::hash(&pk.to_bytes()), pk);
        if let Some(origin) = origin {
            self.origins.insert(pk, origin);
        }
    }

    /// Derives the key at `path` from `xpriv` and adds it along with its key origin.
    pub fn insert_derived(
        &mut self,
        xpriv: &Xpriv,
        path: &DerivationPath,
    ) -> Result<PublicKey, KeyRingError> {
        let secp = Secp256k1::new();
        let derived = xpriv.derive_priv(&secp, path)?;
        let pk = self.insert_key(derived.to_priv());
        self.origins.insert(pk, (xpriv.fingerprint(&secp), path.clone()));
        Ok(pk)
    }

    /// Adds a script, e.g. a P2SH redeem script.
    pub fn insert_script(&mut self, script: Script) {
        self.scripts.insert(ScriptHash::hash(script.as_bytes()), script);
    }
}

impl KeyStore for KeyRing {
    fn pubkey(&self, hash: &PubkeyHash) -> Option<PublicKey> { self.pubkeys.get(hash).copied() }

    fn private_key(&self, pk: &PublicKey) -> Option<PrivateKey> { self.keys.get(pk).copied() }

    fn key_origin(&self, pk: &PublicKey) -> Option<KeySource> { self.origins.get(pk).cloned() }

    fn script(&self, hash: &ScriptHash) -> Option<Script> { self.scripts.get(hash).cloned() }
}

/// Errors when adding keys to a [`KeyRing`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyRingError {
    /// A bip32 error.
    Bip32(bip32::Error),
}

impl fmt::Display for KeyRingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use KeyRingError::*;

        match *self {
            Bip32(ref e) => write_err!(f, "a bip32 error"; e),
        }
    }
}

impl std::error::Error for KeyRingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use KeyRingError::*;

        match *self {
            Bip32(ref e) => Some(e),
        }
    }
}

impl From<bip32::Error> for KeyRingError {
    fn from(e: bip32::Error) -> Self { KeyRingError::Bip32(e) }
}

/// The capability handed to signature production.
///
/// Implemented by exactly two variants, [`Signing`] and [`MetadataOnly`].
pub trait SignatureProvider: sealed::Sealed {
    /// Returns the public key hashing to `hash`.
    fn pubkey(&self, hash: &PubkeyHash) -> Option<PublicKey>;

    /// Returns the script hashing to `hash`.
    fn script(&self, hash: &ScriptHash) -> Option<Script>;

    /// Returns the key origin of `pk` if this provider reveals key origins.
    fn key_origin(&self, pk: &PublicKey) -> Option<KeySource>;

    /// Signs `msg` with the private key for `pk` if this provider signs and the key is known.
    fn sign_ecdsa(&self, pk: &PublicKey, msg: &Message) -> Option<ecdsa::Signature>;
}

mod sealed {
    pub trait Sealed {}
    impl<K: super::KeyStore> Sealed for super::Signing<'_, K> {}
    impl<K: super::KeyStore> Sealed for super::MetadataOnly<'_, K> {}
}

/// A provider that creates signatures and hides key origins.
pub struct Signing<'a, K> {
    keys: &'a K,
    secp: Secp256k1<All>,
}

impl<'a, K: KeyStore> Signing<'a, K> {
    /// Creates a signing provider backed by `keys`.
    pub fn new(keys: &'a K) -> Self { Signing { keys, secp: Secp256k1::new() } }
}

impl<K: KeyStore> SignatureProvider for Signing<'_, K> {
    fn pubkey(&self, hash: &PubkeyHash) -> Option<PublicKey> { self.keys.pubkey(hash) }

    fn script(&self, hash: &ScriptHash) -> Option<Script> { self.keys.script(hash) }

    fn key_origin(&self, _: &PublicKey) -> Option<KeySource> { None }

    fn sign_ecdsa(&self, pk: &PublicKey, msg: &Message) -> Option<ecdsa::Signature> {
        let sk = self.keys.private_key(pk)?;
        Some(self.secp.sign_ecdsa_low_r(msg, &sk.inner))
    }
}

/// A provider that never signs, used to fill in scripts and key origins.
pub struct MetadataOnly<'a, K> {
    keys: &'a K,
    key_origins: bool,
}

impl<'a, K: KeyStore> MetadataOnly<'a, K> {
    /// Creates a metadata provider backed by `keys`, revealing key origins iff `key_origins`.
    pub fn new(keys: &'a K, key_origins: bool) -> Self { MetadataOnly { keys, key_origins } }
}

impl<K: KeyStore> SignatureProvider for MetadataOnly<'_, K> {
    fn pubkey(&self, hash: &PubkeyHash) -> Option<PublicKey> { self.keys.pubkey(hash) }

    fn script(&self, hash: &ScriptHash) -> Option<Script> { self.keys.script(hash) }

    fn key_origin(&self, pk: &PublicKey) -> Option<KeySource> {
        if self.key_origins {
            self.keys.key_origin(pk)
        } else {
            None
        }
    }

    fn sign_ecdsa(&self, _: &PublicKey, _: &Message) -> Option<ecdsa::Signature> { None }
}
