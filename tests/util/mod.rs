// SPDX-License-Identifier: CC0-1.0

// Functions in this file are all used but clippy complains still.
#![allow(dead_code)]

use core::str::FromStr;

use elements_psbt_wallet::bitcoin::bip32::{DerivationPath, Xpriv};
use elements_psbt_wallet::bitcoin::secp256k1::{ecdsa, Message, Secp256k1};
use elements_psbt_wallet::bitcoin::{Network, PublicKey};
use elements_psbt_wallet::elements::confidential::{Asset, Nonce, Value};
use elements_psbt_wallet::elements::hashes::Hash;
use elements_psbt_wallet::elements::sighash::SighashCache;
use elements_psbt_wallet::elements::{
    AssetId, EcdsaSighashType, LockTime, OutPoint, PubkeyHash, Script, ScriptHash, Transaction,
    TxIn, TxOut, TxOutWitness, Txid, WPubkeyHash,
};
use elements_psbt_wallet::{KeyRing, MemoryWallet, Psbt, Wallet};

/// The only asset used in these tests.
pub fn asset() -> AssetId { AssetId::from_slice(&[0xaa; 32]).expect("32 bytes") }

/// An output with explicit value and asset.
pub fn explicit_out(value: u64, script_pubkey: Script) -> TxOut {
    TxOut {
        asset: Asset::Explicit(asset()),
        value: Value::Explicit(value),
        nonce: Nonce::Null,
        script_pubkey,
        witness: TxOutWitness::default(),
    }
}

/// An output whose value and asset are yet to be filled in from the output map.
pub fn null_out(script_pubkey: Script) -> TxOut {
    TxOut {
        asset: Asset::Null,
        value: Value::Null,
        nonce: Nonce::Null,
        script_pubkey,
        witness: TxOutWitness::default(),
    }
}

pub fn wpkh(pk: &PublicKey) -> Script { Script::new_v0_wpkh(&WPubkeyHash::hash(&pk.to_bytes())) }

pub fn pkh(pk: &PublicKey) -> Script { Script::new_p2pkh(&PubkeyHash::hash(&pk.to_bytes())) }

pub fn sh_wpkh(pk: &PublicKey) -> Script {
    Script::new_p2sh(&ScriptHash::hash(wpkh(pk).as_bytes()))
}

/// A transaction paying to `outputs`, `tag` keeps txids apart.
pub fn funding_tx(tag: u32, outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: 2,
        lock_time: LockTime::from_consensus(tag),
        input: vec![],
        output: outputs,
    }
}

/// An unsigned transaction spending `prevouts`.
pub fn spending_tx(prevouts: &[OutPoint], outputs: Vec<TxOut>) -> Transaction {
    Transaction {
        version: 2,
        lock_time: LockTime::ZERO,
        input: prevouts
            .iter()
            .map(|prevout| TxIn { previous_output: *prevout, ..Default::default() })
            .collect(),
        output: outputs,
    }
}

/// A wallet and key ring with `n` receive keys and one change key.
pub struct Fixture {
    pub wallet: MemoryWallet,
    pub keys: KeyRing,
    pub receive: Vec<PublicKey>,
    pub change: PublicKey,
}

impl Fixture {
    pub fn new(n: u32) -> Self {
        let xpriv = Xpriv::new_master(Network::Regtest, &[0x42; 32]).expect("valid seed");
        let mut keys = KeyRing::new();

        let receive = (0..n)
            .map(|i| {
                let path = DerivationPath::from_str(&format!("m/84'/1'/0'/0/{}", i)).unwrap();
                keys.insert_derived(&xpriv, &path).unwrap()
            })
            .collect();
        let path = DerivationPath::from_str("m/84'/1'/0'/1/0").unwrap();
        let change = keys.insert_derived(&xpriv, &path).unwrap();

        Fixture { wallet: MemoryWallet::new(), keys, receive, change }
    }

    /// Funds each `(script_pubkey, value)` in its own wallet transaction, returns the outpoints.
    pub fn fund(&self, coins: &[(Script, u64)]) -> Vec<OutPoint> {
        coins
            .iter()
            .enumerate()
            .map(|(i, (spk, value))| {
                let tx = funding_tx(i as u32 + 1, vec![explicit_out(*value, spk.clone())]);
                let outpoint = OutPoint::new(tx.txid(), 0);
                self.wallet.insert_transaction(tx);
                outpoint
            })
            .collect()
    }

    /// Returns the wallet transaction `txid`, panics if unknown.
    pub fn wallet_tx(&self, txid: &Txid) -> Transaction {
        self.wallet.transaction(txid).expect("wallet transaction")
    }

    /// A PSBT spending one P2WPKH coin of 10_000 to 8_000 plus 1_500 change and a 500 fee.
    pub fn single_wpkh_psbt(&self) -> (Psbt, TxOut) {
        let spk = wpkh(&self.receive[0]);
        let outpoints = self.fund(&[(spk.clone(), 10_000)]);
        let tx = spending_tx(
            &outpoints,
            vec![
                explicit_out(8_000, Script::from(vec![0x51])),
                explicit_out(1_500, wpkh(&self.change)),
                TxOut::new_fee(500, asset()),
            ],
        );
        (Psbt::from_unsigned_tx(tx).expect("unsigned"), explicit_out(10_000, spk))
    }
}

/// Checks the final witness of a segwit input of `psbt` signs `spent` with `SIGHASH_ALL`.
#[track_caller]
pub fn assert_valid_witness_signature(psbt: &Psbt, input_index: usize, spent: &TxOut) {
    let witness = psbt.inputs[input_index].final_script_witness.as_ref().expect("finalized");
    assert_eq!(witness.len(), 2);
    let (sighash_byte, der) = witness[0].split_last().expect("non-empty signature");
    assert_eq!(*sighash_byte, EcdsaSighashType::All as u8);
    let pk = PublicKey::from_slice(&witness[1]).expect("valid public key");

    let tx = psbt.extract_tx();
    let script_code = Script::new_p2pkh(&PubkeyHash::hash(&pk.to_bytes()));
    let sighash = SighashCache::new(&tx).segwitv0_sighash(
        input_index,
        &script_code,
        spent.value,
        EcdsaSighashType::All,
    );
    let msg = Message::from_digest(sighash.to_byte_array());
    let sig = ecdsa::Signature::from_der(der).expect("DER signature");
    Secp256k1::verification_only().verify_ecdsa(&msg, &sig, &pk.inner).expect("valid signature");
}
