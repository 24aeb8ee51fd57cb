// SPDX-License-Identifier: CC0-1.0

//! Filling in wallet-known data without signing.

use crate::error::TransactionError;
use crate::provider::{KeyStore, MetadataOnly};
use crate::psbt::Psbt;
use crate::signature::produce_signature;
use crate::signer::sign_input;
use crate::wallet::WalletSnapshot;

/// Adds UTXOs, blinding data and key origins known to the wallet to the inputs of `psbt`.
///
/// Inputs that are already signed are skipped. Inputs before a failing one keep whatever was
/// filled in. The transaction skeleton is never touched.
pub(crate) fn fill_inputs<K: KeyStore>(
    psbt: &mut Psbt,
    snapshot: &WalletSnapshot,
    keys: &K,
    bip32_derivations: bool,
) -> Result<(), TransactionError> {
    psbt.check_counts()?;
    let provider = MetadataOnly::new(keys, bip32_derivations);

    for (input_index, (input, txin)) in psbt.inputs.iter_mut().zip(&psbt.tx.input).enumerate() {
        if input.is_signed() {
            tracing::trace!(input_index, "input already signed, skipping");
            continue;
        }

        input.sanity_check(input_index, &txin.previous_output)?;

        let outpoint = txin.previous_output;
        // Blinding data only applies to coins whose transaction the wallet holds.
        if let Some(tx) = snapshot.transaction(&outpoint.txid) {
            if input.non_witness_utxo.is_none() && input.witness_utxo.is_none() {
                tracing::debug!(input_index, txid = %outpoint.txid, "adding non-witness utxo");
                input.non_witness_utxo = Some(tx.clone());
            }
            if let Some(data) = snapshot.blinding_data(&outpoint) {
                input.set_blinding_data(data);
            }
        }

        sign_input(&provider, input, input_index, &outpoint, None);
    }
    Ok(())
}

/// Adds redeem scripts and key origins known to the wallet to the outputs of `psbt`.
///
/// Lets hardware signers recognise change outputs, outputs we know nothing about are left as
/// they are.
pub(crate) fn fill_outputs<K: KeyStore>(psbt: &mut Psbt, keys: &K, bip32_derivations: bool) {
    let provider = MetadataOnly::new(keys, bip32_derivations);

    for (output, txout) in psbt.outputs.iter_mut().zip(&psbt.tx.output) {
        let mut sigdata = output.signature_data();
        produce_signature(&provider, None, &txout.script_pubkey, &mut sigdata);
        output.update_with(sigdata);
    }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use bitcoin::bip32::{DerivationPath, Xpriv};
    use bitcoin::Network;
    use elements::confidential::{Asset, AssetBlindingFactor, Nonce, Value, ValueBlindingFactor};
    use elements::hashes::Hash;
    use elements::{
        AssetId, LockTime, OutPoint, Script, Transaction, TxIn, TxOut, TxOutWitness, WPubkeyHash,
    };

    use super::*;
    use crate::error::InvalidInputError;
    use crate::map::Input;
    use crate::provider::KeyRing;
    use crate::wallet::{BlindingData, MemoryWallet, Wallet};

    fn asset() -> AssetId { AssetId::from_slice(&[0x55; 32]).unwrap() }

    fn out(value: u64, script_pubkey: Script) -> TxOut {
        TxOut {
            asset: Asset::Explicit(asset()),
            value: Value::Explicit(value),
            nonce: Nonce::Null,
            script_pubkey,
            witness: TxOutWitness::default(),
        }
    }

    struct Fixture {
        keys: KeyRing,
        wallet: MemoryWallet,
        prev: Transaction,
        psbt: Psbt,
    }

    fn fixture() -> Fixture {
        let xpriv = Xpriv::new_master(Network::Regtest, &[0x07; 32]).unwrap();
        let mut keys = KeyRing::new();
        let path = DerivationPath::from_str("m/84'/1'/0'/0/0").unwrap();
        let pk = keys.insert_derived(&xpriv, &path).unwrap();
        let change = keys
            .insert_derived(&xpriv, &DerivationPath::from_str("m/84'/1'/0'/1/0").unwrap())
            .unwrap();
        let spk = Script::new_v0_wpkh(&WPubkeyHash::hash(&pk.to_bytes()));
        let change_spk = Script::new_v0_wpkh(&WPubkeyHash::hash(&change.to_bytes()));

        let prev = Transaction {
            version: 2,
            lock_time: LockTime::ZERO,
            input: vec![],
            output: vec![out(10_000, spk)],
        };
        let tx = Transaction {
            version: 2,
            lock_time: LockTime::ZERO,
            input: vec![TxIn { previous_output: OutPoint::new(prev.txid(), 0), ..Default::default() }],
            output: vec![out(9_000, change_spk), TxOut::new_fee(1_000, asset())],
        };

        let wallet = MemoryWallet::new();
        wallet.insert_transaction(prev.clone());
        let psbt = Psbt::from_unsigned_tx(tx).unwrap();
        Fixture { keys, wallet, prev, psbt }
    }

    #[test]
    fn fills_utxo_and_key_origins() {
        let Fixture { keys, wallet, prev, mut psbt } = fixture();
        let snapshot = wallet.snapshot(&psbt.outpoints());
        let before = psbt.tx.clone();

        fill_inputs(&mut psbt, &snapshot, &keys, true).unwrap();

        let input = &psbt.inputs[0];
        // P2WPKH, so the full transaction is swapped for the spent output.
        assert!(input.non_witness_utxo.is_none());
        assert_eq!(input.witness_utxo.as_ref(), Some(&prev.output[0]));
        assert_eq!(input.bip32_derivations.len(), 1);
        assert!(input.partial_sigs.is_empty());
        assert!(!input.is_signed());
        assert_eq!(psbt.tx, before);
    }

    #[test]
    fn key_origins_can_be_hidden() {
        let Fixture { keys, wallet, mut psbt, .. } = fixture();
        let snapshot = wallet.snapshot(&psbt.outpoints());

        fill_inputs(&mut psbt, &snapshot, &keys, false).unwrap();
        fill_outputs(&mut psbt, &keys, false);

        assert!(psbt.inputs[0].witness_utxo.is_some());
        assert!(psbt.inputs[0].bip32_derivations.is_empty());
        assert!(psbt.outputs[0].bip32_derivations.is_empty());
    }

    #[test]
    fn fills_blinding_data() {
        let Fixture { keys, wallet, prev, mut psbt } = fixture();
        let data = BlindingData {
            value: Some(10_000),
            value_blinding_factor: ValueBlindingFactor::zero(),
            asset: asset(),
            asset_blinding_factor: AssetBlindingFactor::zero(),
        };
        wallet.insert_blinding_data(OutPoint::new(prev.txid(), 0), data);
        let snapshot = wallet.snapshot(&psbt.outpoints());

        fill_inputs(&mut psbt, &snapshot, &keys, true).unwrap();
        assert_eq!(psbt.inputs[0].value, Some(10_000));
        assert_eq!(psbt.inputs[0].asset, Some(asset()));
    }

    #[test]
    fn signed_input_is_left_alone() {
        let Fixture { keys, wallet, mut psbt, .. } = fixture();
        psbt.inputs[0].final_script_witness = Some(vec![vec![0x01]]);
        let before = psbt.clone();
        let snapshot = wallet.snapshot(&psbt.outpoints());

        fill_inputs(&mut psbt, &snapshot, &keys, true).unwrap();
        assert_eq!(psbt, before);
    }

    #[test]
    fn insane_input_fails() {
        let Fixture { keys, wallet, prev, mut psbt } = fixture();
        psbt.inputs[0] = Input {
            non_witness_utxo: Some(prev),
            witness_utxo: Some(out(1, Script::new())),
            ..Default::default()
        };
        let snapshot = wallet.snapshot(&psbt.outpoints());

        assert_eq!(
            fill_inputs(&mut psbt, &snapshot, &keys, true),
            Err(TransactionError::InvalidPsbt(InvalidInputError::WitnessUtxoMismatch {
                input_index: 0
            }))
        );
    }

    #[test]
    fn fills_change_output_origins() {
        let Fixture { keys, mut psbt, .. } = fixture();
        fill_outputs(&mut psbt, &keys, true);

        assert_eq!(psbt.outputs[0].bip32_derivations.len(), 1);
        let (_, path) = psbt.outputs[0].bip32_derivations.values().next().unwrap();
        assert_eq!(*path, DerivationPath::from_str("m/84'/1'/0'/1/0").unwrap());
        // The fee output has an empty script.
        assert!(psbt.outputs[1].bip32_derivations.is_empty());
    }
}
