// SPDX-License-Identifier: CC0-1.0

//! Access to wallet-resident previous transactions and blinding data.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use elements::confidential::{AssetBlindingFactor, ValueBlindingFactor};
use elements::{AssetId, OutPoint, Transaction, Txid};

/// The unblinding data of a wallet-owned output.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlindingData {
    /// The explicit value, `None` if the wallet could not unblind it.
    pub value: Option<u64>,
    /// The value blinding factor.
    pub value_blinding_factor: ValueBlindingFactor,
    /// The explicit asset.
    pub asset: AssetId,
    /// The asset blinding factor.
    pub asset_blinding_factor: AssetBlindingFactor,
}

/// A wallet that can look up previous transactions and the blinding data of their outputs.
pub trait Wallet {
    /// Returns the wallet transaction with `txid`, if known.
    fn transaction(&self, txid: &Txid) -> Option<Transaction>;

    /// Returns the blinding data for the output at `outpoint`, if known.
    fn blinding_data(&self, outpoint: &OutPoint) -> Option<BlindingData>;

    /// Returns an immutable view of everything the wallet knows about `outpoints`.
    ///
    /// Implementations guarding their state with a lock should override this to take the lock
    /// once so the view is consistent.
    fn snapshot(&self, outpoints: &[OutPoint]) -> WalletSnapshot {
        let mut snapshot = WalletSnapshot::default();
        for outpoint in outpoints {
            if let Some(tx) = self.transaction(&outpoint.txid) {
                snapshot.transactions.insert(outpoint.txid, tx);
            }
            if let Some(data) = self.blinding_data(outpoint) {
                snapshot.blinding.insert(*outpoint, data);
            }
        }
        snapshot
    }
}

impl<W: Wallet + ?Sized> Wallet for &W {
    fn transaction(&self, txid: &Txid) -> Option<Transaction> { (**self).transaction(txid) }

    fn blinding_data(&self, outpoint: &OutPoint) -> Option<BlindingData> {
        (**self).blinding_data(outpoint)
    }

    fn snapshot(&self, outpoints: &[OutPoint]) -> WalletSnapshot { (**self).snapshot(outpoints) }
}

/// Wallet data needed by one fill or sign call, read once at the start of the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletSnapshot {
    transactions: BTreeMap<Txid, Transaction>,
    blinding: BTreeMap<OutPoint, BlindingData>,
}

impl WalletSnapshot {
    /// Returns the previous transaction `txid`.
    pub fn transaction(&self, txid: &Txid) -> Option<&Transaction> { self.transactions.get(txid) }

    /// Returns the blinding data for `outpoint`.
    pub fn blinding_data(&self, outpoint: &OutPoint) -> Option<&BlindingData> {
        self.blinding.get(outpoint)
    }

    /// Returns true if the snapshot contains neither transactions nor blinding data.
    pub fn is_empty(&self) -> bool { self.transactions.is_empty() && self.blinding.is_empty() }
}

#[derive(Debug, Default)]
struct State {
    transactions: BTreeMap<Txid, Transaction>,
    blinding: BTreeMap<OutPoint, BlindingData>,
}

/// An in-memory [`Wallet`].
///
/// Calls on different PSBTs may share one `MemoryWallet`, each call reads the wallet once.
#[derive(Debug, Default)]
pub struct MemoryWallet {
    state: RwLock<State>,
}

impl MemoryWallet {
    /// Creates an empty wallet.
    pub fn new() -> Self { Self::default() }

    /// Adds a transaction to the wallet, replacing any with the same txid.
    pub fn insert_transaction(&self, tx: Transaction) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.transactions.insert(tx.txid(), tx);
    }

    /// Records the blinding data for the output at `outpoint`.
    pub fn insert_blinding_data(&self, outpoint: OutPoint, data: BlindingData) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.blinding.insert(outpoint, data);
    }
}

impl Wallet for MemoryWallet {
    fn transaction(&self, txid: &Txid) -> Option<Transaction> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.transactions.get(txid).cloned()
    }

    fn blinding_data(&self, outpoint: &OutPoint) -> Option<BlindingData> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.blinding.get(outpoint).copied()
    }

    fn snapshot(&self, outpoints: &[OutPoint]) -> WalletSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        let mut snapshot = WalletSnapshot::default();
        for outpoint in outpoints {
            if let Some(tx) = state.transactions.get(&outpoint.txid) {
                snapshot.transactions.insert(outpoint.txid, tx.clone());
            }
            if let Some(data) = state.blinding.get(outpoint) {
                snapshot.blinding.insert(*outpoint, *data);
            }
        }
        snapshot
    }
}
