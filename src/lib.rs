// SPDX-License-Identifier: CC0-1.0

//! Partially Signed Elements Transactions, wallet side.
//!
//! Fills in and signs PSBTs for chains with confidential amounts and assets (Elements, Liquid).
//! Commitment math, proof verification, key storage and the wire format are left to
//! collaborators reached through traits:
//!
//! - [`Wallet`]: previous transactions and per-outpoint blinding data.
//! - [`KeyStore`]: private keys, BIP-32 key origins and redeem scripts.
//! - [`AmountVerifier`]: checks that input and output amounts balance.
//!
//! The entry point is the [`Orchestrator`], exposing the following operations:
//!
//! - [`Orchestrator::fill_data`]: add UTXOs, blinding data and key origins, do not sign.
//! - [`Orchestrator::sign`]: sign an already blinded PSBT, optionally checking the balance first.
//! - [`Orchestrator::fill_and_sign`]: both of the above in one call.
//!
//! # Examples
//!
//! ```no_run
//! use elements_psbt_wallet::{KeyRing, MemoryWallet, Orchestrator, Psbt, SignOptions};
//!
//! # fn get_psbt() -> Psbt { unimplemented!() }
//! let wallet = MemoryWallet::new();
//! let keys = KeyRing::new();
//! let mut psbt = get_psbt();
//!
//! let orchestrator = Orchestrator::new(&wallet, &keys);
//! let complete = orchestrator.sign(&mut psbt, &SignOptions::default())?;
//! # Ok::<_, elements_psbt_wallet::TransactionError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// Coding conventions
#![warn(missing_docs)]

#[cfg(feature = "serde")]
#[macro_use]
extern crate actual_serde as serde;

/// Re-export of the `rust-bitcoin` crate.
pub extern crate bitcoin;
/// Re-export of the `rust-elements` crate.
pub extern crate elements;

mod error;
mod fill;
mod map;
mod options;
mod orchestrator;
mod provider;
mod psbt;
#[cfg(feature = "serde")]
mod serde_utils;
mod sighash_type;
mod signature;
mod signer;
mod verify;
mod wallet;

#[rustfmt::skip]                // Keep public re-exports separate.
pub use crate::{
    error::{ErrorCategory, IndexOutOfBoundsError, InvalidInputError, TransactionError},
    map::{input::{self, Input}, output::{self, Output}},
    options::{BalanceCheck, FillOptions, SignOptions},
    orchestrator::Orchestrator,
    provider::{KeyRing, KeyRingError, KeyStore, MetadataOnly, SignatureProvider, Signing},
    psbt::{Psbt, UnsignedTxError},
    sighash_type::{NonStandardSighashTypeError, ParseSighashTypeError, PsbtSighashType},
    signature::{OutputType, SignatureData},
    signer::Signer,
    verify::{AmountVerifier, ProofVerifier},
    wallet::{BlindingData, MemoryWallet, Wallet, WalletSnapshot},
};
