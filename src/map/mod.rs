// SPDX-License-Identifier: CC0-1.0

//! The per-input and per-output side-records of a PSBT.
//!
//! > The Partially Signed Bitcoin Transaction (PSBT) format consists of key-value maps.
//! > ...
//! > `<input-map> := <keypair>* 0x00`
//! > `<output-map> := <keypair>* 0x00`
//!
//! Only the in-memory form is modelled here, encoding the maps is left to the caller.

/// The `input-map`.
pub mod input;
/// The `output-map`.
pub mod output;

#[rustfmt::skip]                // Keep public re-exports separate.
pub use self::{input::Input, output::Output};
