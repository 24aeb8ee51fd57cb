// SPDX-License-Identifier: CC0-1.0

//! The PSBT: an unsigned transaction skeleton plus per-input and per-output side-records.

use core::fmt;

use elements::{OutPoint, Transaction};

use crate::error::{IndexOutOfBoundsError, InvalidInputError};
use crate::map::{Input, Output};

/// A Partially Signed Elements Transaction.
///
/// `inputs` and `outputs` are index-aligned with the inputs and outputs of `tx`. Confidential
/// output data lives in `outputs`, `tx` only ever holds what the creator put there.
#[derive(Debug, Clone, PartialEq)]
pub struct Psbt {
    /// The unsigned transaction skeleton.
    pub tx: Transaction,
    /// The input side-records.
    pub inputs: Vec<Input>,
    /// The output side-records.
    pub outputs: Vec<Output>,
}

impl Psbt {
    /// Creates a PSBT from an unsigned transaction, with empty side-records.
    ///
    /// # Errors
    ///
    /// If transaction is not unsigned.
    pub fn from_unsigned_tx(tx: Transaction) -> Result<Self, UnsignedTxError> {
        for (index, txin) in tx.input.iter().enumerate() {
            if !txin.script_sig.is_empty() {
                return Err(UnsignedTxError::HasScriptSig { input_index: index });
            }
            if !txin.witness.script_witness.is_empty() {
                return Err(UnsignedTxError::HasScriptWitness { input_index: index });
            }
        }

        let inputs = vec![Input::default(); tx.input.len()];
        let outputs = vec![Output::default(); tx.output.len()];
        Ok(Psbt { tx, inputs, outputs })
    }

    /// Checks that there is exactly one side-record per skeleton input and output.
    pub fn check_counts(&self) -> Result<(), InvalidInputError> {
        if self.inputs.len() != self.tx.input.len() {
            return Err(InvalidInputError::InputCountMismatch {
                tx_inputs: self.tx.input.len(),
                psbt_inputs: self.inputs.len(),
            });
        }
        if self.outputs.len() != self.tx.output.len() {
            return Err(InvalidInputError::OutputCountMismatch {
                tx_outputs: self.tx.output.len(),
                psbt_outputs: self.outputs.len(),
            });
        }
        Ok(())
    }

    /// Returns the outpoints spent by this PSBT, in input order.
    pub fn outpoints(&self) -> Vec<OutPoint> {
        self.tx.input.iter().map(|txin| txin.previous_output).collect()
    }

    /// Returns true if every input carries final script material.
    pub fn is_complete(&self) -> bool { self.inputs.iter().all(Input::is_signed) }

    /// Gets a reference to the input at `index` after checking that it is a valid index.
    pub fn checked_input(&self, index: usize) -> Result<&Input, IndexOutOfBoundsError> {
        self.check_input_index(index)?;
        Ok(&self.inputs[index])
    }

    /// Gets a mutable reference to the input at `index` after checking that it is a valid index.
    pub fn checked_input_mut(&mut self, index: usize) -> Result<&mut Input, IndexOutOfBoundsError> {
        self.check_input_index(index)?;
        Ok(&mut self.inputs[index])
    }

    /// Gets a reference to the output at `index` after checking that it is a valid index.
    pub fn checked_output(&self, index: usize) -> Result<&Output, IndexOutOfBoundsError> {
        if index >= self.outputs.len() {
            return Err(IndexOutOfBoundsError::Outputs { index, length: self.outputs.len() });
        }
        Ok(&self.outputs[index])
    }

    fn check_input_index(&self, index: usize) -> Result<(), IndexOutOfBoundsError> {
        if index >= self.inputs.len() {
            return Err(IndexOutOfBoundsError::Inputs { index, length: self.inputs.len() });
        }
        Ok(())
    }

    /// Returns the transaction with confidential output data and final input scripts filled in.
    ///
    /// Inputs without final script material are left unsigned, use [`Psbt::is_complete`] to
    /// check before broadcasting.
    pub fn extract_tx(&self) -> Transaction {
        let mut tx = self.materialized_tx();
        for (txin, input) in tx.input.iter_mut().zip(&self.inputs) {
            if let Some(ref script_sig) = input.final_script_sig {
                txin.script_sig = script_sig.clone();
            }
            if let Some(ref witness) = input.final_script_witness {
                txin.witness.script_witness = witness.clone();
            }
        }
        tx
    }

    /// Returns a copy of the skeleton with the confidential output data of the side-records
    /// copied in.
    pub(crate) fn materialized_tx(&self) -> Transaction {
        let mut tx = self.tx.clone();
        for (txout, output) in tx.output.iter_mut().zip(&self.outputs) {
            output.materialize(txout);
        }
        tx
    }
}

/// Error constructing a [`Psbt`] from a transaction that is not unsigned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnsignedTxError {
    /// The transaction input at this index has a non-empty scriptSig.
    HasScriptSig {
        /// The input index.
        input_index: usize,
    },
    /// The transaction input at this index has a non-empty script witness.
    HasScriptWitness {
        /// The input index.
        input_index: usize,
    },
}

impl fmt::Display for UnsignedTxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use UnsignedTxError::*;

        match *self {
            HasScriptSig { input_index } =>
                write!(f, "unsigned tx input {} has a scriptSig", input_index),
            HasScriptWitness { input_index } =>
                write!(f, "unsigned tx input {} has a script witness", input_index),
        }
    }
}

impl std::error::Error for UnsignedTxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}
