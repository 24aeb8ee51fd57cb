// SPDX-License-Identifier: CC0-1.0

use core::fmt;

use elements::Txid;

use crate::sighash_type::PsbtSighashType;

/// Formats error.
///
/// Only the error message is written, the source is available through
/// [`std::error::Error::source`].
macro_rules! write_err {
    ($writer:expr, $string:literal $(, $args:expr)*; $source:expr) => {
        {
            let _ = &$source;   // Prevents clippy warnings.
            write!($writer, $string $(, $args)*)
        }
    }
}
pub(crate) use write_err;

/// The outcome of a failed fill or sign operation.
///
/// Exactly one of these is returned per call, the first failing step ends the call. Side-record
/// mutations already performed before the error was hit are not rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
    /// An input failed the sanity or cross-consistency checks.
    InvalidPsbt(InvalidInputError),
    /// Attempted to sign while an output still needs blinding.
    BlindingRequired {
        /// Index of the first output still carrying a blinding public key.
        output_index: usize,
    },
    /// The spent output of an input is unknown so amounts can not be checked.
    UtxosMissingForBalanceCheck {
        /// Index of the input without any UTXO.
        input_index: usize,
    },
    /// Input and output amounts do not balance.
    ValueImbalance,
    /// The sighash type recorded on an input differs from the one requested.
    SighashMismatch {
        /// Index of the mismatching input.
        input_index: usize,
        /// The sighash type recorded on the input.
        required: PsbtSighashType,
        /// The sighash type requested by the caller.
        requested: PsbtSighashType,
    },
}

/// How a caller is expected to react to a [`TransactionError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The PSBT is malformed, it must be fixed before retrying.
    FormatViolation,
    /// A prerequisite step (e.g. blinding) must be completed first.
    UnmetPrecondition,
    /// A convenience check failed, the caller may skip the check and retry.
    Advisory,
}

impl TransactionError {
    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        use TransactionError::*;

        match *self {
            InvalidPsbt(_) => ErrorCategory::FormatViolation,
            BlindingRequired { .. } | SighashMismatch { .. } => ErrorCategory::UnmetPrecondition,
            UtxosMissingForBalanceCheck { .. } | ValueImbalance => ErrorCategory::Advisory,
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TransactionError::*;

        match *self {
            InvalidPsbt(ref e) => write_err!(f, "PSBT is not sane"; e),
            BlindingRequired { output_index } =>
                write!(f, "output {} must be blinded before signing", output_index),
            UtxosMissingForBalanceCheck { input_index } =>
                write!(f, "input {} has no UTXO, unable to check that amounts balance", input_index),
            ValueImbalance => f.write_str("input and output amounts do not balance"),
            SighashMismatch { input_index, required, requested } => write!(
                f,
                "input {} requires sighash type {} but {} was requested",
                input_index, required, requested
            ),
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use TransactionError::*;

        match *self {
            InvalidPsbt(ref e) => Some(e),
            BlindingRequired { .. }
            | UtxosMissingForBalanceCheck { .. }
            | ValueImbalance
            | SighashMismatch { .. } => None,
        }
    }
}

impl From<InvalidInputError> for TransactionError {
    fn from(e: InvalidInputError) -> Self { Self::InvalidPsbt(e) }
}

/// A PSBT input is malformed or inconsistent with the transaction skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidInputError {
    /// The non-witness UTXO is not the transaction referenced by the prevout.
    NonWitnessUtxoTxidMismatch {
        /// The input index.
        input_index: usize,
        /// The txid referenced by the skeleton input.
        expected: Txid,
        /// The txid of the non-witness UTXO.
        got: Txid,
    },
    /// The prevout index is out of bounds for the non-witness UTXO.
    OutOfBounds {
        /// The input index.
        input_index: usize,
        /// The prevout index used as list index.
        vout: usize,
        /// The number of outputs in the non-witness UTXO.
        len: usize,
    },
    /// The witness UTXO differs from the output it claims to be in the non-witness UTXO.
    WitnessUtxoMismatch {
        /// The input index.
        input_index: usize,
    },
    /// The PSBT has a different number of side-records than the skeleton has inputs.
    InputCountMismatch {
        /// Number of inputs in the skeleton.
        tx_inputs: usize,
        /// Number of input side-records.
        psbt_inputs: usize,
    },
    /// The PSBT has a different number of side-records than the skeleton has outputs.
    OutputCountMismatch {
        /// Number of outputs in the skeleton.
        tx_outputs: usize,
        /// Number of output side-records.
        psbt_outputs: usize,
    },
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InvalidInputError::*;

        match *self {
            NonWitnessUtxoTxidMismatch { input_index, ref expected, ref got } => write!(
                f,
                "input {} non-witness utxo has txid {} but prevout references {}",
                input_index, got, expected
            ),
            OutOfBounds { input_index, vout, len } => write!(
                f,
                "input {} prevout index {} out of bounds for non-witness utxo with {} outputs",
                input_index, vout, len
            ),
            WitnessUtxoMismatch { input_index } => write!(
                f,
                "input {} witness utxo does not match the output in the non-witness utxo",
                input_index
            ),
            InputCountMismatch { tx_inputs, psbt_inputs } => write!(
                f,
                "transaction has {} inputs but the PSBT has {} input maps",
                tx_inputs, psbt_inputs
            ),
            OutputCountMismatch { tx_outputs, psbt_outputs } => write!(
                f,
                "transaction has {} outputs but the PSBT has {} output maps",
                tx_outputs, psbt_outputs
            ),
        }
    }
}

impl std::error::Error for InvalidInputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}

/// Input or output index out of bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexOutOfBoundsError {
    /// The index is out of bounds for the `psbt.inputs` vector.
    Inputs {
        /// Attempted index access.
        index: usize,
        /// Length of the PBST inputs vector.
        length: usize,
    },
    /// The index is out of bounds for the `psbt.outputs` vector.
    Outputs {
        /// Attempted index access.
        index: usize,
        /// Length of the PBST outputs vector.
        length: usize,
    },
}

impl fmt::Display for IndexOutOfBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use IndexOutOfBoundsError::*;

        match *self {
            Inputs { ref index, ref length } => write!(
                f,
                "index {} is out-of-bounds for PSBT inputs vector length {}",
                index, length
            ),
            Outputs { ref index, ref length } => write!(
                f,
                "index {} is out-of-bounds for PSBT outputs vector length {}",
                index, length
            ),
        }
    }
}

impl std::error::Error for IndexOutOfBoundsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}
