// SPDX-License-Identifier: CC0-1.0

use core::fmt;
use core::str::FromStr;

use elements::EcdsaSighashType;

/// A signature hash type for the corresponding input.
///
/// Stores the raw `u32` so that non-standard values recorded on a PSBT input survive a round
/// trip, use [`PsbtSighashType::ecdsa_hash_ty`] to get a standard [`EcdsaSighashType`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct PsbtSighashType {
    pub(crate) inner: u32,
}

/// All the standard ECDSA sighash types and their string representation.
const STANDARD: [(EcdsaSighashType, &str); 6] = [
    (EcdsaSighashType::All, "SIGHASH_ALL"),
    (EcdsaSighashType::None, "SIGHASH_NONE"),
    (EcdsaSighashType::Single, "SIGHASH_SINGLE"),
    (EcdsaSighashType::AllPlusAnyoneCanPay, "SIGHASH_ALL|SIGHASH_ANYONECANPAY"),
    (EcdsaSighashType::NonePlusAnyoneCanPay, "SIGHASH_NONE|SIGHASH_ANYONECANPAY"),
    (EcdsaSighashType::SinglePlusAnyoneCanPay, "SIGHASH_SINGLE|SIGHASH_ANYONECANPAY"),
];

impl fmt::Display for PsbtSighashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match STANDARD.iter().find(|(ty, _)| *ty as u32 == self.inner) {
            Some((_, s)) => f.write_str(s),
            None => write!(f, "{:#x}", self.inner),
        }
    }
}

impl FromStr for PsbtSighashType {
    type Err = ParseSighashTypeError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // We accept strings of form: "SIGHASH_ALL" etc.
        if let Some((ty, _)) = STANDARD.iter().find(|(_, name)| *name == s) {
            return Ok((*ty).into());
        }

        // We accept non-standard sighash values.
        if let Ok(inner) = u32::from_str_radix(s.trim_start_matches("0x"), 16) {
            return Ok(PsbtSighashType { inner });
        }

        Err(ParseSighashTypeError { unrecognized: s.to_owned() })
    }
}

impl From<EcdsaSighashType> for PsbtSighashType {
    fn from(ecdsa_hash_ty: EcdsaSighashType) -> Self {
        PsbtSighashType { inner: ecdsa_hash_ty as u32 }
    }
}

impl Default for PsbtSighashType {
    fn default() -> Self { EcdsaSighashType::All.into() }
}

impl PsbtSighashType {
    /// Returns the [`EcdsaSighashType`] if the [`PsbtSighashType`] is a standard one.
    pub fn ecdsa_hash_ty(self) -> Result<EcdsaSighashType, NonStandardSighashTypeError> {
        standard_ecdsa_hash_ty(self.inner)
    }

    /// Creates a [`PsbtSighashType`] from a raw `u32`.
    ///
    /// Allows construction of a non-standard sighash flag.
    pub fn from_u32(n: u32) -> PsbtSighashType { PsbtSighashType { inner: n } }

    /// Converts [`PsbtSighashType`] to a raw `u32` sighash flag.
    ///
    /// No guarantees are made as to the standardness of the returned value.
    pub fn to_u32(self) -> u32 { self.inner }
}

/// Converts a raw `u32` into a standard [`EcdsaSighashType`].
pub(crate) fn standard_ecdsa_hash_ty(n: u32) -> Result<EcdsaSighashType, NonStandardSighashTypeError> {
    STANDARD
        .iter()
        .map(|(ty, _)| *ty)
        .find(|ty| *ty as u32 == n)
        .ok_or(NonStandardSighashTypeError(n))
}

/// Error returned for failure during parsing one of the sighash types.
///
/// This is currently returned for unrecognized sighash strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseSighashTypeError {
    /// The unrecognized string we attempted to parse.
    pub unrecognized: String,
}

impl fmt::Display for ParseSighashTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unrecognized SIGHASH string '{}'", self.unrecognized)
    }
}

impl std::error::Error for ParseSighashTypeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}

/// Integer is not a standard ECDSA sighash type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonStandardSighashTypeError(pub u32);

impl fmt::Display for NonStandardSighashTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "non-standard sighash type {:#x}", self.0)
    }
}

impl std::error::Error for NonStandardSighashTypeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { None }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;

    #[test]
    fn psbt_sighash_type_ecdsa() {
        for (ecdsa, _) in &STANDARD {
            let sighash = PsbtSighashType::from(*ecdsa);
            let s = format!("{}", sighash);
            let back = PsbtSighashType::from_str(&s).unwrap();
            assert_eq!(back, sighash);
            assert_eq!(back.ecdsa_hash_ty().unwrap(), *ecdsa);
        }
    }

    #[test]
    fn psbt_sighash_type_notstd() {
        let nonstd = 0xdddddddd;
        let sighash = PsbtSighashType { inner: nonstd };
        let s = format!("{}", sighash);
        let back = PsbtSighashType::from_str(&s).unwrap();

        assert_eq!(back, sighash);
        assert_eq!(back.ecdsa_hash_ty(), Err(NonStandardSighashTypeError(nonstd)));
    }

    #[test]
    fn psbt_sighash_type_unrecognized() {
        assert!(PsbtSighashType::from_str("SIGHASH_EVERYTHING").is_err());
    }

    #[test]
    fn default_is_all() {
        assert_eq!(PsbtSighashType::default().to_u32(), 0x01);
    }
}
