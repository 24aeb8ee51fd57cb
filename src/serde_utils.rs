// SPDX-License-Identifier: CC0-1.0

//! Bespoke serde functions for foreign types that do not implement serde traits themselves.

/// Serializes an [`elements::EcdsaSighashType`] as its consensus `u32`.
pub mod ecdsa_sighash {
    use actual_serde::de::Error as _;
    use actual_serde::{Deserialize, Deserializer, Serialize, Serializer};
    use elements::EcdsaSighashType;

    use crate::sighash_type::standard_ecdsa_hash_ty;

    pub fn serialize<S: Serializer>(ty: &EcdsaSighashType, s: S) -> Result<S::Ok, S::Error> {
        (*ty as u32).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<EcdsaSighashType, D::Error> {
        let n = u32::deserialize(d)?;
        standard_ecdsa_hash_ty(n).map_err(D::Error::custom)
    }
}
