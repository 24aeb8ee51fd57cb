// SPDX-License-Identifier: CC0-1.0

//! Per-call configuration for the fill and sign operations.

use elements::EcdsaSighashType;

/// Whether to check that input and output amounts balance before signing.
///
/// It is not invalid to sign an unbalanced transaction but it is easy to lose funds doing so.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde", rename_all = "snake_case"))]
pub enum BalanceCheck {
    /// Refuse to sign unless the spent outputs are known and amounts balance.
    #[default]
    Enforce,
    /// Sign without looking at amounts.
    Skip,
}

/// Options for [`crate::Orchestrator::fill_data`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct FillOptions {
    /// Include BIP-32 key origins in the filled in input and output maps.
    pub bip32_derivations: bool,
}

impl Default for FillOptions {
    fn default() -> Self { FillOptions { bip32_derivations: true } }
}

/// Options for [`crate::Orchestrator::sign`] and [`crate::Orchestrator::fill_and_sign`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "actual_serde"))]
pub struct SignOptions {
    /// The sighash type to sign with.
    #[cfg_attr(feature = "serde", serde(with = "crate::serde_utils::ecdsa_sighash"))]
    pub sighash_type: EcdsaSighashType,
    /// Create signatures, if false only checks which inputs could be signed.
    pub sign: bool,
    /// Include BIP-32 key origins when filling data (ignored by `sign`).
    pub bip32_derivations: bool,
    /// Whether to check amounts balance before signing.
    pub balance_check: BalanceCheck,
}

impl SignOptions {
    /// Signs with `sighash_type`, enforcing the balance check.
    pub fn new(sighash_type: EcdsaSighashType) -> Self {
        SignOptions { sighash_type, ..Default::default() }
    }

    /// Options matching how the combined fill-and-sign call historically behaved.
    ///
    /// Amounts are not checked, which only works for fully unblinded transactions anyway.
    pub fn legacy(sighash_type: EcdsaSighashType) -> Self {
        SignOptions { sighash_type, balance_check: BalanceCheck::Skip, ..Default::default() }
    }

    /// Only reports which inputs could be signed, does not create signatures.
    pub fn dry_run(mut self) -> Self {
        self.sign = false;
        self
    }

    /// Returns the [`FillOptions`] implied by these options.
    pub fn fill_options(&self) -> FillOptions {
        FillOptions { bip32_derivations: self.bip32_derivations }
    }
}

impl Default for SignOptions {
    /// Signs with `SIGHASH_ALL` and enforces the balance check, also in
    /// [`crate::Orchestrator::fill_and_sign`].
    fn default() -> Self {
        SignOptions {
            sighash_type: EcdsaSighashType::All,
            sign: true,
            bip32_derivations: true,
            balance_check: BalanceCheck::Enforce,
        }
    }
}
