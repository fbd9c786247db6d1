//! Compact ES256 signatures (`r ‖ s`, 64 bytes) and their limb form.

use num_bigint::BigUint;

use crate::error::{Result, WitnessError};
use crate::limbs::LimbArray;
use crate::utils::{bytes_to_biguint, decode_base64};

pub const COMPACT_SIGNATURE_BYTES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: BigUint,
    pub s: BigUint,
    compact: [u8; COMPACT_SIGNATURE_BYTES],
}

impl EcdsaSignature {
    /// Decodes the third segment of a JWS.
    pub fn from_base64url(encoded: &str) -> Result<Self> {
        let bytes = decode_base64(encoded).ok_or_else(|| {
            WitnessError::MalformedSignature("signature is not base64url".into())
        })?;
        Self::from_compact(&bytes)
    }

    pub fn from_compact(bytes: &[u8]) -> Result<Self> {
        let compact: [u8; COMPACT_SIGNATURE_BYTES] = bytes.try_into().map_err(|_| {
            WitnessError::MalformedSignature(format!(
                "signature is {} bytes, expected {COMPACT_SIGNATURE_BYTES}",
                bytes.len()
            ))
        })?;
        let (r, s) = compact.split_at(COMPACT_SIGNATURE_BYTES / 2);

        Ok(Self {
            r: bytes_to_biguint(r),
            s: bytes_to_biguint(s),
            compact,
        })
    }

    pub fn compact_bytes(&self) -> &[u8; COMPACT_SIGNATURE_BYTES] {
        &self.compact
    }

    /// `(sig_r, sig_s)` limb arrays.
    pub fn to_limbs(&self, limb_width: usize, limb_count: usize) -> Result<(LimbArray, LimbArray)> {
        Ok((
            LimbArray::decompose(&self.r, limb_width, limb_count)?,
            LimbArray::decompose(&self.s, limb_width, limb_count)?,
        ))
    }
}
