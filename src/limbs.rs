//! Base-`2^n` limb decomposition of 256-bit values.

use num_bigint::BigUint;
use serde::{Serialize, Serializer};

use crate::error::{ConfigError, Result, WitnessError};

/// Widest limb a `u64` can hold.
pub const MAX_LIMB_WIDTH: usize = 64;

/// Upper bound on limbs per value; far beyond any 256-bit layout.
pub const MAX_LIMB_COUNT: usize = 256;

/// Rejects limb shapes that cannot be represented without truncation.
pub fn check_limb_shape(
    limb_width: usize,
    limb_count: usize,
) -> std::result::Result<(), ConfigError> {
    if limb_width == 0 || limb_width > MAX_LIMB_WIDTH {
        return Err(ConfigError::LimbWidth(limb_width));
    }
    if limb_count == 0 || limb_count > MAX_LIMB_COUNT {
        return Err(ConfigError::LimbCount {
            count: limb_count,
            max: MAX_LIMB_COUNT,
        });
    }
    Ok(())
}

/// `k` limbs of `n` bits each, least significant first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimbArray {
    width: usize,
    limbs: Vec<u64>,
}

impl LimbArray {
    /// Splits `value` into `limb_count` limbs of `limb_width` bits.
    ///
    /// Fails instead of truncating when `value` needs more than
    /// `limb_width * limb_count` bits, or when a limb is wider than 64 bits.
    pub fn decompose(value: &BigUint, limb_width: usize, limb_count: usize) -> Result<Self> {
        check_limb_shape(limb_width, limb_count)?;

        let capacity = (limb_width * limb_count) as u64;
        if value.bits() > capacity {
            return Err(WitnessError::LimbOverflow {
                bits: value.bits(),
                limb_width,
                limb_count,
            });
        }

        let mask = (BigUint::from(1u8) << limb_width) - 1u8;
        let mut rest = value.clone();
        let mut limbs = Vec::with_capacity(limb_count);
        for _ in 0..limb_count {
            let limb = &rest & &mask;
            limbs.push(limb.iter_u64_digits().next().unwrap_or(0));
            rest >>= limb_width;
        }

        Ok(Self {
            width: limb_width,
            limbs,
        })
    }

    /// `Σ limb[i] · 2^(n·i)`.
    pub fn reconstruct(&self) -> BigUint {
        self.limbs
            .iter()
            .enumerate()
            .fold(BigUint::default(), |acc, (i, limb)| {
                acc + (BigUint::from(*limb) << (self.width * i))
            })
    }

    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.limbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limbs.is_empty()
    }
}

impl Serialize for LimbArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.limbs.iter().map(|limb| limb.to_string()))
    }
}
