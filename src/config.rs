//! Circuit instantiation parameters.
//!
//! The numbers here are baked into the compiled circuit, so the witness must
//! be shaped by exactly the same values the circuit was compiled with.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::limbs::check_limb_shape;
use crate::sha::SHA256_BLOCK_BYTES;

/// Number of template parameters of the JWT circuit.
pub const JWT_PARAM_COUNT: usize = 9;

/// Parameters of the stand-alone ES256 verifier circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Es256CircuitParams {
    pub n: usize,
    pub k: usize,
    pub max_message_length: usize,
}

/// Parameters of the JWT circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtCircuitParams {
    /// Bits per limb.
    pub limb_width: usize,
    /// Limbs per 256-bit value.
    pub limb_count: usize,
    pub max_message_length: usize,
    pub max_header_length: usize,
    pub max_payload_length: usize,
    pub max_matches: usize,
    pub max_substring_length: usize,
    pub max_claims: usize,
    pub max_claim_length: usize,
}

impl Default for JwtCircuitParams {
    fn default() -> Self {
        Self {
            limb_width: 43,
            limb_count: 6,
            max_message_length: 2048,
            max_header_length: 256,
            max_payload_length: 2000,
            max_matches: 5,
            max_substring_length: 50,
            max_claims: 3,
            max_claim_length: 128,
        }
    }
}

impl JwtCircuitParams {
    /// Builds parameters from the circom template argument list
    /// `[n, k, maxMessageLength, maxHeaderLength, maxPayloadLength,
    /// maxMatches, maxSubstringLength, maxClaims, maxClaimLength]`.
    pub fn from_params(params: &[usize]) -> Result<Self, ConfigError> {
        let [limb_width, limb_count, max_message_length, max_header_length, max_payload_length, max_matches, max_substring_length, max_claims, max_claim_length] =
            <[usize; JWT_PARAM_COUNT]>::try_from(params).map_err(|_| {
                ConfigError::ParamCount {
                    expected: JWT_PARAM_COUNT,
                    actual: params.len(),
                }
            })?;

        let parsed = Self {
            limb_width,
            limb_count,
            max_message_length,
            max_header_length,
            max_payload_length,
            max_matches,
            max_substring_length,
            max_claims,
            max_claim_length,
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Inverse of [`JwtCircuitParams::from_params`].
    pub fn to_params(&self) -> [usize; JWT_PARAM_COUNT] {
        [
            self.limb_width,
            self.limb_count,
            self.max_message_length,
            self.max_header_length,
            self.max_payload_length,
            self.max_matches,
            self.max_substring_length,
            self.max_claims,
            self.max_claim_length,
        ]
    }

    pub fn es256(&self) -> Es256CircuitParams {
        Es256CircuitParams {
            n: self.limb_width,
            k: self.limb_count,
            max_message_length: self.max_message_length,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.es256().validate()?;

        for (name, value) in [
            ("maxHeaderLength", self.max_header_length),
            ("maxPayloadLength", self.max_payload_length),
            ("maxMatches", self.max_matches),
            ("maxSubstringLength", self.max_substring_length),
            ("maxClaims", self.max_claims),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        check_block_aligned("maxClaimLength", self.max_claim_length)
    }
}

impl Es256CircuitParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_limb_shape(self.n, self.k)?;
        if self.n.checked_mul(self.k).map_or(true, |bits| bits < 256) {
            return Err(ConfigError::LimbCapacity {
                limb_width: self.n,
                limb_count: self.k,
            });
        }
        check_block_aligned("maxMessageLength", self.max_message_length)
    }
}

fn check_block_aligned(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 || value % SHA256_BLOCK_BYTES != 0 {
        return Err(ConfigError::BlockAlignment {
            name,
            value,
            block: SHA256_BLOCK_BYTES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_production_template() {
        let params = JwtCircuitParams::from_params(&[43, 6, 2048, 256, 2000, 5, 50, 3, 128])
            .expect("production params are valid");
        assert_eq!(params, JwtCircuitParams::default());
        assert_eq!(params.to_params(), [43, 6, 2048, 256, 2000, 5, 50, 3, 128]);
    }

    #[test]
    fn rejects_short_param_list() {
        let err = JwtCircuitParams::from_params(&[43, 6, 2048]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ParamCount {
                expected: 9,
                actual: 3
            }
        );
    }

    #[test]
    fn rejects_limbs_too_narrow_for_p256() {
        let err = JwtCircuitParams::from_params(&[42, 6, 2048, 256, 2000, 5, 50, 3, 128])
            .unwrap_err();
        assert!(matches!(err, ConfigError::LimbCapacity { .. }));
    }

    #[test]
    fn huge_limb_count_is_an_error_not_an_overflow() {
        let json = r#"{
            "limbWidth": 43, "limbCount": 18446744073709551615, "maxMessageLength": 2048,
            "maxHeaderLength": 256, "maxPayloadLength": 2000, "maxMatches": 5,
            "maxSubstringLength": 50, "maxClaims": 3, "maxClaimLength": 128
        }"#;
        let params: JwtCircuitParams = serde_json::from_str(json).unwrap();
        assert!(matches!(
            params.validate(),
            Err(ConfigError::LimbCount { .. })
        ));

        let es256 = Es256CircuitParams {
            n: 64,
            k: usize::MAX / 2,
            max_message_length: 2048,
        };
        assert!(matches!(es256.validate(), Err(ConfigError::LimbCount { .. })));
    }

    #[test]
    fn rejects_unaligned_lengths() {
        let mut params = JwtCircuitParams::default();
        params.max_claim_length = 100;
        assert!(matches!(
            params.validate(),
            Err(ConfigError::BlockAlignment {
                name: "maxClaimLength",
                ..
            })
        ));
    }

    #[test]
    fn deserializes_camel_case_json() {
        let json = r#"{
            "limbWidth": 43, "limbCount": 6, "maxMessageLength": 1024,
            "maxHeaderLength": 128, "maxPayloadLength": 900, "maxMatches": 2,
            "maxSubstringLength": 50, "maxClaims": 2, "maxClaimLength": 64
        }"#;
        let params: JwtCircuitParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.max_message_length, 1024);
        assert_eq!(params.es256().k, 6);
        assert!(params.validate().is_ok());
    }
}
