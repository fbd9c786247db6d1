//! Circuit inputs for ES256 JWT and SD-JWT verification circuits
//!
//! This library turns a signed token and its issuer key into the exact
//! signal values the circom circuits expect:
//! - ES256 signature and P-256 public key as fixed-width limbs
//! - SHA-256 padded signed message
//! - Payload substring offsets and selectively disclosed claims
//!
//! Every signature is checked with a reference verifier before any input is
//! produced.

pub mod age;
pub mod circuits;
pub mod claims;
pub mod config;
pub mod error;
pub mod key;
pub mod limbs;
pub mod matches;
pub mod sha;
pub mod signature;
pub mod token;
pub mod utils;
pub mod verify;

// Re-export commonly used types and functions
pub use age::{age_from_roc_digits, age_on, is_at_least, AgeReport, CalendarDate, RocDate};
pub use circuits::{
    es256::{generate_es256_inputs, Es256Inputs},
    jwt::{generate_jwt_inputs, InputBundle, JwtRequest, KeySource},
};
pub use claims::{Claim, DigestPolicy, Disclosure};
pub use config::{Es256CircuitParams, JwtCircuitParams};
pub use error::{ConfigError, LengthField, Result, WitnessError};
pub use key::{EcKey, Jwk, JwkSet, PemKey, PublicKey};
pub use limbs::LimbArray;
pub use sha::{sha256_pad, PaddedMessage};
pub use signature::EcdsaSignature;
pub use token::Token;
pub use utils::parse_jwt_inputs;
pub use verify::verify_es256;
