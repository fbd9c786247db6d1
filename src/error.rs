use std::fmt;

use thiserror::Error;

/// Which length limit a token or match request ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    Message,
    PaddedMessage,
    Header,
    Payload,
    Substring,
}

impl fmt::Display for LengthField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LengthField::Message => "message",
            LengthField::PaddedMessage => "padded message",
            LengthField::Header => "header",
            LengthField::Payload => "payload",
            LengthField::Substring => "match substring",
        };
        f.write_str(name)
    }
}

/// Raised when circuit parameters cannot describe a valid circuit instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("expected {expected} circuit parameters, got {actual}")]
    ParamCount { expected: usize, actual: usize },

    #[error("limb width must be in 1..=64 bits, got {0}")]
    LimbWidth(usize),

    #[error("limb count must be in 1..={max}, got {count}")]
    LimbCount { count: usize, max: usize },

    #[error("{limb_count} limbs of {limb_width} bits cannot hold a 256-bit value")]
    LimbCapacity { limb_width: usize, limb_count: usize },

    #[error("{name} must be a positive multiple of {block} bytes, got {value}")]
    BlockAlignment {
        name: &'static str,
        value: usize,
        block: usize,
    },

    #[error("{0} must be non-zero")]
    Zero(&'static str),
}

/// Every way the pipeline can refuse to produce an input bundle.
///
/// None of these are recovered locally: a partially valid witness is never
/// handed to the circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WitnessError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("malformed key: {0}")]
    MalformedKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("{field} length {length} exceeds maximum {max}")]
    LengthExceeded {
        field: LengthField,
        length: usize,
        max: usize,
    },

    #[error("substring {substring:?} not found in payload")]
    SubstringNotFound { substring: String },

    #[error("{count} matches requested but the circuit supports {max}")]
    MatchCountExceeded { count: usize, max: usize },

    #[error("disclosure {index} hashes to {actual} but the payload lists {expected:?}")]
    ClaimDigestMismatch {
        index: usize,
        expected: Option<String>,
        actual: String,
    },

    #[error("{count} claims supplied but the circuit supports {max}")]
    ClaimCountExceeded { count: usize, max: usize },

    #[error("claim {index} is {length} bytes, padded form exceeds maximum {max}")]
    ClaimLengthExceeded {
        index: usize,
        length: usize,
        max: usize,
    },

    #[error("malformed disclosure {index}: {reason}")]
    MalformedDisclosure { index: usize, reason: String },

    #[error("value of {bits} bits does not fit in {limb_count} limbs of {limb_width} bits")]
    LimbOverflow {
        bits: u64,
        limb_width: usize,
        limb_count: usize,
    },

    #[error("invalid birthdate {0:?}")]
    InvalidBirthdate(String),

    #[error("invalid circuit configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl WitnessError {
    /// Short stable name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            WitnessError::MalformedToken(_) => "MalformedToken",
            WitnessError::UnsupportedKeyType(_) => "UnsupportedKeyType",
            WitnessError::MalformedKey(_) => "MalformedKey",
            WitnessError::MalformedSignature(_) => "MalformedSignature",
            WitnessError::SignatureVerificationFailed => "SignatureVerificationFailed",
            WitnessError::LengthExceeded { .. } => "LengthExceeded",
            WitnessError::SubstringNotFound { .. } => "SubstringNotFound",
            WitnessError::MatchCountExceeded { .. } => "MatchCountExceeded",
            WitnessError::ClaimDigestMismatch { .. } => "ClaimDigestMismatch",
            WitnessError::ClaimCountExceeded { .. } => "ClaimCountExceeded",
            WitnessError::ClaimLengthExceeded { .. } => "ClaimLengthExceeded",
            WitnessError::MalformedDisclosure { .. } => "MalformedDisclosure",
            WitnessError::LimbOverflow { .. } => "LimbOverflow",
            WitnessError::InvalidBirthdate(_) => "InvalidBirthdate",
            WitnessError::InvalidConfig(_) => "InvalidConfig",
        }
    }
}

pub type Result<T> = std::result::Result<T, WitnessError>;
