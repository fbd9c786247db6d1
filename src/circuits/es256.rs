use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Es256CircuitParams;
use crate::error::{LengthField, Result, WitnessError};
use crate::key::{EcKey, PublicKey};
use crate::limbs::LimbArray;
use crate::sha::sha256_pad;
use crate::signature::EcdsaSignature;
use crate::utils::serialize_decimal_bytes;
use crate::verify::ensure_es256;

// es256.circom
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Es256Inputs {
    pub sig_r: LimbArray,
    pub sig_s: LimbArray,
    /// `[x limbs, y limbs]`.
    pub pubkey: [LimbArray; 2],
    /// SHA-256 padded message, zero-filled to `max_message_length` bytes.
    #[serde(serialize_with = "serialize_decimal_bytes")]
    pub message: Vec<u8>,
    /// Padded length in bytes, a multiple of 64.
    #[serde(rename = "messageLength")]
    pub message_length: usize,
}

impl Es256Inputs {
    /// Lays out already verified values; no cryptographic check happens here.
    pub(crate) fn assemble(
        params: &Es256CircuitParams,
        message: &[u8],
        signature: &EcdsaSignature,
        key: &PublicKey,
    ) -> Result<Self> {
        let (sig_r, sig_s) = signature.to_limbs(params.n, params.k)?;
        let pubkey = key.to_limbs(params.n, params.k)?;
        let padded = sha256_pad(message, params.max_message_length)?;
        debug!(
            message_len = message.len(),
            padded_len = padded.padded_length,
            "padded signed message"
        );

        Ok(Self {
            sig_r,
            sig_s,
            pubkey,
            message: padded.bytes,
            message_length: padded.padded_length,
        })
    }
}

pub(crate) fn check_message_length(message: &[u8], max_message_length: usize) -> Result<()> {
    if message.len() > max_message_length {
        return Err(WitnessError::LengthExceeded {
            field: LengthField::Message,
            length: message.len(),
            max: max_message_length,
        });
    }
    Ok(())
}

/// Inputs for the ES256 verifier circuit over an arbitrary `message`.
///
/// The signature is checked with a reference implementation first; nothing
/// is returned for a signature the circuit would reject.
pub fn generate_es256_inputs(
    params: &Es256CircuitParams,
    message: &str,
    b64_signature: &str,
    key: &EcKey,
) -> Result<Es256Inputs> {
    let t0 = Instant::now();
    let result = build(params, message.as_bytes(), b64_signature, key);
    match &result {
        Ok(inputs) => info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            message_len = message.len(),
            padded_len = inputs.message_length,
            "es256 circuit inputs ready"
        ),
        Err(err) => warn!(kind = err.kind(), error = %err, "es256 input generation aborted"),
    }
    result
}

fn build(
    params: &Es256CircuitParams,
    message: &[u8],
    b64_signature: &str,
    key: &EcKey,
) -> Result<Es256Inputs> {
    params.validate()?;
    check_message_length(message, params.max_message_length)?;

    let public_key = key.resolve()?;
    let signature = EcdsaSignature::from_base64url(b64_signature)?;
    ensure_es256(message, &signature, &public_key)?;

    Es256Inputs::assemble(params, message, &signature, &public_key)
}
