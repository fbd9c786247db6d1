//! Reference ES256 verification with a conventional P-256 implementation.
//!
//! This runs before any circuit input is emitted. The circuit repeats the
//! check in constraints, but a bundle is never built for a signature that
//! fails here.

use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use tracing::{debug, warn};

use crate::error::{Result, WitnessError};
use crate::key::{Jwk, JwkSet, PublicKey};
use crate::signature::EcdsaSignature;
use crate::utils::biguint_to_be32;

/// SEC1 uncompressed encoding, rejecting points off the curve.
pub fn verifying_key(key: &PublicKey) -> Result<VerifyingKey> {
    let x = biguint_to_be32(&key.x)
        .ok_or_else(|| WitnessError::MalformedKey("x coordinate exceeds 256 bits".into()))?;
    let y = biguint_to_be32(&key.y)
        .ok_or_else(|| WitnessError::MalformedKey("y coordinate exceeds 256 bits".into()))?;

    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);

    VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|_| WitnessError::MalformedKey("point is not on P-256".into()))
}

/// Checks `signature` over SHA-256(`message`).
///
/// Returns `Ok(false)` for a well-formed signature that does not verify, and
/// an error when the key or signature cannot be interpreted at all.
pub fn verify_es256(message: &[u8], signature: &EcdsaSignature, key: &PublicKey) -> Result<bool> {
    let verifying_key = verifying_key(key)?;
    // rejects r or s outside [1, n)
    let signature = Signature::from_slice(signature.compact_bytes())
        .map_err(|_| WitnessError::MalformedSignature("r or s out of range".into()))?;

    let valid = verifying_key.verify(message, &signature).is_ok();
    debug!(message_len = message.len(), valid, "reference es256 check");
    Ok(valid)
}

/// Fails with `SignatureVerificationFailed` unless the signature verifies.
pub fn ensure_es256(message: &[u8], signature: &EcdsaSignature, key: &PublicKey) -> Result<()> {
    if verify_es256(message, signature, key)? {
        Ok(())
    } else {
        warn!(message_len = message.len(), "signature rejected by reference verifier");
        Err(WitnessError::SignatureVerificationFailed)
    }
}

/// Picks the key of `set` that signed `message`, trying the `kid` match
/// first. Keys that are malformed or of another type are skipped.
pub fn select_signing_key<'a>(
    set: &'a JwkSet,
    kid: Option<&str>,
    message: &[u8],
    signature: &EcdsaSignature,
) -> Result<(&'a Jwk, PublicKey)> {
    for jwk in set.candidates(kid) {
        let key = match jwk.resolve() {
            Ok(key) => key,
            Err(err) => {
                debug!(kid = ?jwk.kid, error = %err, "skipping unusable jwk");
                continue;
            }
        };
        match verify_es256(message, signature, &key) {
            Ok(true) => {
                debug!(kid = ?jwk.kid, "selected signing key from set");
                return Ok((jwk, key));
            }
            Ok(false) => {}
            Err(WitnessError::MalformedKey(reason)) => {
                debug!(kid = ?jwk.kid, %reason, "skipping unusable jwk");
            }
            Err(err) => return Err(err),
        }
    }

    warn!(keys = set.keys.len(), "no key in set verifies the signature");
    Err(WitnessError::SignatureVerificationFailed)
}
