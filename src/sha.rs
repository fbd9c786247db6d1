//! SHA-256 message padding in the layout the circuit's hasher expects.

use tracing::debug;

use crate::error::{LengthField, Result, WitnessError};

pub const SHA256_BLOCK_BYTES: usize = 64;

/// Bytes taken by the `0x80` marker plus the 64-bit length suffix.
const PADDING_OVERHEAD: usize = 1 + 8;

/// A message padded to a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedMessage {
    /// Exactly `max_length` bytes.
    pub bytes: Vec<u8>,
    /// Bytes up to and including the length suffix; everything after is filler.
    pub padded_length: usize,
}

/// Length of `message_length` bytes once SHA-256 padding is applied.
pub fn padded_length(message_length: usize) -> usize {
    (message_length + PADDING_OVERHEAD).div_ceil(SHA256_BLOCK_BYTES) * SHA256_BLOCK_BYTES
}

/// Pads `message` with `0x80`, zeros and the big-endian bit length so the
/// result is block aligned, then zero-fills up to `max_length` bytes.
pub fn sha256_pad(message: &[u8], max_length: usize) -> Result<PaddedMessage> {
    pad_to(message, max_length).map_err(|length| WitnessError::LengthExceeded {
        field: LengthField::PaddedMessage,
        length,
        max: max_length,
    })
}

/// Same as [`sha256_pad`] but hands back the padded length on overflow, for
/// callers that attach their own error context.
pub(crate) fn pad_to(
    message: &[u8],
    max_length: usize,
) -> std::result::Result<PaddedMessage, usize> {
    let padded_len = padded_length(message.len());
    if padded_len > max_length {
        return Err(padded_len);
    }

    let bit_length = (message.len() as u64) * 8;

    let mut bytes = Vec::with_capacity(max_length);
    bytes.extend_from_slice(message);
    bytes.push(0x80);
    bytes.resize(padded_len - 8, 0);
    bytes.extend_from_slice(&bit_length.to_be_bytes());
    bytes.resize(max_length, 0);

    debug!(
        message_len = message.len(),
        padded_len, max_length, "applied sha256 padding"
    );

    Ok(PaddedMessage {
        bytes,
        padded_length: padded_len,
    })
}
