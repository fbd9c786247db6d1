//! Splitting a compact JWS or SD-JWT presentation into its parts.

use serde_json::Value;

use crate::error::{Result, WitnessError};
use crate::utils::decode_base64;

const DISCLOSURE_SEPARATOR: char = '~';

/// A compact ES256 JWS plus any `~`-separated disclosures that followed it.
///
/// Segments are kept exactly as they appeared; nothing is re-encoded, so the
/// signed message is byte-for-byte what the issuer signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    header: String,
    payload: String,
    signature: String,
    disclosures: Vec<String>,
}

impl Token {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let mut parts = text.split(DISCLOSURE_SEPARATOR);
        let jws = parts.next().unwrap_or_default();
        // A presentation without key binding ends in '~'
        let disclosures: Vec<String> = parts
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect();

        let segments: Vec<&str> = jws.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(WitnessError::MalformedToken(format!(
                "expected 3 dot-separated segments, found {}",
                segments.len()
            )));
        };
        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(WitnessError::MalformedToken("empty segment".into()));
        }

        Ok(Self {
            header: header.to_string(),
            payload: payload.to_string(),
            signature: signature.to_string(),
            disclosures,
        })
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn disclosures(&self) -> &[String] {
        &self.disclosures
    }

    /// `header "." payload`, the bytes covered by the signature.
    pub fn signed_message(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    /// Byte index of the `.` between header and payload.
    pub fn period_index(&self) -> usize {
        self.header.len()
    }

    /// The payload JSON text.
    pub fn decoded_payload(&self) -> Result<String> {
        let bytes = decode_base64(&self.payload)
            .ok_or_else(|| WitnessError::MalformedToken("payload is not base64url".into()))?;
        String::from_utf8(bytes)
            .map_err(|_| WitnessError::MalformedToken("payload is not utf-8".into()))
    }

    /// The `kid` header member, if the header is readable JSON and has one.
    ///
    /// Only a hint for picking a key; never trusted before verification.
    pub fn header_kid(&self) -> Option<String> {
        let bytes = decode_base64(&self.header)?;
        let header: Value = serde_json::from_slice(&bytes).ok()?;
        header.get("kid")?.as_str().map(str::to_owned)
    }
}
