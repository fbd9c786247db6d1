//! Selectively disclosed claims: digest checks against the payload and the
//! padded byte layout the circuit hashes.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Result, WitnessError};
use crate::sha::pad_to;
use crate::utils::{decode_base64, encode_base64url};

/// Payload member that lists disclosure digests.
pub const SD_DIGESTS_KEY: &str = "_sd";

/// How disclosure entries are paired with payload digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestPolicy {
    /// Entry `i` must hash to digest `i`.
    #[default]
    Positional,
    /// Entry `i` must hash to some digest in the list. Issuers are free to
    /// shuffle `_sd`, so this is what generic SD-JWTs need.
    AnyOrder,
}

/// One decoded disclosure `[salt, name, value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub position: usize,
    pub salt: String,
    pub name: String,
    pub value: Value,
}

/// A disclosure entry exactly as it appeared after a `~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disclosure<'a> {
    pub position: usize,
    pub raw: &'a str,
}

impl<'a> Disclosure<'a> {
    pub fn new(position: usize, raw: &'a str) -> Self {
        Self { position, raw }
    }

    /// base64url(SHA-256(raw entry text)), the form listed in `_sd`.
    pub fn digest(&self) -> String {
        encode_base64url(&Sha256::digest(self.raw.as_bytes()))
    }

    pub fn decode(&self) -> Result<Claim> {
        self.claim_from(self.parse()?)
    }

    /// Like [`Disclosure::decode`], but an array-element disclosure
    /// `[salt, value]` yields `None` since it carries no claim name.
    pub fn decode_named(&self) -> Result<Option<Claim>> {
        match self.parse()? {
            Value::Array(items) if items.len() == 2 => Ok(None),
            value => self.claim_from(value).map(Some),
        }
    }

    fn malformed(&self, reason: &str) -> WitnessError {
        WitnessError::MalformedDisclosure {
            index: self.position,
            reason: reason.to_string(),
        }
    }

    fn parse(&self) -> Result<Value> {
        let bytes = decode_base64(self.raw).ok_or_else(|| self.malformed("not base64url"))?;
        serde_json::from_slice(&bytes).map_err(|_| self.malformed("not a json array"))
    }

    fn claim_from(&self, value: Value) -> Result<Claim> {
        let malformed = |reason: &str| self.malformed(reason);
        match value {
            Value::Array(items) if items.len() == 3 => {
                let mut items = items.into_iter();
                let salt = items.next().and_then(|v| v.as_str().map(str::to_owned));
                let name = items.next().and_then(|v| v.as_str().map(str::to_owned));
                let claim_value = items.next().unwrap_or(Value::Null);
                match (salt, name) {
                    (Some(salt), Some(name)) => Ok(Claim {
                        position: self.position,
                        salt,
                        name,
                        value: claim_value,
                    }),
                    _ => Err(malformed("salt and name must be strings")),
                }
            }
            _ => Err(malformed("expected [salt, name, value]")),
        }
    }
}

/// Every string inside every `_sd` array of `payload`, depth first.
pub fn collect_sd_digests(payload: &Value) -> Vec<String> {
    let mut digests = Vec::new();
    collect_into(payload, &mut digests);
    digests
}

fn collect_into(value: &Value, digests: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                if key == SD_DIGESTS_KEY {
                    if let Value::Array(items) = member {
                        digests.extend(items.iter().filter_map(|d| d.as_str().map(str::to_owned)));
                        continue;
                    }
                }
                collect_into(member, digests);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_into(item, digests)),
        _ => {}
    }
}

/// Checks each entry's digest against `expected` under `policy`.
pub fn check_digests<S: AsRef<str>>(
    entries: &[S],
    expected: &[String],
    policy: DigestPolicy,
) -> Result<()> {
    for (index, entry) in entries.iter().enumerate() {
        let actual = Disclosure::new(index, entry.as_ref()).digest();
        let found = match policy {
            DigestPolicy::Positional => expected.get(index) == Some(&actual),
            DigestPolicy::AnyOrder => expected.contains(&actual),
        };
        if !found {
            warn!(index, ?policy, "disclosure digest not listed in payload");
            return Err(WitnessError::ClaimDigestMismatch {
                index,
                expected: match policy {
                    DigestPolicy::Positional => expected.get(index).cloned(),
                    DigestPolicy::AnyOrder => None,
                },
                actual,
            });
        }
    }
    Ok(())
}

/// The `claims` and `claimLengths` signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedClaims {
    /// `max_claims` rows of `max_claim_length` bytes.
    pub claims: Vec<Vec<u8>>,
    /// Unpadded byte length of each entry, 0 for unused rows.
    pub lengths: Vec<usize>,
}

/// SHA-256 pads each raw entry to `max_claim_length` bytes and fills the
/// remaining rows with zeros.
pub fn encode_claims<S: AsRef<str>>(
    entries: &[S],
    max_claims: usize,
    max_claim_length: usize,
) -> Result<EncodedClaims> {
    if entries.len() > max_claims {
        warn!(count = entries.len(), max_claims, "too many claims");
        return Err(WitnessError::ClaimCountExceeded {
            count: entries.len(),
            max: max_claims,
        });
    }

    let mut encoded = EncodedClaims {
        claims: vec![vec![0; max_claim_length]; max_claims],
        lengths: vec![0; max_claims],
    };

    for (index, entry) in entries.iter().enumerate() {
        let bytes = entry.as_ref().as_bytes();
        let padded = pad_to(bytes, max_claim_length).map_err(|_| {
            WitnessError::ClaimLengthExceeded {
                index,
                length: bytes.len(),
                max: max_claim_length,
            }
        })?;
        encoded.claims[index] = padded.bytes;
        encoded.lengths[index] = bytes.len();
    }

    debug!(claims = entries.len(), max_claims, "encoded disclosures");
    Ok(encoded)
}
