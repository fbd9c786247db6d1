//! Issuer public keys: JWK objects, JWK sets and PEM/DER SubjectPublicKeyInfo.
//!
//! Whatever form the key arrives in, it is reduced to the affine `(x, y)`
//! pair the circuit consumes, so the input shape never depends on the
//! caller's key encoding.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WitnessError};
use crate::limbs::LimbArray;
use crate::utils::{bytes_to_biguint, decode_base64};

const COORDINATE_BYTES: usize = 32;

/// DER content of OID 1.2.840.10045.2.1 (id-ecPublicKey).
const OID_EC_PUBLIC_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
/// DER content of OID 1.2.840.10045.3.1.7 (prime256v1 / P-256).
const OID_PRIME256V1: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];

const TAG_SEQUENCE: u8 = 0x30;
const TAG_OID: u8 = 0x06;
const TAG_BIT_STRING: u8 = 0x03;
const SEC1_UNCOMPRESSED: u8 = 0x04;

/// Affine P-256 point. Curve membership is checked when the key is turned
/// into a verifying key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub x: BigUint,
    pub y: BigUint,
}

impl PublicKey {
    /// `[x limbs, y limbs]`, the `pubkey` signal.
    pub fn to_limbs(&self, limb_width: usize, limb_count: usize) -> Result<[LimbArray; 2]> {
        Ok([
            LimbArray::decompose(&self.x, limb_width, limb_count)?,
            LimbArray::decompose(&self.y, limb_width, limb_count)?,
        ])
    }
}

/// JSON Web Key restricted to the fields an EC public key uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    pub x: String,
    pub y: String,
}

impl Jwk {
    pub fn resolve(&self) -> Result<PublicKey> {
        if self.kty != "EC" {
            return Err(WitnessError::UnsupportedKeyType(format!(
                "kty {:?}, expected \"EC\"",
                self.kty
            )));
        }
        if self.crv != "P-256" {
            return Err(WitnessError::UnsupportedKeyType(format!(
                "crv {:?}, expected \"P-256\"",
                self.crv
            )));
        }

        Ok(PublicKey {
            x: decode_coordinate("x", &self.x)?,
            y: decode_coordinate("y", &self.y)?,
        })
    }
}

fn decode_coordinate(name: &str, encoded: &str) -> Result<BigUint> {
    let bytes = decode_base64(encoded)
        .ok_or_else(|| WitnessError::MalformedKey(format!("jwk {name} is not base64")))?;
    if bytes.len() != COORDINATE_BYTES {
        return Err(WitnessError::MalformedKey(format!(
            "jwk {name} is {} bytes, expected {COORDINATE_BYTES}",
            bytes.len()
        )));
    }
    Ok(bytes_to_biguint(&bytes))
}

/// PEM text, or bare base64 DER, of a SubjectPublicKeyInfo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PemKey {
    pub pem: String,
}

impl PemKey {
    pub fn resolve(&self) -> Result<PublicKey> {
        let body: String = self
            .pem
            .lines()
            .filter(|line| !line.trim_start().starts_with("-----"))
            .flat_map(|line| line.chars())
            .filter(|c| !c.is_whitespace())
            .collect();

        let der = decode_base64(&body)
            .ok_or_else(|| WitnessError::MalformedKey("pem body is not base64".into()))?;
        parse_spki_der(&der)
    }
}

/// A key supplied either as a JWK or as PEM. Deserializes from either JSON
/// shape; the presence of a `pem` member selects the PEM form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EcKey {
    Pem(PemKey),
    Jwk(Jwk),
}

impl EcKey {
    pub fn pem(pem: impl Into<String>) -> Self {
        EcKey::Pem(PemKey { pem: pem.into() })
    }

    pub fn resolve(&self) -> Result<PublicKey> {
        match self {
            EcKey::Jwk(jwk) => jwk.resolve(),
            EcKey::Pem(pem) => pem.resolve(),
        }
    }

    pub fn kid(&self) -> Option<&str> {
        match self {
            EcKey::Jwk(jwk) => jwk.kid.as_deref(),
            EcKey::Pem(_) => None,
        }
    }
}

impl From<Jwk> for EcKey {
    fn from(jwk: Jwk) -> Self {
        EcKey::Jwk(jwk)
    }
}

/// A locally held JWKS document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// Keys in the order they should be tried: the `kid` match first when
    /// there is one, then everything else in document order.
    pub fn candidates<'a>(&'a self, kid: Option<&str>) -> impl Iterator<Item = &'a Jwk> + 'a {
        let preferred = kid.and_then(|kid| self.find(kid));
        preferred.into_iter().chain(
            self.keys
                .iter()
                .filter(move |k| preferred.map_or(true, |p| !std::ptr::eq(*k, p))),
        )
    }
}

struct DerReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn byte(&mut self) -> Result<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| WitnessError::MalformedKey("truncated der".into()))?;
        self.pos += 1;
        Ok(b)
    }

    fn length(&mut self) -> Result<usize> {
        let first = self.byte()?;
        if first < 0x80 {
            return Ok(first as usize);
        }
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 2 {
            return Err(WitnessError::MalformedKey(format!(
                "unsupported der length form 0x{first:02x}"
            )));
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | self.byte()? as usize;
        }
        Ok(len)
    }

    /// Reads one TLV with the given tag and returns its contents.
    fn read(&mut self, tag: u8) -> Result<&'a [u8]> {
        let found = self.byte()?;
        if found != tag {
            return Err(WitnessError::MalformedKey(format!(
                "expected der tag 0x{tag:02x}, found 0x{found:02x}"
            )));
        }
        let len = self.length()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| WitnessError::MalformedKey("der length past end of input".into()))?;
        let contents = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(contents)
    }
}

/// Extracts `(x, y)` from a P-256 SubjectPublicKeyInfo:
///
/// ```text
/// SEQUENCE {
///   SEQUENCE { OID id-ecPublicKey, OID prime256v1 }
///   BIT STRING { 0x00, 0x04, x[32], y[32] }
/// }
/// ```
pub fn parse_spki_der(der: &[u8]) -> Result<PublicKey> {
    let mut outer = DerReader::new(der);
    let mut spki = DerReader::new(outer.read(TAG_SEQUENCE)?);

    let mut algorithm = DerReader::new(spki.read(TAG_SEQUENCE)?);
    let key_oid = algorithm.read(TAG_OID)?;
    let curve_oid = algorithm.read(TAG_OID)?;
    if key_oid != OID_EC_PUBLIC_KEY {
        return Err(WitnessError::UnsupportedKeyType(
            "spki algorithm is not id-ecPublicKey".into(),
        ));
    }
    if curve_oid != OID_PRIME256V1 {
        return Err(WitnessError::UnsupportedKeyType(
            "spki curve is not P-256".into(),
        ));
    }

    let bits = spki.read(TAG_BIT_STRING)?;
    if bits.len() != 2 + 2 * COORDINATE_BYTES {
        return Err(WitnessError::MalformedKey(format!(
            "bit string is {} bytes, expected {}",
            bits.len(),
            2 + 2 * COORDINATE_BYTES
        )));
    }
    if bits[0] != 0x00 {
        return Err(WitnessError::MalformedKey(
            "bit string has unused bits".into(),
        ));
    }
    if bits[1] != SEC1_UNCOMPRESSED {
        return Err(WitnessError::MalformedKey(
            "point is not in uncompressed form".into(),
        ));
    }

    let (x, y) = bits[2..].split_at(COORDINATE_BYTES);
    debug!(der_len = der.len(), "parsed spki public key");

    Ok(PublicKey {
        x: bytes_to_biguint(x),
        y: bytes_to_biguint(y),
    })
}
