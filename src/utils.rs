use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use num_bigint::{BigInt, BigUint};
use serde::Serializer;
use serde_json::Value;
use std::{collections::HashMap, str::FromStr};

#[derive(Clone, Copy)]
pub enum FieldParser {
    U64Scalar,
    BigIntScalar,
    BigIntArray,
    U64Array,
    BigInt2DArray,
}

/// Signals of the JWT circuit and how each is laid out in an input file.
pub const JWT_FIELDS: &[(&str, FieldParser)] = &[
    ("sig_r", FieldParser::BigIntArray),
    ("sig_s", FieldParser::BigIntArray),
    ("pubkey", FieldParser::BigInt2DArray),
    ("message", FieldParser::BigIntArray),
    ("messageLength", FieldParser::U64Scalar),
    ("periodIndex", FieldParser::U64Scalar),
    ("matchesCount", FieldParser::U64Scalar),
    ("matchSubstring", FieldParser::BigInt2DArray),
    ("matchLength", FieldParser::U64Array),
    ("matchIndex", FieldParser::U64Array),
    ("claims", FieldParser::BigInt2DArray),
    ("claimLengths", FieldParser::BigIntArray),
];

/// Optional date signals, present when the age check is wired in.
pub const DATE_FIELDS: &[(&str, FieldParser)] = &[
    ("currentYear", FieldParser::BigIntScalar),
    ("currentMonth", FieldParser::BigIntScalar),
    ("currentDay", FieldParser::BigIntScalar),
];

/// Generic function to parse input fields from JSON based on field definitions
pub fn parse_inputs(
    json_value: &Value,
    field_defs: &[(&str, FieldParser)],
) -> Result<HashMap<String, Vec<BigInt>>, String> {
    let mut inputs = HashMap::new();

    for (field_name, parser) in field_defs {
        let value = match parser {
            FieldParser::U64Scalar => vec![parse_u64_scalar(json_value, field_name)?],
            FieldParser::BigIntScalar => vec![parse_bigint_scalar(json_value, field_name)?],
            FieldParser::BigIntArray => parse_bigint_string_array(json_value, field_name)?,
            FieldParser::U64Array => parse_u64_array(json_value, field_name)?,
            FieldParser::BigInt2DArray => parse_2d_bigint_array(json_value, field_name)?,
        };
        inputs.insert(field_name.to_string(), value);
    }

    Ok(inputs)
}

/// Parse JWT circuit inputs from JSON, including the date signals when the
/// file carries them.
pub fn parse_jwt_inputs(json_value: &Value) -> Result<HashMap<String, Vec<BigInt>>, String> {
    let mut inputs = parse_inputs(json_value, JWT_FIELDS)?;
    if json_value.get("currentYear").is_some() {
        inputs.extend(parse_inputs(json_value, DATE_FIELDS)?);
    }
    Ok(inputs)
}

/// Decodes base64 in whichever dialect the issuer used: URL-safe or standard
/// alphabet, with or without `=` padding.
pub fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    if encoded.len() % 4 == 1 {
        return None;
    }

    let mut candidates = vec![encoded.to_string()];

    let mut padded = encoded.to_string();
    match encoded.len() % 4 {
        2 => padded.push_str("=="),
        3 => padded.push('='),
        _ => {}
    }

    if padded != encoded {
        candidates.push(padded);
    }

    for candidate in candidates {
        if let Ok(decoded) = URL_SAFE_NO_PAD.decode(candidate.as_bytes()) {
            return Some(decoded);
        }
        if let Ok(decoded) = URL_SAFE.decode(candidate.as_bytes()) {
            return Some(decoded);
        }
        if let Ok(decoded) = STANDARD.decode(candidate.as_bytes()) {
            return Some(decoded);
        }
    }

    None
}

/// Unpadded base64url, the encoding used for SD-JWT digests.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Big-endian bytes to an unsigned integer.
pub fn bytes_to_biguint(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Left-pads a big-endian integer to exactly 32 bytes.
pub fn biguint_to_be32(value: &BigUint) -> Option<[u8; 32]> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

/// Bytes of `s` zero-filled to `pad_length` entries.
pub fn string_to_padded_bytes(s: &str, pad_length: usize) -> Vec<u8> {
    let mut values = s.as_bytes().to_vec();
    if values.len() < pad_length {
        values.resize(pad_length, 0);
    }
    values
}

// Serde helpers: circom input files carry field elements as decimal strings
pub fn serialize_decimal_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(bytes.iter().map(|b| b.to_string()))
}

pub fn serialize_decimal_matrix<S: Serializer>(
    rows: &[Vec<u8>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
        rows.iter()
            .map(|row| row.iter().map(|b| b.to_string()).collect::<Vec<_>>()),
    )
}

pub fn serialize_decimal_usizes<S: Serializer>(
    values: &[usize],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|v| v.to_string()))
}

pub fn serialize_decimal_opt<S: Serializer>(
    value: &Option<u32>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&v.to_string()),
        None => serializer.serialize_none(),
    }
}

// JSON Parsing Helpers
/// Parse a single BigInt from a string field
fn parse_bigint_scalar(json: &Value, key: &str) -> Result<BigInt, String> {
    let s = json
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or(format!("{key} must be a string"))?;
    BigInt::from_str(s).map_err(|_| format!("{key}: failed to parse as BigInt"))
}

/// Parse a single u64 from a number field and convert to BigInt
fn parse_u64_scalar(json: &Value, key: &str) -> Result<BigInt, String> {
    json.get(key)
        .and_then(|v| v.as_u64())
        .map(BigInt::from)
        .ok_or(format!("{key} must be a number"))
}

/// Parse an array of BigInt strings
fn parse_bigint_string_array(json: &Value, key: &str) -> Result<Vec<BigInt>, String> {
    let array = json
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or(format!("{key} must be an array"))?;

    array
        .iter()
        .map(|v| {
            let s = v
                .as_str()
                .ok_or(format!("{key}: array element must be a string"))?;
            BigInt::from_str(s).map_err(|_| format!("{key}: failed to parse array element"))
        })
        .collect()
}

/// Parse an array of u64 numbers and convert to BigInt
fn parse_u64_array(json: &Value, key: &str) -> Result<Vec<BigInt>, String> {
    json.get(key)
        .and_then(|v| v.as_array())
        .ok_or(format!("{key} must be an array"))?
        .iter()
        .map(|v| {
            v.as_u64()
                .map(BigInt::from)
                .ok_or(format!("{key}: array element must be a number"))
        })
        .collect()
}

/// Parse a 2D array of BigInt strings and flatten into 1D vector
fn parse_2d_bigint_array(json: &Value, key: &str) -> Result<Vec<BigInt>, String> {
    let outer_array = json
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or(format!("{key} must be an array"))?;

    // Pre-calculate total capacity
    let total_capacity: usize = outer_array
        .iter()
        .filter_map(|v| v.as_array())
        .map(|arr| arr.len())
        .sum();

    let mut result = Vec::with_capacity(total_capacity);

    for inner_value in outer_array.iter() {
        let inner_array = inner_value
            .as_array()
            .ok_or(format!("{key}: outer array element must be an array"))?;

        for v in inner_array.iter() {
            result.push(parse_bigint_string(v, key)?);
        }
    }

    Ok(result)
}

fn parse_bigint_string(value: &Value, key: &str) -> Result<BigInt, String> {
    let s = value
        .as_str()
        .ok_or(format!("{key}: inner array element must be a string"))?;
    BigInt::from_str(s).map_err(|_| format!("{key}: failed to parse inner array element"))
}
