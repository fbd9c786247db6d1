use std::{collections::HashMap, time::Instant};

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::age::{age_on, AgeReport, CalendarDate, RocDate, ROC_BIRTHDAY_CLAIM};
use crate::circuits::es256::{check_message_length, Es256Inputs};
use crate::claims::{check_digests, collect_sd_digests, encode_claims, DigestPolicy, Disclosure};
use crate::config::JwtCircuitParams;
use crate::error::{LengthField, Result, WitnessError};
use crate::key::{EcKey, Jwk, JwkSet, PublicKey};
use crate::limbs::LimbArray;
use crate::matches::locate_matches;
use crate::signature::EcdsaSignature;
use crate::token::Token;
use crate::utils::{serialize_decimal_matrix, serialize_decimal_opt, serialize_decimal_usizes};
use crate::verify::{ensure_es256, select_signing_key};

/// Where the issuer key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySource {
    /// A JWKS document; the signing key is picked by `kid` or by trial.
    Set(JwkSet),
    Key(EcKey),
}

impl From<EcKey> for KeySource {
    fn from(key: EcKey) -> Self {
        KeySource::Key(key)
    }
}

impl From<Jwk> for KeySource {
    fn from(jwk: Jwk) -> Self {
        KeySource::Key(EcKey::Jwk(jwk))
    }
}

impl From<JwkSet> for KeySource {
    fn from(set: JwkSet) -> Self {
        KeySource::Set(set)
    }
}

/// One witness request: a token, its issuer key and what to reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtRequest {
    pub token: String,
    pub key: KeySource,
    /// Literals to locate in the decoded payload.
    pub matches: Vec<String>,
    /// Disclosure entries to encode; `None` takes the ones attached to the token.
    pub claims: Option<Vec<String>>,
    pub digest_policy: DigestPolicy,
    /// Enables the date signals and the birthdate age report.
    pub current_date: Option<CalendarDate>,
}

impl JwtRequest {
    pub fn new(token: impl Into<String>, key: impl Into<KeySource>) -> Self {
        Self {
            token: token.into(),
            key: key.into(),
            matches: Vec::new(),
            claims: None,
            digest_policy: DigestPolicy::default(),
            current_date: None,
        }
    }

    pub fn with_matches<I, S>(mut self, matches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matches = matches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims = Some(claims.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_digest_policy(mut self, policy: DigestPolicy) -> Self {
        self.digest_policy = policy;
        self
    }

    pub fn with_current_date(mut self, date: CalendarDate) -> Self {
        self.current_date = Some(date);
        self
    }
}

/// Everything jwt.circom consumes, built once and handed over unchanged.
///
/// Serializes to the circom input JSON: limbs and bytes as decimal strings,
/// counters and offsets as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputBundle {
    #[serde(flatten)]
    es256: Es256Inputs,
    #[serde(rename = "periodIndex")]
    period_index: usize,
    #[serde(rename = "matchesCount")]
    matches_count: usize,
    #[serde(rename = "matchSubstring", serialize_with = "serialize_decimal_matrix")]
    match_substring: Vec<Vec<u8>>,
    #[serde(rename = "matchLength")]
    match_length: Vec<usize>,
    #[serde(rename = "matchIndex")]
    match_index: Vec<usize>,
    #[serde(serialize_with = "serialize_decimal_matrix")]
    claims: Vec<Vec<u8>>,
    #[serde(rename = "claimLengths", serialize_with = "serialize_decimal_usizes")]
    claim_lengths: Vec<usize>,
    #[serde(
        rename = "currentYear",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_decimal_opt"
    )]
    current_year: Option<u32>,
    #[serde(
        rename = "currentMonth",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_decimal_opt"
    )]
    current_month: Option<u32>,
    #[serde(
        rename = "currentDay",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_decimal_opt"
    )]
    current_day: Option<u32>,
    #[serde(skip)]
    age: Option<AgeReport>,
}

impl InputBundle {
    pub fn es256(&self) -> &Es256Inputs {
        &self.es256
    }

    pub fn sig_r(&self) -> &LimbArray {
        &self.es256.sig_r
    }

    pub fn sig_s(&self) -> &LimbArray {
        &self.es256.sig_s
    }

    pub fn pubkey(&self) -> &[LimbArray; 2] {
        &self.es256.pubkey
    }

    pub fn message(&self) -> &[u8] {
        &self.es256.message
    }

    pub fn message_length(&self) -> usize {
        self.es256.message_length
    }

    pub fn period_index(&self) -> usize {
        self.period_index
    }

    pub fn matches_count(&self) -> usize {
        self.matches_count
    }

    pub fn match_substring(&self) -> &[Vec<u8>] {
        &self.match_substring
    }

    pub fn match_length(&self) -> &[usize] {
        &self.match_length
    }

    pub fn match_index(&self) -> &[usize] {
        &self.match_index
    }

    pub fn claims(&self) -> &[Vec<u8>] {
        &self.claims
    }

    pub fn claim_lengths(&self) -> &[usize] {
        &self.claim_lengths
    }

    pub fn current_date(&self) -> Option<CalendarDate> {
        match (self.current_year, self.current_month, self.current_day) {
            (Some(year), Some(month), Some(day)) => Some(CalendarDate::new(year, month, day)),
            _ => None,
        }
    }

    /// Age from the disclosed `roc_birthday` claim, when a current date was
    /// supplied and such a claim is among the encoded ones.
    pub fn age(&self) -> Option<&AgeReport> {
        self.age.as_ref()
    }

    /// Signal name to flattened values, 2-D signals row-major. Same shape
    /// [`crate::utils::parse_jwt_inputs`] produces from the JSON form.
    pub fn to_witness_inputs(&self) -> HashMap<String, Vec<BigInt>> {
        fn limbs(array: &LimbArray) -> Vec<BigInt> {
            array.limbs().iter().map(|l| BigInt::from(*l)).collect()
        }
        fn bytes(rows: &[Vec<u8>]) -> Vec<BigInt> {
            rows.iter().flatten().map(|b| BigInt::from(*b)).collect()
        }
        fn numbers(values: &[usize]) -> Vec<BigInt> {
            values.iter().map(|v| BigInt::from(*v)).collect()
        }

        let mut inputs = HashMap::new();
        inputs.insert("sig_r".to_string(), limbs(&self.es256.sig_r));
        inputs.insert("sig_s".to_string(), limbs(&self.es256.sig_s));
        inputs.insert(
            "pubkey".to_string(),
            self.es256.pubkey.iter().flat_map(limbs).collect(),
        );
        inputs.insert(
            "message".to_string(),
            bytes(std::slice::from_ref(&self.es256.message)),
        );
        inputs.insert(
            "messageLength".to_string(),
            numbers(&[self.es256.message_length]),
        );
        inputs.insert("periodIndex".to_string(), numbers(&[self.period_index]));
        inputs.insert("matchesCount".to_string(), numbers(&[self.matches_count]));
        inputs.insert("matchSubstring".to_string(), bytes(&self.match_substring));
        inputs.insert("matchLength".to_string(), numbers(&self.match_length));
        inputs.insert("matchIndex".to_string(), numbers(&self.match_index));
        inputs.insert("claims".to_string(), bytes(&self.claims));
        inputs.insert("claimLengths".to_string(), numbers(&self.claim_lengths));

        if let Some(date) = self.current_date() {
            inputs.insert("currentYear".to_string(), vec![BigInt::from(date.year)]);
            inputs.insert("currentMonth".to_string(), vec![BigInt::from(date.month)]);
            inputs.insert("currentDay".to_string(), vec![BigInt::from(date.day)]);
        }

        inputs
    }
}

/// Runs the whole pipeline for one request. Any failure aborts it; there is
/// no partially filled bundle.
pub fn generate_jwt_inputs(params: &JwtCircuitParams, request: &JwtRequest) -> Result<InputBundle> {
    let t0 = Instant::now();
    let result = build_bundle(params, request);
    match &result {
        Ok(bundle) => info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            message_len = bundle.message_length(),
            matches = bundle.matches_count(),
            claims = bundle.claim_lengths().iter().filter(|l| **l > 0).count(),
            "jwt circuit inputs ready"
        ),
        Err(err) => warn!(kind = err.kind(), error = %err, "jwt input generation aborted"),
    }
    result
}

fn build_bundle(params: &JwtCircuitParams, request: &JwtRequest) -> Result<InputBundle> {
    params.validate()?;

    let token = Token::parse(&request.token)?;
    check_length(LengthField::Header, token.header().len(), params.max_header_length)?;
    check_length(LengthField::Payload, token.payload().len(), params.max_payload_length)?;
    let message = token.signed_message();
    check_message_length(message.as_bytes(), params.max_message_length)?;
    debug!(
        header_len = token.header().len(),
        payload_len = token.payload().len(),
        disclosures = token.disclosures().len(),
        "parsed token"
    );

    let signature = EcdsaSignature::from_base64url(token.signature())?;
    let public_key = resolve_and_verify(&request.key, &token, message.as_bytes(), &signature)?;
    let es256 = Es256Inputs::assemble(&params.es256(), message.as_bytes(), &signature, &public_key)?;

    // Only now is any JSON inside the token interpreted
    let payload = token.decoded_payload()?;
    let table = locate_matches(
        &payload,
        &request.matches,
        params.max_matches,
        params.max_substring_length,
    )?;

    let entries: &[String] = request.claims.as_deref().unwrap_or(token.disclosures());
    let encoded = encode_claims(entries, params.max_claims, params.max_claim_length)?;
    if !entries.is_empty() {
        let payload_json: Value = serde_json::from_str(&payload)
            .map_err(|err| WitnessError::MalformedToken(format!("payload is not json: {err}")))?;
        let digests = collect_sd_digests(&payload_json);
        check_digests(entries, &digests, request.digest_policy)?;
        debug!(claims = entries.len(), digests = digests.len(), "disclosure digests match");
    }

    let age = match &request.current_date {
        Some(today) => birthdate_age(entries, today)?,
        None => None,
    };

    Ok(InputBundle {
        es256,
        period_index: token.period_index(),
        matches_count: table.count,
        match_substring: table.substrings,
        match_length: table.lengths,
        match_index: table.indices,
        claims: encoded.claims,
        claim_lengths: encoded.lengths,
        current_year: request.current_date.map(|d| d.year),
        current_month: request.current_date.map(|d| d.month),
        current_day: request.current_date.map(|d| d.day),
        age,
    })
}

fn check_length(field: LengthField, length: usize, max: usize) -> Result<()> {
    if length > max {
        return Err(WitnessError::LengthExceeded { field, length, max });
    }
    Ok(())
}

fn resolve_and_verify(
    source: &KeySource,
    token: &Token,
    message: &[u8],
    signature: &EcdsaSignature,
) -> Result<PublicKey> {
    match source {
        KeySource::Key(key) => {
            let public_key = key.resolve()?;
            ensure_es256(message, signature, &public_key)?;
            debug!(kid = ?key.kid(), "token signed by supplied key");
            Ok(public_key)
        }
        KeySource::Set(set) => {
            let kid = token.header_kid();
            let (jwk, public_key) = select_signing_key(set, kid.as_deref(), message, signature)?;
            debug!(kid = ?jwk.kid, "token signed by key from set");
            Ok(public_key)
        }
    }
}

fn birthdate_age<S: AsRef<str>>(entries: &[S], today: &CalendarDate) -> Result<Option<AgeReport>> {
    for (index, entry) in entries.iter().enumerate() {
        let Some(claim) = Disclosure::new(index, entry.as_ref()).decode_named()? else {
            continue;
        };
        if claim.name != ROC_BIRTHDAY_CLAIM {
            continue;
        }

        let digits = claim
            .value
            .as_str()
            .ok_or_else(|| WitnessError::InvalidBirthdate(claim.value.to_string()))?;
        let birthdate = RocDate::parse(digits)?;
        let age = age_on(&birthdate, today);
        debug!(claim_index = index, age, "computed age from birthdate claim");
        return Ok(Some(AgeReport {
            claim_index: index,
            birthdate,
            age,
        }));
    }
    Ok(None)
}
