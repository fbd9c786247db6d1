//! Age from an ROC (minguo) calendar birthdate.
//!
//! The comparison is the same one the age-verifier circuit performs, so the
//! value computed here is what the circuit will arrive at.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WitnessError};

/// Gregorian year of ROC year 0.
pub const ROC_YEAR_OFFSET: u32 = 1911;

/// Disclosure name the Taiwan wallet uses for the birthdate.
pub const ROC_BIRTHDAY_CLAIM: &str = "roc_birthday";

/// A Gregorian calendar date, used as "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn new(year: u32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

/// A birthdate in the ROC calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RocDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl RocDate {
    /// Parses `YYMMDD` or `YYYMMDD`: the last four digits are month and day,
    /// everything before them is the ROC year.
    pub fn parse(digits: &str) -> Result<Self> {
        let invalid = || WitnessError::InvalidBirthdate(digits.to_string());

        if !(6..=7).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let split = digits.len() - 4;
        let number = |s: &str| s.parse::<u32>().map_err(|_| invalid());
        let year = number(&digits[..split])?;
        let month = number(&digits[split..split + 2])?;
        let day = number(&digits[split + 2..])?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(invalid());
        }

        Ok(Self { year, month, day })
    }

    pub fn gregorian_year(&self) -> u32 {
        self.year + ROC_YEAR_OFFSET
    }
}

/// Whole years between `birth` and `today`, one less while this year's
/// birthday is still ahead. Zero if `today` precedes the birthdate.
pub fn age_on(birth: &RocDate, today: &CalendarDate) -> u32 {
    let birth_year = birth.gregorian_year();
    let mut age = today.year.saturating_sub(birth_year);
    if today.year >= birth_year && (today.month, today.day) < (birth.month, birth.day) {
        age = age.saturating_sub(1);
    }
    age
}

/// [`age_on`] for a birthdate still in digit form.
pub fn age_from_roc_digits(digits: &str, today: &CalendarDate) -> Result<u32> {
    Ok(age_on(&RocDate::parse(digits)?, today))
}

pub fn is_at_least(age: u32, threshold: u32) -> bool {
    age >= threshold
}

/// Age derived from a disclosed birthdate claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeReport {
    /// Row of the `claims` signal holding the birthdate disclosure.
    pub claim_index: usize,
    pub birthdate: RocDate,
    pub age: u32,
}
