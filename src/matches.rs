//! Locating literal substrings in the decoded payload.
//!
//! The circuit re-checks each match by indexing into the payload it decodes
//! itself, so the offsets here are byte offsets into the UTF-8 payload.

use tracing::{debug, warn};

use crate::error::{LengthField, Result, WitnessError};
use crate::utils::string_to_padded_bytes;

/// The `matchesCount`, `matchSubstring`, `matchLength` and `matchIndex`
/// signals, always `max_matches` entries long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTable {
    pub count: usize,
    /// Each row holds `max_substring_length` bytes.
    pub substrings: Vec<Vec<u8>>,
    pub lengths: Vec<usize>,
    pub indices: Vec<usize>,
}

/// Finds the first occurrence of each literal in `payload`.
///
/// Unused slots are filled with an all-zero substring, length 0 and index 0.
pub fn locate_matches<S: AsRef<str>>(
    payload: &str,
    matches: &[S],
    max_matches: usize,
    max_substring_length: usize,
) -> Result<MatchTable> {
    if matches.len() > max_matches {
        warn!(
            count = matches.len(),
            max_matches, "too many match requests"
        );
        return Err(WitnessError::MatchCountExceeded {
            count: matches.len(),
            max: max_matches,
        });
    }

    let mut table = MatchTable {
        count: matches.len(),
        substrings: Vec::with_capacity(max_matches),
        lengths: Vec::with_capacity(max_matches),
        indices: Vec::with_capacity(max_matches),
    };

    for literal in matches {
        let literal = literal.as_ref();
        // an empty row is indistinguishable from an unused slot
        if literal.is_empty() {
            return Err(WitnessError::SubstringNotFound {
                substring: String::new(),
            });
        }
        if literal.len() > max_substring_length {
            return Err(WitnessError::LengthExceeded {
                field: LengthField::Substring,
                length: literal.len(),
                max: max_substring_length,
            });
        }

        let index = payload
            .find(literal)
            .ok_or_else(|| WitnessError::SubstringNotFound {
                substring: literal.to_string(),
            })?;
        debug!(index, length = literal.len(), "located payload substring");

        table
            .substrings
            .push(string_to_padded_bytes(literal, max_substring_length));
        table.lengths.push(literal.len());
        table.indices.push(index);
    }

    while table.indices.len() < max_matches {
        table.substrings.push(vec![0; max_substring_length]);
        table.lengths.push(0);
        table.indices.push(0);
    }

    Ok(table)
}
