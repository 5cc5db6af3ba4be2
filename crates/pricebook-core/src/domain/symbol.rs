use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest exchange root accepted, e.g. `GOOGL`.
const MAX_ROOT_LEN: usize = 10;
/// Longest share-class or venue suffix, e.g. `B` in `BRK.B` or `LON` in `TSCO.LON`.
const MAX_SUFFIX_LEN: usize = 4;

/// Equity ticker as sent to the provider and stored in the records table.
///
/// A ticker is a root starting with a letter, optionally followed by one
/// `.` or `-` and a short suffix: `IBM`, `BRK.B`, `BF-B`, `TSCO.LON`.
/// Input is trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let (root, suffix) = match ticker.find(['.', '-']) {
            Some(at) => (&ticker[..at], Some(&ticker[at + 1..])),
            None => (ticker.as_str(), None),
        };

        if let Some(first) = ticker.chars().next().filter(|ch| !ch.is_ascii_alphabetic()) {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }
        if let Some((index, ch)) = root
            .char_indices()
            .find(|(_, ch)| !ch.is_ascii_alphanumeric())
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }
        if root.len() > MAX_ROOT_LEN {
            return Err(ValidationError::SymbolTooLong {
                len: root.len(),
                max: MAX_ROOT_LEN,
            });
        }

        if let Some(suffix) = suffix {
            let valid = (1..=MAX_SUFFIX_LEN).contains(&suffix.len())
                && suffix.chars().all(|ch| ch.is_ascii_alphanumeric());
            if !valid {
                return Err(ValidationError::SymbolInvalidSuffix {
                    suffix: suffix.to_owned(),
                    max: MAX_SUFFIX_LEN,
                });
            }
        }

        Ok(Self(ticker))
    }

    /// Parse a comma-separated list, keeping order and duplicates.
    pub fn parse_list(input: &str) -> Result<Vec<Self>, ValidationError> {
        let symbols = input
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if symbols.is_empty() {
            return Err(ValidationError::EmptySymbolList);
        }
        Ok(symbols)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
