use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PatentError;

/// Publication number of a patent as used by the remote source, e.g. `US7654321B2`.
///
/// Only ASCII alphanumerics, `-` and `_` are accepted so the id can be used
/// verbatim as a file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatentId(String);

impl PatentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatentId {
    type Err = PatentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !is_valid {
            return Err(PatentError::InvalidPatentId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

/// CPC class a query record is filed under; names the per-category directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Category {
    type Err = PatentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let is_valid = !value.is_empty()
            && value != "."
            && value != ".."
            && !value.contains(['/', '\\']);
        if !is_valid {
            return Err(PatentError::InvalidCategory(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

/// The five pieces a document record is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Abstract,
    CpcClasses,
    FirstClaim,
    FrontImage,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => write!(f, "title"),
            Field::Abstract => write!(f, "abstract"),
            Field::CpcClasses => write!(f, "CPC classes"),
            Field::FirstClaim => write!(f, "first claim"),
            Field::FrontImage => write!(f, "front image"),
        }
    }
}
