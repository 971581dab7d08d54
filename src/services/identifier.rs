//! Rules for the canonical employee number.
//!
//! An employee number is trimmed and then checked structurally; uniqueness is
//! checked against the record store. Nothing in the crate rewrites a number
//! once it has been assigned.

use std::fmt;

use thiserror::Error;

use crate::store::{RecordStore, StoreError};

pub const MAX_EMPLOYEE_NUMBER_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIdentifier {
    #[error("employee number must not be empty")]
    Empty,
    #[error("employee number must be at most {max} characters")]
    TooLong { max: usize },
    #[error("employee number contains illegal character {0:?}")]
    IllegalCharacter(char),
    #[error("employee number '{0}' is already in use")]
    AlreadyUsed(String),
}

/// A trimmed, structurally valid employee number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmployeeNumber(String);

impl EmployeeNumber {
    /// Structural validation only. The token has to fit in one URL path
    /// segment and in Code 128 set B.
    pub fn parse(candidate: &str) -> Result<Self, InvalidIdentifier> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(InvalidIdentifier::Empty);
        }
        if trimmed.chars().count() > MAX_EMPLOYEE_NUMBER_LEN {
            return Err(InvalidIdentifier::TooLong { max: MAX_EMPLOYEE_NUMBER_LEN });
        }
        if let Some(bad) = trimmed.chars().find(|c| !is_token_char(*c)) {
            return Err(InvalidIdentifier::IllegalCharacter(bad));
        }
        Ok(EmployeeNumber(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmployeeNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '/' | '?' | '#' | '%')
}

/// Either the candidate is unusable or the store could not be asked.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Invalid(#[from] InvalidIdentifier),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Checks a candidate for a new record: structure first, then exact-match
/// uniqueness against the store.
///
/// The store's unique constraint still has the final word; this check only
/// gives the common case a clean error before any photo is uploaded.
pub async fn validate(store: &dyn RecordStore, candidate: &str) -> Result<EmployeeNumber, PolicyError> {
    let number = EmployeeNumber::parse(candidate)?;

    if store.find_by_employee_number(number.as_str()).await?.is_some() {
        return Err(InvalidIdentifier::AlreadyUsed(number.to_string()).into());
    }

    Ok(number)
}
