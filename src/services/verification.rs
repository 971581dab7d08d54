//! Public resolution of scanned tokens.
//!
//! Takes no admin context and never writes. Matching is exact and
//! case-sensitive: `di-3001` does not verify `DI-3001`.

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use url::form_urlencoded;

use crate::models::employee::PublicEmployee;
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "employee", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verification {
    Verified(PublicEmployee),
    NotFound,
    MalformedInput,
}

/// Where a token may arrive from. Scanner apps append the value either as a
/// path segment or as `?id=` / `?scan=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSources {
    pub id: Option<String>,
    pub scan: Option<String>,
}

impl TokenSources {
    /// Reads `id` and `scan` from a raw query string. The first occurrence of
    /// each key wins; anything unparseable is simply absent.
    pub fn from_query(query: &str) -> Self {
        let mut sources = TokenSources::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "id" if sources.id.is_none() => sources.id = Some(value.into_owned()),
                "scan" if sources.scan.is_none() => sources.scan = Some(value.into_owned()),
                _ => {}
            }
        }
        sources
    }

    /// Picks the token to look up: `id`, then `scan`, then the path segment.
    /// Blank query values do not shadow later sources.
    pub fn select<'a>(&'a self, path: Option<&'a str>) -> Option<&'a str> {
        [self.id.as_deref(), self.scan.as_deref(), path]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
    }
}

pub struct VerificationResolver {
    store: Arc<dyn RecordStore>,
}

impl VerificationResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        VerificationResolver { store }
    }

    pub async fn resolve(&self, token: Option<&str>) -> Result<Verification, StoreError> {
        let key = match token.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Ok(Verification::MalformedInput),
        };

        let outcome = match self.store.find_by_employee_number(key).await? {
            Some(record) => Verification::Verified(PublicEmployee::from(&record)),
            None => Verification::NotFound,
        };
        debug!("Verification of {:?}: {}", key, outcome.label());
        Ok(outcome)
    }
}

impl Verification {
    pub fn label(&self) -> &'static str {
        match self {
            Verification::Verified(_) => "VERIFIED",
            Verification::NotFound => "NOT_FOUND",
            Verification::MalformedInput => "MALFORMED_INPUT",
        }
    }
}
