// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace identifiers.
//!
//! A workspace id is a short DNS-safe token: 4–32 lowercase alphanumerics
//! with interior hyphens allowed. The runtime service name is always derived
//! as `ide-{id}`; the derivation is an invariant, never recomputed ad-hoc
//! with a different prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix joining a workspace id to its runtime service name.
pub const SERVICE_PREFIX: &str = "ide-";

/// Generated ids use 10 characters from this alphabet, which keeps the
/// derived service name well under the 63-char DNS label limit.
const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

const GENERATED_LEN: usize = 10;
const MIN_LEN: usize = 4;
const MAX_LEN: usize = 32;

/// Validation failure for a workspace id token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceIdError {
    #[error("workspace id must be {MIN_LEN}-{MAX_LEN} characters, got {0}")]
    Length(usize),
    #[error("workspace id contains invalid character {0:?}")]
    InvalidChar(char),
    #[error("workspace id cannot start or end with a hyphen")]
    EdgeHyphen,
}

/// A validated workspace id token.
///
/// Construction goes through [`WorkspaceId::parse`] or [`WorkspaceId::generate`],
/// so a held value always satisfies the DNS-safe pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceId(String);

impl WorkspaceId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        // nanoid over a lowercase alphanumeric alphabet cannot produce an
        // invalid token, so this never rejects.
        loop {
            let token = nanoid::nanoid!(GENERATED_LEN, &ID_ALPHABET);
            if let Ok(id) = Self::parse(&token) {
                return id;
            }
        }
    }

    /// Validate and wrap an externally supplied token.
    pub fn parse(s: &str) -> Result<Self, WorkspaceIdError> {
        if s.len() < MIN_LEN || s.len() > MAX_LEN {
            return Err(WorkspaceIdError::Length(s.len()));
        }
        for c in s.chars() {
            let ok = c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
            if !ok {
                return Err(WorkspaceIdError::InvalidChar(c));
            }
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(WorkspaceIdError::EdgeHyphen);
        }
        Ok(Self(s.to_string()))
    }

    /// Recover an id from its service name, if the prefix matches.
    pub fn from_service_name(service_name: &str) -> Option<Self> {
        let token = service_name.strip_prefix(SERVICE_PREFIX)?;
        Self::parse(token).ok()
    }

    /// The derived runtime service name (`ide-{id}`).
    pub fn service_name(&self) -> String {
        format!("{}{}", SERVICE_PREFIX, self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WorkspaceId {
    type Error = WorkspaceIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<WorkspaceId> for String {
    fn from(id: WorkspaceId) -> String {
        id.0
    }
}

impl AsRef<str> for WorkspaceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for WorkspaceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for WorkspaceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WorkspaceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
