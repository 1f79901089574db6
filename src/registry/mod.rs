/// Name registry text records
///
/// Defines the record keys the session reads and the resolver seam the
/// session is driven through. `ens` holds the JSON-RPC backed implementation.

pub mod ens;

pub use ens::{namehash, EnsTextResolver};

use crate::error::AttestResult;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Text record keys read for every session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextKey {
    #[serde(rename = "com.twitter")]
    Twitter,
    #[serde(rename = "com.instagram")]
    Instagram,
    #[serde(rename = "verifications")]
    Verifications,
}

impl TextKey {
    pub const ALL: [TextKey; 3] = [TextKey::Twitter, TextKey::Instagram, TextKey::Verifications];

    pub fn as_str(&self) -> &'static str {
        match self {
            TextKey::Twitter => "com.twitter",
            TextKey::Instagram => "com.instagram",
            TextKey::Verifications => "verifications",
        }
    }
}

impl fmt::Display for TextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads a named text record for an identity from an external registry
///
/// A record that does not exist is `Ok(None)`; only transport or payload
/// failures are errors.
#[async_trait]
pub trait TextResolver: Send + Sync {
    async fn resolve_text(&self, name: &str, key: TextKey) -> AttestResult<Option<String>>;
}
