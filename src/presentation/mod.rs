/// Verifiable credential presentations
///
/// Wire types for the presentation service, the locator that pulls the
/// service url out of the `verifications` record, and the fetch seam.

pub mod client;

pub use client::HttpPresentationClient;

use crate::error::AttestResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Claim schema discriminator read from `type[0]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialTemplate {
    #[serde(rename = "ENS")]
    Ens,
    Personhood,
    X,
}

impl CredentialTemplate {
    pub fn tag(&self) -> &'static str {
        match self {
            CredentialTemplate::Ens => "ENS",
            CredentialTemplate::Personhood => "Personhood",
            CredentialTemplate::X => "X",
        }
    }

    /// Recognized template for a type tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ENS" => Some(CredentialTemplate::Ens),
            "Personhood" => Some(CredentialTemplate::Personhood),
            "X" => Some(CredentialTemplate::X),
            _ => None,
        }
    }

    /// Subject claim holding the social handle this template attests
    pub fn handle_field(&self) -> Option<&'static str> {
        match self {
            CredentialTemplate::X => Some("username"),
            CredentialTemplate::Ens | CredentialTemplate::Personhood => None,
        }
    }
}

impl fmt::Display for CredentialTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One credential from a presentation bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPresentation {
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub credential_subject: BTreeMap<String, Value>,
}

impl CredentialPresentation {
    /// Template named by `type[0]`, if recognized
    pub fn template(&self) -> Option<CredentialTemplate> {
        self.types.first().and_then(|tag| CredentialTemplate::from_tag(tag))
    }

    /// String-valued subject claim
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.credential_subject.get(name).and_then(Value::as_str)
    }

    pub fn eth_address(&self) -> Option<&str> {
        self.claim("ethAddress")
    }

    pub fn username(&self) -> Option<&str> {
        self.claim("username")
    }
}

/// Presentation service response body
#[derive(Debug, Clone, Deserialize)]
pub struct PresentationResponse {
    #[serde(default)]
    pub data: Option<PresentationData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresentationData {
    #[serde(default)]
    pub vp_token: Vec<CredentialPresentation>,
}

/// Credentials obtained for a session, with a note when nothing usable came back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationBundle {
    pub credentials: Vec<CredentialPresentation>,
    pub diagnostic: Option<String>,
}

impl PresentationBundle {
    pub fn empty_with(diagnostic: impl Into<String>) -> Self {
        Self {
            credentials: Vec::new(),
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Retrieves a presentation bundle from a verification service
#[async_trait]
pub trait PresentationSource: Send + Sync {
    async fn fetch_presentations(&self, url: &str) -> AttestResult<Vec<CredentialPresentation>>;
}

/// Extract the presentation service url from a raw `verifications` record
///
/// The record is a JSON array of strings; element 0 is the url. Names without
/// a verification setup are the common case, so failures only log.
pub fn locate(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|r| !r.is_empty())?;

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(urls) => {
            let url = urls.into_iter().next().filter(|u| !u.is_empty());
            if url.is_none() {
                debug!("verifications record holds no url");
            }
            url
        }
        Err(e) => {
            info!("Name has no usable verification record: {}", e);
            None
        }
    }
}
