/// Verification report - what a viewer of a session is shown
///
/// Derived from a session snapshot. Anything missing or unmatched is reported
/// as not verified.
use crate::{
    config::DisplayConfig,
    presentation::CredentialTemplate,
    session::{Session, SessionId, SessionStatus},
};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub session: SessionId,
    pub status: SessionStatus,
    pub name: Option<String>,
    pub twitter_handle: Option<String>,
    pub twitter_verified: bool,
    /// Shown as published; no credential template attests it
    pub instagram_handle: Option<String>,
    pub ens_verified: bool,
    pub personhood_verified: bool,
    pub verification_url: Option<String>,
    pub eth_address: Option<String>,
    pub explorer_link: Option<String>,
    pub notes: Vec<String>,
}

impl VerificationReport {
    pub fn from_session(session: &Session, display: &DisplayConfig) -> Self {
        let twitter_handle = session.twitter.value().cloned();
        let index = session.credentials.resolved();

        let ens_credential = index.and_then(|i| i.find_by_template(CredentialTemplate::Ens));
        let personhood_verified = index
            .and_then(|i| i.find_by_template(CredentialTemplate::Personhood))
            .is_some();
        let twitter_verified = match (index, twitter_handle.as_deref()) {
            (Some(index), Some(handle)) => index
                .find_social_match_with(CredentialTemplate::X, handle, display.handle_match)
                .is_some(),
            _ => false,
        };

        let eth_address = ens_credential
            .and_then(|c| c.eth_address())
            .map(str::to_string);
        let explorer_link = eth_address.as_ref().map(|address| {
            format!("{}/address/{}", display.explorer_url.trim_end_matches('/'), address)
        });

        Self {
            session: session.id,
            status: session.status,
            name: session.canonical_name().map(str::to_string),
            twitter_handle,
            twitter_verified,
            instagram_handle: session.instagram.value().cloned(),
            ens_verified: ens_credential.is_some(),
            personhood_verified,
            verification_url: session.presentation_url.value().cloned(),
            eth_address,
            explorer_link,
            notes: session.notes.clone(),
        }
    }
}

fn verified(flag: bool) -> &'static str {
    if flag {
        "verified"
    } else {
        "not verified"
    }
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(none)")
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let badge = if self.ens_verified { " [verified]" } else { "" };
        writeln!(f, "{}{} ({})", or_none(&self.name), badge, self.status)?;

        let twitter_badge = if self.twitter_verified { " [verified]" } else { "" };
        writeln!(f, "  twitter:     {}{}", or_none(&self.twitter_handle), twitter_badge)?;
        writeln!(f, "  instagram:   {}", or_none(&self.instagram_handle))?;
        writeln!(f, "  verifications url: {}", or_none(&self.verification_url))?;
        writeln!(f, "  ENS credential is {}", verified(self.ens_verified))?;
        if let Some(link) = &self.explorer_link {
            writeln!(f, "    explorer: {}", link)?;
        }
        writeln!(f, "  personhood credential is {}", verified(self.personhood_verified))?;
        write!(f, "  twitter credential is {}", verified(self.twitter_verified))?;

        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}
