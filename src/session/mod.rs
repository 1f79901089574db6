/// Resolution sessions
///
/// A `Session` is the snapshot of one resolve-and-correlate cycle for a single
/// committed name. The coordinator publishes exactly one current session and
/// replaces it wholesale when a new name is committed.

pub mod coordinator;

pub use coordinator::{SessionCoordinator, SessionHandle, SessionOptions};

use crate::{credentials::CredentialIndex, registry::TextKey};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Monotonically increasing session tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Name committed for a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub raw_input: String,
    pub canonical_name: String,
    pub committed_at: DateTime<Utc>,
}

/// A value that is still being looked up, or its settled outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Pending,
    Resolved(T),
}

impl<T> Slot<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Slot::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Slot::Resolved(value) => Some(value),
            Slot::Pending => None,
        }
    }
}

impl<T> Slot<Option<T>> {
    /// Settled inner value; pending and absent both read as `None`
    pub fn value(&self) -> Option<&T> {
        self.resolved().and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Idle,
    Resolving,
    Resolved,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Resolving => "resolving",
            SessionStatus::Resolved => "resolved",
        };
        f.write_str(s)
    }
}

/// Snapshot of the current resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub identity: Option<Identity>,
    pub status: SessionStatus,
    pub twitter: Slot<Option<String>>,
    pub instagram: Slot<Option<String>>,
    pub verifications: Slot<Option<String>>,
    pub presentation_url: Slot<Option<String>>,
    pub credentials: Slot<CredentialIndex>,
    /// Absorbed failures, in arrival order
    pub notes: Vec<String>,
}

impl Session {
    /// The session before any name has been committed
    pub fn idle() -> Self {
        Self {
            id: SessionId::default(),
            identity: None,
            status: SessionStatus::Idle,
            twitter: Slot::Pending,
            instagram: Slot::Pending,
            verifications: Slot::Pending,
            presentation_url: Slot::Pending,
            credentials: Slot::Pending,
            notes: Vec::new(),
        }
    }

    /// A fresh session for a committed name, with nothing looked up yet
    pub fn start(id: SessionId, identity: Identity) -> Self {
        Self {
            id,
            identity: Some(identity),
            status: SessionStatus::Resolving,
            ..Self::idle()
        }
    }

    pub fn canonical_name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.canonical_name.as_str())
    }

    pub(crate) fn text_slot_mut(&mut self, key: TextKey) -> &mut Slot<Option<String>> {
        match key {
            TextKey::Twitter => &mut self.twitter,
            TextKey::Instagram => &mut self.instagram,
            TextKey::Verifications => &mut self.verifications,
        }
    }

    /// Recompute the status from the slots
    pub(crate) fn settle(&mut self) {
        if self.identity.is_none() {
            self.status = SessionStatus::Idle;
            return;
        }

        let settled = self.twitter.is_resolved()
            && self.instagram.is_resolved()
            && self.verifications.is_resolved()
            && self.presentation_url.is_resolved()
            && self.credentials.is_resolved();

        self.status = if settled {
            SessionStatus::Resolved
        } else {
            SessionStatus::Resolving
        };
    }
}
