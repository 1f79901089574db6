/// Session coordinator - runs one resolve-and-correlate cycle per committed name
///
/// The coordinator is the only writer of the current session. Starting a
/// session replaces the snapshot before any lookup is issued. In-flight work
/// from older sessions is not cancelled; every result carries the id it was
/// issued under and is dropped on arrival if that id is no longer current.
use crate::{
    config::AppConfig,
    credentials::CredentialIndex,
    error::{AttestError, AttestResult},
    metrics,
    name::normalize,
    presentation::{locate, PresentationBundle, PresentationSource},
    registry::{TextKey, TextResolver},
    session::{Identity, Session, SessionId, Slot},
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Session behaviour knobs
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Upper bound for each registry read and the presentation fetch
    pub call_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            call_timeout: config.http.call_timeout,
        }
    }
}

/// Background resolution of one session
pub struct SessionHandle {
    pub id: SessionId,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Wait until every lookup of this session has settled
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            warn!("Session {} task ended abnormally: {}", self.id, e);
        }
    }
}

/// Owner of the current session
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Arc<dyn TextResolver>,
    presentations: Arc<dyn PresentationSource>,
    options: SessionOptions,
    state: watch::Sender<Session>,
}

impl SessionCoordinator {
    pub fn new(
        resolver: Arc<dyn TextResolver>,
        presentations: Arc<dyn PresentationSource>,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(Session::idle());
        Self {
            inner: Arc::new(Inner {
                resolver,
                presentations,
                options,
                state,
            }),
        }
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Commit a name and start resolving it
    ///
    /// An invalid name is rejected without touching the current session.
    pub fn begin(&self, raw: &str) -> AttestResult<SessionHandle> {
        let canonical = normalize(raw.trim())?;

        let identity = Identity {
            raw_input: raw.to_string(),
            canonical_name: canonical.clone(),
            committed_at: Utc::now(),
        };

        // Id assignment and replacement happen under the same write
        let mut id = SessionId::default();
        self.inner.state.send_modify(|current| {
            id = SessionId(current.id.0 + 1);
            *current = Session::start(id, identity);
        });

        metrics::SESSIONS_STARTED_TOTAL.inc();
        info!("Session {} started for {}", id, canonical);

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run(id, canonical).await });

        Ok(SessionHandle { id, task })
    }

    /// Resolve a name to completion
    ///
    /// Returns `None` when another session was started before this one settled.
    pub async fn resolve(&self, raw: &str) -> AttestResult<Option<Session>> {
        let handle = self.begin(raw)?;
        let id = handle.id;
        handle.finished().await;

        let current = self.current();
        Ok((current.id == id).then_some(current))
    }
}

impl Inner {
    async fn run(self: Arc<Self>, id: SessionId, name: String) {
        tokio::join!(
            self.read_handle(id, &name, TextKey::Twitter),
            self.read_handle(id, &name, TextKey::Instagram),
            self.read_credentials(id, &name),
        );

        if self.state.borrow().id == id {
            metrics::SESSIONS_RESOLVED_TOTAL.inc();
            info!("Session {} resolved for {}", id, name);
        } else {
            debug!("Session {} for {} was superseded", id, name);
        }
    }

    async fn read_handle(&self, id: SessionId, name: &str, key: TextKey) {
        let (value, note) = self.read_text(name, key).await;
        self.apply(id, |session| {
            *session.text_slot_mut(key) = Slot::Resolved(value);
            session.notes.extend(note);
        });
    }

    /// Read `verifications`, then fetch the bundle it points at
    async fn read_credentials(&self, id: SessionId, name: &str) {
        let (raw, note) = self.read_text(name, TextKey::Verifications).await;
        let url = locate(raw.as_deref());

        let located = url.clone();
        let still_current = self.apply(id, |session| {
            session.verifications = Slot::Resolved(raw);
            session.presentation_url = Slot::Resolved(located);
            session.notes.extend(note);
        });
        if !still_current {
            return;
        }

        let bundle = self.fetch(url.as_deref()).await;
        self.apply(id, |session| {
            session.credentials = Slot::Resolved(CredentialIndex::build(bundle.credentials));
            session.notes.extend(bundle.diagnostic);
        });
    }

    /// One text record; failures become absent plus a note
    async fn read_text(&self, name: &str, key: TextKey) -> (Option<String>, Option<String>) {
        let result = match timeout(self.options.call_timeout, self.resolver.resolve_text(name, key)).await {
            Ok(result) => result,
            Err(_) => Err(AttestError::Network(format!(
                "lookup timed out after {:?}",
                self.options.call_timeout
            ))),
        };

        match result {
            Ok(Some(value)) => {
                metrics::record_text_lookup(key, "found");
                (Some(value), None)
            }
            Ok(None) => {
                metrics::record_text_lookup(key, "absent");
                (None, None)
            }
            Err(e) => {
                metrics::record_text_lookup(key, "error");
                warn!("Failed to read {} for {}: {}", key, name, e);
                (None, Some(format!("{}: {}", key, e)))
            }
        }
    }

    /// Presentation bundle for a located url; never fails
    async fn fetch(&self, url: Option<&str>) -> PresentationBundle {
        let Some(url) = url else {
            metrics::record_presentation_fetch("skipped");
            return PresentationBundle::default();
        };

        let result = match timeout(self.options.call_timeout, self.presentations.fetch_presentations(url)).await {
            Ok(result) => result,
            Err(_) => Err(AttestError::Network(format!(
                "presentation fetch timed out after {:?}",
                self.options.call_timeout
            ))),
        };

        match result {
            Ok(credentials) => {
                metrics::record_presentation_fetch("ok");
                debug!("Fetched {} credentials from {}", credentials.len(), url);
                PresentationBundle {
                    credentials,
                    diagnostic: None,
                }
            }
            Err(e) => {
                metrics::record_presentation_fetch("error");
                warn!("Get VP token failed for {}: {}", url, e);
                PresentationBundle::empty_with(format!("presentations: {}", e))
            }
        }
    }

    /// Apply a result if its session is still current
    fn apply(&self, id: SessionId, update: impl FnOnce(&mut Session)) -> bool {
        self.state.send_if_modified(|current| {
            if current.id != id {
                metrics::STALE_RESULTS_DISCARDED_TOTAL.inc();
                debug!("Discarding result of session {} (current is {})", id, current.id);
                return false;
            }
            update(current);
            current.settle();
            true
        })
    }
}
