#![allow(dead_code)]
// In-memory registry and presentation service used by the integration tests
use async_trait::async_trait;
use ens_attest::{
    error::{AttestError, AttestResult},
    presentation::{CredentialPresentation, PresentationSource},
    registry::{TextKey, TextResolver},
    session::{SessionCoordinator, SessionOptions},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};

pub enum Failure {
    Network(&'static str),
    NoData,
}

impl Failure {
    fn to_error(&self, url: &str) -> AttestError {
        match self {
            Failure::Network(message) => AttestError::Network(message.to_string()),
            Failure::NoData => AttestError::SoftFailure(format!("{} returned no data", url)),
        }
    }
}

type TextReply = (Duration, Result<Option<String>, &'static str>);

#[derive(Default)]
pub struct FakeRegistry {
    records: HashMap<(String, TextKey), TextReply>,
}

impl FakeRegistry {
    pub fn with(self, name: &str, key: TextKey, value: &str) -> Self {
        self.slow(name, key, value, Duration::ZERO)
    }

    pub fn slow(mut self, name: &str, key: TextKey, value: &str, delay: Duration) -> Self {
        self.records
            .insert((name.to_string(), key), (delay, Ok(Some(value.to_string()))));
        self
    }

    pub fn hung(mut self, name: &str, key: TextKey) -> Self {
        self.records
            .insert((name.to_string(), key), (Duration::from_secs(3600), Ok(None)));
        self
    }

    pub fn failing(mut self, name: &str, key: TextKey, message: &'static str) -> Self {
        self.records
            .insert((name.to_string(), key), (Duration::ZERO, Err(message)));
        self
    }
}

#[async_trait]
impl TextResolver for FakeRegistry {
    async fn resolve_text(&self, name: &str, key: TextKey) -> AttestResult<Option<String>> {
        let Some((delay, reply)) = self.records.get(&(name.to_string(), key)) else {
            return Ok(None);
        };

        sleep(*delay).await;
        reply
            .clone()
            .map_err(|message| AttestError::Network(message.to_string()))
    }
}

#[derive(Default)]
pub struct FakeVerifier {
    bundles: HashMap<String, (Duration, Result<serde_json::Value, Failure>)>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl FakeVerifier {
    pub fn with(self, url: &str, tokens: serde_json::Value) -> Self {
        self.slow(url, tokens, Duration::ZERO)
    }

    pub fn slow(mut self, url: &str, tokens: serde_json::Value, delay: Duration) -> Self {
        self.bundles.insert(url.to_string(), (delay, Ok(tokens)));
        self
    }

    pub fn failing(mut self, url: &str, failure: Failure) -> Self {
        self.bundles.insert(url.to_string(), (Duration::ZERO, Err(failure)));
        self
    }

    /// Urls fetched so far, with the instant each fetch began
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PresentationSource for FakeVerifier {
    async fn fetch_presentations(&self, url: &str) -> AttestResult<Vec<CredentialPresentation>> {
        self.calls.lock().unwrap().push((url.to_string(), Instant::now()));

        let Some((delay, reply)) = self.bundles.get(url) else {
            return Err(AttestError::Network(format!("no route to {}", url)));
        };

        sleep(*delay).await;
        match reply {
            Ok(tokens) => serde_json::from_value(tokens.clone())
                .map_err(|e| AttestError::Parse(e.to_string())),
            Err(failure) => Err(failure.to_error(url)),
        }
    }
}

pub fn coordinator(
    registry: FakeRegistry,
    verifier: Arc<FakeVerifier>,
    call_timeout: Duration,
) -> SessionCoordinator {
    SessionCoordinator::new(
        Arc::new(registry),
        verifier,
        SessionOptions { call_timeout },
    )
}
