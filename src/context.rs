/// Application context and dependency injection
use crate::{
    config::AppConfig,
    error::AttestResult,
    presentation::HttpPresentationClient,
    registry::EnsTextResolver,
    report::VerificationReport,
    session::{Session, SessionCoordinator, SessionOptions},
};
use std::sync::Arc;

/// Application context holding the configured session coordinator
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub coordinator: SessionCoordinator,
}

impl AppContext {
    /// Create a new application context from configuration
    pub fn new(config: AppConfig) -> AttestResult<Self> {
        config.validate()?;

        let resolver = Arc::new(EnsTextResolver::new(&config)?);
        let presentations = Arc::new(HttpPresentationClient::new(&config)?);
        let coordinator =
            SessionCoordinator::new(resolver, presentations, SessionOptions::from(&config));

        Ok(Self {
            config: Arc::new(config),
            coordinator,
        })
    }

    /// Report for a session using the configured display settings
    pub fn report(&self, session: &Session) -> VerificationReport {
        VerificationReport::from_session(session, &self.config.display)
    }
}
