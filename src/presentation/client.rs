/// HTTP client for the verification presentation service
use crate::{
    config::AppConfig,
    error::{AttestError, AttestResult},
    presentation::{CredentialPresentation, PresentationResponse, PresentationSource},
};
use async_trait::async_trait;
use tracing::debug;

/// Presentation source that performs a plain GET against the located url
#[derive(Clone)]
pub struct HttpPresentationClient {
    http_client: reqwest::Client,
}

impl HttpPresentationClient {
    /// Create a new presentation client
    pub fn new(config: &AppConfig) -> AttestResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http.call_timeout)
            .build()
            .map_err(|e| AttestError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl PresentationSource for HttpPresentationClient {
    async fn fetch_presentations(&self, url: &str) -> AttestResult<Vec<CredentialPresentation>> {
        debug!("Fetching presentations from {}", url);

        let response = self.http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AttestError::Network(format!("Failed to fetch presentations: {}", e)))?;

        if !response.status().is_success() {
            return Err(AttestError::Network(format!(
                "Presentation service returned error: {}",
                response.status()
            )));
        }

        let body: PresentationResponse = response
            .json()
            .await
            .map_err(|e| AttestError::Parse(format!("Invalid presentation response: {}", e)))?;

        let data = body
            .data
            .ok_or_else(|| AttestError::SoftFailure(format!("{} returned no data", url)))?;

        Ok(data.vp_token)
    }
}
