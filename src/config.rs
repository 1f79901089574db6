/// Configuration management for ENS Attest
use crate::error::{AttestError, AttestResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

/// Mainnet ENS registry
pub const DEFAULT_ENS_REGISTRY: &str = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Name registry (JSON-RPC) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub rpc_url: String,
    pub ens_registry: String,
}

/// Outbound HTTP settings shared by the JSON-RPC and presentation clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Upper bound for every registry read and presentation fetch
    pub call_timeout: Duration,
}

/// Search input configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub default_name: String,
}

/// Report rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub explorer_url: String,
    pub handle_match: HandleMatchPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

/// How an observed registry handle is compared against a credential claim
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandleMatchPolicy {
    #[default]
    Exact,
    CaseInsensitive,
}

impl HandleMatchPolicy {
    pub fn matches(self, claimed: &str, observed: &str) -> bool {
        match self {
            HandleMatchPolicy::Exact => claimed == observed,
            HandleMatchPolicy::CaseInsensitive => claimed.to_lowercase() == observed.to_lowercase(),
        }
    }
}

impl std::str::FromStr for HandleMatchPolicy {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(HandleMatchPolicy::Exact),
            "case-insensitive" | "insensitive" => Ok(HandleMatchPolicy::CaseInsensitive),
            other => Err(AttestError::Config(format!("Unknown handle match policy: {}", other))),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig {
                rpc_url: "https://cloudflare-eth.com".to_string(),
                ens_registry: DEFAULT_ENS_REGISTRY.to_string(),
            },
            http: HttpConfig {
                user_agent: format!("ens-attest/{}", env!("CARGO_PKG_VERSION")),
                call_timeout: Duration::from_secs(10),
            },
            search: SearchConfig {
                debounce: Duration::from_millis(500),
                default_name: "domico.eth".to_string(),
            },
            display: DisplayConfig {
                explorer_url: "https://etherscan.io".to_string(),
                handle_match: HandleMatchPolicy::Exact,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AttestResult<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let rpc_url = env::var("ATTEST_RPC_URL").unwrap_or(defaults.registry.rpc_url);
        let ens_registry = env::var("ATTEST_ENS_REGISTRY").unwrap_or(defaults.registry.ens_registry);

        let user_agent = env::var("ATTEST_USER_AGENT").unwrap_or(defaults.http.user_agent);
        let call_timeout = env::var("ATTEST_CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| AttestError::Config("Invalid call timeout".to_string()))?;

        let debounce = env::var("ATTEST_DEBOUNCE_MS")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| AttestError::Config("Invalid debounce interval".to_string()))?;
        let default_name = env::var("ATTEST_DEFAULT_NAME").unwrap_or(defaults.search.default_name);

        let explorer_url = env::var("ATTEST_EXPLORER_URL").unwrap_or(defaults.display.explorer_url);
        let handle_match = match env::var("ATTEST_HANDLE_MATCH") {
            Ok(value) => value.parse()?,
            Err(_) => HandleMatchPolicy::default(),
        };

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let json = env::var("ATTEST_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(AppConfig {
            registry: RegistryConfig {
                rpc_url,
                ens_registry,
            },
            http: HttpConfig {
                user_agent,
                call_timeout,
            },
            search: SearchConfig {
                debounce,
                default_name,
            },
            display: DisplayConfig {
                explorer_url,
                handle_match,
            },
            logging: LoggingConfig { level, json },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AttestResult<()> {
        Url::parse(&self.registry.rpc_url)
            .map_err(|e| AttestError::Config(format!("Invalid RPC url: {}", e)))?;
        Url::parse(&self.display.explorer_url)
            .map_err(|e| AttestError::Config(format!("Invalid explorer url: {}", e)))?;

        let registry = self
            .registry
            .ens_registry
            .strip_prefix("0x")
            .ok_or_else(|| AttestError::Config("Registry address must start with 0x".to_string()))?;
        if registry.len() != 40 || hex::decode(registry).is_err() {
            return Err(AttestError::Config(format!(
                "Invalid registry address: {}",
                self.registry.ens_registry
            )));
        }

        if self.http.call_timeout.is_zero() {
            return Err(AttestError::Config("Call timeout cannot be zero".to_string()));
        }
        if self.search.debounce.is_zero() {
            return Err(AttestError::Config("Debounce interval cannot be zero".to_string()));
        }

        Ok(())
    }
}
