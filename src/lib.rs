/// ENS Attest
///
/// Resolves an ENS name to the verifiable credentials published for it and
/// reports which of its social handles are backed by a matching credential.

pub mod config;
pub mod context;
pub mod credentials;
pub mod debounce;
pub mod error;
pub mod metrics;
pub mod name;
pub mod presentation;
pub mod registry;
pub mod report;
pub mod session;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AttestError, AttestResult};
