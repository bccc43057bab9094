use log::*;

/// Paste a Google Apps Script deployment URL here to bake the endpoint into the build. When set,
/// it takes precedence over the environment and any persisted configuration.
pub const HARDCODED_ENDPOINT: &str = "";

pub const ENDPOINT_ENV_VAR: &str = "FD_SHEET_ENDPOINT";

/// Where the adapter sends its requests. Resolution order: the build-time constant, then the
/// `FD_SHEET_ENDPOINT` environment variable, then whatever URL the caller persisted. A config
/// with no endpoint leaves the adapter unconfigured: reads return nothing, writes fail fast.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    endpoint: Option<String>,
}

impl StoreConfig {
    /// Resolves the endpoint from the build-time constant, the environment, or the given
    /// persisted URL, in that order.
    pub fn resolve(persisted: Option<String>) -> Self {
        if !HARDCODED_ENDPOINT.trim().is_empty() {
            return Self { endpoint: Some(HARDCODED_ENDPOINT.trim().to_string()) };
        }
        if let Ok(url) = std::env::var(ENDPOINT_ENV_VAR) {
            if !url.trim().is_empty() {
                return Self { endpoint: Some(url.trim().to_string()) };
            }
        }
        match persisted {
            Some(url) if !url.trim().is_empty() => Self { endpoint: Some(url.trim().to_string()) },
            _ => {
                warn!("No sheet endpoint configured. Run setup, or set {ENDPOINT_ENV_VAR}.");
                Self { endpoint: None }
            },
        }
    }

    pub fn with_endpoint<S: Into<String>>(url: S) -> Self {
        Self { endpoint: Some(url.into()) }
    }

    pub fn unconfigured() -> Self {
        Self { endpoint: None }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}
