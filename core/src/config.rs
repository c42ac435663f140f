use crate::error::{IgdbError, IgdbResult};

/// Environment variable holding the IGDB request URL.
pub const BASE_URL_ENV: &str = "IGDB_BASE_URL";
/// Environment variable holding the IGDB `user-key`.
pub const API_KEY_ENV: &str = "IGDB_API_KEY";

/// Runtime configuration describing how to reach IGDB.
#[derive(Clone)]
pub struct IgdbConfig {
    pub base_url: String,
    pub api_key: String,
}

impl IgdbConfig {
    /// Construct a configuration from an explicit request URL and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> IgdbResult<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| IgdbError::MissingEnvVar { var: BASE_URL_ENV })?;
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| IgdbError::MissingEnvVar { var: API_KEY_ENV })?;

        Ok(Self::new(base_url, api_key))
    }

    /// Reject blank values; both are required to talk to IGDB at all.
    pub fn validate(&self) -> IgdbResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(IgdbError::Configuration {
                reason: "IGDB API key is required",
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(IgdbError::Configuration {
                reason: "IGDB request URL is required",
            });
        }
        Ok(())
    }
}

// The key is a credential; keep it out of logs and panic messages.
impl std::fmt::Debug for IgdbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgdbConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
