//! Command line and environment configuration.

use clap::Parser;
use solaredge_api::{DEFAULT_BASE_URL, SolarEdgeClient, TransportError};
use solaredge_mcp_rpc::transport::{DEFAULT_MAX_LINE_BYTES, LineFramer};
use thiserror::Error;

const API_KEY_VAR: &str = "SOLAREDGE_API_KEY";
const SITE_ID_VAR: &str = "SOLAREDGE_SITE_ID";
const MAX_LINE_BYTES_VAR: &str = "SOLAREDGE_MAX_LINE_BYTES";

/// Command line arguments. Every option falls back to an environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "solaredge-mcp", version, about)]
pub struct Cli {
    /// SolarEdge monitoring API key.
    #[arg(long, env = API_KEY_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Numeric id of the site to report on.
    #[arg(long, env = SITE_ID_VAR)]
    pub site_id: Option<String>,

    /// Monitoring API endpoint.
    #[arg(long, env = "SOLAREDGE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Longest accepted input line, in bytes.
    #[arg(long, env = MAX_LINE_BYTES_VAR, default_value_t = DEFAULT_MAX_LINE_BYTES)]
    pub max_line_bytes: usize,
}

/// Configuration errors, reported before any protocol traffic.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was not supplied.
    #[error("{variable} environment variable is required")]
    Missing {
        /// Environment variable that supplies the setting.
        variable: &'static str,
    },

    /// A setting was supplied but is not usable.
    #[error("{variable} must be a positive integer, got {value:?}")]
    Invalid {
        /// Environment variable that supplies the setting.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Validated server configuration.
#[derive(Clone)]
pub struct Config {
    /// Monitoring API key.
    pub api_key: String,
    /// Site every tool reports on.
    pub site_id: u64,
    /// Monitoring API endpoint.
    pub base_url: String,
    /// Longest accepted input line, in bytes.
    pub max_line_bytes: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("site_id", &self.site_id)
            .field("base_url", &self.base_url)
            .field("max_line_bytes", &self.max_line_bytes)
            .finish()
    }
}

impl Cli {
    /// Validate the arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or site id is missing, or if a numeric
    /// setting is not a positive integer.
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let api_key = self
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::Missing {
                variable: API_KEY_VAR,
            })?;

        let site_id = self
            .site_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::Missing {
                variable: SITE_ID_VAR,
            })?;
        let site_id = match site_id.trim().parse::<u64>() {
            Ok(id) if id > 0 => id,
            _ => {
                return Err(ConfigError::Invalid {
                    variable: SITE_ID_VAR,
                    value: site_id,
                });
            }
        };

        if self.max_line_bytes == 0 {
            return Err(ConfigError::Invalid {
                variable: MAX_LINE_BYTES_VAR,
                value: self.max_line_bytes.to_string(),
            });
        }

        Ok(Config {
            api_key,
            site_id,
            base_url: self.base_url,
            max_line_bytes: self.max_line_bytes,
        })
    }
}

impl Config {
    /// The API key as shown in logs.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        mask_api_key(&self.api_key)
    }

    /// Build the monitoring API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn client(&self) -> Result<SolarEdgeClient, TransportError> {
        Ok(SolarEdgeClient::new(self.api_key.clone(), self.site_id)?.with_base_url(&self.base_url))
    }

    /// A line framer honouring the configured limit.
    #[must_use]
    pub const fn framer(&self) -> LineFramer {
        LineFramer::new(self.max_line_bytes)
    }
}

/// Show the first and last four characters of a key.
///
/// Keys too short to keep anything hidden are masked entirely.
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
