//! Configuration types for the zone updater
//!
//! This module defines all configuration structures used throughout the workspace.

use crate::validate::validate_domain_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default public-IP lookup service (JSON answer `{"ip": "..."}`)
pub const DEFAULT_IP_URL: &str = "https://api.ipify.org?format=json";

/// JSON field holding the address in the default service's answer
pub const DEFAULT_IP_JSON_FIELD: &str = "ip";

/// Default timeout for the public-IP lookup (seconds)
pub const DEFAULT_IP_TIMEOUT_SECS: u64 = 5;

/// Default Gandi XML-RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://rpc.gandi.net/xmlrpc/";

/// Default timeout for registrar calls (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 60;

/// Main updater configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Registrar API key
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Domain whose zone is updated
    pub domain: String,

    /// Public-IP lookup settings
    #[serde(default)]
    pub ip_endpoint: IpEndpointConfig,

    /// Registrar endpoint settings
    #[serde(default)]
    pub registrar: RegistrarConfig,

    /// Report pending changes without publishing anything
    #[serde(default)]
    pub dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl fmt::Debug for UpdaterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdaterConfig")
            .field("api_key", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("ip_endpoint", &self.ip_endpoint)
            .field("registrar", &self.registrar)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl UpdaterConfig {
    /// Create a configuration with default endpoints
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            ip_endpoint: IpEndpointConfig::default(),
            registrar: RegistrarConfig::default(),
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.trim().is_empty() {
            return Err(crate::Error::config("API key cannot be empty"));
        }

        validate_domain_name(&self.domain)?;
        self.ip_endpoint.validate()?;
        self.registrar.validate()?;

        Ok(())
    }
}

/// Public-IP lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpEndpointConfig {
    /// URL answering with the caller's address, as text or JSON
    #[serde(default = "default_ip_url")]
    pub url: String,

    /// Field holding the address when the answer is a JSON object
    #[serde(default = "default_ip_json_field")]
    pub json_field: String,

    /// Request timeout in seconds
    #[serde(default = "default_ip_timeout_secs")]
    pub timeout_secs: u64,
}

impl IpEndpointConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the endpoint configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("IP endpoint", &self.url)?;
        if self.json_field.trim().is_empty() {
            return Err(crate::Error::config("IP endpoint JSON field cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP endpoint timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for IpEndpointConfig {
    fn default() -> Self {
        Self {
            url: default_ip_url(),
            json_field: default_ip_json_field(),
            timeout_secs: default_ip_timeout_secs(),
        }
    }
}

/// Registrar endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// XML-RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

impl RegistrarConfig {
    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("Registrar endpoint", &self.url)?;
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Registrar timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

fn validate_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} URL cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} URL must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

fn default_ip_json_field() -> String {
    DEFAULT_IP_JSON_FIELD.to_string()
}

fn default_ip_timeout_secs() -> u64 {
    DEFAULT_IP_TIMEOUT_SECS
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    DEFAULT_RPC_TIMEOUT_SECS
}
