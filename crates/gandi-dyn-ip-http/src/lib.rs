// # HTTP IP Resolver
//
// This crate provides an HTTP-based IP resolver for the zone updater.
//
// ## Architecture
//
// Asks a third-party lookup service for the caller's public address with a
// single GET. Services answer in one of two shapes, both accepted:
//
// - plain text: `203.0.113.7\n` (e.g. `https://api.ipify.org`)
// - JSON object: `{"ip": "203.0.113.7"}` (e.g. `https://api.ipify.org?format=json`)
//
// The extracted value is validated as a dotted-quad IPv4 address before it
// is handed to the caller. Lookups are never cached and never retried.

use gandi_dyn_core::config::{DEFAULT_IP_JSON_FIELD, IpEndpointConfig};
use gandi_dyn_core::traits::IpResolver;
use gandi_dyn_core::validate::parse_ipv4;
use gandi_dyn_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// HTTP-based IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: String,

    /// JSON field holding the address when the body is an object
    json_field: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a new HTTP IP resolver
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g., "https://api.ipify.org?format=json")
    /// - `timeout`: Bound on the whole request
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, url))
    }

    /// Create a resolver from endpoint configuration
    pub fn from_config(config: &IpEndpointConfig) -> Result<Self> {
        let resolver = Self::new(config.url.clone(), config.timeout())?;
        Ok(resolver.with_json_field(config.json_field.clone()))
    }

    /// Create a resolver around an existing HTTP client
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            json_field: DEFAULT_IP_JSON_FIELD.to_string(),
            client,
        }
    }

    /// Read the address from another JSON field
    pub fn with_json_field(mut self, field: impl Into<String>) -> Self {
        self.json_field = field.into();
        self
    }

    /// Fetch the response body of the lookup service
    async fn fetch_body(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::transport(&self.url, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::transport(
                &self.url,
                format!("http call failed with {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| Error::transport(&self.url, format!("Failed to read response: {}", e)))
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn current(&self) -> Result<Ipv4Addr> {
        let body = self.fetch_body().await?;
        let text = extract_address(&body, &self.json_field)?;

        tracing::debug!("Lookup service {} answered {:?}", self.url, text);
        parse_ipv4(&text)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Pull the address text out of a lookup service answer
///
/// A body starting with `{` is read as a JSON object and `field` must hold
/// a string; anything else is taken as plain text.
pub fn extract_address(body: &str, field: &str) -> Result<String> {
    let body = body.trim();
    if !body.starts_with('{') {
        return Ok(body.to_string());
    }

    let mut object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;
    let value = object
        .remove(field)
        .ok_or_else(|| Error::validation(format!("response has no {:?} field", field)))?;

    match value {
        serde_json::Value::String(text) => Ok(text),
        other => Err(Error::validation(format!(
            "field {:?} is not a string: {}",
            field, other
        ))),
    }
}
