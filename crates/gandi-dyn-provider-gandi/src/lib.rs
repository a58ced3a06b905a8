// # Gandi Registrar
//
// This crate provides a registrar implementation for the Gandi XML-RPC
// domain API (`https://rpc.gandi.net/xmlrpc/`).
//
// ## Behaviour
//
// - One HTTP POST per registrar operation, XML-RPC encoded
// - The API key is the first positional parameter of every call
// - HTTP timeout configured (60 seconds by default)
// - XML-RPC faults become `Error::Fault`, explicit `false` results become
//   `Error::RemoteLogic`, everything on the wire becomes `Error::Transport`
// - No retry, no caching: the zone update transaction owns all decisions
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Construction fails if the key is empty
//
// ## API Reference
//
// - Zone versions: clone with `domain.zone.version.new`, activate with
//   `domain.zone.version.set`, discard with `domain.zone.version.delete`
// - Records: `domain.zone.record.list`, `.add`, `.delete`

pub mod api;
pub mod xmlrpc;

use api::{DomainInfo, FromValue, NewRecord, RecordFilter};
use async_trait::async_trait;
use gandi_dyn_core::config::RegistrarConfig;
use gandi_dyn_core::traits::{Record, RecordDraft, RecordId, Registrar, ZoneId, ZoneVersion};
use gandi_dyn_core::{Error, Result};
use std::time::Duration;
use xmlrpc::{Response, Value};

/// Gandi XML-RPC endpoint
pub const GANDI_RPC_URL: &str = "https://rpc.gandi.net/xmlrpc/";

/// Default HTTP timeout for API requests (60 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Gandi registrar client
///
/// Stateless apart from the credential: every method is a single remote
/// call.
pub struct GandiRegistrar {
    /// Gandi API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// XML-RPC endpoint
    url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiRegistrar")
            .field("api_key", &"<REDACTED>")
            .field("url", &self.url)
            .finish()
    }
}

impl GandiRegistrar {
    /// Create a new Gandi registrar client
    ///
    /// # Parameters
    ///
    /// - `api_key`: Gandi API key
    /// - `url`: XML-RPC endpoint (normally [`GANDI_RPC_URL`])
    /// - `timeout`: Bound on each remote call
    pub fn new(api_key: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(client, api_key, url)
    }

    /// Create a client from registrar configuration
    pub fn from_config(api_key: impl Into<String>, config: &RegistrarConfig) -> Result<Self> {
        Self::new(api_key, config.url.clone(), config.timeout())
    }

    /// Create a client around an existing HTTP client
    pub fn with_client(
        client: reqwest::Client,
        api_key: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        Ok(Self {
            api_key,
            url: url.into(),
            client,
        })
    }

    /// Perform one remote call and decode its result
    ///
    /// The API key is prepended to `params`.
    async fn call<T: FromValue>(&self, method: &'static str, params: Vec<Value>) -> Result<T> {
        let mut args = Vec::with_capacity(params.len() + 1);
        args.push(Value::from(self.api_key.as_str()));
        args.extend(params);

        tracing::debug!("Calling {} with {} parameter(s)", method, args.len() - 1);
        let body = xmlrpc::encode_call(method, &args);

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::transport(method, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::transport(
                method,
                format!("HTTP error: {} - {}", status, error_text.trim()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(method, format!("Failed to read response: {}", e)))?;

        match xmlrpc::decode_response(&text).map_err(|e| Error::protocol(method, e.to_string()))? {
            Response::Success(value) => {
                T::from_value(value).map_err(|e| Error::protocol(method, e.to_string()))
            }
            Response::Fault { code, message } => {
                tracing::debug!("{} returned fault {}: {}", method, code, message);
                Err(Error::fault(method, code, message))
            }
        }
    }

    /// Perform a call whose result is an explicit success flag
    async fn call_confirmed(
        &self,
        method: &'static str,
        params: Vec<Value>,
        refusal: &str,
    ) -> Result<()> {
        if self.call::<bool>(method, params).await? {
            Ok(())
        } else {
            Err(Error::remote_logic(method, refusal))
        }
    }
}

#[async_trait]
impl Registrar for GandiRegistrar {
    async fn zone_id(&self, domain: &str) -> Result<ZoneId> {
        let info: DomainInfo = self.call(api::DOMAIN_INFO, vec![Value::from(domain)]).await?;
        tracing::debug!("Domain {} uses zone {}", domain, info.zone_id);
        Ok(ZoneId(info.zone_id))
    }

    async fn list_records(&self, zone: ZoneId, version: ZoneVersion) -> Result<Vec<Record>> {
        self.call(
            api::RECORD_LIST,
            vec![Value::from(zone.0), Value::from(version.0)],
        )
        .await
    }

    async fn clone_version(&self, zone: ZoneId) -> Result<ZoneVersion> {
        let version: i64 = self.call(api::VERSION_NEW, vec![Value::from(zone.0)]).await?;
        Ok(ZoneVersion(version))
    }

    async fn delete_record(
        &self,
        zone: ZoneId,
        version: ZoneVersion,
        id: &RecordId,
    ) -> Result<u32> {
        // Ids above 32 bits are only matched when sent as <int>
        let filter = RecordFilter { id: id.numeric()? };

        self.call(
            api::RECORD_DELETE,
            vec![
                Value::from(zone.0),
                Value::from(version.0),
                Value::from(filter),
            ],
        )
        .await
    }

    async fn add_record(
        &self,
        zone: ZoneId,
        version: ZoneVersion,
        draft: &RecordDraft,
    ) -> Result<Record> {
        self.call(
            api::RECORD_ADD,
            vec![
                Value::from(zone.0),
                Value::from(version.0),
                Value::from(NewRecord::from(draft)),
            ],
        )
        .await
    }

    async fn activate_version(&self, zone: ZoneId, version: ZoneVersion) -> Result<()> {
        self.call_confirmed(
            api::VERSION_SET,
            vec![Value::from(zone.0), Value::from(version.0)],
            "zone activation failed for unknown reason",
        )
        .await
    }

    async fn delete_version(&self, zone: ZoneId, version: ZoneVersion) -> Result<()> {
        self.call_confirmed(
            api::VERSION_DELETE,
            vec![Value::from(zone.0), Value::from(version.0)],
            "zone version deletion failed for unknown reason",
        )
        .await
    }

    fn registrar_name(&self) -> &'static str {
        "gandi"
    }
}
