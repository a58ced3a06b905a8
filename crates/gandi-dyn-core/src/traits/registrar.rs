// # Registrar Trait
//
// Defines the interface to a DNS registrar that stores zones as numbered
// versions.
//
// ## Implementations
//
// - Gandi XML-RPC: `gandi-dyn-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use gandi_dyn_core::{Registrar, ZoneVersion};
//
// async fn show(registrar: &dyn Registrar) -> gandi_dyn_core::Result<()> {
//     let zone = registrar.zone_id("example.org").await?;
//     for record in registrar.list_records(zone, ZoneVersion::ACTIVE).await? {
//         println!("{} {} {}", record.name, record.record_type, record.value);
//     }
//     Ok(())
// }
// ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record type handled by the updater
pub const RECORD_TYPE_A: &str = "A";

/// Identifier of a DNS zone at the registrar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub i64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numbered snapshot of a zone's record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneVersion(pub i64);

impl ZoneVersion {
    /// Sentinel meaning "the currently active version"
    pub const ACTIVE: ZoneVersion = ZoneVersion(0);
}

impl fmt::Display for ZoneVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registrar-assigned record identifier
///
/// Kept in its textual form: identifiers may exceed 32 bits and the
/// registrar is free to send them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an identifier as received from the registrar
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the identifier as a 64-bit integer
    ///
    /// The registrar rejects string identifiers that do not fit in 32 bits,
    /// so deletions must send the numeric form.
    pub fn numeric(&self) -> Result<i64> {
        self.0.trim().parse::<i64>().map_err(|e| {
            Error::validation(format!("record id {:?} is not an integer: {}", self.0, e))
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A DNS record as stored in one zone version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Registrar-assigned identifier
    pub id: RecordId,
    /// Record type tag ("A", "MX", ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Subdomain label ("@" for the apex)
    pub name: String,
    /// Record payload
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl Record {
    /// Whether this is an IPv4 address record
    pub fn is_a(&self) -> bool {
        self.record_type == RECORD_TYPE_A
    }

    /// Whether this A record points somewhere other than `ip`
    pub fn is_stale(&self, ip: &str) -> bool {
        self.is_a() && self.value != ip
    }

    /// Draft of the same record carrying a new value
    pub fn with_value(&self, value: impl Into<String>) -> RecordDraft {
        RecordDraft {
            record_type: self.record_type.clone(),
            name: self.name.clone(),
            value: value.into(),
            ttl: self.ttl,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} (id {})",
            self.name, self.ttl, self.record_type, self.value, self.id
        )
    }
}

/// A record to be created; the registrar assigns the identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Record type tag
    #[serde(rename = "type")]
    pub record_type: String,
    /// Subdomain label
    pub name: String,
    /// Record payload
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

/// Trait for registrar implementations
///
/// Each method performs exactly one remote call and returns its typed
/// result. No retries, no caching, no decisions: the zone update
/// transaction owns all of that.
///
/// Implementations must be usable across async tasks.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Look up the zone associated with a domain
    ///
    /// Fails if the domain is unknown to the registrar or the call fails.
    async fn zone_id(&self, domain: &str) -> Result<ZoneId>;

    /// List all records of a zone version
    ///
    /// [`ZoneVersion::ACTIVE`] lists the version currently served.
    async fn list_records(&self, zone: ZoneId, version: ZoneVersion) -> Result<Vec<Record>>;

    /// Create a new inactive version copied from the active one
    async fn clone_version(&self, zone: ZoneId) -> Result<ZoneVersion>;

    /// Delete one record from an inactive version
    ///
    /// Returns the number of records the registrar deleted. The call
    /// succeeding does not mean anything was deleted: callers must check
    /// the count.
    async fn delete_record(&self, zone: ZoneId, version: ZoneVersion, id: &RecordId)
    -> Result<u32>;

    /// Add a record to an inactive version, returning it with its new id
    async fn add_record(
        &self,
        zone: ZoneId,
        version: ZoneVersion,
        draft: &RecordDraft,
    ) -> Result<Record>;

    /// Make a version the live one
    ///
    /// An explicit refusal from the registrar is an error, not `Ok`.
    async fn activate_version(&self, zone: ZoneId, version: ZoneVersion) -> Result<()>;

    /// Remove an inactive version
    ///
    /// An explicit refusal from the registrar is an error, not `Ok`.
    async fn delete_version(&self, zone: ZoneId, version: ZoneVersion) -> Result<()>;

    /// Registrar name (for logging/debugging)
    fn registrar_name(&self) -> &'static str;
}
