//! Typed request and response shapes of the Gandi domain API
//!
//! Every remote method has a fixed positional signature; the API key is
//! always the first parameter and is added by the client. Response structs
//! mark which fields must be present.

use crate::xmlrpc::{DecodeError, Value};
use gandi_dyn_core::traits::{Record, RecordDraft, RecordId};
use std::collections::BTreeMap;

/// `domain.info(key, domain)` → struct with `zone_id`
pub const DOMAIN_INFO: &str = "domain.info";
/// `domain.zone.record.list(key, zone, version)` → array of records
pub const RECORD_LIST: &str = "domain.zone.record.list";
/// `domain.zone.version.new(key, zone)` → new version number
pub const VERSION_NEW: &str = "domain.zone.version.new";
/// `domain.zone.record.delete(key, zone, version, {id})` → deleted count
pub const RECORD_DELETE: &str = "domain.zone.record.delete";
/// `domain.zone.record.add(key, zone, version, record)` → created record
pub const RECORD_ADD: &str = "domain.zone.record.add";
/// `domain.zone.version.set(key, zone, version)` → boolean
pub const VERSION_SET: &str = "domain.zone.version.set";
/// `domain.zone.version.delete(key, zone, version)` → boolean
pub const VERSION_DELETE: &str = "domain.zone.version.delete";

/// Conversion from a decoded XML-RPC value
pub trait FromValue: Sized {
    /// Convert, failing if the value has the wrong shape
    fn from_value(value: Value) -> Result<Self, DecodeError>;
}

fn mismatch(expected: &str, value: &Value) -> DecodeError {
    DecodeError(format!("expected {}, got {}", expected, value.kind()))
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        Ok(value)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        let v = i64::from_value(value)?;
        u32::try_from(v).map_err(|_| DecodeError(format!("{} out of range", v)))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("array", &other)),
        }
    }
}

/// Record identifiers come back as integers or strings
impl FromValue for RecordId {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Int(v) => Ok(RecordId::new(v.to_string())),
            Value::String(v) => Ok(RecordId::new(v)),
            other => Err(mismatch("int or string", &other)),
        }
    }
}

/// Members of a response struct, consumed field by field
struct Members {
    shape: &'static str,
    fields: BTreeMap<String, Value>,
}

impl Members {
    fn new(shape: &'static str, value: Value) -> Result<Self, DecodeError> {
        match value {
            Value::Struct(fields) => Ok(Self { shape, fields }),
            other => Err(mismatch(shape, &other)),
        }
    }

    fn required<T: FromValue>(&mut self, name: &str) -> Result<T, DecodeError> {
        let value = self
            .fields
            .remove(name)
            .ok_or_else(|| DecodeError(format!("{} has no {:?} field", self.shape, name)))?;
        T::from_value(value).map_err(|e| DecodeError(format!("{}.{}: {}", self.shape, name, e)))
    }

    fn optional<T: FromValue>(&mut self, name: &str) -> Result<Option<T>, DecodeError> {
        match self.fields.remove(name) {
            None | Some(Value::Nil) => Ok(None),
            Some(value) => T::from_value(value)
                .map(Some)
                .map_err(|e| DecodeError(format!("{}.{}: {}", self.shape, name, e))),
        }
    }
}

/// Response of `domain.info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    /// Zone attached to the domain (required)
    pub zone_id: i64,
    /// Fully qualified domain name (optional)
    pub fqdn: Option<String>,
}

impl FromValue for DomainInfo {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        let mut members = Members::new("domain info", value)?;
        Ok(Self {
            zone_id: members.required("zone_id")?,
            fqdn: members.optional("fqdn")?,
        })
    }
}

/// A record as returned by `domain.zone.record.list` and `.add`
impl FromValue for Record {
    fn from_value(value: Value) -> Result<Self, DecodeError> {
        let mut members = Members::new("record", value)?;
        Ok(Record {
            id: members.required("id")?,
            record_type: members.required("type")?,
            name: members.required("name")?,
            value: members.required("value")?,
            ttl: members.optional("ttl")?.unwrap_or(DEFAULT_TTL),
        })
    }
}

/// TTL the registrar applies when a record carries none
pub const DEFAULT_TTL: u32 = 10800;

/// Parameter of `domain.zone.record.delete`: selects records by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFilter {
    /// Numeric record id (required)
    pub id: i64,
}

impl From<RecordFilter> for Value {
    fn from(filter: RecordFilter) -> Self {
        Value::structure([("id", Value::from(filter.id))])
    }
}

/// Parameter of `domain.zone.record.add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Record type (required)
    pub record_type: String,
    /// Subdomain label (required)
    pub name: String,
    /// Record payload (required)
    pub value: String,
    /// Time-to-live in seconds (optional)
    pub ttl: Option<u32>,
}

impl From<&RecordDraft> for NewRecord {
    fn from(draft: &RecordDraft) -> Self {
        Self {
            record_type: draft.record_type.clone(),
            name: draft.name.clone(),
            value: draft.value.clone(),
            ttl: Some(draft.ttl),
        }
    }
}

impl From<NewRecord> for Value {
    fn from(record: NewRecord) -> Self {
        let mut members = vec![
            ("type", Value::from(record.record_type)),
            ("name", Value::from(record.name)),
            ("value", Value::from(record.value)),
        ];
        if let Some(ttl) = record.ttl {
            members.push(("ttl", Value::from(ttl)));
        }
        Value::structure(members)
    }
}
