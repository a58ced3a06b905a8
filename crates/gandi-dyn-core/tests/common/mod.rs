//! Test doubles and common utilities for transaction contract tests
//!
//! This module provides an in-memory registrar that behaves like a
//! versioned zone store, records every call, and can be told to fail.

#![allow(dead_code)]

use gandi_dyn_core::error::{Error, Result};
use gandi_dyn_core::traits::{
    IpResolver, Record, RecordDraft, RecordId, Registrar, ZoneId, ZoneVersion,
};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Zone id handed out for the known domain
pub const ZONE: ZoneId = ZoneId(42);

/// Domain known to the scripted registrar
pub const DOMAIN: &str = "example.org";

/// One remote call observed by the scripted registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ZoneId(String),
    ListRecords(ZoneVersion),
    CloneVersion,
    DeleteRecord(ZoneVersion, String),
    AddRecord(ZoneVersion, RecordDraft),
    ActivateVersion(ZoneVersion),
    DeleteVersion(ZoneVersion),
}

impl Call {
    /// Whether this call changes anything at the registrar
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Call::ZoneId(_) | Call::ListRecords(_))
    }
}

/// Failure knobs for the scripted registrar
#[derive(Debug, Default)]
struct Faults {
    clone_fails: bool,
    /// Fail the n-th (1-based) delete_record call
    delete_record_fails_at: Option<usize>,
    /// Report this count instead of the real one
    delete_count: Option<u32>,
    /// Fail the n-th (1-based) add_record call
    add_record_fails_at: Option<usize>,
    activate_refused: bool,
    delete_version_fails: bool,
}

#[derive(Debug)]
struct Zone {
    versions: HashMap<i64, Vec<Record>>,
    active: i64,
    next_version: i64,
    next_record_id: u64,
    calls: Vec<Call>,
    faults: Faults,
}

/// In-memory versioned registrar
///
/// Clones share the same zone, so a test can keep one handle for
/// inspection and box another for the updater.
#[derive(Debug, Clone)]
pub struct ScriptedRegistrar {
    zone: Arc<Mutex<Zone>>,
}

impl ScriptedRegistrar {
    /// Create a registrar whose active version (1) holds `records`
    ///
    /// The first clone becomes version 7 and the first created record gets
    /// id 2002.
    pub fn with_records(records: Vec<Record>) -> Self {
        let mut versions = HashMap::new();
        versions.insert(1, records);

        Self {
            zone: Arc::new(Mutex::new(Zone {
                versions,
                active: 1,
                next_version: 7,
                next_record_id: 2002,
                calls: Vec::new(),
                faults: Faults::default(),
            })),
        }
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.zone.lock().unwrap().calls.clone()
    }

    /// Calls that change the registrar's state
    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutating).collect()
    }

    /// Number of versions currently stored
    pub fn version_count(&self) -> usize {
        self.zone.lock().unwrap().versions.len()
    }

    /// Records of the active version
    pub fn active_records(&self) -> Vec<Record> {
        let zone = self.zone.lock().unwrap();
        zone.versions[&zone.active].clone()
    }

    /// Number of the active version
    pub fn active_version(&self) -> ZoneVersion {
        ZoneVersion(self.zone.lock().unwrap().active)
    }

    pub fn fail_clone(&self) {
        self.zone.lock().unwrap().faults.clone_fails = true;
    }

    pub fn fail_delete_record_at(&self, nth: usize) {
        self.zone.lock().unwrap().faults.delete_record_fails_at = Some(nth);
    }

    pub fn report_delete_count(&self, count: u32) {
        self.zone.lock().unwrap().faults.delete_count = Some(count);
    }

    pub fn fail_add_record_at(&self, nth: usize) {
        self.zone.lock().unwrap().faults.add_record_fails_at = Some(nth);
    }

    pub fn refuse_activation(&self) {
        self.zone.lock().unwrap().faults.activate_refused = true;
    }

    pub fn fail_delete_version(&self) {
        self.zone.lock().unwrap().faults.delete_version_fails = true;
    }

    fn resolve(zone: &Zone, version: ZoneVersion) -> i64 {
        if version == ZoneVersion::ACTIVE {
            zone.active
        } else {
            version.0
        }
    }

    fn count_calls(zone: &Zone, pred: impl Fn(&Call) -> bool) -> usize {
        zone.calls.iter().filter(|c| pred(c)).count()
    }
}

#[async_trait::async_trait]
impl Registrar for ScriptedRegistrar {
    async fn zone_id(&self, domain: &str) -> Result<ZoneId> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls.push(Call::ZoneId(domain.to_string()));

        if domain == DOMAIN {
            Ok(ZONE)
        } else {
            Err(Error::fault("domain.info", 510042, "unknown domain"))
        }
    }

    async fn list_records(&self, _zone: ZoneId, version: ZoneVersion) -> Result<Vec<Record>> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls.push(Call::ListRecords(version));

        let number = Self::resolve(&zone, version);
        zone.versions
            .get(&number)
            .cloned()
            .ok_or_else(|| Error::fault("domain.zone.record.list", 510042, "no such version"))
    }

    async fn clone_version(&self, _zone: ZoneId) -> Result<ZoneVersion> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls.push(Call::CloneVersion);

        if zone.faults.clone_fails {
            return Err(Error::transport("scripted", "connection reset"));
        }

        let number = zone.next_version;
        zone.next_version += 1;
        let records = zone.versions[&zone.active].clone();
        zone.versions.insert(number, records);
        Ok(ZoneVersion(number))
    }

    async fn delete_record(
        &self,
        _zone: ZoneId,
        version: ZoneVersion,
        id: &RecordId,
    ) -> Result<u32> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls
            .push(Call::DeleteRecord(version, id.as_str().to_string()));

        let nth = Self::count_calls(&zone, |c| matches!(c, Call::DeleteRecord(..)));
        if zone.faults.delete_record_fails_at == Some(nth) {
            return Err(Error::transport("scripted", "connection reset"));
        }

        let records = zone
            .versions
            .get_mut(&version.0)
            .ok_or_else(|| Error::fault("domain.zone.record.delete", 510042, "no such version"))?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        let deleted = (before - records.len()) as u32;

        Ok(zone.faults.delete_count.unwrap_or(deleted))
    }

    async fn add_record(
        &self,
        _zone: ZoneId,
        version: ZoneVersion,
        draft: &RecordDraft,
    ) -> Result<Record> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls.push(Call::AddRecord(version, draft.clone()));

        let nth = Self::count_calls(&zone, |c| matches!(c, Call::AddRecord(..)));
        if zone.faults.add_record_fails_at == Some(nth) {
            return Err(Error::fault("domain.zone.record.add", 581042, "invalid record"));
        }

        let id = zone.next_record_id;
        zone.next_record_id += 1;
        let record = Record {
            id: RecordId::new(id.to_string()),
            record_type: draft.record_type.clone(),
            name: draft.name.clone(),
            value: draft.value.clone(),
            ttl: draft.ttl,
        };
        zone.versions
            .get_mut(&version.0)
            .ok_or_else(|| Error::fault("domain.zone.record.add", 510042, "no such version"))?
            .push(record.clone());
        Ok(record)
    }

    async fn activate_version(&self, _zone: ZoneId, version: ZoneVersion) -> Result<()> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls.push(Call::ActivateVersion(version));

        if zone.faults.activate_refused {
            return Err(Error::remote_logic(
                "domain.zone.version.set",
                "zone activation failed for unknown reason",
            ));
        }

        zone.active = version.0;
        Ok(())
    }

    async fn delete_version(&self, _zone: ZoneId, version: ZoneVersion) -> Result<()> {
        let mut zone = self.zone.lock().unwrap();
        zone.calls.push(Call::DeleteVersion(version));

        if zone.faults.delete_version_fails {
            return Err(Error::transport("scripted", "connection reset"));
        }

        zone.versions.remove(&version.0);
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        "scripted"
    }
}

/// An IP resolver that always answers the same way
pub struct FixedIpResolver {
    answer: std::result::Result<Ipv4Addr, String>,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpResolver {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            answer: Ok(ip),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A resolver whose lookups fail with a validation error
    pub fn invalid(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for FixedIpResolver {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(Error::validation)
    }

    fn describe(&self) -> String {
        "fixed".to_string()
    }
}

/// Build a record
pub fn record(id: &str, record_type: &str, name: &str, value: &str) -> Record {
    Record {
        id: RecordId::new(id),
        record_type: record_type.to_string(),
        name: name.to_string(),
        value: value.to_string(),
        ttl: 300,
    }
}

/// An updater wired to a shared handle of `registrar`
pub fn updater(ip: Ipv4Addr, registrar: &ScriptedRegistrar) -> gandi_dyn_core::ZoneUpdater {
    gandi_dyn_core::ZoneUpdater::new(
        Box::new(FixedIpResolver::new(ip)),
        Box::new(registrar.clone()),
    )
}
