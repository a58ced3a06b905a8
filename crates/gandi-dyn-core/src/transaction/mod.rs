//! Zone update transaction
//!
//! The ZoneUpdater is responsible for:
//! - Resolving the current public IPv4 address via IpResolver
//! - Detecting A records that drifted away from it
//! - Publishing a corrected zone version via Registrar
//! - Deleting the half-built version when anything goes wrong
//!
//! ## Flow
//!
//! ```text
//! INIT ──▶ DETECT_DRIFT ──▶ UNCHANGED ──────────────────────────▶ DONE (no-op)
//!                │
//!                ▼
//!             DRIFTED ──▶ CLONE_VERSION ──▶ APPLY_CHANGES ──▶ ACTIVATE ──▶ DONE (changed)
//!                                               │                │
//!                                               ▼                ▼
//!                                           ROLLBACK ◀───────────┘
//!                                               │
//!                                               ▼
//!                                          DONE (error)
//! ```
//!
//! ## Guarantees
//!
//! 1. No mutating call is issued unless at least one A record drifted
//! 2. A cloned version is either activated with every change applied, or deleted
//! 3. The error returned is always the one that aborted the update; a failed
//!    rollback is logged only
//! 4. Every call is awaited before the next one is issued
//!
//! The version that was active before a successful swap is left in place.

use crate::error::{Error, Result, Stage, UpdateError};
use crate::traits::{IpResolver, Record, Registrar, ZoneId, ZoneVersion};
use std::net::Ipv4Addr;
use tracing::{debug, error, info, warn};

/// Remote method reported when a record deletion removes nothing
const RECORD_DELETE_METHOD: &str = "domain.zone.record.delete";

/// A record that was replaced in the new zone version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacedRecord {
    /// Record as found in the cloned version
    pub previous: Record,
    /// Record created by the registrar in its place
    pub current: Record,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every A record already points at the current address
    Unchanged {
        /// The current IP address
        ip: Ipv4Addr,
    },

    /// A new zone version with the current address is live
    Changed {
        /// The new IP address
        ip: Ipv4Addr,
        /// Zone that was updated
        zone: ZoneId,
        /// Version that is now active
        version: ZoneVersion,
        /// Records that were replaced
        replaced: Vec<ReplacedRecord>,
    },

    /// Dry run: records that would have been replaced
    Pending {
        /// The new IP address
        ip: Ipv4Addr,
        /// Zone that would be updated
        zone: ZoneId,
        /// Stale A records of the active version
        stale: Vec<Record>,
    },
}

impl Outcome {
    /// Whether the zone differs (or differed) from the current address
    pub fn is_change(&self) -> bool {
        !matches!(self, Outcome::Unchanged { .. })
    }

    /// The address the run was based on
    pub fn ip(&self) -> Ipv4Addr {
        match self {
            Outcome::Unchanged { ip }
            | Outcome::Changed { ip, .. }
            | Outcome::Pending { ip, .. } => *ip,
        }
    }
}

/// Zone update transaction
///
/// Owns the lifecycle of any zone version it clones during a run. One
/// instance can be run any number of times; nothing is remembered between
/// runs.
pub struct ZoneUpdater {
    /// IP resolver for the current address
    ip_resolver: Box<dyn IpResolver>,

    /// Registrar holding the zone
    registrar: Box<dyn Registrar>,

    /// Dry-run mode: detect drift but publish nothing
    dry_run: bool,
}

impl ZoneUpdater {
    /// Create a new updater
    pub fn new(ip_resolver: Box<dyn IpResolver>, registrar: Box<dyn Registrar>) -> Self {
        Self {
            ip_resolver,
            registrar,
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Bring the A records of `domain` in line with the current public IP
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: nothing to do, the zone was updated, or (dry run)
    ///   what would have been updated
    /// - `Err(UpdateError)`: the stage that failed and the triggering error
    pub async fn run(&self, domain: &str) -> std::result::Result<Outcome, UpdateError> {
        let ip = self
            .ip_resolver
            .current()
            .await
            .map_err(|e| UpdateError::new(Stage::ResolveIp, e))?;
        info!("Current IP: {} (from {})", ip, self.ip_resolver.describe());

        let zone = self
            .registrar
            .zone_id(domain)
            .await
            .map_err(|e| UpdateError::new(Stage::ResolveZone, e))?;
        info!("Zone of {}: {}", domain, zone);

        self.reconcile(zone, ip).await
    }

    /// Bring the A records of `zone` in line with `ip`
    ///
    /// This is [`ZoneUpdater::run`] without the IP and zone lookups.
    pub async fn reconcile(
        &self,
        zone: ZoneId,
        ip: Ipv4Addr,
    ) -> std::result::Result<Outcome, UpdateError> {
        let ip_text = ip.to_string();

        let records = self
            .registrar
            .list_records(zone, ZoneVersion::ACTIVE)
            .await
            .map_err(|e| UpdateError::new(Stage::DetectDrift, e))?;
        debug!("Active version of zone {} has {} record(s)", zone, records.len());

        let stale: Vec<Record> = records
            .into_iter()
            .filter(|r| r.is_stale(&ip_text))
            .collect();

        if stale.is_empty() {
            info!("IP unchanged, zone {} is up to date", zone);
            return Ok(Outcome::Unchanged { ip });
        }

        if self.dry_run {
            for record in &stale {
                info!("[DRY-RUN] Would update {} -> {}", record, ip_text);
            }
            return Ok(Outcome::Pending { ip, zone, stale });
        }

        let version = self
            .registrar
            .clone_version(zone)
            .await
            .map_err(|e| UpdateError::new(Stage::CloneVersion, e))?;
        info!("Cloned active version of zone {} into version {}", zone, version);

        let replaced = match self.apply_changes(zone, version, &ip_text).await {
            Ok(replaced) => replaced,
            Err(e) => {
                warn!("Failed to apply records, deleting zone version {}: {}", version, e);
                self.rollback(zone, version).await;
                return Err(UpdateError::new(Stage::ApplyChanges, e));
            }
        };

        if let Err(e) = self.registrar.activate_version(zone, version).await {
            error!("Zone activation failed for version {}: {}", version, e);
            self.rollback(zone, version).await;
            return Err(UpdateError::new(Stage::Activate, e));
        }

        info!(
            "Zone {} version {} activated with {} updated record(s)",
            zone,
            version,
            replaced.len()
        );
        Ok(Outcome::Changed {
            ip,
            zone,
            version,
            replaced,
        })
    }

    /// Replace every stale A record of the cloned version
    ///
    /// Stops at the first failure; the caller discards the version.
    async fn apply_changes(
        &self,
        zone: ZoneId,
        version: ZoneVersion,
        ip: &str,
    ) -> Result<Vec<ReplacedRecord>> {
        // The clone is a fresh snapshot, list it again
        let records = self.registrar.list_records(zone, version).await?;

        let stale: Vec<Record> = records.into_iter().filter(|r| r.is_stale(ip)).collect();

        // Every id must be usable before the first record is touched
        for record in &stale {
            record.id.numeric()?;
        }

        let mut replaced = Vec::new();
        for record in stale {
            info!("Updating {} -> {}", record, ip);
            let deleted = self
                .registrar
                .delete_record(zone, version, &record.id)
                .await?;
            if deleted < 1 {
                return Err(Error::remote_logic(
                    RECORD_DELETE_METHOD,
                    format!("no record deleted for id {}", record.id),
                ));
            }

            let current = self
                .registrar
                .add_record(zone, version, &record.with_value(ip))
                .await?;
            debug!("Created {}", current);

            replaced.push(ReplacedRecord {
                previous: record,
                current,
            });
        }

        Ok(replaced)
    }

    /// Delete a version this run cloned but could not activate
    async fn rollback(&self, zone: ZoneId, version: ZoneVersion) {
        match self.registrar.delete_version(zone, version).await {
            Ok(()) => info!("Deleted zone version {}", version),
            Err(e) => {
                let err = Error::compensation(version.0, e.to_string());
                error!("Rollback failed, version left behind: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_change() {
        let ip = Ipv4Addr::new(1, 2, 3, 4);

        assert!(!Outcome::Unchanged { ip }.is_change());
        assert!(
            Outcome::Pending {
                ip,
                zone: ZoneId(1),
                stale: Vec::new(),
            }
            .is_change()
        );
        assert_eq!(Outcome::Unchanged { ip }.ip(), ip);
    }
}
