//! Core traits for the zone updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Discover the current public IPv4 address
//! - [`Registrar`]: Read and publish versioned DNS zones

pub mod ip_resolver;
pub mod registrar;

pub use ip_resolver::IpResolver;
pub use registrar::{
    RECORD_TYPE_A, Record, RecordDraft, RecordId, Registrar, ZoneId, ZoneVersion,
};
