// # gandi-dyn-core
//
// Core library for the zone-versioned dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpResolver**: Trait for discovering the current public IPv4 address
// - **Registrar**: Trait for reading and publishing versioned DNS zones
// - **ZoneUpdater**: Transaction that clones, patches and activates a zone
//   version, deleting it again if anything fails
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single-Shot**: One run, one attempt per remote call, no retries
// 3. **All or Nothing**: A zone version is activated fully updated or not at all
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Stateless**: Nothing is kept between runs

pub mod config;
pub mod error;
pub mod traits;
pub mod transaction;
pub mod validate;

// Re-export core types for convenience
pub use config::{IpEndpointConfig, RegistrarConfig, UpdaterConfig};
pub use error::{Error, Result, Stage, UpdateError};
pub use traits::{IpResolver, Record, RecordDraft, RecordId, Registrar, ZoneId, ZoneVersion};
pub use transaction::{Outcome, ReplacedRecord, ZoneUpdater};
pub use validate::parse_ipv4;
