//! Error types for the zone updater
//!
//! This module defines all error types used throughout the workspace.

use std::fmt;
use thiserror::Error;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zone updater
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP failure reaching the IP endpoint or the registrar
    #[error("transport error ({endpoint}): {message}")]
    Transport {
        /// Endpoint or remote method that was being called
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Malformed IP address or record identifier
    #[error("validation error: {0}")]
    Validation(String),

    /// The registrar answered but reported a failure
    #[error("{method}: {message}")]
    RemoteLogic {
        /// Remote method name
        method: String,
        /// Error message
        message: String,
    },

    /// XML-RPC fault returned by the registrar
    #[error("{method}: fault {code}: {message}")]
    Fault {
        /// Remote method name
        method: String,
        /// Fault code reported by the registrar
        code: i64,
        /// Fault string reported by the registrar
        message: String,
    },

    /// Response could not be decoded into the expected shape
    #[error("protocol error ({method}): {message}")]
    Protocol {
        /// Remote method name
        method: String,
        /// Error message
        message: String,
    },

    /// Rollback of a cloned zone version failed
    #[error("failed to delete zone version {version}: {message}")]
    Compensation {
        /// The version that could not be removed
        version: i64,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport error
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a remote logic error
    pub fn remote_logic(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteLogic {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a fault error
    pub fn fault(method: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self::Fault {
            method: method.into(),
            code,
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create a compensation error
    pub fn compensation(version: i64, message: impl Into<String>) -> Self {
        Self::Compensation {
            version,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the failure happened before the remote side answered
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Whether the remote side answered with an application-level failure
    pub fn is_remote_logic(&self) -> bool {
        matches!(self, Self::RemoteLogic { .. } | Self::Fault { .. })
    }
}

/// Step of the zone update in which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching the current public IP
    ResolveIp,
    /// Looking up the zone of the domain
    ResolveZone,
    /// Listing the active version and comparing A records
    DetectDrift,
    /// Cloning the active version
    CloneVersion,
    /// Replacing A records in the cloned version
    ApplyChanges,
    /// Making the cloned version live
    Activate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolveIp => "resolve ip",
            Stage::ResolveZone => "resolve zone",
            Stage::DetectDrift => "detect drift",
            Stage::CloneVersion => "clone version",
            Stage::ApplyChanges => "apply changes",
            Stage::Activate => "activate version",
        };
        f.write_str(name)
    }
}

/// A failed zone update: the stage it stopped in and the triggering error
///
/// A rollback failure is logged by the transaction and never replaces
/// `source` here.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct UpdateError {
    /// Stage that failed
    pub stage: Stage,
    /// The error that aborted the update
    #[source]
    pub source: Error,
}

impl UpdateError {
    /// Wrap an error with the stage it happened in
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }
}
