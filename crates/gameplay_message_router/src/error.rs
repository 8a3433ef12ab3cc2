//! Error types for router operations.
//!
//! Most router operations treat these conditions as recoverable: they log a
//! warning and degrade to a no-op. The `try_*` variants surface them to
//! callers that want to react.

use crate::types::{HandleId, RouterId};

/// Errors that can occur while registering, unregistering or relocating
/// listeners, or while moving payloads across the scripting boundary.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The handle was never issued or has already been unregistered
    #[error("Invalid listener handle")]
    InvalidHandle,
    /// The handle was issued by a different router instance
    #[error("Handle belongs to router {handle_router}, not {router}")]
    ForeignHandle {
        handle_router: RouterId,
        router: RouterId,
    },
    /// The handle looks valid but the router has no entry for it
    #[error("No listener registered for handle {0}")]
    UnknownHandle(HandleId),
    /// A payload did not have the type the operation expected
    #[error("Payload type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
    },
    /// The message type was unloaded while still referenced
    #[error("Message type '{0}' is no longer valid")]
    StaleMessageType(String),
    /// A channel tag failed validation
    #[error("Invalid channel tag '{0}': {1}")]
    InvalidChannel(String, String),
    /// Converting a dynamic payload failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors reported by [`RouterConfig::validate`](crate::RouterConfig::validate).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid grid cell size {0}: must be finite and greater than 0")]
    InvalidCellSize(f64),
    #[error("Invalid default channel: {0}")]
    InvalidDefaultChannel(String),
    #[error("Overlap warning threshold must be greater than 0")]
    InvalidOverlapThreshold,
    #[error("Invalid per-listener cell cap {0}: must be at least 9")]
    InvalidMaxCells(usize),
}
