//! # Gameplay Message Router
//!
//! An in-process publish/subscribe router for gameplay code. Systems send
//! typed messages on hierarchical channels (`"Combat.Damage.Fire"`) and
//! listeners registered for that message type and channel are invoked
//! synchronously, in priority order, on the broadcasting thread.
//!
//! ## Core Features
//!
//! - **Typed payloads**: any `Send + Sync + Debug` type is a message
//! - **Hierarchical channels**: exact or partial (descendant) matching
//! - **Priority bands**: lower values run first, ties keep registration order
//! - **Cancellation and interruption**: listeners can mark a broadcast
//!   cancelled and stop the remaining listeners from running
//! - **Payload override**: listeners can replace the payload in place
//! - **Target affinity**: listeners can be bound to a single target id
//! - **Spatial routing**: listeners with a position and radius, bucketed in a
//!   uniform grid, hear only broadcasts made close enough to them
//! - **Async streams**: await messages instead of handling them in a callback
//! - **Scripting boundary**: script-defined message types with JSON payloads
//!
//! ## Key Types
//!
//! - [`MessageRouter`] - Global router keyed by message type
//! - [`SpatialMessageRouter`] - Position-aware router over a uniform grid
//! - [`ChannelTag`] - Dotted hierarchical channel name
//! - [`MessageContext`] - Per-callback view of the broadcast in flight
//! - [`ListenerHandle`] - Token returned by registration, used to unregister
//! - [`MessageStream`] - Async stream of messages for one registration
//!
//! ## Quick Start Example
//!
//! ```rust
//! use gameplay_message_router::*;
//!
//! #[derive(Debug, Clone)]
//! struct DamageTaken {
//!     amount: f32,
//! }
//!
//! let router = MessageRouter::new();
//!
//! // Shields run first and absorb everything
//! router.register(
//!     "Combat.Damage",
//!     ListenerOptions::partial().with_priority(MessagePriority::Highest),
//!     |ctx, _msg: &DamageTaken| ctx.cancel_message(true, true),
//! );
//! router.register(
//!     "Combat.Damage",
//!     ListenerOptions::partial(),
//!     |_ctx, msg: &DamageTaken| println!("took {} damage", msg.amount),
//! );
//!
//! let result = router.broadcast(&ChannelTag::new("Combat.Damage.Fire"), &mut DamageTaken { amount: 12.0 });
//! assert!(result.cancelled && result.interrupted);
//! ```

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod listen;
pub mod message;
pub mod script;
pub mod spatial;
pub mod system;
pub mod tag;
pub mod types;

// tests
mod tests;

pub use config::{presets, RouterConfig, SpatialConfig, DEFAULT_CELL_SIZE};
pub use context::{AlwaysActiveWorld, MessageContext, WorldContext};
pub use error::{ConfigValidationError, RouterError};
pub use listen::{MessageStream, ReceivedMessage};
pub use message::{Message, MessageType, MessageTypeKey, Payload, WeakMessageType};
pub use spatial::{CellId, CellSet, SpatialInfo, SpatialMessageRouter};
pub use system::{ListenerHandle, ListenerOptions, MessageCallback, MessageRouter, RouterStats};
pub use tag::{ChannelTag, DEFAULT_CHANNEL};
pub use types::*;

// External dependencies callers commonly need
pub use serde_json;
