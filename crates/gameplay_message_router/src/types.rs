//! Core value types shared by both router variants.
//!
//! ## Key Types
//!
//! - [`Vec3`] - World-space position used by the spatial router
//! - [`TargetId`] - Identity of a world object a listener can bind itself to
//! - [`MessagePriority`] - Named priority bands for listener ordering
//! - [`MatchRule`] - How a listener's channel tag is compared against broadcasts
//! - [`BroadcastResult`] - Cancellation/interruption flags returned to senders

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a listener registration, scoped to one router instance.
///
/// Identifiers start at 1 and grow monotonically; `0` is reserved for
/// handles that were never issued or have already been unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl HandleId {
    /// The identifier carried by invalid handles.
    pub const INVALID: HandleId = HandleId(0);

    /// Returns true if this id could have been issued by a router.
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a router instance. Handles remember the router that issued them
/// so a foreign handle is rejected instead of removing an unrelated listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouterId(pub Uuid);

impl RouterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RouterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a world object used for target affinity.
///
/// The router never owns the object behind a `TargetId`; whether it is still
/// alive is answered by the router's [`WorldContext`](crate::WorldContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(pub Uuid);

impl TargetId {
    /// Creates a new random target ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 3D vector for world positions.
///
/// # Examples
///
/// ```rust
/// use gameplay_message_router::Vec3;
///
/// let origin = Vec3::zero();
/// let guard = Vec3::new(3.0, 4.0, 0.0);
/// assert_eq!(guard.distance(origin), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate (height)
    pub z: f64,
}

impl Vec3 {
    /// Creates a new Vec3 with the specified coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculates the Euclidean distance to another Vec3.
    pub fn distance(&self, other: Vec3) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance, used by range checks to avoid the square root.
    pub fn distance_squared(&self, other: Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Creates a zero vector (0, 0, 0).
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Named priority bands. Lower values are invoked first.
///
/// Priorities are plain `i32` values on the wire; the bands are conventions,
/// any value in between (or outside) is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessagePriority {
    Highest,
    Higher,
    Default,
    Lower,
    Lowest,
    /// Observers that must see the final state of a message, after everyone else.
    Monitor,
}

impl MessagePriority {
    /// Numeric value of the band.
    pub const fn value(self) -> i32 {
        match self {
            MessagePriority::Highest => 0,
            MessagePriority::Higher => 25,
            MessagePriority::Default => 50,
            MessagePriority::Lower => 75,
            MessagePriority::Lowest => 100,
            MessagePriority::Monitor => 255,
        }
    }
}

impl Default for MessagePriority {
    fn default() -> Self {
        MessagePriority::Default
    }
}

impl From<MessagePriority> for i32 {
    fn from(priority: MessagePriority) -> Self {
        priority.value()
    }
}

/// How a listener's registered channel is compared with a broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchRule {
    /// Only the exact channel is accepted.
    #[default]
    ExactMatch,
    /// The registered channel and all of its descendants are accepted.
    PartialMatch,
}

/// Outcome flags of a single broadcast.
///
/// Reset before dispatch starts and returned by value once every eligible
/// listener has run (or one of them interrupted the broadcast).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// A listener asked the sender to treat the message as cancelled.
    pub cancelled: bool,
    /// A listener stopped delivery to the remaining listeners.
    pub interrupted: bool,
}

impl BroadcastResult {
    /// Clears both flags.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
