/// Statistics tracking for routers
use serde::{Deserialize, Serialize};

/// Router statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterStats {
    /// Listeners currently registered
    pub active_listeners: usize,
    /// Total registrations since the router was created
    pub registrations: u64,
    /// Total successful unregistrations, including stale purges
    pub unregistrations: u64,
    /// Total broadcasts sent
    pub broadcasts: u64,
    /// Total callback invocations across all broadcasts
    pub deliveries: u64,
    /// Broadcasts that ended with the cancelled flag set
    pub cancelled_broadcasts: u64,
    /// Broadcasts stopped early by a listener
    pub interrupted_broadcasts: u64,
    /// Listeners removed because their message type was unloaded
    pub stale_listeners_purged: u64,
}

impl RouterStats {
    /// Average number of callbacks per broadcast
    pub fn deliveries_per_broadcast(&self) -> f64 {
        if self.broadcasts == 0 {
            0.0
        } else {
            self.deliveries as f64 / self.broadcasts as f64
        }
    }
}
