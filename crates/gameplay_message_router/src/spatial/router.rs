//! The position-aware message router.

use super::grid::{CellId, CellSet};
use super::registry::{SpatialInfo, SpatialRegistry};
use crate::config::{RouterConfig, DEFAULT_CELL_SIZE, MIN_CELLS_PER_LISTENER};
use crate::context::{MessageContext, WorldContext};
use crate::error::RouterError;
use crate::message::{Message, MessageType};
use crate::system::engine::{Broadcast, RouterShared};
use crate::system::listeners::typed_callback;
use crate::system::{ListenerHandle, ListenerOptions, MessageCallback, RouterStats};
use crate::tag::ChannelTag;
use crate::types::{BroadcastResult, RouterId, TargetId, Vec3};
use std::sync::Arc;
use tracing::{debug, warn};

/// Message router whose listeners only hear messages broadcast within their
/// listen radius.
///
/// Listeners are bucketed into a uniform grid. A broadcast at a position
/// consults only the cell containing that position, then checks the exact 3D
/// distance against each candidate's radius.
#[derive(Clone)]
pub struct SpatialMessageRouter {
    shared: Arc<RouterShared<SpatialRegistry>>,
}

impl std::fmt::Debug for SpatialMessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialMessageRouter")
            .field("id", &self.shared.id())
            .field("listeners", &self.shared.listener_count())
            .field("cells", &self.cell_count())
            .field("config", self.shared.config())
            .finish()
    }
}

impl SpatialMessageRouter {
    /// Creates a spatial router with the default 16 m grid.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a spatial router with the given configuration.
    ///
    /// An invalid cell size is replaced by the default one.
    pub fn with_config(mut config: RouterConfig) -> Self {
        let cell_size = config.spatial.cell_size;
        if !cell_size.is_finite() || cell_size <= 0.0 {
            warn!(
                "⚠️ Invalid grid cell size {}, using {} instead",
                cell_size, DEFAULT_CELL_SIZE
            );
            config.spatial.cell_size = DEFAULT_CELL_SIZE;
        }

        let registry = SpatialRegistry::new(
            config.spatial.cell_size,
            config.spatial.overlap_warning_threshold.max(1),
            config.spatial.max_cells_per_listener.max(MIN_CELLS_PER_LISTENER),
        );
        Self {
            shared: Arc::new(RouterShared::new("spatial", config, registry)),
        }
    }

    pub fn id(&self) -> RouterId {
        self.shared.id()
    }

    pub fn config(&self) -> &RouterConfig {
        self.shared.config()
    }

    pub fn default_channel(&self) -> &ChannelTag {
        self.shared.default_channel()
    }

    /// Edge length of a grid cell in world meters.
    pub fn cell_size(&self) -> f64 {
        self.shared.with_registry(|registry| registry.cell_size())
    }

    /// Largest listen radius the grid accepts; larger radii are clamped.
    pub fn max_listen_radius(&self) -> f64 {
        self.shared.with_registry(|registry| registry.max_radius())
    }

    /// Installs the provider answering world and target liveness queries.
    pub fn set_world_context(&self, world: Arc<dyn WorldContext>) {
        self.shared.set_world(world);
    }

    pub fn stats(&self) -> RouterStats {
        self.shared.stats()
    }

    /// Registers a typed listener at `position` hearing broadcasts within `radius`.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to listen on
    /// * `position` - Listen position in world space
    /// * `radius` - Listen radius; negative, NaN or infinite values are treated
    ///   as 0, values above [`max_listen_radius`](Self::max_listen_radius) are clamped
    /// * `options` - Match rule, priority and optional target affinity
    /// * `callback` - Invoked with the callback context and the message
    pub fn register_at<T, F>(
        &self,
        channel: impl Into<ChannelTag>,
        position: Vec3,
        radius: f64,
        options: ListenerOptions,
        callback: F,
    ) -> ListenerHandle
    where
        T: Message,
        F: Fn(&mut MessageContext<'_>, &T) + Send + Sync + 'static,
    {
        self.register_raw_at(
            &MessageType::of::<T>(),
            channel,
            position,
            radius,
            options,
            typed_callback(callback),
        )
    }

    /// Registers a typed listener on the default channel, matched partially.
    pub fn register_simple_at<T, F>(
        &self,
        position: Vec3,
        radius: f64,
        priority: impl Into<i32>,
        callback: F,
    ) -> ListenerHandle
    where
        T: Message,
        F: Fn(&mut MessageContext<'_>, &T) + Send + Sync + 'static,
    {
        let channel = self.default_channel().clone();
        self.register_at(
            channel,
            position,
            radius,
            ListenerOptions::partial().with_priority(priority),
            callback,
        )
    }

    /// Registers a type-erased listener for `message_type`.
    pub fn register_raw_at(
        &self,
        message_type: &MessageType,
        channel: impl Into<ChannelTag>,
        position: Vec3,
        radius: f64,
        options: ListenerOptions,
        callback: MessageCallback,
    ) -> ListenerHandle {
        let radius = if radius.is_finite() && radius >= 0.0 {
            radius
        } else {
            warn!("⚠️ Listen radius {} is invalid, clamping to 0", radius);
            0.0
        };

        self.shared.register(
            message_type,
            channel.into(),
            options,
            SpatialInfo { position, radius },
            callback,
        )
    }

    /// Removes the listener behind `handle` from every cell it occupies and
    /// invalidates the handle. Problems are logged and otherwise ignored.
    pub fn unregister(&self, handle: &mut ListenerHandle) {
        self.shared.unregister(handle);
    }

    /// Like [`unregister`](Self::unregister) but reports why nothing was removed.
    pub fn try_unregister(&self, handle: &mut ListenerHandle) -> Result<(), RouterError> {
        self.shared.try_unregister(handle)
    }

    /// Moves a listener and optionally changes its radius.
    ///
    /// `None` or a negative, NaN or infinite radius keeps the current one.
    /// Radii above [`max_listen_radius`](Self::max_listen_radius) are
    /// clamped. Returns false, after logging a warning, if the handle is
    /// invalid, belongs to another router or has no listener here.
    pub fn update_location(&self, handle: &ListenerHandle, position: Vec3, radius: Option<f64>) -> bool {
        match self.try_update_location(handle, position, radius) {
            Ok(_) => true,
            Err(e) => {
                warn!("⚠️ Ignoring location update: {}", e);
                false
            }
        }
    }

    /// Like [`update_location`](Self::update_location) but returns the new
    /// spatial info or the reason nothing changed.
    pub fn try_update_location(
        &self,
        handle: &ListenerHandle,
        position: Vec3,
        radius: Option<f64>,
    ) -> Result<SpatialInfo, RouterError> {
        self.shared.check_handle(handle)?;
        let id = handle.id();
        let (old, new) = self
            .shared
            .with_registry(|registry| registry.relocate(id, position, radius))?;

        debug!(
            "📍 Moved spatial listener {} from {} (r={}) to {} (r={})",
            id, old.position, old.radius, new.position, new.radius
        );
        Ok(new)
    }

    /// Broadcasts `message` at `position` on `channel`.
    pub fn broadcast_at<T: Message>(
        &self,
        channel: &ChannelTag,
        message: &mut T,
        position: Vec3,
    ) -> BroadcastResult {
        self.broadcast_raw_at(channel, &MessageType::of::<T>(), message, position, None)
    }

    /// Broadcasts `message` at `position`, addressed to `target`.
    pub fn broadcast_to_at<T: Message>(
        &self,
        channel: &ChannelTag,
        message: &mut T,
        position: Vec3,
        target: TargetId,
    ) -> BroadcastResult {
        self.broadcast_raw_at(channel, &MessageType::of::<T>(), message, position, Some(target))
    }

    /// Broadcasts `message` at `position` on the default channel.
    pub fn broadcast_simple_at<T: Message>(&self, message: &mut T, position: Vec3) -> BroadcastResult {
        let channel = self.default_channel().clone();
        self.broadcast_at(&channel, message, position)
    }

    /// Type-erased spatial broadcast. Only listeners registered in the cell
    /// containing `position` are considered.
    pub fn broadcast_raw_at(
        &self,
        channel: &ChannelTag,
        message_type: &MessageType,
        payload: &mut dyn Message,
        position: Vec3,
        target: Option<TargetId>,
    ) -> BroadcastResult {
        self.shared.broadcast(
            Broadcast {
                channel,
                message_type,
                target,
                origin: position,
            },
            payload,
            |registry| registry.snapshot_at(position),
        )
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listener_count()
    }

    /// Number of non-empty grid cells.
    pub fn cell_count(&self) -> usize {
        self.shared.with_registry(|registry| registry.cell_count())
    }

    /// Number of listeners registered in `cell`.
    pub fn cell_population(&self, cell: CellId) -> usize {
        self.shared.with_registry(|registry| registry.cell_population(cell))
    }

    /// Current position and radius of the listener behind `handle`.
    pub fn spatial_info(&self, handle: &ListenerHandle) -> Option<SpatialInfo> {
        self.shared.check_handle(handle).ok()?;
        let id = handle.id();
        self.shared.with_registry(|registry| registry.spatial_info(id))
    }

    /// Grid cells the listener behind `handle` occupies.
    pub fn cells_of(&self, handle: &ListenerHandle) -> Option<CellSet> {
        self.shared.check_handle(handle).ok()?;
        let id = handle.id();
        self.shared.with_registry(|registry| registry.cells_of(id))
    }

    /// Drops every listener and cell.
    pub fn reset(&self) {
        self.shared.reset();
    }
}

impl Default for SpatialMessageRouter {
    fn default() -> Self {
        Self::new()
    }
}
