/// Router engine shared by the global and spatial routers.
///
/// A router is a [`RouterShared`] around a registry type. The engine owns
/// everything both variants have in common: handle issuance, registration
/// bookkeeping, unregistration, the dispatch loop, message logging and stats.
/// Registries only decide where entries live and which entries a broadcast
/// considers.
use super::handle::{ListenerHandle, RouterLink};
use super::listeners::{ListenerEntry, ListenerOptions, MembershipScope, MessageCallback};
use super::stats::RouterStats;
use crate::config::RouterConfig;
use crate::context::{AlwaysActiveWorld, MessageContext, WorldContext};
use crate::error::RouterError;
use crate::message::{Message, MessageType, MessageTypeKey, Payload};
use crate::tag::ChannelTag;
use crate::types::{BroadcastResult, HandleId, RouterId, TargetId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

/// Storage strategy of a router variant.
pub(crate) trait Registry: Send + 'static {
    type Scope: MembershipScope;

    fn insert(&mut self, entry: ListenerEntry<Self::Scope>);

    fn remove(&mut self, type_key: MessageTypeKey, id: HandleId) -> Result<(), RouterError>;

    fn listener_count(&self) -> usize;

    fn clear(&mut self);
}

/// Everything a single broadcast carries besides its payload.
pub(crate) struct Broadcast<'a, O> {
    pub channel: &'a ChannelTag,
    pub message_type: &'a MessageType,
    pub target: Option<TargetId>,
    pub origin: O,
}

type OriginOf<R> = <<R as Registry>::Scope as MembershipScope>::Origin;

pub(crate) struct RouterShared<R> {
    id: RouterId,
    kind: &'static str,
    config: RouterConfig,
    default_channel: ChannelTag,
    next_handle: AtomicU64,
    /// Guards every registry structure. Held while mutating or snapshotting,
    /// never while a callback runs.
    registry: Mutex<R>,
    stats: Mutex<RouterStats>,
    world: RwLock<Arc<dyn WorldContext>>,
}

impl<R: Registry> RouterShared<R> {
    pub fn new(kind: &'static str, config: RouterConfig, registry: R) -> Self {
        let default_channel = config.default_channel_tag();
        Self {
            id: RouterId::new(),
            kind,
            config,
            default_channel,
            next_handle: AtomicU64::new(1),
            registry: Mutex::new(registry),
            stats: Mutex::new(RouterStats::default()),
            world: RwLock::new(Arc::new(AlwaysActiveWorld)),
        }
    }

    pub fn id(&self) -> RouterId {
        self.id
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn default_channel(&self) -> &ChannelTag {
        &self.default_channel
    }

    pub fn set_world(&self, world: Arc<dyn WorldContext>) {
        *self.world.write() = world;
    }

    pub fn world(&self) -> Arc<dyn WorldContext> {
        self.world.read().clone()
    }

    /// Runs `f` with the registry locked.
    pub fn with_registry<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.registry.lock())
    }

    pub fn register(
        self: &Arc<Self>,
        message_type: &MessageType,
        channel: ChannelTag,
        options: ListenerOptions,
        scope: R::Scope,
        callback: MessageCallback,
    ) -> ListenerHandle {
        let id = HandleId(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let entry = ListenerEntry {
            id,
            callback,
            message_type: message_type.downgrade(),
            channel,
            match_rule: options.match_rule,
            priority: options.priority,
            target: options.target,
            scope,
        };

        debug!(
            "📝 Registered {} listener {} for {} on '{}' (priority {}, {:?})",
            self.kind, id, message_type, entry.channel, entry.priority, entry.match_rule
        );

        self.registry.lock().insert(entry);
        self.stats.lock().registrations += 1;

        let link: Weak<dyn RouterLink> = Arc::downgrade(self) as Weak<dyn RouterLink>;
        ListenerHandle::new(link, self.id, message_type.key(), id)
    }

    /// Removes a listener by id, bypassing handle checks.
    pub fn remove_listener(&self, type_key: MessageTypeKey, id: HandleId) -> Result<(), RouterError> {
        self.registry.lock().remove(type_key, id)?;
        self.stats.lock().unregistrations += 1;
        debug!("🗑️ Unregistered {} listener {}", self.kind, id);
        Ok(())
    }

    /// Verifies that `handle` belongs to this router and returns its key.
    pub fn check_handle(&self, handle: &ListenerHandle) -> Result<MessageTypeKey, RouterError> {
        if !handle.is_valid() {
            return Err(RouterError::InvalidHandle);
        }
        match handle.router_id() {
            Some(router_id) if router_id == self.id => {}
            Some(router_id) => {
                return Err(RouterError::ForeignHandle {
                    handle_router: router_id,
                    router: self.id,
                })
            }
            None => return Err(RouterError::InvalidHandle),
        }
        handle.message_type_key().ok_or(RouterError::InvalidHandle)
    }

    pub fn try_unregister(&self, handle: &mut ListenerHandle) -> Result<(), RouterError> {
        let type_key = self.check_handle(handle)?;
        let result = self.remove_listener(type_key, handle.id());
        handle.invalidate();
        result
    }

    pub fn unregister(&self, handle: &mut ListenerHandle) {
        if let Err(e) = self.try_unregister(handle) {
            warn!("⚠️ Ignoring unregister on {} router: {}", self.kind, e);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().listener_count()
    }

    pub fn reset(&self) {
        let removed = {
            let mut registry = self.registry.lock();
            let count = registry.listener_count();
            registry.clear();
            count
        };
        info!("🧹 Reset {} router {}: dropped {} listeners", self.kind, self.id, removed);
    }

    pub fn stats(&self) -> RouterStats {
        let mut stats = self.stats.lock().clone();
        stats.active_listeners = self.listener_count();
        stats
    }

    /// Sends `payload` to the entries `collect` picks out of the registry.
    pub fn broadcast<F>(
        &self,
        broadcast: Broadcast<'_, OriginOf<R>>,
        payload: &mut dyn Message,
        collect: F,
    ) -> BroadcastResult
    where
        F: FnOnce(&R) -> Vec<ListenerEntry<R::Scope>>,
    {
        if !broadcast.message_type.accepts(payload) {
            warn!(
                "⚠️ Refusing broadcast on '{}': payload is not a {} ({})",
                broadcast.channel,
                broadcast.message_type,
                broadcast.message_type.payload_type_name()
            );
            return BroadcastResult::default();
        }

        let world = self.world();
        if !world.is_active() {
            warn!(
                "⚠️ Dropping broadcast on '{}': world is no longer active",
                broadcast.channel
            );
            return BroadcastResult::default();
        }

        if self.config.log_messages {
            info!(
                "📨 BroadcastMessage({}, {}, {}): {:?}",
                self.kind, broadcast.channel, broadcast.message_type, payload
            );
        } else {
            trace!(
                "📨 BroadcastMessage({}, {}, {})",
                self.kind, broadcast.channel, broadcast.message_type
            );
        }

        let snapshot = {
            let registry = self.registry.lock();
            collect(&registry)
        };

        self.dispatch(&snapshot, &broadcast, payload, world.as_ref())
    }

    fn dispatch(
        &self,
        snapshot: &[ListenerEntry<R::Scope>],
        broadcast: &Broadcast<'_, OriginOf<R>>,
        payload: &mut dyn Message,
        world: &dyn WorldContext,
    ) -> BroadcastResult {
        let mut result = BroadcastResult::default();
        let mut deliveries = 0u64;
        let mut purged = 0u64;

        for entry in snapshot {
            if entry.message_type.upgrade().is_none() {
                warn!(
                    "⚠️ Listener {} on '{}' refers to an unloaded message type, unregistering it",
                    entry.id, entry.channel
                );
                if self.remove_listener(entry.type_key(), entry.id).is_ok() {
                    purged += 1;
                }
                continue;
            }

            if entry.type_key() != broadcast.message_type.key() {
                continue;
            }

            if let Some(target) = entry.target {
                if broadcast.target != Some(target) || !world.is_target_valid(target) {
                    continue;
                }
            }

            if !entry.accepts_channel(broadcast.channel) {
                continue;
            }

            if !entry.scope.admits(broadcast.origin) {
                continue;
            }

            let mut context = MessageContext::new(
                broadcast.channel,
                broadcast.message_type,
                broadcast.target,
                R::Scope::origin_position(broadcast.origin),
                entry.id,
                &mut result,
            );
            let mut view = Payload::new(&mut *payload);
            (entry.callback)(&mut context, &mut view);
            deliveries += 1;

            if result.interrupted {
                debug!(
                    "✋ Broadcast on '{}' interrupted by listener {}",
                    broadcast.channel, entry.id
                );
                break;
            }
        }

        let mut stats = self.stats.lock();
        stats.broadcasts += 1;
        stats.deliveries += deliveries;
        stats.stale_listeners_purged += purged;
        if result.cancelled {
            stats.cancelled_broadcasts += 1;
        }
        if result.interrupted {
            stats.interrupted_broadcasts += 1;
        }

        result
    }
}

impl<R: Registry> RouterLink for RouterShared<R> {
    fn unlink(&self, type_key: MessageTypeKey, id: HandleId) -> Result<(), RouterError> {
        self.remove_listener(type_key, id)
    }
}
