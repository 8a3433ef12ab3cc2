/// Core MessageRouter implementation
use super::engine::{Registry, RouterShared};
use super::listeners::{GlobalScope, ListenerEntry, ListenerList};
use super::stats::RouterStats;
use crate::config::RouterConfig;
use crate::context::WorldContext;
use crate::error::RouterError;
use crate::message::MessageTypeKey;
use crate::tag::ChannelTag;
use crate::types::{HandleId, RouterId};
use std::collections::HashMap;
use std::sync::Arc;

/// Listener storage of the global router: one priority-ordered list per
/// message type. A type key disappears as soon as its list is empty.
#[derive(Default)]
pub(crate) struct GlobalRegistry {
    lists: HashMap<MessageTypeKey, ListenerList<ListenerEntry<GlobalScope>>>,
}

impl GlobalRegistry {
    pub fn snapshot(&self, type_key: MessageTypeKey) -> Vec<ListenerEntry<GlobalScope>> {
        self.lists
            .get(&type_key)
            .map(ListenerList::snapshot)
            .unwrap_or_default()
    }

    pub fn count_for(&self, type_key: MessageTypeKey) -> usize {
        self.lists.get(&type_key).map_or(0, ListenerList::len)
    }

    pub fn type_count(&self) -> usize {
        self.lists.len()
    }
}

impl Registry for GlobalRegistry {
    type Scope = GlobalScope;

    fn insert(&mut self, entry: ListenerEntry<GlobalScope>) {
        self.lists.entry(entry.type_key()).or_default().insert(entry);
    }

    fn remove(&mut self, type_key: MessageTypeKey, id: HandleId) -> Result<(), RouterError> {
        let list = self
            .lists
            .get_mut(&type_key)
            .ok_or(RouterError::UnknownHandle(id))?;
        list.remove(id).ok_or(RouterError::UnknownHandle(id))?;
        if list.is_empty() {
            self.lists.remove(&type_key);
        }
        Ok(())
    }

    fn listener_count(&self) -> usize {
        self.lists.values().map(ListenerList::len).sum()
    }

    fn clear(&mut self) {
        self.lists.clear();
    }
}

/// Global message router.
///
/// Listeners register for a message type on a channel and are invoked in
/// priority order whenever a matching message is broadcast. Cloning is cheap
/// and every clone addresses the same router instance.
///
/// Dispatch is synchronous on the broadcasting thread. Callbacks may register,
/// unregister or broadcast again; the broadcast in flight keeps iterating the
/// snapshot it took before the first callback ran.
#[derive(Clone)]
pub struct MessageRouter {
    pub(super) shared: Arc<RouterShared<GlobalRegistry>>,
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("id", &self.shared.id())
            .field("listeners", &self.shared.listener_count())
            .field("config", self.shared.config())
            .finish()
    }
}

impl MessageRouter {
    /// Creates a router with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a router with the given configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            shared: Arc::new(RouterShared::new("global", config, GlobalRegistry::default())),
        }
    }

    /// Identity of this router instance
    #[inline]
    pub fn id(&self) -> RouterId {
        self.shared.id()
    }

    pub fn config(&self) -> &RouterConfig {
        self.shared.config()
    }

    /// Channel used by the "simple" helpers
    pub fn default_channel(&self) -> &ChannelTag {
        self.shared.default_channel()
    }

    /// Installs the provider answering world and target liveness queries.
    pub fn set_world_context(&self, world: Arc<dyn WorldContext>) {
        self.shared.set_world(world);
    }

    /// Gets the current router statistics
    pub fn stats(&self) -> RouterStats {
        self.shared.stats()
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}
