/// Listener handles returned by registration.
use crate::error::RouterError;
use crate::message::MessageTypeKey;
use crate::types::{HandleId, RouterId};
use std::fmt;
use std::sync::Weak;
use tracing::debug;

/// Back-reference from a handle to the router that issued it.
pub(crate) trait RouterLink: Send + Sync {
    fn unlink(&self, type_key: MessageTypeKey, id: HandleId) -> Result<(), RouterError>;
}

/// Opaque token identifying one listener registration.
///
/// The handle does not keep its router alive. Unregistering is idempotent:
/// the first call removes the listener and invalidates the handle, later
/// calls do nothing. Clones share the registration, so unregistering through
/// one clone leaves the others pointing at a listener that no longer exists;
/// using them afterwards is harmless and only logs a warning.
#[derive(Clone)]
pub struct ListenerHandle {
    router: Option<Weak<dyn RouterLink>>,
    router_id: Option<RouterId>,
    type_key: Option<MessageTypeKey>,
    id: HandleId,
}

impl ListenerHandle {
    pub(crate) fn new(
        router: Weak<dyn RouterLink>,
        router_id: RouterId,
        type_key: MessageTypeKey,
        id: HandleId,
    ) -> Self {
        Self {
            router: Some(router),
            router_id: Some(router_id),
            type_key: Some(type_key),
            id,
        }
    }

    /// True until the handle is unregistered.
    pub fn is_valid(&self) -> bool {
        self.router.is_some() && self.id.is_valid()
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Router instance that issued this handle.
    pub fn router_id(&self) -> Option<RouterId> {
        self.router_id
    }

    pub fn message_type_key(&self) -> Option<MessageTypeKey> {
        self.type_key
    }

    /// Removes the listener from its router and invalidates the handle.
    ///
    /// Does nothing on an invalid handle or when the router is already gone.
    pub fn unregister(&mut self) {
        let Some(link) = self.router.take() else {
            return;
        };

        if let (Some(router), Some(type_key)) = (link.upgrade(), self.type_key) {
            if let Err(e) = router.unlink(type_key, self.id) {
                debug!("🔌 Handle {} was already detached: {}", self.id, e);
            }
        }

        self.invalidate();
    }

    pub(crate) fn invalidate(&mut self) {
        self.router = None;
        self.router_id = None;
        self.type_key = None;
        self.id = HandleId::INVALID;
    }
}

impl Default for ListenerHandle {
    fn default() -> Self {
        Self {
            router: None,
            router_id: None,
            type_key: None,
            id: HandleId::INVALID,
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("router_id", &self.router_id)
            .field("type_key", &self.type_key)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.router_id == other.router_id
    }
}

impl Eq for ListenerHandle {}
