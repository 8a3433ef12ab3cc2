/// Unregistration and introspection for the global router
use super::core::MessageRouter;
use super::handle::ListenerHandle;
use crate::error::RouterError;
use crate::message::MessageType;

impl MessageRouter {
    /// Removes the listener behind `handle` and invalidates the handle.
    ///
    /// Invalid handles, handles from another router and handles whose
    /// listener is already gone are logged and otherwise ignored.
    pub fn unregister(&self, handle: &mut ListenerHandle) {
        self.shared.unregister(handle);
    }

    /// Like [`unregister`](Self::unregister) but reports why nothing was removed.
    pub fn try_unregister(&self, handle: &mut ListenerHandle) -> Result<(), RouterError> {
        self.shared.try_unregister(handle)
    }

    /// Total number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listener_count()
    }

    /// Number of listeners registered for `message_type`.
    pub fn listener_count_for(&self, message_type: &MessageType) -> usize {
        let type_key = message_type.key();
        self.shared.with_registry(|registry| registry.count_for(type_key))
    }

    pub fn has_listeners(&self, message_type: &MessageType) -> bool {
        self.listener_count_for(message_type) > 0
    }

    /// Number of message types with at least one listener.
    pub fn message_type_count(&self) -> usize {
        self.shared.with_registry(|registry| registry.type_count())
    }

    /// Drops every listener. Outstanding handles become harmless no-ops.
    pub fn reset(&self) {
        self.shared.reset();
    }
}
