/// Listener registration for the global router
use super::core::MessageRouter;
use super::handle::ListenerHandle;
use super::listeners::{typed_callback, GlobalScope, ListenerOptions, MessageCallback};
use crate::context::MessageContext;
use crate::message::{Message, MessageType};
use crate::tag::ChannelTag;

impl MessageRouter {
    /// Registers a typed listener.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel to listen on; see [`ListenerOptions::match_rule`]
    /// * `options` - Match rule, priority and optional target affinity
    /// * `callback` - Invoked with the callback context and the message
    ///
    /// # Returns
    ///
    /// The handle needed to unregister the listener.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gameplay_message_router::{ListenerOptions, MessageRouter};
    ///
    /// #[derive(Debug)]
    /// struct DoorOpened { door: u32 }
    ///
    /// let router = MessageRouter::new();
    /// let handle = router.register("World.Doors", ListenerOptions::default(), |_ctx, msg: &DoorOpened| {
    ///     println!("door {} opened", msg.door);
    /// });
    /// assert!(handle.is_valid());
    /// ```
    pub fn register<T, F>(
        &self,
        channel: impl Into<ChannelTag>,
        options: ListenerOptions,
        callback: F,
    ) -> ListenerHandle
    where
        T: Message,
        F: Fn(&mut MessageContext<'_>, &T) + Send + Sync + 'static,
    {
        self.register_raw(&MessageType::of::<T>(), channel, options, typed_callback(callback))
    }

    /// Registers a typed listener on the default channel.
    ///
    /// The default channel is matched partially, so this listener also sees
    /// messages sent on channels below it.
    pub fn register_simple<T, F>(&self, priority: impl Into<i32>, callback: F) -> ListenerHandle
    where
        T: Message,
        F: Fn(&mut MessageContext<'_>, &T) + Send + Sync + 'static,
    {
        let channel = self.default_channel().clone();
        self.register(channel, ListenerOptions::partial().with_priority(priority), callback)
    }

    /// Registers a type-erased listener for `message_type`.
    ///
    /// The callback receives the payload as a [`Payload`](crate::Payload) and
    /// may replace it in place; later listeners see the replacement.
    pub fn register_raw(
        &self,
        message_type: &MessageType,
        channel: impl Into<ChannelTag>,
        options: ListenerOptions,
        callback: MessageCallback,
    ) -> ListenerHandle {
        self.shared
            .register(message_type, channel.into(), options, GlobalScope, callback)
    }
}
