/// Broadcast methods for the global router
use super::core::MessageRouter;
use super::engine::Broadcast;
use crate::message::{Message, MessageType};
use crate::tag::ChannelTag;
use crate::types::{BroadcastResult, TargetId};

impl MessageRouter {
    /// Broadcasts `message` on `channel` to every matching listener.
    ///
    /// The message is passed by mutable reference: listeners that override
    /// the payload leave their replacement in `message` once this returns.
    pub fn broadcast<T: Message>(&self, channel: &ChannelTag, message: &mut T) -> BroadcastResult {
        self.broadcast_raw(channel, &MessageType::of::<T>(), message, None)
    }

    /// Broadcasts `message` addressed to `target`.
    ///
    /// Listeners without target affinity receive it as usual; listeners bound
    /// to a different target do not.
    pub fn broadcast_to<T: Message>(
        &self,
        channel: &ChannelTag,
        message: &mut T,
        target: TargetId,
    ) -> BroadcastResult {
        self.broadcast_raw(channel, &MessageType::of::<T>(), message, Some(target))
    }

    /// Broadcasts `message` on the default channel.
    pub fn broadcast_simple<T: Message>(&self, message: &mut T) -> BroadcastResult {
        let channel = self.default_channel().clone();
        self.broadcast(&channel, message)
    }

    /// Type-erased broadcast.
    ///
    /// `payload` must have the concrete type `message_type` describes;
    /// otherwise nothing is delivered and a warning is logged.
    pub fn broadcast_raw(
        &self,
        channel: &ChannelTag,
        message_type: &MessageType,
        payload: &mut dyn Message,
        target: Option<TargetId>,
    ) -> BroadcastResult {
        let type_key = message_type.key();
        self.shared.broadcast(
            Broadcast {
                channel,
                message_type,
                target,
                origin: (),
            },
            payload,
            |registry| registry.snapshot(type_key),
        )
    }
}
