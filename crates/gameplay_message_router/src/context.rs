//! Per-invocation callback context and the world liveness provider.
//!
//! ## Key Types
//!
//! - [`MessageContext`] - What a listener sees about the broadcast that reached it,
//!   and the only way to cancel or interrupt that broadcast
//! - [`WorldContext`] - Liveness queries the router asks before dispatching
//! - [`AlwaysActiveWorld`] - Default provider: everything is alive

use crate::message::MessageType;
use crate::tag::ChannelTag;
use crate::types::{BroadcastResult, HandleId, TargetId, Vec3};
use std::fmt::Debug;

/// Context handed to a listener callback for the duration of one invocation.
///
/// It borrows the broadcast's [`BroadcastResult`], so cancellation requests
/// land on the broadcast that is currently being dispatched. A nested
/// broadcast started from inside a callback gets a context of its own.
pub struct MessageContext<'a> {
    channel: &'a ChannelTag,
    message_type: &'a MessageType,
    target: Option<TargetId>,
    origin: Option<Vec3>,
    listener: HandleId,
    result: &'a mut BroadcastResult,
}

impl<'a> MessageContext<'a> {
    pub(crate) fn new(
        channel: &'a ChannelTag,
        message_type: &'a MessageType,
        target: Option<TargetId>,
        origin: Option<Vec3>,
        listener: HandleId,
        result: &'a mut BroadcastResult,
    ) -> Self {
        Self {
            channel,
            message_type,
            target,
            origin,
            listener,
            result,
        }
    }

    /// Channel the message was broadcast on.
    pub fn channel(&self) -> &ChannelTag {
        self.channel
    }

    pub fn message_type(&self) -> &MessageType {
        self.message_type
    }

    /// Target the broadcast was addressed to, if any.
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    /// Broadcast position for spatial broadcasts.
    pub fn origin(&self) -> Option<Vec3> {
        self.origin
    }

    /// Handle id of the listener being invoked.
    pub fn listener(&self) -> HandleId {
        self.listener
    }

    /// Flags the current broadcast.
    ///
    /// `cancel` is reported back to the sender and does not stop delivery.
    /// `interrupt` stops delivery to every listener after this one.
    /// Both flags are overwritten, so a later listener may withdraw an
    /// earlier cancellation.
    pub fn cancel_message(&mut self, cancel: bool, interrupt: bool) {
        self.result.cancelled = cancel;
        self.result.interrupted = interrupt;
    }

    pub fn is_cancelled(&self) -> bool {
        self.result.cancelled
    }

    pub fn is_interrupted(&self) -> bool {
        self.result.interrupted
    }
}

/// Answers "is this still alive" questions for the router.
///
/// The router never extends the lifetime of anything it is asked about.
pub trait WorldContext: Send + Sync + Debug {
    /// False once the world the router serves has shut down. Broadcasts on an
    /// inactive world deliver nothing.
    fn is_active(&self) -> bool {
        true
    }

    /// False if the object behind `target` no longer exists. Listeners bound
    /// to a dead target never match.
    fn is_target_valid(&self, _target: TargetId) -> bool {
        true
    }
}

/// World provider used when none is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysActiveWorld;

impl WorldContext for AlwaysActiveWorld {}
