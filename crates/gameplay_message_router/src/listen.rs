//! Async "wait for the next message" streams.
//!
//! A [`MessageStream`] is a listener whose callback forwards a copy of every
//! matching message into a channel, so async code can `recv().await` messages
//! instead of handling them inside a synchronous callback. Dropping or closing
//! the stream unregisters the listener.

use crate::context::MessageContext;
use crate::message::Message;
use crate::spatial::SpatialMessageRouter;
use crate::system::{ListenerHandle, ListenerOptions, MessageRouter};
use crate::tag::ChannelTag;
use crate::types::{TargetId, Vec3};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// A message received through a [`MessageStream`].
#[derive(Debug, Clone)]
pub struct ReceivedMessage<T> {
    /// Channel the message was broadcast on
    pub channel: ChannelTag,
    /// Target the broadcast was addressed to
    pub target: Option<TargetId>,
    /// Broadcast position, for spatial routers
    pub origin: Option<Vec3>,
    /// Copy of the payload as this listener saw it
    pub payload: T,
}

/// Stream of messages delivered to one listener registration.
pub struct MessageStream<T> {
    receiver: mpsc::UnboundedReceiver<ReceivedMessage<T>>,
    handle: ListenerHandle,
}

impl<T> MessageStream<T> {
    /// Waits for the next message. Returns `None` once the stream is closed
    /// and every buffered message has been taken.
    pub async fn recv(&mut self) -> Option<ReceivedMessage<T>> {
        self.receiver.recv().await
    }

    /// Takes a buffered message without waiting.
    pub fn try_recv(&mut self) -> Option<ReceivedMessage<T>> {
        self.receiver.try_recv().ok()
    }

    /// Handle of the underlying listener.
    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    /// True until the stream is closed.
    pub fn is_listening(&self) -> bool {
        self.handle.is_valid()
    }

    /// Unregisters the listener. Messages already buffered can still be received.
    pub fn close(&mut self) {
        self.handle.unregister();
        self.receiver.close();
    }
}

impl<T> Stream for MessageStream<T> {
    type Item = ReceivedMessage<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl<T> Drop for MessageStream<T> {
    fn drop(&mut self) {
        self.handle.unregister();
    }
}

impl<T> std::fmt::Debug for MessageStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("handle", &self.handle)
            .finish()
    }
}

type Forwarder<T> = Box<dyn Fn(&mut MessageContext<'_>, &T) + Send + Sync>;

fn forwarder<T: Message + Clone>() -> (
    Forwarder<T>,
    mpsc::UnboundedReceiver<ReceivedMessage<T>>,
) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let forward = move |ctx: &mut MessageContext<'_>, message: &T| {
        let received = ReceivedMessage {
            channel: ctx.channel().clone(),
            target: ctx.target(),
            origin: ctx.origin(),
            payload: message.clone(),
        };
        // The receiver only disappears together with the stream, which
        // unregisters this listener on drop.
        let _ = sender.send(received);
    };
    (Box::new(forward), receiver)
}

impl MessageRouter {
    /// Registers a listener that forwards matching messages into a stream.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gameplay_message_router::{ChannelTag, ListenerOptions, MessageRouter};
    ///
    /// #[derive(Debug, Clone)]
    /// struct RoundStarted(u32);
    ///
    /// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// runtime.block_on(async {
    ///     let router = MessageRouter::new();
    ///     let mut rounds = router.listen::<RoundStarted>("Match.Round", ListenerOptions::default());
    ///     router.broadcast(&ChannelTag::new("Match.Round"), &mut RoundStarted(3));
    ///     assert_eq!(rounds.recv().await.map(|m| m.payload.0), Some(3));
    /// });
    /// ```
    pub fn listen<T: Message + Clone>(
        &self,
        channel: impl Into<ChannelTag>,
        options: ListenerOptions,
    ) -> MessageStream<T> {
        let (forward, receiver) = forwarder::<T>();
        let handle = self.register(channel, options, move |ctx, message: &T| forward(ctx, message));
        MessageStream { receiver, handle }
    }
}

impl SpatialMessageRouter {
    /// Registers a spatial listener that forwards matching messages into a stream.
    pub fn listen_at<T: Message + Clone>(
        &self,
        channel: impl Into<ChannelTag>,
        position: Vec3,
        radius: f64,
        options: ListenerOptions,
    ) -> MessageStream<T> {
        let (forward, receiver) = forwarder::<T>();
        let handle = self.register_at(channel, position, radius, options, move |ctx, message: &T| {
            forward(ctx, message)
        });
        MessageStream { receiver, handle }
    }
}
