/// Listener entries, registration options and the priority-ordered list.
use crate::context::MessageContext;
use crate::message::{Message, MessageTypeKey, Payload, WeakMessageType};
use crate::tag::ChannelTag;
use crate::types::{HandleId, MatchRule, MessagePriority, TargetId, Vec3};
use std::fmt;
use std::sync::Arc;

/// Type-erased listener callback.
///
/// Receives the per-invocation context and the payload. Typed registration
/// helpers wrap a `Fn(&mut MessageContext, &T)` into one of these.
pub type MessageCallback = Arc<dyn Fn(&mut MessageContext<'_>, &mut Payload<'_>) + Send + Sync>;

/// Wraps a typed callback into a [`MessageCallback`].
///
/// The wrapper skips payloads that are not a `T`; the dispatcher already
/// filters by message type, so this only matters for raw registrations that
/// pair a type with a mismatched callback.
pub(crate) fn typed_callback<T, F>(callback: F) -> MessageCallback
where
    T: Message,
    F: Fn(&mut MessageContext<'_>, &T) + Send + Sync + 'static,
{
    Arc::new(move |ctx: &mut MessageContext<'_>, payload: &mut Payload<'_>| {
        if let Some(message) = payload.get::<T>() {
            callback(ctx, message);
        }
    })
}

/// Options accepted by every registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    /// How the registered channel is compared with broadcast channels
    pub match_rule: MatchRule,
    /// Dispatch order; lower values run first
    pub priority: i32,
    /// Only receive broadcasts addressed to this target
    pub target: Option<TargetId>,
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self {
            match_rule: MatchRule::ExactMatch,
            priority: MessagePriority::Default.value(),
            target: None,
        }
    }
}

impl ListenerOptions {
    /// Options for listening to a channel and everything below it.
    pub fn partial() -> Self {
        Self::default().with_match_rule(MatchRule::PartialMatch)
    }

    pub fn with_match_rule(mut self, match_rule: MatchRule) -> Self {
        self.match_rule = match_rule;
        self
    }

    pub fn with_priority(mut self, priority: impl Into<i32>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }
}

/// Decides whether a listener's membership admits a broadcast origin.
///
/// The global router admits everything; the spatial router admits an origin
/// within the listener's radius.
pub(crate) trait MembershipScope: Clone + Send + Sync + 'static {
    type Origin: Copy;

    fn admits(&self, origin: Self::Origin) -> bool;

    /// Position reported to callbacks, if the scope has one.
    fn origin_position(origin: Self::Origin) -> Option<Vec3>;
}

/// Membership of global listeners.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GlobalScope;

impl MembershipScope for GlobalScope {
    type Origin = ();

    fn admits(&self, _origin: ()) -> bool {
        true
    }

    fn origin_position(_origin: ()) -> Option<Vec3> {
        None
    }
}

/// One registration as stored by a router.
#[derive(Clone)]
pub(crate) struct ListenerEntry<S> {
    pub id: HandleId,
    pub callback: MessageCallback,
    pub message_type: WeakMessageType,
    pub channel: ChannelTag,
    pub match_rule: MatchRule,
    pub priority: i32,
    pub target: Option<TargetId>,
    pub scope: S,
}

impl<S> ListenerEntry<S> {
    pub fn type_key(&self) -> MessageTypeKey {
        self.message_type.key()
    }

    /// Channel filter for a broadcast on `channel`.
    pub fn accepts_channel(&self, channel: &ChannelTag) -> bool {
        match self.match_rule {
            MatchRule::ExactMatch => channel.matches_exact(&self.channel),
            MatchRule::PartialMatch => channel.matches(&self.channel),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ListenerEntry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("message_type", &self.message_type)
            .field("channel", &self.channel)
            .field("match_rule", &self.match_rule)
            .field("priority", &self.priority)
            .field("target", &self.target)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Anything that can sit in a [`ListenerList`].
pub(crate) trait Prioritized {
    fn handle_id(&self) -> HandleId;
    fn priority(&self) -> i32;
}

impl<S> Prioritized for ListenerEntry<S> {
    fn handle_id(&self) -> HandleId {
        self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Sequence of listeners sorted by ascending priority, registration order
/// within equal priorities.
#[derive(Debug, Clone)]
pub(crate) struct ListenerList<T> {
    entries: Vec<T>,
}

impl<T> Default for ListenerList<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Prioritized> ListenerList<T> {
    /// Inserts after every entry whose priority is lower or equal.
    ///
    /// Scans from the tail, so appending at an equal or higher priority than
    /// the current last entry is constant time.
    pub fn insert(&mut self, entry: T) {
        let priority = entry.priority();
        let mut index = self.entries.len();
        for (i, existing) in self.entries.iter().enumerate().rev() {
            if existing.priority() > priority {
                index = i;
            } else {
                break;
            }
        }
        self.entries.insert(index, entry);
    }

    /// Removes the entry with `id`, keeping the order of the others.
    pub fn remove(&mut self, id: HandleId) -> Option<T> {
        let index = self.entries.iter().position(|e| e.handle_id() == id)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> ListenerList<T> {
    /// Copies the list so it can be iterated without holding the router lock.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Slot(u64, i32);

    impl Prioritized for Slot {
        fn handle_id(&self) -> HandleId {
            HandleId(self.0)
        }
        fn priority(&self) -> i32 {
            self.1
        }
    }

    fn ids(list: &ListenerList<Slot>) -> Vec<u64> {
        list.iter().map(|s| s.0).collect()
    }

    #[test]
    fn insert_is_stable_for_equal_priorities() {
        let mut list = ListenerList::default();
        list.insert(Slot(1, 50));
        list.insert(Slot(2, 10));
        list.insert(Slot(3, 50));
        list.insert(Slot(4, 0));
        assert_eq!(ids(&list), vec![4, 2, 1, 3]);
    }

    #[test]
    fn insert_handles_negative_and_large_priorities() {
        let mut list = ListenerList::default();
        list.insert(Slot(1, 255));
        list.insert(Slot(2, -10));
        list.insert(Slot(3, 1000));
        list.insert(Slot(4, 255));
        assert_eq!(ids(&list), vec![2, 1, 4, 3]);
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut list = ListenerList::default();
        for (id, priority) in [(1, 0), (2, 10), (3, 20), (4, 30)] {
            list.insert(Slot(id, priority));
        }
        assert_eq!(list.remove(HandleId(2)), Some(Slot(2, 10)));
        assert_eq!(list.remove(HandleId(2)), None);
        assert_eq!(ids(&list), vec![1, 3, 4]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn options_builder() {
        let target = TargetId::new();
        let options = ListenerOptions::partial()
            .with_priority(MessagePriority::Monitor)
            .with_target(target);
        assert_eq!(options.match_rule, MatchRule::PartialMatch);
        assert_eq!(options.priority, 255);
        assert_eq!(options.target, Some(target));
        assert_eq!(ListenerOptions::default().priority, 50);
    }
}
