//! Message payloads and message type identity.
//!
//! Any `'static + Send + Sync + Debug` value can be broadcast as a message;
//! the [`Message`] trait is implemented automatically. Listeners are keyed by
//! [`MessageType`], a shared descriptor whose lifetime the router does not
//! own: listeners only hold a [`WeakMessageType`] and are purged lazily once
//! the type becomes stale.
//!
//! ## Key Types
//!
//! - [`Message`] - Marker trait for broadcastable payloads
//! - [`MessageType`] - Shared type descriptor (native Rust or script-defined)
//! - [`WeakMessageType`] - Non-owning reference stored in listener entries
//! - [`Payload`] - Type-erased view of the payload handed to callbacks

use compact_str::CompactString;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Core trait for anything that can travel through a router.
///
/// Implemented for every type that is `'static + Send + Sync + Debug`, so
/// plain structs can be broadcast without ceremony:
///
/// ```rust
/// #[derive(Debug, Clone)]
/// struct FootstepNoise {
///     loudness: f32,
/// }
/// // FootstepNoise is now a Message.
/// ```
pub trait Message: Any + Send + Sync + fmt::Debug {
    /// Upcast used for type-checked reads.
    fn as_any(&self) -> &dyn Any;
    /// Upcast used for type-checked in-place writes.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Fully qualified name of the concrete payload type.
    fn message_type_name(&self) -> &'static str;
}

impl<T> Message for T
where
    T: Any + Send + Sync + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn message_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Hashable identity of a [`MessageType`]. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageTypeKey(pub u64);

impl fmt::Display for MessageTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

static NEXT_TYPE_KEY: AtomicU64 = AtomicU64::new(1);

/// Interned descriptors for native Rust payload types.
static NATIVE_TYPES: Lazy<DashMap<TypeId, MessageType>> = Lazy::new(DashMap::new);

struct MessageTypeInfo {
    key: MessageTypeKey,
    name: CompactString,
    payload_type: TypeId,
    payload_type_name: &'static str,
    dynamic: bool,
    retired: AtomicBool,
}

/// Shared descriptor identifying the shape of a message payload.
///
/// Cloning is cheap. Equality and hashing use the [`MessageTypeKey`], so two
/// descriptors created separately for the same name are still different
/// types.
#[derive(Clone)]
pub struct MessageType(Arc<MessageTypeInfo>);

impl MessageType {
    fn create(
        name: &str,
        payload_type: TypeId,
        payload_type_name: &'static str,
        dynamic: bool,
    ) -> Self {
        Self(Arc::new(MessageTypeInfo {
            key: MessageTypeKey(NEXT_TYPE_KEY.fetch_add(1, Ordering::Relaxed)),
            name: CompactString::new(name),
            payload_type,
            payload_type_name,
            dynamic,
            retired: AtomicBool::new(false),
        }))
    }

    /// Returns the descriptor for the Rust type `T`.
    ///
    /// Descriptors are interned per `TypeId`. If the interned descriptor has
    /// been retired a fresh one (with a new key) replaces it, so listeners
    /// registered before the retirement go stale while new registrations work.
    pub fn of<T: Message>() -> Self {
        let type_id = TypeId::of::<T>();
        if let Some(existing) = NATIVE_TYPES.get(&type_id) {
            if existing.is_valid() {
                return existing.clone();
            }
        }

        let create = || {
            MessageType::create(
                short_type_name::<T>(),
                type_id,
                std::any::type_name::<T>(),
                false,
            )
        };
        let mut slot = NATIVE_TYPES.entry(type_id).or_insert_with(create);
        if !slot.is_valid() {
            *slot = create();
        }
        slot.clone()
    }

    /// Creates a script-defined message type carrying `serde_json::Value`
    /// payloads. The caller owns its lifetime: once every clone is dropped
    /// (or [`retire`](Self::retire) is called) listeners of this type go stale.
    pub fn dynamic(name: &str) -> Self {
        Self::create(
            name,
            TypeId::of::<serde_json::Value>(),
            std::any::type_name::<serde_json::Value>(),
            true,
        )
    }

    pub fn key(&self) -> MessageTypeKey {
        self.0.key
    }

    pub fn name(&self) -> &str {
        self.0.name.as_str()
    }

    /// True for types created with [`MessageType::dynamic`].
    pub fn is_dynamic(&self) -> bool {
        self.0.dynamic
    }

    /// Fully qualified name of the Rust type payloads of this message type have.
    pub fn payload_type_name(&self) -> &'static str {
        self.0.payload_type_name
    }

    /// False once the type has been retired.
    pub fn is_valid(&self) -> bool {
        !self.0.retired.load(Ordering::Acquire)
    }

    /// Marks the type as unloaded. Listeners of this type are purged the next
    /// time a broadcast reaches them.
    pub fn retire(&self) {
        self.0.retired.store(true, Ordering::Release);
    }

    /// True if `payload` has the concrete type this message type describes.
    pub fn accepts(&self, payload: &dyn Message) -> bool {
        Message::as_any(payload).type_id() == self.0.payload_type
    }

    pub fn downgrade(&self) -> WeakMessageType {
        WeakMessageType {
            key: self.0.key,
            inner: Arc::downgrade(&self.0),
        }
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MessageType {}

impl std::hash::Hash for MessageType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageType")
            .field("key", &self.0.key)
            .field("name", &self.0.name)
            .field("dynamic", &self.0.dynamic)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-owning reference to a [`MessageType`], kept by listener entries.
#[derive(Clone)]
pub struct WeakMessageType {
    key: MessageTypeKey,
    inner: Weak<MessageTypeInfo>,
}

impl WeakMessageType {
    pub fn key(&self) -> MessageTypeKey {
        self.key
    }

    /// Returns the live descriptor, or `None` if it was dropped or retired.
    pub fn upgrade(&self) -> Option<MessageType> {
        self.inner
            .upgrade()
            .map(MessageType)
            .filter(MessageType::is_valid)
    }

    pub fn is_stale(&self) -> bool {
        self.upgrade().is_none()
    }
}

impl fmt::Debug for WeakMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMessageType")
            .field("key", &self.key)
            .field("stale", &self.is_stale())
            .finish()
    }
}

/// Type-erased payload handed to listener callbacks.
///
/// Reads are type-checked; [`override_with`](Self::override_with) replaces
/// the payload in place so every listener after the current one observes the
/// new value.
pub struct Payload<'a> {
    data: &'a mut dyn Message,
}

impl<'a> Payload<'a> {
    pub(crate) fn new(data: &'a mut dyn Message) -> Self {
        Self { data }
    }

    /// Borrows the payload as `T` if it has that type.
    pub fn get<T: Message>(&self) -> Option<&T> {
        Message::as_any(&*self.data).downcast_ref::<T>()
    }

    /// Mutably borrows the payload as `T` if it has that type.
    pub fn get_mut<T: Message>(&mut self) -> Option<&mut T> {
        Message::as_any_mut(&mut *self.data).downcast_mut::<T>()
    }

    /// Copies the payload into `out`. Returns false and leaves `out`
    /// untouched on a type mismatch.
    pub fn copy_into<T: Message + Clone>(&self, out: &mut T) -> bool {
        match self.get::<T>() {
            Some(value) => {
                *out = value.clone();
                true
            }
            None => false,
        }
    }

    /// Replaces the payload with `value`. Returns false on a type mismatch.
    pub fn override_with<T: Message>(&mut self, value: T) -> bool {
        match self.get_mut::<T>() {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// True if the payload has type `T`.
    pub fn is<T: Message>(&self) -> bool {
        Message::as_any(&*self.data).is::<T>()
    }

    pub fn as_message(&self) -> &dyn Message {
        &*self.data
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.data, f)
    }
}

/// Last path segment of `T`'s type name, e.g. `FootstepNoise`.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
