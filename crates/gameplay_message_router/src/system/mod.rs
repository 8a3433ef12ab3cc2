/// Router engine and the global router - broken down into manageable components
mod core;
mod emitters;
pub(crate) mod engine;
mod handle;
mod handlers;
pub(crate) mod listeners;
mod management;
mod stats;

pub use self::core::MessageRouter;
pub use handle::ListenerHandle;
pub use listeners::{ListenerOptions, MessageCallback};
pub use stats::RouterStats;
