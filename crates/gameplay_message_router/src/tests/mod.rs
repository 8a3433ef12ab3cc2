//! Scenario tests for the routers
//!
//! These exercise several modules together:
//! - Priority ordering across registration and unregistration
//! - Reentrant callbacks (unregister, register and broadcast from a listener)
//! - Spatial routing, including listeners that move
//! - Async message streams
//! - The scripting bridge with dynamic message types

#[cfg(test)]
pub mod priority_ordering_test;

#[cfg(test)]
pub mod reentrancy_test;


#[cfg(test)]
pub mod message_stream_test;

#[cfg(test)]
pub mod script_bridge_test;
