//! Position-aware message routing.
//!
//! ## Key Types
//!
//! - [`SpatialMessageRouter`] - Router whose listeners hear broadcasts within a radius
//! - [`SpatialInfo`] - A listener's listen position and radius
//! - [`CellId`] - Packed id of a grid cell
//!
//! Listeners are stored once, in a handle index, and referenced from every
//! grid cell their listen circle overlaps. A broadcast at a position looks at
//! the single cell containing it, so a listener must overlap the sender's
//! cell to be considered at all; the exact distance check happens during
//! dispatch.

pub mod grid;
mod registry;
mod router;

pub use grid::{cells_in_radius, CellId, CellSet};
pub use registry::SpatialInfo;
pub use router::SpatialMessageRouter;
