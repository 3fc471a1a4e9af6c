//! Spatial indexing and normal estimation for meshview
//!
//! This crate provides the nearest-neighbor structures used for point and
//! face picking, and the normal estimation the render cache draws from.

pub mod nearest_neighbor;
pub mod normals;

pub use nearest_neighbor::*;
pub use normals::*;
