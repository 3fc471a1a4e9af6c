//! Core data structures and traits for meshview
//!
//! This crate provides the fundamental types for interactive mesh viewing:
//! points, triangle meshes with their derived scalar quantities (bounding
//! box, bounding sphere, average edge length), and essential traits.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3};

/// Common result type for meshview operations
pub type Result<T> = std::result::Result<T, Error>;

// Type aliases for easier imports
pub type Point = Point3f;
pub type Mesh = TriangleMesh;
