//! Core data structures and traits for lowpoly
//!
//! This crate provides the mesh value types shared by the decimation engine
//! and its collaborators: polygon meshes with a world transform, the
//! immutable snapshot / mutable working-copy pair used by a decimation
//! session, and the error taxonomy.

pub mod point;
pub mod mesh;
pub mod snapshot;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use snapshot::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
