//! # Crossfield
//!
//! Smooth 4-RoSy cross field computation on triangle meshes.
//!
//! A cross field assigns four tangent directions, 90° apart, to every face
//! of a mesh, varying as little as possible between neighboring faces. The
//! user pins the directions of a sparse set of faces; the solver propagates
//! them smoothly across the rest of the surface. Cross fields drive quad
//! remeshing, texture synthesis, and stroke placement, among other things.
//!
//! ## Features
//!
//! - **Half-edge mesh substrate**: O(1) adjacency queries with type-safe indices
//! - **Per-face tangent frames**: deterministic, recomputed per solve
//! - **Discrete connection**: complex transport coefficients across interior
//!   edges, raised to the 4th power to quotient out the cross symmetry
//! - **Sparse complex solve**: triplet-assembled CSR matrix and BiCGSTAB
//!
//! ## Quick Start
//!
//! ```
//! use crossfield::prelude::*;
//! use nalgebra::{Point3, Vector2};
//!
//! // Build a mesh (a tetrahedron here; real meshes come from the caller)
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![
//!     [0, 2, 1],
//!     [0, 1, 3],
//!     [1, 2, 3],
//!     [2, 0, 3],
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // Pin face 0's directions along its local u axis
//! let mut solver = CrossFieldSolver::new(&mesh);
//! solver
//!     .set_constraints(&[FaceId::new(0)], &[Vector2::new(1.0, 0.0)])
//!     .unwrap();
//!
//! // Solve and extract four unit directions per face
//! solver.solve().unwrap();
//! let cross = solver.extract_cross_field().unwrap();
//! assert_eq!(cross.len(), mesh.num_faces());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use crossfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{FieldError, Result};
    pub use crate::field::{
        compute_cross_field, CrossFieldOptions, CrossFieldSolver, LocalFrame,
    };
    pub use crate::mesh::{
        build_from_triangles, Face, FaceId, HalfEdge, HalfEdgeId, HalfEdgeMesh, MeshIndex, Vertex,
        VertexId,
    };
}

// Re-export math crates for convenience
pub use nalgebra;
pub use num_complex;
