//! Cross field computation.
//!
//! This module implements the full field pipeline:
//!
//! 1. [`compute_local_frames`] - an orthonormal tangent frame per face
//! 2. [`compute_connection`] - a complex transport coefficient per interior
//!    edge, raised to the 4th power to encode the 4-fold symmetry
//! 3. [`CrossFieldSolver`] - constraint storage, sparse system assembly,
//!    the iterative solve, and extraction of the four world-space
//!    directions per face
//!
//! The stages run strictly in order; within the frame and connection stages
//! every mesh element is independent, so those passes run in parallel by
//! default (see [`CrossFieldOptions`]).
//!
//! # Example
//!
//! ```
//! use crossfield::field::{compute_cross_field, CrossFieldOptions};
//! use crossfield::mesh::{build_from_triangles, FaceId, HalfEdgeMesh};
//! use nalgebra::{Point3, Vector2};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let cross = compute_cross_field(
//!     &mesh,
//!     &[FaceId::new(0)],
//!     &[Vector2::new(1.0, 0.0)],
//!     &CrossFieldOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(cross.len(), 4);
//! ```

mod connection;
mod frame;
mod progress;
mod solver;
mod sparse;

pub use connection::{compute_connection, compute_connection_sequential};
pub use frame::{compute_local_frames, compute_local_frames_sequential, LocalFrame};
pub use progress::Progress;
pub use solver::{compute_cross_field, CrossFieldOptions, CrossFieldSolver};

/// Length below which geometry counts as degenerate.
pub(crate) const DEGENERATE_EPS: f64 = 1e-10;
