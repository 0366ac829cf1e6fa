//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation the field pipeline
//! runs against: type-safe element indices, O(1) adjacency queries, boundary
//! predicates, and construction from face-vertex lists.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//!
//! These indices are generic over the underlying integer type ([`MeshIndex`]),
//! allowing `u16`, `u32`, or `u64` storage based on mesh size.
//!
//! # Construction
//!
//! ```
//! use crossfield::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::build_from_triangles;
pub use halfedge::{Face, HalfEdge, HalfEdgeMesh, Vertex};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
