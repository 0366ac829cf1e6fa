//! Error types for crossfield.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`FieldError`].
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors that can occur during mesh construction or field computation.
#[derive(Error, Debug)]
pub enum FieldError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate triangle).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The constraint face and direction lists have different lengths.
    #[error("constraint count mismatch: {faces} faces but {directions} directions")]
    ConstraintMismatch {
        /// Number of constrained faces supplied.
        faces: usize,
        /// Number of constraint directions supplied.
        directions: usize,
    },

    /// A constraint names a face outside the mesh or carries a direction
    /// that cannot be normalized.
    #[error("constraint {index} has an unknown face or zero-length direction")]
    InvalidConstraint {
        /// Position of the offending constraint in the input lists.
        index: usize,
    },

    /// A face has zero-length or non-finite geometry, so no tangent frame
    /// or edge direction can be derived from it.
    #[error("face {face} has degenerate geometry")]
    DegenerateGeometry {
        /// The face index.
        face: usize,
    },

    /// The iterative solver broke down or failed to converge.
    #[error("solver failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// The cross field was requested before a successful solve.
    #[error("cross field has not been solved yet")]
    FieldNotSolved,
}
