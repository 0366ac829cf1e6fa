//! Smooth cross field solver.
//!
//! Computes a 4-RoSy direction field over a triangle mesh: every face gets
//! four tangent directions, 90° apart, varying as little as possible between
//! neighboring faces while matching the caller's per-face constraints.
//!
//! Per face the field is a single complex unknown in the face's local frame.
//! A constrained face is pinned to its constraint; an unconstrained face
//! accumulates one smoothness term per interior edge, relating it to each
//! neighbor through the edge's connection coefficient. The result is an
//! F×F sparse complex system solved with BiCGSTAB.
//!
//! # Example
//!
//! ```
//! use crossfield::field::CrossFieldSolver;
//! use crossfield::mesh::{build_from_triangles, FaceId, HalfEdgeMesh};
//! use nalgebra::{Point3, Vector2};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, -1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [1, 0, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let mut solver = CrossFieldSolver::new(&mesh);
//! solver
//!     .set_constraints(&[FaceId::new(0)], &[Vector2::new(1.0, 0.0)])
//!     .unwrap();
//! solver.solve().unwrap();
//!
//! let cross = solver.extract_cross_field().unwrap();
//! assert_eq!(cross.len(), 2);
//! ```

use std::f64::consts::FRAC_PI_2;

use nalgebra::{DVector, Vector2, Vector3};
use num_complex::Complex;

use crate::error::{FieldError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex};

use super::connection::connection_impl;
use super::frame::{frames_impl, LocalFrame};
use super::progress::Progress;
use super::sparse::{bicgstab, CsrMatrix};
use super::DEGENERATE_EPS;

/// Number of pipeline stages reported through [`Progress`].
const SOLVE_STAGES: usize = 3;

/// Options for cross field computation.
#[derive(Debug, Clone)]
pub struct CrossFieldOptions {
    /// Maximum iterations for the BiCGSTAB solver.
    pub max_iterations: usize,

    /// Convergence tolerance for the solver (relative residual norm).
    pub tolerance: f64,

    /// Compute frames and connection coefficients in parallel.
    pub parallel: bool,
}

impl Default for CrossFieldOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            parallel: true,
        }
    }
}

impl CrossFieldOptions {
    /// Set the maximum solver iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Disable internal parallelism.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Cross field solver over a triangle mesh.
///
/// Holds the constraint set and, after a successful [`solve`](Self::solve),
/// the per-face frames and field values needed for extraction. The mesh is
/// borrowed for the solver's lifetime and never mutated.
#[derive(Debug)]
pub struct CrossFieldSolver<'m, I: MeshIndex = u32> {
    mesh: &'m HalfEdgeMesh<I>,
    options: CrossFieldOptions,

    constraint_faces: Vec<FaceId<I>>,
    constraint_directions: Vec<Complex<f64>>,

    // Populated by solve(); emptied again if a later solve fails.
    frames: Vec<LocalFrame>,
    field: Option<DVector<Complex<f64>>>,
}

impl<'m, I: MeshIndex> CrossFieldSolver<'m, I> {
    /// Create a solver for the given mesh with default options.
    pub fn new(mesh: &'m HalfEdgeMesh<I>) -> Self {
        Self::with_options(mesh, CrossFieldOptions::default())
    }

    /// Create a solver for the given mesh with the given options.
    pub fn with_options(mesh: &'m HalfEdgeMesh<I>, options: CrossFieldOptions) -> Self {
        Self {
            mesh,
            options,
            constraint_faces: Vec::new(),
            constraint_directions: Vec::new(),
            frames: Vec::new(),
            field: None,
        }
    }

    /// Set the per-face direction constraints, replacing any prior set.
    ///
    /// `faces` and `directions` are parallel lists: `directions[i]` is the
    /// desired direction on `faces[i]`, expressed in that face's local
    /// `(u, v)` frame. Directions are normalized before storage. Faces not
    /// listed are unconstrained.
    ///
    /// # Errors
    ///
    /// - [`FieldError::ConstraintMismatch`] if the lists have different
    ///   lengths
    /// - [`FieldError::InvalidConstraint`] if a face is outside the mesh or
    ///   a direction has zero length
    ///
    /// On error the previously stored constraints are left untouched.
    pub fn set_constraints(
        &mut self,
        faces: &[FaceId<I>],
        directions: &[Vector2<f64>],
    ) -> Result<()> {
        if faces.len() != directions.len() {
            return Err(FieldError::ConstraintMismatch {
                faces: faces.len(),
                directions: directions.len(),
            });
        }

        // Validate everything before touching stored state
        let mut normalized = Vec::with_capacity(directions.len());
        for (i, (face, dir)) in faces.iter().zip(directions.iter()).enumerate() {
            if face.index() >= self.mesh.num_faces() {
                return Err(FieldError::InvalidConstraint { index: i });
            }
            let len = dir.norm();
            if !len.is_finite() || len <= DEGENERATE_EPS {
                return Err(FieldError::InvalidConstraint { index: i });
            }
            normalized.push(Complex::new(dir.x / len, dir.y / len));
        }

        self.constraint_faces = faces.to_vec();
        self.constraint_directions = normalized;
        // Any previously solved field no longer matches the constraints
        self.field = None;
        Ok(())
    }

    /// Compute the cross field.
    ///
    /// Runs the full pipeline: per-face frames, per-edge connection
    /// coefficients, sparse system assembly, and the iterative solve. On
    /// success the per-face field values are stored for extraction.
    ///
    /// # Errors
    ///
    /// - [`FieldError::DegenerateGeometry`] if a face has a zero-length
    ///   reference edge or non-finite normal
    /// - [`FieldError::ConvergenceFailed`] if the linear solver breaks down
    ///   or does not converge
    ///
    /// On error no field is retained, not even from an earlier solve.
    pub fn solve(&mut self) -> Result<()> {
        self.solve_with_progress(&Progress::none())
    }

    /// Compute the cross field, reporting pipeline stages to `progress`.
    pub fn solve_with_progress(&mut self, progress: &Progress) -> Result<()> {
        // A failed solve must not leave a stale field behind
        self.field = None;

        progress.report(0, SOLVE_STAGES, "computing local frames");
        let frames = frames_impl(self.mesh, self.options.parallel)?;

        progress.report(1, SOLVE_STAGES, "computing connection coefficients");
        let connection = connection_impl(self.mesh, &frames, self.options.parallel)?;

        progress.report(2, SOLVE_STAGES, "solving linear system");
        let n = self.mesh.num_faces();

        let mut is_constrained = vec![false; n];
        for f in &self.constraint_faces {
            is_constrained[f.index()] = true;
        }

        let mut triplets = Vec::with_capacity(self.mesh.num_halfedges() * 2);
        for f in self.mesh.face_ids() {
            if is_constrained[f.index()] {
                // x_f pinned to the constraint
                triplets.push((f.index(), f.index(), Complex::new(1.0, 0.0)));
            } else {
                // One smoothness term per interior edge, accumulated into
                // the face's single row: x_f * r_he - x_g * r_twin = 0
                for he in self.mesh.face_halfedges(f) {
                    let twin = self.mesh.twin(he);
                    if self.mesh.is_boundary_halfedge(twin) {
                        continue;
                    }
                    let g = self.mesh.face_of(twin);
                    triplets.push((f.index(), f.index(), connection[he.index()]));
                    triplets.push((f.index(), g.index(), -connection[twin.index()]));
                }
            }
        }

        let mut b = DVector::zeros(n);
        for (f, dir) in self
            .constraint_faces
            .iter()
            .zip(&self.constraint_directions)
        {
            // The unknowns live in 4th-power representation space, so the
            // pinned value must as well; otherwise the extracted directions
            // would not reproduce the constraint.
            b[f.index()] = dir.powu(4);
        }

        let a = CsrMatrix::from_triplets(n, n, triplets);
        let x = bicgstab(
            &a,
            &b,
            None,
            self.options.max_iterations,
            self.options.tolerance,
        )?;

        self.frames = frames;
        self.field = Some(x);
        progress.report(SOLVE_STAGES, SOLVE_STAGES, "done");
        Ok(())
    }

    /// Get a face's solved field value, if a solve has succeeded.
    ///
    /// The value's argument, divided by 4, is the angle of the face's first
    /// cross direction in its local frame.
    pub fn field_value(&self, f: FaceId<I>) -> Option<Complex<f64>> {
        self.field.as_ref().map(|x| x[f.index()])
    }

    /// Extract the cross field as four world-space unit vectors per face.
    ///
    /// The returned vector is indexed by face id. Consecutive directions of
    /// a face are 90° apart in its tangent plane; which of the four comes
    /// first is arbitrary, as the field is direction-agnostic.
    ///
    /// # Errors
    ///
    /// [`FieldError::FieldNotSolved`] if no successful [`solve`](Self::solve)
    /// has run.
    pub fn extract_cross_field(&self) -> Result<Vec<[Vector3<f64>; 4]>> {
        let field = self.field.as_ref().ok_or(FieldError::FieldNotSolved)?;

        let mut cross = Vec::with_capacity(self.mesh.num_faces());
        for f in self.mesh.face_ids() {
            let frame = &self.frames[f.index()];
            let angle = field[f.index()].arg() / 4.0;
            cross.push(std::array::from_fn(|k| {
                frame.embed(angle + k as f64 * FRAC_PI_2)
            }));
        }

        Ok(cross)
    }
}

/// Compute a cross field in one call.
///
/// Convenience wrapper that builds a [`CrossFieldSolver`], applies the
/// constraints, solves, and extracts the field.
pub fn compute_cross_field<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    faces: &[FaceId<I>],
    directions: &[Vector2<f64>],
    options: &CrossFieldOptions,
) -> Result<Vec<[Vector3<f64>; 4]>> {
    let mut solver = CrossFieldSolver::with_options(mesh, options.clone());
    solver.set_constraints(faces, directions)?;
    solver.solve()?;
    solver.extract_cross_field()
}
