//! Discrete connection coefficients across interior edges.
//!
//! Transporting a tangent direction from one face to its neighbor requires
//! knowing how their frames are rotated against each other. For each interior
//! edge we express the (normalized) edge direction in the canonical incident
//! face's frame as a unit complex number `e_f`, and store
//! `r = conj(e_f)^4` on both half-edges of the edge. The 4th power quotients
//! out the 4-fold symmetry of the cross field, so the solver can compare
//! neighboring field values directly through these coefficients.
//!
//! Boundary edges carry no coefficient; their table slots stay zero and are
//! never read by the solver.

use num_complex::Complex;
use rayon::prelude::*;

use crate::error::{FieldError, Result};
use crate::mesh::{HalfEdgeId, HalfEdgeMesh, MeshIndex};

use super::frame::LocalFrame;
use super::DEGENERATE_EPS;

/// Compute the per-half-edge connection coefficient table, in parallel.
///
/// `frames` must hold one frame per face, as produced by
/// [`super::compute_local_frames`]. The returned table has one entry per
/// half-edge; both half-edges of an interior edge hold the same value.
///
/// Fails with [`FieldError::DegenerateGeometry`] if an interior edge has
/// zero length.
pub fn compute_connection<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    frames: &[LocalFrame],
) -> Result<Vec<Complex<f64>>> {
    connection_impl(mesh, frames, true)
}

/// Single-threaded variant of [`compute_connection`].
pub fn compute_connection_sequential<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    frames: &[LocalFrame],
) -> Result<Vec<Complex<f64>>> {
    connection_impl(mesh, frames, false)
}

pub(crate) fn connection_impl<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    frames: &[LocalFrame],
    parallel: bool,
) -> Result<Vec<Complex<f64>>> {
    // One canonical half-edge per interior edge: the lower-indexed one.
    let canonical: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| !mesh.is_boundary_edge(he) && he.index() < mesh.twin(he).index())
        .collect();

    let edge_coefficient = |&he: &HalfEdgeId<I>| -> Result<(usize, usize, Complex<f64>)> {
        let twin = mesh.twin(he);
        let f = mesh.face_of(he);

        // Direction between the edge's two distinct endpoints
        let d = mesh.edge_vector(he);
        let len = d.norm();
        if !len.is_finite() || len <= DEGENERATE_EPS {
            return Err(FieldError::DegenerateGeometry { face: f.index() });
        }
        let dir = d / len;

        let e_f = frames[f.index()].project(&dir);
        let r = e_f.conj().powu(4);

        Ok((he.index(), twin.index(), r))
    };

    let computed: Vec<(usize, usize, Complex<f64>)> = if parallel {
        canonical
            .par_iter()
            .map(edge_coefficient)
            .collect::<Result<_>>()?
    } else {
        canonical
            .iter()
            .map(edge_coefficient)
            .collect::<Result<_>>()?
    };

    let mut table = vec![Complex::new(0.0, 0.0); mesh.num_halfedges()];
    for (he, twin, r) in computed {
        table[he] = r;
        table[twin] = r;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::frame::compute_local_frames;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

    fn two_triangles() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_symmetric_storage() {
        let mesh = two_triangles();
        let frames = compute_local_frames(&mesh).unwrap();
        let connection = compute_connection(&mesh, &frames).unwrap();

        assert_eq!(connection.len(), mesh.num_halfedges());

        for he in mesh.halfedge_ids() {
            if mesh.is_boundary_edge(he) {
                continue;
            }
            let twin = mesh.twin(he);
            assert_eq!(connection[he.index()], connection[twin.index()]);
        }
    }

    #[test]
    fn test_boundary_slots_empty() {
        let mesh = two_triangles();
        let frames = compute_local_frames(&mesh).unwrap();
        let connection = compute_connection(&mesh, &frames).unwrap();

        for he in mesh.halfedge_ids() {
            if mesh.is_boundary_edge(he) {
                assert_eq!(connection[he.index()], Complex::new(0.0, 0.0));
            }
        }
    }

    #[test]
    fn test_unit_modulus() {
        // Edge directions lie in their faces' planes, so the projected
        // complex numbers are unit and so are their 4th powers.
        let mesh = tetrahedron();
        let frames = compute_local_frames(&mesh).unwrap();
        let connection = compute_connection(&mesh, &frames).unwrap();

        for he in mesh.halfedge_ids() {
            assert!((connection[he.index()].norm() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_two_triangle_coefficient_value() {
        // The shared edge runs along face 0's u axis, so e_f = 1 and r = 1.
        let mesh = two_triangles();
        let frames = compute_local_frames(&mesh).unwrap();
        let connection = compute_connection(&mesh, &frames).unwrap();

        let he = mesh
            .halfedge_ids()
            .find(|&he| !mesh.is_boundary_edge(he))
            .unwrap();
        let r = connection[he.index()];
        assert!((r - Complex::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = tetrahedron();
        let frames = compute_local_frames(&mesh).unwrap();

        let par = compute_connection(&mesh, &frames).unwrap();
        let seq = compute_connection_sequential(&mesh, &frames).unwrap();
        assert_eq!(par, seq);
    }
}
