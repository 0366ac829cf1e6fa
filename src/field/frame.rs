//! Per-face orthonormal tangent frames.
//!
//! Every face gets a right-handed orthonormal frame `(u, v, normal)` embedded
//! in its plane. The `u` axis follows the face's canonical first half-edge,
//! which is deterministic for a given input, so repeated runs produce
//! identical frames. All in-plane quantities downstream (constraint
//! directions, connection coefficients, solved field values) are complex
//! numbers expressed in these per-face coordinates.

use nalgebra::Vector3;
use num_complex::Complex;
use rayon::prelude::*;

use crate::error::{FieldError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex};

use super::DEGENERATE_EPS;

/// An orthonormal tangent frame on a face.
///
/// Invariant: `u`, `v`, and `normal` are unit length, mutually orthogonal,
/// and right-handed (`v = normal × u`).
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    /// The face normal.
    pub normal: Vector3<f64>,
    /// First in-plane axis, along the face's canonical first half-edge.
    pub u: Vector3<f64>,
    /// Second in-plane axis, `normal × u`.
    pub v: Vector3<f64>,
}

impl LocalFrame {
    /// Express a world-space vector in this frame's tangent plane as a
    /// complex number (real part along `u`, imaginary part along `v`).
    #[inline]
    pub fn project(&self, d: &Vector3<f64>) -> Complex<f64> {
        Complex::new(d.dot(&self.u), d.dot(&self.v))
    }

    /// Map an in-plane angle (measured from `u` toward `v`) back to a
    /// world-space unit vector.
    #[inline]
    pub fn embed(&self, angle: f64) -> Vector3<f64> {
        angle.cos() * self.u + angle.sin() * self.v
    }
}

/// Compute a tangent frame for every face, in parallel.
///
/// Fails with [`FieldError::DegenerateGeometry`] if any face has a
/// zero-length reference edge or a non-finite normal; no frame table is
/// produced in that case.
pub fn compute_local_frames<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<Vec<LocalFrame>> {
    frames_impl(mesh, true)
}

/// Single-threaded variant of [`compute_local_frames`].
pub fn compute_local_frames_sequential<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
) -> Result<Vec<LocalFrame>> {
    frames_impl(mesh, false)
}

pub(crate) fn frames_impl<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    parallel: bool,
) -> Result<Vec<LocalFrame>> {
    let faces: Vec<FaceId<I>> = mesh.face_ids().collect();

    // Each face writes only its own slot, so the parallel path is a pure
    // optimization with identical output.
    if parallel {
        faces.par_iter().map(|&f| face_frame(mesh, f)).collect()
    } else {
        faces.iter().map(|&f| face_frame(mesh, f)).collect()
    }
}

fn face_frame<I: MeshIndex>(mesh: &HalfEdgeMesh<I>, f: FaceId<I>) -> Result<LocalFrame> {
    let normal = mesh.face_normal(f);
    if !normal.iter().all(|c| c.is_finite()) {
        return Err(FieldError::DegenerateGeometry { face: f.index() });
    }

    let e = mesh.edge_vector(mesh.face(f).halfedge);
    let len = e.norm();
    if !len.is_finite() || len <= DEGENERATE_EPS {
        return Err(FieldError::DegenerateGeometry { face: f.index() });
    }

    let u = e / len;
    let v = normal.cross(&u);

    Ok(LocalFrame { normal, u, v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;

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
    fn test_frames_orthonormal_right_handed() {
        let mesh = tetrahedron();
        let frames = compute_local_frames(&mesh).unwrap();

        assert_eq!(frames.len(), mesh.num_faces());
        for frame in &frames {
            assert!((frame.u.norm() - 1.0).abs() < 1e-12);
            assert!((frame.v.norm() - 1.0).abs() < 1e-12);
            assert!((frame.normal.norm() - 1.0).abs() < 1e-12);

            assert!(frame.u.dot(&frame.v).abs() < 1e-12);
            assert!(frame.u.dot(&frame.normal).abs() < 1e-12);
            assert!(frame.v.dot(&frame.normal).abs() < 1e-12);

            // v = normal x u
            assert!((frame.normal.cross(&frame.u) - frame.v).norm() < 1e-12);
        }
    }

    #[test]
    fn test_u_follows_reference_edge() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let frames = compute_local_frames(&mesh).unwrap();
        assert!((frames[0].u - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((frames[0].normal - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert!((frames[0].v - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_project_embed_roundtrip() {
        let mesh = tetrahedron();
        let frames = compute_local_frames(&mesh).unwrap();

        for frame in &frames {
            let angle = 0.37;
            let world = frame.embed(angle);
            assert!((world.norm() - 1.0).abs() < 1e-12);

            let z = frame.project(&world);
            assert!((z.arg() - angle).abs() < 1e-12);
            assert!((z.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_reference_edge() {
        // Distinct indices, coincident positions: zero-length reference edge
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let result = compute_local_frames(&mesh);
        assert!(matches!(
            result,
            Err(FieldError::DegenerateGeometry { face: 0 })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = tetrahedron();
        let par = compute_local_frames(&mesh).unwrap();
        let seq = compute_local_frames_sequential(&mesh).unwrap();

        for (a, b) in par.iter().zip(seq.iter()) {
            assert_eq!(a.u, b.u);
            assert_eq!(a.v, b.v);
            assert_eq!(a.normal, b.normal);
        }
    }
}
