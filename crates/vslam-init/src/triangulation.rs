//! Two-view point triangulation by iteratively reweighted linear least squares.
//!
//! Each view contributes the two rows of the cross product `x × (P X) = 0`.
//! The first solve is the plain linear (DLT) estimate. Every following solve
//! divides the rows of a view by its projective depth `p_3 · X` from the
//! previous estimate, which turns the algebraic error into an approximation of
//! the image-space error.
//!
//! Reference: Hartley & Sturm, "Triangulation", CVIU 1997, section 5.1.

use glam::{DMat3, DVec2, DVec3, DVec4};

use crate::config::TriangulationParams;
use crate::linalg;

/// Relative singular value below which a direction of the linear system is
/// considered unobservable.
const LSTSQ_RCOND: f64 = 1e-12;

/// A 3x4 camera projection matrix `P = K [R | t]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionMatrix {
    rows: [DVec4; 3],
}

impl ProjectionMatrix {
    /// Create a projection matrix from its rows.
    pub fn new(rows: [DVec4; 3]) -> Self {
        Self { rows }
    }

    /// Build `K [R | t]`.
    pub fn from_pose(k: &DMat3, rotation: &DMat3, translation: DVec3) -> Self {
        let kr = *k * *rotation;
        let kt = *k * translation;
        Self {
            rows: [
                kr.row(0).extend(kt.x),
                kr.row(1).extend(kt.y),
                kr.row(2).extend(kt.z),
            ],
        }
    }

    /// Build `K [I | 0]`, the camera placed at the world origin.
    pub fn at_origin(k: &DMat3) -> Self {
        Self::from_pose(k, &DMat3::IDENTITY, DVec3::ZERO)
    }

    pub(crate) fn row(&self, i: usize) -> DVec4 {
        self.rows[i]
    }

    /// Projective depth `p_3 · (X, 1)` of a point.
    pub fn depth(&self, point: DVec3) -> f64 {
        self.rows[2].dot(point.extend(1.0))
    }

    /// Project a 3D point to pixel coordinates.
    pub fn project(&self, point: DVec3) -> Option<DVec2> {
        let h = point.extend(1.0);
        let w = self.rows[2].dot(h);
        if w == 0.0 {
            return None;
        }
        Some(DVec2::new(
            self.rows[0].dot(h) / w,
            self.rows[1].dot(h) / w,
        ))
    }
}

/// Linear least-squares triangulation of a single correspondence.
pub fn triangulate_linear(
    x_ref: DVec2,
    x_tar: DVec2,
    p_ref: &ProjectionMatrix,
    p_tar: &ProjectionMatrix,
) -> Option<DVec3> {
    solve_weighted(x_ref, x_tar, p_ref, p_tar, 1.0, 1.0)
}

/// Iterative linear least-squares triangulation of a single correspondence.
///
/// Stops when both depth weights change by less than `params.epsilon` or after
/// `params.max_iterations` reweighted solves. Returns `None` if the linear
/// system is not finite.
pub fn triangulate(
    x_ref: DVec2,
    x_tar: DVec2,
    p_ref: &ProjectionMatrix,
    p_tar: &ProjectionMatrix,
    params: &TriangulationParams,
) -> Option<DVec3> {
    let (mut w_ref, mut w_tar) = (1.0, 1.0);
    let mut point = solve_weighted(x_ref, x_tar, p_ref, p_tar, w_ref, w_tar)?;

    for _ in 0..params.max_iterations {
        let depth_ref = p_ref.depth(point);
        let depth_tar = p_tar.depth(point);

        if (w_ref - depth_ref).abs() <= params.epsilon
            && (w_tar - depth_tar).abs() <= params.epsilon
        {
            break;
        }
        // a point on a camera plane cannot be reweighted
        if depth_ref.abs() < f64::EPSILON || depth_tar.abs() < f64::EPSILON {
            break;
        }

        w_ref = depth_ref;
        w_tar = depth_tar;
        point = solve_weighted(x_ref, x_tar, p_ref, p_tar, w_ref, w_tar)?;
    }

    Some(point)
}

fn solve_weighted(
    x_ref: DVec2,
    x_tar: DVec2,
    p_ref: &ProjectionMatrix,
    p_tar: &ProjectionMatrix,
    w_ref: f64,
    w_tar: f64,
) -> Option<DVec3> {
    let rows = [
        (x_ref.x * p_ref.row(2) - p_ref.row(0)) / w_ref,
        (x_ref.y * p_ref.row(2) - p_ref.row(1)) / w_ref,
        (x_tar.x * p_tar.row(2) - p_tar.row(0)) / w_tar,
        (x_tar.y * p_tar.row(2) - p_tar.row(1)) / w_tar,
    ];

    let mut a = faer::Mat::<f64>::zeros(4, 3);
    let mut b = [0.0; 4];
    for (i, row) in rows.iter().enumerate() {
        a.write(i, 0, row.x);
        a.write(i, 1, row.y);
        a.write(i, 2, row.z);
        b[i] = -row.w;
    }

    let x = linalg::solve_least_squares(&a, &b, LSTSQ_RCOND)?;
    Some(DVec3::new(x[0], x[1], x[2]))
}
