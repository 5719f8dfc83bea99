use glam::{DMat3, DVec3};

/// Singular value decomposition of a 3x3 matrix, `m = u * diag(singular_values) * v^T`.
#[derive(Clone, Copy, Debug)]
pub struct Svd3 {
    /// Left singular vectors (columns).
    pub u: DMat3,
    /// Singular values in non-increasing order.
    pub singular_values: DVec3,
    /// Right singular vectors (columns).
    pub v: DMat3,
}

/// Compute the singular value decomposition of a 3x3 matrix.
///
/// The singular values are returned in non-increasing order. No sign
/// normalization is applied to `u` or `v`, so their determinants may be -1.
pub fn svd3(m: &DMat3) -> Svd3 {
    let svd = mat3_to_faer(m).svd();
    let s = svd.s_diagonal();
    Svd3 {
        u: faer_to_mat3(svd.u()),
        singular_values: DVec3::new(s.read(0), s.read(1), s.read(2)),
        v: faer_to_mat3(svd.v()),
    }
}

/// Skew-symmetric matrix `[v]_x` such that `[v]_x * w = v.cross(w)`.
pub fn skew(v: DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, v.z, -v.y),
        DVec3::new(-v.z, 0.0, v.x),
        DVec3::new(v.y, -v.x, 0.0),
    )
}

/// Right singular vector of the smallest singular value, i.e. the least-squares
/// solution of `a * x = 0` with `|x| = 1`.
pub fn null_vector(a: &faer::Mat<f64>) -> Vec<f64> {
    let svd = a.svd();
    let v = svd.v();
    let last = v.ncols() - 1;
    (0..v.nrows()).map(|i| v.read(i, last)).collect()
}

/// Solve `a * x = b` in the least-squares sense through the SVD pseudo-inverse.
///
/// Singular values below `rcond` times the largest one are treated as zero,
/// which yields the minimum-norm solution for rank deficient systems.
/// Returns `None` if the system contains non-finite values or is all zeros.
pub fn solve_least_squares(a: &faer::Mat<f64>, b: &[f64], rcond: f64) -> Option<Vec<f64>> {
    debug_assert_eq!(a.nrows(), b.len());

    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            if !a.read(i, j).is_finite() {
                return None;
            }
        }
    }
    if b.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let svd = a.svd();
    let u = svd.u();
    let v = svd.v();
    let s = svd.s_diagonal();

    let s_max = s.read(0);
    if s_max <= 0.0 {
        return None;
    }

    let mut x = vec![0.0; a.ncols()];
    for i in 0..s.nrows() {
        let si = s.read(i);
        if si <= rcond * s_max {
            continue;
        }
        let mut ub = 0.0;
        for (r, b_r) in b.iter().enumerate() {
            ub += u.read(r, i) * b_r;
        }
        let coeff = ub / si;
        for (j, x_j) in x.iter_mut().enumerate() {
            *x_j += coeff * v.read(j, i);
        }
    }

    Some(x)
}

pub(crate) fn mat3_to_faer(m: &DMat3) -> faer::Mat<f64> {
    let mut out = faer::Mat::<f64>::zeros(3, 3);
    for i in 0..3 {
        let row = m.row(i);
        for j in 0..3 {
            out.write(i, j, row[j]);
        }
    }
    out
}

pub(crate) fn faer_to_mat3(m: faer::MatRef<'_, f64>) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(m.read(0, 0), m.read(1, 0), m.read(2, 0)),
        DVec3::new(m.read(0, 1), m.read(1, 1), m.read(2, 1)),
        DVec3::new(m.read(0, 2), m.read(1, 2), m.read(2, 2)),
    )
}
