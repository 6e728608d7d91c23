//! Gauss-Jordan elimination.

use crate::error::{Dims, EngineError, Result};

use super::Matrix;

/// Pivot tolerance used by [`Matrix::try_inverse`].
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Solves `a · x = b` by column-wise Gauss-Jordan elimination.
///
/// The pivot for each column is the first row at or below the frontier whose
/// entry exceeds `eps` in magnitude. Columns without a pivot are treated as
/// dependent: their unknowns come back as `0`. The result has `a.cols()`
/// entries.
pub fn solve(mut a: Matrix, mut b: Vec<f64>, eps: f64) -> Result<Vec<f64>> {
    let n = a.rows();
    let m = a.cols();
    if b.len() != n {
        return Err(EngineError::dims("linear solve", a.dims(), Dims::new(b.len(), 1)));
    }

    // pivot_col[r] = column whose pivot landed on row r.
    let mut pivot_col = Vec::with_capacity(n.min(m));
    let mut frontier = 0;

    for j in 0..m {
        let pivot = (frontier..n).find(|&k| a[(k, j)].abs() > eps);

        let Some(k) = pivot else {
            for i in 0..frontier {
                a[(i, j)] = 0.0;
            }
            continue;
        };

        a.swap_rows(frontier, k);
        b.swap(frontier, k);

        let p = a[(frontier, j)];
        b[frontier] /= p;
        for v in &mut a.row_mut(frontier)[j..] {
            *v /= p;
        }

        for i in 0..n {
            if i == frontier {
                continue;
            }
            let factor = a[(i, j)];
            if factor == 0.0 {
                continue;
            }
            for c in j..m {
                a[(i, c)] -= factor * a[(frontier, c)];
            }
            b[i] -= factor * b[frontier];
        }

        pivot_col.push(j);
        frontier += 1;
        if frontier == n {
            break;
        }
    }

    let mut x = vec![0.0; m];
    for (row, &col) in pivot_col.iter().enumerate() {
        x[col] = b[row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9
    }

    // ── square systems ────────────────────────────────────────────────────

    #[test]
    fn solves_3x3() {
        let a = Matrix::from_rows(&[[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]]);
        let x = solve(a, vec![8.0, -11.0, -3.0], DEFAULT_EPSILON).unwrap();
        assert!(approx_eq(x[0], 2.0));
        assert!(approx_eq(x[1], 3.0));
        assert!(approx_eq(x[2], -1.0));
    }

    #[test]
    fn swaps_rows_when_leading_entry_is_zero() {
        let a = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0]]);
        let x = solve(a, vec![5.0, 7.0], DEFAULT_EPSILON).unwrap();
        assert_eq!(x, vec![7.0, 5.0]);
    }

    // ── rank deficiency ───────────────────────────────────────────────────

    #[test]
    fn zero_row_leaves_free_variable_at_zero() {
        let a = Matrix::from_rows(&[[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 2.0]]);
        let x = solve(a, vec![4.0, 0.0, 6.0], DEFAULT_EPSILON).unwrap();
        assert_eq!(x, vec![4.0, 0.0, 3.0]);
    }

    #[test]
    fn dependent_column_is_zeroed() {
        // x + y = 2, 2x + 2y = 4: y is free.
        let a = Matrix::from_rows(&[[1.0, 1.0], [2.0, 2.0]]);
        let x = solve(a, vec![2.0, 4.0], DEFAULT_EPSILON).unwrap();
        assert!(approx_eq(x[0], 2.0));
        assert_eq!(x[1], 0.0);
    }

    #[test]
    fn entries_below_epsilon_are_not_pivots() {
        let a = Matrix::from_rows(&[[1e-9, 0.0], [0.0, 1.0]]);
        let x = solve(a, vec![1.0, 3.0], DEFAULT_EPSILON).unwrap();
        assert_eq!(x, vec![0.0, 3.0]);
    }

    // ── shape checks ──────────────────────────────────────────────────────

    #[test]
    fn rhs_length_must_match_rows() {
        let a = Matrix::zeros(2, 2);
        assert!(matches!(
            solve(a, vec![1.0], DEFAULT_EPSILON),
            Err(EngineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn wide_system_returns_one_value_per_column() {
        let a = Matrix::from_rows(&[[1.0, 0.0, 1.0]]);
        let x = solve(a, vec![3.0], DEFAULT_EPSILON).unwrap();
        assert_eq!(x, vec![3.0, 0.0, 0.0]);
    }
}
