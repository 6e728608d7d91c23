use core::fmt;
use core::ops::{Index, IndexMut, Mul};

use crate::error::{or_report, Dims, EngineError, Result};

use super::solver::{solve, DEFAULT_EPSILON};
use super::Vect3;

/// Dense row-major matrix of arbitrary shape.
///
/// `Matrix * Matrix` and `Matrix * Vect3` never abort: a shape mismatch is
/// reported and yields an empty matrix / zero vector. Use [`Matrix::checked_mul`]
/// and [`Matrix::transform`] to observe the error instead.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// `rows × cols` zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// 0×0 matrix; the fallback of a failed multiplication.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds from nested rows. Short rows are zero-padded to the widest one.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Self {
        let cols = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        let mut m = Self::zeros(rows.len(), cols);
        for (i, r) in rows.iter().enumerate() {
            for (j, &v) in r.as_ref().iter().enumerate() {
                m[(i, j)] = v;
            }
        }
        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        Dims::new(self.rows, self.cols)
    }

    #[inline]
    pub fn is_transform(&self) -> bool {
        self.rows == 4 && self.cols == 4
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    /// `self * rhs`, or `DimensionMismatch` when `self.cols != rhs.rows`.
    pub fn checked_mul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(EngineError::dims("matrix multiplication", self.dims(), rhs.dims()));
        }

        let mut out = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(i, k)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    out.data[i * rhs.cols + j] += a * rhs[(k, j)];
                }
            }
        }
        Ok(out)
    }

    /// Applies a 4×4 matrix to the homogeneous vector `v`.
    ///
    /// Only x/y/z of the product are kept; the result has `w = 1` (no
    /// perspective divide).
    pub fn transform(&self, v: Vect3) -> Result<Vect3> {
        if self.rows != 4 || self.cols != 4 {
            return Err(EngineError::dims("matrix-vector multiplication", self.dims(), Dims::new(4, 1)));
        }

        let mut out = Vect3::zero();
        for i in 0..3 {
            out[i] = (0..4).map(|k| self[(i, k)] * v[k]).sum();
        }
        Ok(out)
    }

    /// Transposes in place, returning `self` for chaining.
    pub fn transpose(&mut self) -> &mut Self {
        *self = self.transposed();
        self
    }

    pub fn transposed(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out[(j, i)] = self[(i, j)];
            }
        }
        out
    }

    /// Generic inverse through the elimination solver.
    ///
    /// Every entry of the inverse is an unknown: `X[k][j]` sits at index
    /// `j*n + k`, and the n² equations are `Σ_k A[i][k]·X[k][j] = δ(i, j)`.
    /// A singular matrix yields zeros where no pivot was found.
    pub fn try_inverse(&self) -> Result<Matrix> {
        if !self.is_square() {
            return Err(EngineError::dims("matrix inverse", self.dims(), self.dims()));
        }

        let n = self.rows;
        let nn = n * n;
        let mut system = Matrix::zeros(nn, nn);
        let mut rhs = vec![0.0; nn];

        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    system[(i * n + j, j * n + k)] = self[(i, k)];
                }
            }
            rhs[i * n + i] = 1.0;
        }

        let x = solve(system, rhs, DEFAULT_EPSILON)?;

        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                out[(i, j)] = x[j * n + i];
            }
        }
        Ok(out)
    }

    /// Reporting form of [`Matrix::try_inverse`]; non-square input yields an
    /// empty matrix.
    pub fn inverse(&self) -> Matrix {
        or_report(self.try_inverse(), Matrix::empty)
    }

    pub fn approx_eq(&self, other: &Matrix, tol: f64) -> bool {
        self.dims() == other.dims()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// Column-major f32 copy, the layout WGSL `mat4x4<f32>` expects.
    pub fn to_cols_f32(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.data.len());
        for j in 0..self.cols {
            for i in 0..self.rows {
                out.push(self[(i, j)] as f32);
            }
        }
        out
    }

    /// Column-major 4×4 for uniform/instance upload. Non-4×4 input is
    /// reported and exported as identity.
    pub fn to_mat4_f32(&self) -> [[f32; 4]; 4] {
        let mut out = [[0.0f32; 4]; 4];
        if self.rows != 4 || self.cols != 4 {
            EngineError::dims("matrix export", self.dims(), Dims::new(4, 4)).report();
            for (i, col) in out.iter_mut().enumerate() {
                col[i] = 1.0;
            }
            return out;
        }
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = self[(i, j)] as f32;
            }
        }
        out
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i * self.cols + j]
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        or_report(self.checked_mul(rhs), Matrix::empty)
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        &self * &rhs
    }
}

impl Mul<&Matrix> for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        &self * rhs
    }
}

impl Mul<Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self * &rhs
    }
}

impl Mul<Vect3> for &Matrix {
    type Output = Vect3;

    fn mul(self, rhs: Vect3) -> Vect3 {
        or_report(self.transform(rhs), Vect3::zero)
    }
}

impl Mul<Vect3> for Matrix {
    type Output = Vect3;

    fn mul(self, rhs: Vect3) -> Vect3 {
        &self * rhs
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row: Vec<String> = self.row(i).iter().map(|v| format!("{v:.4}")).collect();
            writeln!(f, "[{}]", row.join(", "))?;
        }
        Ok(())
    }
}
