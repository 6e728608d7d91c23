use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::error::{or_report, EngineError, Result};

/// Homogeneous 3D point/direction.
///
/// Invariant:
/// - vector algebra (`+`, `-`, scaling, dot, cross, normalize, reflect) reads and
///   writes `x`, `y`, `z` only; results carry `w = 1`
/// - `w` participates only when the vector is multiplied by a 4×4 [`Matrix`](super::Matrix)
/// - equality compares `x`, `y`, `z`
#[derive(Debug, Copy, Clone)]
pub struct Vect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

const IN_ANGLE_EPS: f64 = 1e-5;

impl Vect3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    #[inline]
    pub const fn with_w(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn dot(self, rhs: Vect3) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Vect3) -> Vect3 {
        Vect3::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Component-wise `|c|^p`.
    #[inline]
    pub fn pow_abs(self, p: f64) -> Vect3 {
        Vect3::new(self.x.abs().powf(p), self.y.abs().powf(p), self.z.abs().powf(p))
    }

    #[inline]
    pub fn length_sqr(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.length_sqr().sqrt()
    }

    /// Divides x/y/z by `rhs`.
    pub fn checked_div(self, rhs: f64) -> Result<Vect3> {
        if rhs == 0.0 {
            return Err(EngineError::DivisionByZero { op: "vector division" });
        }
        Ok(Vect3::new(self.x / rhs, self.y / rhs, self.z / rhs))
    }

    /// Unit vector in the same direction.
    ///
    /// A zero vector is reported and returned unchanged.
    pub fn normalize(self) -> Vect3 {
        self / self.length()
    }

    /// Cosine of the angle between `self` and `v`.
    pub fn cos_angle(self, v: Vect3) -> f64 {
        self.dot(v) / (self.length() * v.length())
    }

    /// Sine of the angle between `self` and `v` (always non-negative).
    pub fn sin_angle(self, v: Vect3) -> f64 {
        self.cross(v).length() / (self.length() * v.length())
    }

    /// Reflects `self` about the unit normal `n`: `2(n·v)n - v`.
    pub fn reflect(self, n: Vect3) -> Vect3 {
        n * (2.0 * n.dot(self)) - self
    }

    /// Raises each component to at least the matching component of `v`.
    pub fn set_max(&mut self, v: Vect3) -> Vect3 {
        self.x = self.x.max(v.x);
        self.y = self.y.max(v.y);
        self.z = self.z.max(v.z);
        *self
    }

    /// Lowers each component to at most the matching component of `v`.
    pub fn set_min(&mut self, v: Vect3) -> Vect3 {
        self.x = self.x.min(v.x);
        self.y = self.y.min(v.y);
        self.z = self.z.min(v.z);
        *self
    }

    /// Component-wise clamp into `[lo, hi]`.
    pub fn clamp(self, lo: Vect3, hi: Vect3) -> Vect3 {
        let mut v = self;
        v.set_max(lo);
        v.set_min(hi)
    }

    /// True when `self` lies between `a` and `b` in the plane they span.
    pub fn in_angle(self, a: Vect3, b: Vect3) -> bool {
        (a.cross(self).cos_angle(b.cross(self)) + 1.0).abs() < IN_ANGLE_EPS
    }

    /// Approximate equality on x/y/z.
    pub fn approx_eq(self, other: Vect3, tol: f64) -> bool {
        (self.x - other.x).abs() <= tol
            && (self.y - other.y).abs() <= tol
            && (self.z - other.z).abs() <= tol
    }

    #[inline]
    pub fn to_f32(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Default for Vect3 {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Vect3 {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl From<[f64; 3]> for Vect3 {
    #[inline]
    fn from(v: [f64; 3]) -> Self {
        Vect3::new(v[0], v[1], v[2])
    }
}

impl From<[f64; 4]> for Vect3 {
    #[inline]
    fn from(v: [f64; 4]) -> Self {
        Vect3::with_w(v[0], v[1], v[2], v[3])
    }
}

/// Components in x, y, z, w order. Indices past 3 panic, as slice indexing
/// and `Matrix` indexing do.
impl Index<usize> for Vect3 {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            3 => &self.w,
            _ => panic!("Vect3 index out of range: {index} (components are 0..=3)"),
        }
    }
}

impl IndexMut<usize> for Vect3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            2 => &mut self.z,
            3 => &mut self.w,
            _ => panic!("Vect3 index out of range: {index} (components are 0..=3)"),
        }
    }
}

impl Neg for Vect3 {
    type Output = Vect3;
    #[inline]
    fn neg(self) -> Vect3 {
        Vect3::new(-self.x, -self.y, -self.z)
    }
}

impl Add for Vect3 {
    type Output = Vect3;
    #[inline]
    fn add(self, rhs: Vect3) -> Vect3 {
        Vect3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vect3 {
    type Output = Vect3;
    #[inline]
    fn sub(self, rhs: Vect3) -> Vect3 {
        Vect3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vect3 {
    type Output = Vect3;
    #[inline]
    fn mul(self, rhs: f64) -> Vect3 {
        Vect3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<Vect3> for f64 {
    type Output = Vect3;
    #[inline]
    fn mul(self, rhs: Vect3) -> Vect3 {
        rhs * self
    }
}

/// Division by zero is reported; the vector comes back unchanged.
impl Div<f64> for Vect3 {
    type Output = Vect3;
    fn div(self, rhs: f64) -> Vect3 {
        or_report(self.checked_div(rhs), || self)
    }
}

impl AddAssign for Vect3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vect3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl SubAssign for Vect3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vect3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl MulAssign<f64> for Vect3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

/// Division by zero is reported and leaves the vector untouched.
impl DivAssign<f64> for Vect3 {
    fn div_assign(&mut self, rhs: f64) {
        if let Ok(v) = self.checked_div(rhs).map_err(EngineError::report) {
            self.x = v.x;
            self.y = v.y;
            self.z = v.z;
        }
    }
}

impl fmt::Display for Vect3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vect3 { Vect3::new(x, y, z) }

    // ── arithmetic ────────────────────────────────────────────────────────

    #[test]
    fn arithmetic_ignores_w() {
        let a = Vect3::with_w(1.0, 2.0, 3.0, 7.0);
        let b = Vect3::with_w(4.0, 5.0, 6.0, 9.0);
        let s = a + b;
        assert_eq!(s, v(5.0, 7.0, 9.0));
        assert_eq!(s.w, 1.0);

        let mut c = a;
        c += b;
        c *= 2.0;
        assert_eq!(c, v(10.0, 14.0, 18.0));
        assert_eq!(c.w, 7.0);
    }

    #[test]
    fn equality_compares_xyz_only() {
        assert_eq!(Vect3::with_w(1.0, 2.0, 3.0, 0.0), v(1.0, 2.0, 3.0));
    }

    #[test]
    fn dot_and_cross() {
        assert_eq!(v(1.0, 2.0, 3.0).dot(v(4.0, -5.0, 6.0)), 12.0);
        assert_eq!(v(1.0, 0.0, 0.0).cross(v(0.0, 1.0, 0.0)), v(0.0, 0.0, 1.0));
        assert_eq!(v(0.0, 0.0, 1.0).cross(v(1.0, 0.0, 0.0)), v(0.0, 1.0, 0.0));
    }

    #[test]
    fn scalar_on_either_side() {
        assert_eq!(2.0 * v(1.0, -1.0, 0.5), v(1.0, -1.0, 0.5) * 2.0);
    }

    // ── division ──────────────────────────────────────────────────────────

    #[test]
    fn checked_div_by_zero_is_an_error() {
        let r = v(1.0, 2.0, 3.0).checked_div(0.0);
        assert!(matches!(r, Err(EngineError::DivisionByZero { .. })));
    }

    #[test]
    fn div_assign_by_zero_is_a_no_op() {
        let mut a = v(1.0, 2.0, 3.0);
        a /= 0.0;
        assert_eq!(a, v(1.0, 2.0, 3.0));
    }

    #[test]
    fn normalize_has_unit_length() {
        for a in [v(3.0, 4.0, 0.0), v(-1e-3, 2e-3, 5e-4), v(1e6, -2e6, 3.0), v(0.0, 0.0, -9.0)] {
            assert!((a.normalize().length() - 1.0).abs() < 1e-6, "{a}");
        }
    }

    #[test]
    fn normalize_zero_vector_returns_it_unchanged() {
        assert_eq!(Vect3::zero().normalize(), Vect3::zero());
    }

    // ── angles / reflection ───────────────────────────────────────────────

    #[test]
    fn angle_between_perpendicular_vectors() {
        let a = v(2.0, 0.0, 0.0);
        let b = v(0.0, 3.0, 0.0);
        assert!(a.cos_angle(b).abs() < 1e-12);
        assert!((a.sin_angle(b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reflect_about_normal() {
        let n = v(0.0, 1.0, 0.0);
        assert!(v(1.0, 1.0, 0.0).reflect(n).approx_eq(v(-1.0, 1.0, 0.0), 1e-12));
    }

    #[test]
    fn in_angle_between_bounds() {
        let a = v(1.0, 0.0, 0.0);
        let b = v(0.0, 1.0, 0.0);
        assert!(v(1.0, 1.0, 0.0).in_angle(a, b));
        assert!(!v(-1.0, 2.0, 0.0).in_angle(a, b));
    }

    // ── min / max ─────────────────────────────────────────────────────────

    #[test]
    fn set_max_set_min_and_clamp() {
        let mut a = v(1.0, 5.0, -2.0);
        assert_eq!(a.set_max(v(2.0, 0.0, 0.0)), v(2.0, 5.0, 0.0));
        assert_eq!(a.set_min(v(3.0, 1.0, 3.0)), v(2.0, 1.0, 0.0));
        let c = v(-4.0, 0.5, 9.0).clamp(Vect3::zero(), v(1.0, 1.0, 1.0));
        assert_eq!(c, v(0.0, 0.5, 1.0));
    }

    #[test]
    fn index_reaches_w() {
        let mut a = v(1.0, 2.0, 3.0);
        a[3] = 0.0;
        assert_eq!(a[0] + a[1] + a[2], 6.0);
        assert_eq!(a.w, 0.0);
    }

    #[test]
    #[should_panic(expected = "Vect3 index out of range: 4")]
    fn index_past_w_panics() {
        let a = v(1.0, 2.0, 3.0);
        let _ = a[4];
    }

    #[test]
    fn pow_abs_is_component_wise() {
        assert_eq!(v(-2.0, 3.0, 0.0).pow_abs(2.0), v(4.0, 9.0, 0.0));
    }
}
