//! 4×4 affine/projective constructors.

use super::{Matrix, Vect3};

pub fn identity(n: usize) -> Matrix {
    let mut m = Matrix::zeros(n, n);
    for i in 0..n {
        m[(i, i)] = 1.0;
    }
    m
}

pub fn scale(s: Vect3) -> Matrix {
    let mut m = identity(4);
    m[(0, 0)] = s.x;
    m[(1, 1)] = s.y;
    m[(2, 2)] = s.z;
    m
}

pub fn uniform_scale(s: f64) -> Matrix {
    scale(Vect3::new(s, s, s))
}

pub fn translation(t: Vect3) -> Matrix {
    let mut m = identity(4);
    m[(0, 3)] = t.x;
    m[(1, 3)] = t.y;
    m[(2, 3)] = t.z;
    m
}

/// Rotation by `angle` radians about `axis` (Rodrigues).
///
/// The axis is normalized first. A zero axis yields NaN entries.
pub fn rotation(axis: Vect3, angle: f64) -> Matrix {
    let len = axis.length();
    let (x, y, z) = (axis.x / len, axis.y / len, axis.z / len);
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;

    Matrix::from_rows(&[
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s, 0.0],
        [y * x * t + z * s, c + y * y * t, y * z * t - x * s, 0.0],
        [z * x * t - y * s, z * y * t + x * s, c + z * z * t, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Orientation whose columns are `vx`, `vy`, `vz`, with an affine identity
/// bottom row and right column.
pub fn from_basis(vx: Vect3, vy: Vect3, vz: Vect3) -> Matrix {
    Matrix::from_rows(&[
        [vx.x, vy.x, vz.x, 0.0],
        [vx.y, vy.y, vz.y, 0.0],
        [vx.z, vy.z, vz.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Perspective projection looking down +z.
///
/// Clip-space z spans `[-w, w]` between `near` and `far`; the scene shader
/// remaps it to wgpu's `[0, w]`.
pub fn perspective(fov: f64, aspect: f64, near: f64, far: f64) -> Matrix {
    let f = 1.0 / (fov / 2.0).tan();
    let mut m = &scale(Vect3::new(f, aspect * f, (near + far) / (far - near)))
        * &translation(Vect3::new(0.0, 0.0, -2.0 * near * far / (near + far)));
    m[(3, 2)] = 1.0;
    m[(3, 3)] = 0.0;
    m
}
