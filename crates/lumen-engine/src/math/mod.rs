//! Dense linear algebra: homogeneous vectors, matrices, elimination.

mod matrix;
mod solver;
pub mod transform;
mod vect3;

pub use matrix::Matrix;
pub use solver::{solve, DEFAULT_EPSILON};
pub use vect3::Vect3;
