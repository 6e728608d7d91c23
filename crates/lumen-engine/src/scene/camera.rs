use crate::math::{transform, Matrix, Vect3};

/// Camera pose: position plus an orthonormal forward/right pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vect3,
    direction: Vect3,
    horizontal: Vect3,
}

impl Camera {
    #[inline]
    pub fn direction(&self) -> Vect3 {
        self.direction
    }

    #[inline]
    pub fn horizontal(&self) -> Vect3 {
        self.horizontal
    }

    /// Up vector, `direction × horizontal`.
    #[inline]
    pub fn vertical(&self) -> Vect3 {
        self.direction.cross(self.horizontal)
    }

    /// Rotates the orientation about `axis`; the position stays put.
    pub fn rotate(&mut self, axis: Vect3, angle: f64) {
        let r = transform::rotation(axis, angle);
        self.direction = &r * self.direction;
        self.horizontal = &r * self.horizontal;
    }

    /// Re-aims the camera. `direction` and `horizontal` must be orthogonal.
    pub fn set_orientation(&mut self, direction: Vect3, horizontal: Vect3) {
        self.direction = direction.normalize();
        self.horizontal = horizontal.normalize();
    }

    /// World → view: rigid change of basis onto (right, up, forward) after
    /// moving the camera to the origin.
    pub fn view_matrix(&self) -> Matrix {
        let basis = transform::from_basis(self.horizontal, self.vertical(), self.direction).transposed();
        &basis * &transform::translation(-self.position)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vect3::zero(),
            direction: Vect3::new(0.0, 0.0, 1.0),
            horizontal: Vect3::new(1.0, 0.0, 0.0),
        }
    }
}
