use core::ops::Range;

use crate::geometry::ObjectId;
use crate::math::{Matrix, Vect3};

use super::{LightState, PostSettings};

/// Which geometry a draw refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawTarget {
    /// Marker object of the light in this slot.
    Marker(usize),
    Object(ObjectId),
}

/// Instance selection of a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instances {
    /// Every instance in one instanced call.
    All(u32),
    /// A single instance (transparent path).
    One(u32),
}

impl Instances {
    /// Instance range for the draw call.
    #[inline]
    pub fn range(self) -> Range<u32> {
        match self {
            Instances::All(n) => 0..n,
            Instances::One(i) => i..i + 1,
        }
    }
}

/// One draw of the scene pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCmd {
    pub target: DrawTarget,
    pub instances: Instances,
    /// Alpha blending expected (draw order matters).
    pub transparent: bool,
    /// Stencil reference written by this draw; 0 when no outline follows.
    pub stencil_ref: u32,
    /// Range into [`FramePlan::outlines`] drawn right after, masked by
    /// `stencil_ref`.
    pub outline: Option<Range<u32>>,
}

/// Outline instance: scaled-up model plus flat color.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineInstance {
    pub model: Matrix,
    pub color: Vect3,
}

/// Everything the renderer needs for one frame, in draw order.
///
/// Built on the CPU by [`SceneComposer::compose`](super::SceneComposer::compose);
/// building it touches no GPU state.
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub view: Matrix,
    pub projection: Matrix,
    pub view_pos: Vect3,
    pub gamma: f64,
    pub clear_color: Vect3,

    /// One entry per slot; empty slots hold [`LightState::neutral`].
    pub lights: Vec<LightState>,

    pub draws: Vec<DrawCmd>,
    pub outlines: Vec<OutlineInstance>,

    pub post: PostSettings,
}

impl FramePlan {
    /// Object draws in order (markers skipped).
    pub fn object_draws(&self) -> impl Iterator<Item = (ObjectId, Instances)> + '_ {
        self.draws.iter().filter_map(|d| match d.target {
            DrawTarget::Object(id) => Some((id, d.instances)),
            DrawTarget::Marker(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_ranges() {
        assert_eq!(Instances::All(3).range(), 0..3);
        assert_eq!(Instances::One(4).range(), 4..5);
        assert!(Instances::All(0).range().is_empty());
    }
}
