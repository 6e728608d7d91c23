use crate::scene::{FramePlan, SceneComposer};

use super::post_pass::PostPass;
use super::scene_pass::ScenePass;
use super::targets::FrameTargets;
use super::{RenderCtx, RenderTarget};

/// Two-pass frame renderer: scene into offscreen targets, then the
/// convolution pass onto the surface.
///
/// All GPU state is created lazily on the first frame.
#[derive(Default)]
pub struct Renderer {
    targets: FrameTargets,
    scene: ScenePass,
    post: PostPass,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records both passes for `plan` into `target`.
    ///
    /// `composer` must be the one that produced `plan`; its GPU mirrors are
    /// synced here before anything is drawn.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        composer: &mut SceneComposer,
        plan: &FramePlan,
    ) {
        self.targets.ensure(ctx);
        self.scene.render(ctx, target.encoder, &self.targets, composer, plan);
        self.post.render(ctx, target, &self.targets, &plan.post);
    }
}
