//! Scene + renderer bundle driven once per frame.

use crate::config::EngineConfig;
use crate::render::{RenderCtx, RenderTarget, Renderer};
use crate::scene::{FramePlan, SceneComposer};

/// Owns a scene and the renderer that draws it.
///
/// Typical frame:
/// ```ignore
/// engine.scene_mut().rotate_camera(axis, dt);
/// ctx.render(|rctx, target| engine.draw(rctx, target));
/// ```
pub struct Engine {
    scene: SceneComposer,
    renderer: Renderer,
}

impl Engine {
    /// `size` is the drawable size in physical pixels.
    pub fn new(config: &EngineConfig, size: (u32, u32)) -> Self {
        log::info!(
            "engine created: {} light slots, {} instances per object",
            config.effective_light_slots(),
            config.max_instances
        );
        Self {
            scene: SceneComposer::new(config, aspect_of(size)),
            renderer: Renderer::new(),
        }
    }

    #[inline]
    pub fn scene(&self) -> &SceneComposer {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut SceneComposer {
        &mut self.scene
    }

    /// Rebuilds the projection for the new drawable size; 0-area sizes are
    /// ignored. Offscreen targets follow on the next draw.
    pub fn resize(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        self.scene.set_aspect(aspect_of(size));
    }

    /// Composes this frame's plan and records both passes.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> FramePlan {
        let plan = self.scene.compose();
        self.renderer.render(ctx, target, &mut self.scene, &plan);
        plan
    }
}

fn aspect_of((w, h): (u32, u32)) -> f64 {
    if w == 0 || h == 0 {
        1.0
    } else {
        w as f64 / h as f64
    }
}
