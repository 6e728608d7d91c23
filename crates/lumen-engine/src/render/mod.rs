//! GPU rendering subsystem.
//!
//! Consumes a [`FramePlan`](crate::scene::FramePlan) and issues wgpu commands.
//! Each pass owns its pipelines and buffers; per-mesh buffers live inside
//! the scene types they mirror.
//!
//! Convention:
//! - scene geometry is f64 world space, converted to f32 at upload
//! - the projection is OpenGL-style; the vertex shader remaps depth for wgpu

mod ctx;
mod gpu_mesh;
mod post_pass;
mod renderer;
mod scene_pass;
mod targets;
mod texture;
mod uniforms;

pub use ctx::{RenderCtx, RenderTarget};
pub(crate) use gpu_mesh::{ObjectGpu, PolygonGpu};
pub use renderer::Renderer;
pub use texture::{Texture, Wrap};
