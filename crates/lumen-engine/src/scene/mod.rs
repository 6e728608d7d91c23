//! Scene description and per-frame composition.
//!
//! Responsibilities:
//! - own the camera, lights and objects of a scene
//! - turn them into a [`FramePlan`] with a deterministic draw order
//!   (markers, opaque, then transparent back-to-front)
//! - stay free of GPU state so ordering is testable headless

mod camera;
mod composer;
mod kernel;
mod key;
mod light;
mod plan;

pub use camera::Camera;
pub use composer::SceneComposer;
pub use kernel::{Kernel, PostSettings, DEFAULT_KERNEL_OFFSET};
pub use key::DepthKey;
pub use light::{Attenuation, Light, LightKind, LightState};
pub use plan::{DrawCmd, DrawTarget, FramePlan, Instances, OutlineInstance};
