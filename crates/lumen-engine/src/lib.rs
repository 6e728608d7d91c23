//! Lumen engine crate.
//!
//! CPU-side scene model (math, geometry, scene composition) plus the wgpu
//! renderer and winit runtime that draw it.

pub mod config;
pub mod error;
pub mod math;
pub mod geometry;
pub mod scene;

pub mod render;
pub mod engine;

pub mod device;
pub mod window;
pub mod time;
pub mod core;
pub mod logging;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};
