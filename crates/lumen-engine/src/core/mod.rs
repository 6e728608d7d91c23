//! Contracts between the window runtime and applications.
//!
//! The runtime owns the event loop and GPU surfaces; applications implement
//! [`App`] and receive a [`FrameCtx`] per frame.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
