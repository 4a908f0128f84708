//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU layer, and
//! runs the app's setup once the GPU is ready.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
