//! Texquad engine crate.
//!
//! Owns the platform + GPU runtime pieces the sample is built on, plus the
//! CPU-side helpers (arena, asset reader, image decode) that feed them.

pub mod core;
pub mod device;
pub mod window;

pub mod image;
pub mod io;
pub mod logging;
pub mod memory;
pub mod render;
