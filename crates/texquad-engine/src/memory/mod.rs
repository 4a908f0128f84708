//! Scratch memory for setup-time staging.
//!
//! A single bump arena: allocations advance a cursor and are never freed.

mod arena;

pub use arena::{Arena, ArenaError};
