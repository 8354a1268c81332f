//! Mosaic Core - Foundational types for the Mosaic engine
//!
//! This crate provides the core types that all other Mosaic crates depend on:
//! - `CanvasId` - Identifiers for the animated canvases
//! - `Vec2`, `Rgb`, `PixelSample` - Geometry and sampled pixel data
//! - `XorShiftRng` - Small seeded PRNG shared by simulation and roster shuffling
//! - Error types and Result alias

mod error;
mod id;
pub mod rand;
mod types;

pub use error::{MosaicError, Result};
pub use id::CanvasId;
pub use rand::XorShiftRng;
pub use types::{PixelSample, Rgb, Vec2};
