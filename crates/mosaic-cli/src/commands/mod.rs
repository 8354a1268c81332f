//! CLI command implementations

pub mod render;
pub mod roster;
pub mod sample;
