//! Runtime system trait

use crate::clock::FrameClock;
use mosaic_core::Result;

/// A system that can be ticked by the frame loop
pub trait RuntimeSystem {
    /// Called once before the first frame
    fn initialize(&mut self) -> Result<()>;

    /// Called once per frame with the clock already advanced
    fn update(&mut self, clock: &FrameClock) -> Result<()>;

    /// Called when the loop is being shut down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
