//! Mosaic Runtime - frame loop infrastructure
//!
//! Provides the building blocks the stage is driven by:
//! - `FrameClock` - real-time or simulated millisecond clock
//! - `IntervalTimer` - fires once immediately, then on a fixed period
//! - `StageEvent` / `EventBus` - typed event queue for captions and completions
//! - `RuntimeSystem` - trait for systems ticked once per frame

mod clock;
mod event;
mod event_bus;
mod system;

pub use clock::{FrameClock, IntervalTimer};
pub use event::StageEvent;
pub use event_bus::EventBus;
pub use system::RuntimeSystem;
