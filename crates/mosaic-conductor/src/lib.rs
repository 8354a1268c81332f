//! Mosaic Conductor - who plays where, and when
//!
//! - `Conductor` - FIFO of idle canvases, monotonic photo counter, and the
//!   rolling cache window
//! - `CanvasAnimation` - formation → hold → explosion loop for one canvas
//! - `Stage` - wires conductor, cache, canvases and surfaces into one
//!   per-frame `RuntimeSystem`

mod canvas;
mod conductor;
mod config;
mod stage;

pub use canvas::{AnimationPhase, CanvasAnimation, FrameHandle, PhaseTiming, StepOutcome};
pub use conductor::{CanvasState, Conductor, TickOutcome};
pub use config::StageConfig;
pub use stage::Stage;
