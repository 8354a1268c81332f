//! Canvas identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one animated canvas.
///
/// Canvas ids are dense indices (`0..canvas_count`) so they double as
/// positions into per-canvas vectors.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasId(pub u32);

impl CanvasId {
    pub fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Position of this canvas in per-canvas storage
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// All ids for a stage of `count` canvases, in order
    pub fn all(count: u32) -> impl Iterator<Item = CanvasId> {
        (0..count).map(CanvasId)
    }
}

impl fmt::Debug for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanvasId({})", self.0)
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "canvas{}", self.0 + 1)
    }
}
