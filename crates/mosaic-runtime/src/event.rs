//! Events emitted by the stage

use mosaic_core::CanvasId;

#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// A canvas started forming a photo; `text` is the formatted caption
    CaptionShown { canvas: CanvasId, text: String },
    /// The canvas began exploding its photo
    CaptionHidden(CanvasId),
    /// Formation and explosion both finished; the canvas is idle again
    AnimationFinished(CanvasId),
    /// The photo for `index` was not resident when the canvas needed it
    CacheMiss { canvas: CanvasId, index: u64 },
}

impl StageEvent {
    pub fn canvas(&self) -> CanvasId {
        match self {
            StageEvent::CaptionShown { canvas, .. } => *canvas,
            StageEvent::CaptionHidden(canvas) => *canvas,
            StageEvent::AnimationFinished(canvas) => *canvas,
            StageEvent::CacheMiss { canvas, .. } => *canvas,
        }
    }
}
