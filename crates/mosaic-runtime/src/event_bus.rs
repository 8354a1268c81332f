//! FIFO of stage events, filled during `update` and drained by the host

use crate::event::StageEvent;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<StageEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: StageEvent) {
        self.queue.push_back(event);
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<StageEvent> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::CanvasId;

    fn caption(canvas: u32, text: &str) -> StageEvent {
        StageEvent::CaptionShown {
            canvas: CanvasId(canvas),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_drain_keeps_push_order() {
        let mut bus = EventBus::new();
        assert!(bus.is_empty());
        bus.push(caption(0, "JANE DOE"));
        bus.push(StageEvent::AnimationFinished(CanvasId(1)));
        assert_eq!(bus.len(), 2);

        let events = bus.drain();
        assert_eq!(events[0], caption(0, "JANE DOE"));
        assert_eq!(events[1].canvas(), CanvasId(1));
        assert!(bus.drain().is_empty());
    }
}
