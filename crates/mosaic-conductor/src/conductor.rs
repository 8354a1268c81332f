//! Canvas scheduling: idle queue, photo counter, rolling cache window
//!
//! Every canvas is either waiting in the queue or animating, never both.
//! Photo indices are absolute and only grow; the roster position is
//! derived from them on use.

use mosaic_cache::PixelCache;
use mosaic_core::{CanvasId, MosaicError, PixelSample, Result};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

/// Per-canvas scheduling record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanvasState {
    /// Consecutive cache misses for the canvas at the head of the queue
    pub retries: u32,
    /// Absolute photo index currently animating, if any
    pub current_index: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Every canvas is busy
    Idle,
    Assigned {
        canvas: CanvasId,
        index: u64,
        /// Roster position for `index`
        looped: usize,
        samples: Arc<Vec<PixelSample>>,
    },
    /// Photo not resident yet; the canvas stays at the front of the queue
    Retry { canvas: CanvasId, index: u64 },
    /// Too many misses in a row; the photo is passed over and the canvas
    /// sits out one cycle
    Skipped { canvas: CanvasId, index: u64 },
}

pub struct Conductor {
    queue: VecDeque<CanvasId>,
    animating: BTreeSet<CanvasId>,
    canvases: Vec<CanvasState>,
    next_person_index: u64,
    roster_len: u64,
    batch_size: u64,
    stale_batches: u64,
    max_retries: u32,
    /// Batch containing the most recently assigned index
    window_batch: u64,
}

impl Conductor {
    /// All canvases start idle, queued in id order. Assumes batches 0 and 1
    /// were loaded by `PixelCache::initialize`.
    pub fn new(
        canvas_count: u32,
        roster_len: usize,
        batch_size: u64,
        stale_batches: u64,
        max_retries: u32,
    ) -> Self {
        Self {
            queue: CanvasId::all(canvas_count).collect(),
            animating: BTreeSet::new(),
            canvases: vec![CanvasState::default(); canvas_count as usize],
            next_person_index: 0,
            roster_len: roster_len.max(1) as u64,
            batch_size: batch_size.max(1),
            stale_batches,
            max_retries,
            window_batch: 0,
        }
    }

    pub fn canvas_count(&self) -> usize {
        self.canvases.len()
    }

    pub fn next_person_index(&self) -> u64 {
        self.next_person_index
    }

    pub fn window_batch(&self) -> u64 {
        self.window_batch
    }

    pub fn queue(&self) -> impl Iterator<Item = &CanvasId> {
        self.queue.iter()
    }

    pub fn is_animating(&self, canvas: CanvasId) -> bool {
        self.animating.contains(&canvas)
    }

    pub fn animating(&self) -> impl Iterator<Item = &CanvasId> {
        self.animating.iter()
    }

    pub fn canvas_state(&self, canvas: CanvasId) -> Option<&CanvasState> {
        self.canvases.get(canvas.index())
    }

    /// Hand the next photo to the longest-idle canvas, if the photo is ready
    pub fn tick(&mut self, cache: &PixelCache) -> TickOutcome {
        let Some(canvas) = self.queue.pop_front() else {
            return TickOutcome::Idle;
        };

        let index = self.next_person_index;
        self.next_person_index += 1;
        self.advance_window(index, cache);
        let looped = (index % self.roster_len) as usize;

        if let Some(samples) = cache.get(index) {
            let state = &mut self.canvases[canvas.index()];
            state.retries = 0;
            state.current_index = Some(index);
            self.animating.insert(canvas);
            log::debug!(
                "{} assigned photo {} (roster #{}, {} samples)",
                canvas,
                index,
                looped,
                samples.len()
            );
            return TickOutcome::Assigned {
                canvas,
                index,
                looped,
                samples,
            };
        }

        // Miss: ask for this one photo right away
        let miss = MosaicError::CacheMiss(index);
        let state = &mut self.canvases[canvas.index()];
        state.retries += 1;
        if state.retries > self.max_retries {
            // The photo never loaded; move past it so later ones still play
            log::warn!(
                "{} on {} after {} retries; skipping photo {}",
                miss,
                canvas,
                self.max_retries,
                index
            );
            state.retries = 0;
            self.queue.push_back(canvas);
            return TickOutcome::Skipped { canvas, index };
        }

        log::debug!("{} on {} (attempt {})", miss, canvas, state.retries);
        self.next_person_index -= 1;
        cache.load_one(index);
        self.queue.push_front(canvas);
        TickOutcome::Retry { canvas, index }
    }

    /// Entering batch `b` prefetches batch `b + 1` and evicts the batch that
    /// just fell out of the stale window
    fn advance_window(&mut self, index: u64, cache: &PixelCache) {
        let batch = index / self.batch_size;
        while self.window_batch < batch {
            self.window_batch += 1;
            let current = self.window_batch;
            let ahead = (current + 1) * self.batch_size;
            cache.load_batch(ahead, self.batch_size);
            if current > self.stale_batches {
                let evict = current - self.stale_batches - 1;
                cache.cleanup_batch(evict * self.batch_size, self.batch_size);
            }
            log::info!(
                "Cache window now at batch {} (prefetching from {})",
                current,
                ahead
            );
        }
    }

    /// A canvas finished its animation and rejoins the back of the queue
    pub fn finish(&mut self, canvas: CanvasId) -> Result<()> {
        let queued = self.queue.contains(&canvas);
        if self.animating.remove(&canvas) && !queued {
            if let Some(state) = self.canvases.get_mut(canvas.index()) {
                state.current_index = None;
            }
            self.queue.push_back(canvas);
            return Ok(());
        }

        log::error!(
            "{} reported completion but was not animating; rebuilding the queue",
            canvas
        );
        self.heal();
        Err(MosaicError::InvariantViolation(format!(
            "{} finished while not animating",
            canvas
        )))
    }

    /// Verify that queue and animating set partition the canvases
    pub fn check_partition(&self) -> Result<()> {
        let n = self.canvases.len();
        let mut seen = vec![0u32; n];
        for canvas in self.queue.iter().chain(self.animating.iter()) {
            match seen.get_mut(canvas.index()) {
                Some(count) => *count += 1,
                None => {
                    return Err(MosaicError::InvariantViolation(format!(
                        "unknown canvas {}",
                        canvas
                    )))
                }
            }
        }
        if let Some(pos) = seen.iter().position(|&c| c != 1) {
            return Err(MosaicError::InvariantViolation(format!(
                "canvas{} appears {} times across queue and animating set",
                pos + 1,
                seen[pos]
            )));
        }
        Ok(())
    }

    /// Drop duplicates and strangers from the queue, then requeue every
    /// canvas that is in neither set
    fn heal(&mut self) {
        let n = self.canvases.len() as u32;
        let animating = &self.animating;
        let mut seen = BTreeSet::new();
        self.queue
            .retain(|c| c.raw() < n && !animating.contains(c) && seen.insert(*c));
        for canvas in CanvasId::all(n) {
            if !animating.contains(&canvas) && !seen.contains(&canvas) {
                self.queue.push_back(canvas);
            }
        }
    }
}
