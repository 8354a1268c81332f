//! Pixel cache keyed by absolute photo index
//!
//! Loads run on a small pool of background threads; callers observe
//! completion by checking `contains`/`get` later, or by waiting on the
//! returned [`BatchHandle`]. Eviction always wins over an in-flight load:
//! `cleanup_batch` revokes the pending ticket and the late result is dropped.

use crate::roster::Roster;
use crate::sampler::PixelSampler;
use crossbeam::channel::{self, Receiver, Sender};
use mosaic_core::{MosaicError, PixelSample, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

type Samples = Arc<Vec<PixelSample>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<u64, Samples>,
    /// In-flight loads; the ticket identifies which request owns the slot
    pending: HashMap<u64, u64>,
    next_ticket: u64,
    roster: Option<Arc<Roster>>,
    step_pixel: u32,
}

struct LoadTask {
    index: u64,
    ticket: u64,
    done: Sender<LoadOutcome>,
}

#[derive(Debug)]
enum LoadOutcome {
    Loaded,
    Failed(MosaicError),
    Discarded,
}

/// Summary of a finished batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Loads issued by this call (already resident or in-flight indices excluded)
    pub requested: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Finished after being evicted; the result was thrown away
    pub discarded: usize,
    /// One `SamplerError` per failed load
    pub errors: Vec<MosaicError>,
}

/// Completion handle for loads issued by one call. Dropping it does not
/// cancel anything.
pub struct BatchHandle {
    requested: usize,
    done: Receiver<LoadOutcome>,
}

impl BatchHandle {
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Block until every load issued by this call has finished
    pub fn wait(self) -> BatchReport {
        let mut report = BatchReport {
            requested: self.requested,
            ..Default::default()
        };
        for outcome in self.done.iter() {
            match outcome {
                LoadOutcome::Loaded => report.loaded += 1,
                LoadOutcome::Failed(e) => {
                    report.failed += 1;
                    report.errors.push(e);
                }
                LoadOutcome::Discarded => report.discarded += 1,
            }
        }
        report
    }
}

pub struct PixelCache {
    state: Arc<Mutex<CacheState>>,
    tasks: Option<Sender<LoadTask>>,
    loaders: Vec<JoinHandle<()>>,
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PixelCache {
    /// Start `loader_threads` background loaders sampling for a
    /// `target_width` x `target_height` canvas
    pub fn new(
        sampler: Arc<dyn PixelSampler>,
        loader_threads: usize,
        target_width: u32,
        target_height: u32,
    ) -> Result<Self> {
        let state = Arc::new(Mutex::new(CacheState::default()));
        let (task_tx, task_rx) = channel::unbounded::<LoadTask>();

        let mut loaders = Vec::with_capacity(loader_threads);
        for i in 0..loader_threads.max(1) {
            let rx = task_rx.clone();
            let state = Arc::clone(&state);
            let sampler = Arc::clone(&sampler);
            let handle = std::thread::Builder::new()
                .name(format!("pixel-loader-{i}"))
                .spawn(move || {
                    for task in rx.iter() {
                        let outcome = run_load(
                            &state,
                            sampler.as_ref(),
                            task.index,
                            task.ticket,
                            target_width,
                            target_height,
                        );
                        let _ = task.done.send(outcome);
                    }
                })?;
            loaders.push(handle);
        }

        Ok(Self {
            state,
            tasks: Some(task_tx),
            loaders,
        })
    }

    /// Seed the roster and step size, then load the first two batches
    /// concurrently and block until both have finished.
    pub fn initialize(
        &self,
        roster: Arc<Roster>,
        step_pixel: u32,
        batch_size: u64,
    ) -> BatchReport {
        {
            let mut state = lock(&self.state);
            state.roster = Some(roster);
            state.step_pixel = step_pixel;
        }
        let first = self.load_batch(0, batch_size);
        let second = self.load_batch(batch_size, batch_size);
        let a = first.wait();
        let b = second.wait();
        let report = BatchReport {
            requested: a.requested + b.requested,
            loaded: a.loaded + b.loaded,
            failed: a.failed + b.failed,
            discarded: a.discarded + b.discarded,
            errors: a.errors.into_iter().chain(b.errors).collect(),
        };
        log::info!(
            "Cache initialized: {}/{} photos resident",
            report.loaded,
            report.requested
        );
        report
    }

    /// Queue loads for `[start, start + size)`, skipping indices that are
    /// already resident or in flight
    pub fn load_batch(&self, start: u64, size: u64) -> BatchHandle {
        self.enqueue(start..start.saturating_add(size))
    }

    /// Emergency single-photo load, used on a cache miss
    pub fn load_one(&self, index: u64) -> BatchHandle {
        log::debug!("Emergency load for index {}", index);
        self.enqueue(index..index + 1)
    }

    fn enqueue(&self, indices: std::ops::Range<u64>) -> BatchHandle {
        let (done_tx, done_rx) = channel::unbounded();
        let mut requested = 0;

        let mut state = lock(&self.state);
        for index in indices {
            if state.entries.contains_key(&index) || state.pending.contains_key(&index) {
                continue;
            }
            let ticket = state.next_ticket;
            state.next_ticket += 1;

            let task = LoadTask {
                index,
                ticket,
                done: done_tx.clone(),
            };
            let sent = match &self.tasks {
                Some(tasks) => tasks.send(task).is_ok(),
                None => false,
            };
            if sent {
                state.pending.insert(index, ticket);
                requested += 1;
            } else {
                log::error!("Pixel loaders are gone; cannot load index {}", index);
            }
        }
        drop(state);

        BatchHandle {
            requested,
            done: done_rx,
        }
    }

    /// Drop `[start, start + size)`, including loads still in flight
    pub fn cleanup_batch(&self, start: u64, size: u64) {
        let mut state = lock(&self.state);
        let mut evicted = 0;
        for index in start..start.saturating_add(size) {
            if state.entries.remove(&index).is_some() {
                evicted += 1;
            }
            state.pending.remove(&index);
        }
        log::debug!(
            "Evicted batch [{}, {}): {} entries",
            start,
            start.saturating_add(size),
            evicted
        );
    }

    pub fn get(&self, index: u64) -> Option<Samples> {
        lock(&self.state).entries.get(&index).cloned()
    }

    pub fn contains(&self, index: u64) -> bool {
        lock(&self.state).entries.contains_key(&index)
    }

    pub fn is_pending(&self, index: u64) -> bool {
        lock(&self.state).pending.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resident indices in ascending order
    pub fn resident(&self) -> Vec<u64> {
        let mut keys: Vec<u64> = lock(&self.state).entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn roster(&self) -> Option<Arc<Roster>> {
        lock(&self.state).roster.clone()
    }
}

impl Drop for PixelCache {
    fn drop(&mut self) {
        self.tasks.take();
        for handle in self.loaders.drain(..) {
            let _ = handle.join();
        }
    }
}

fn run_load(
    state: &Mutex<CacheState>,
    sampler: &dyn PixelSampler,
    index: u64,
    ticket: u64,
    width: u32,
    height: u32,
) -> LoadOutcome {
    let (roster, step) = {
        let guard = lock(state);
        if guard.pending.get(&index) != Some(&ticket) {
            return LoadOutcome::Discarded;
        }
        (guard.roster.clone(), guard.step_pixel)
    };
    let Some(roster) = roster else {
        log::error!("Load for index {} issued before a roster was set", index);
        lock(state).pending.remove(&index);
        return LoadOutcome::Failed(MosaicError::SamplerError {
            index,
            message: "no roster set".to_string(),
        });
    };

    let person = roster.person_for(index);
    let result = sampler.sample(person, step, width, height);

    let mut guard = lock(state);
    if guard.pending.get(&index) != Some(&ticket) {
        log::debug!("Discarding late load for evicted index {}", index);
        return LoadOutcome::Discarded;
    }
    guard.pending.remove(&index);
    match result {
        Ok(samples) => {
            guard.entries.insert(index, Arc::new(samples));
            LoadOutcome::Loaded
        }
        Err(e) => {
            let err = MosaicError::SamplerError {
                index,
                message: format!("{}: {}", person.display_name, e),
            };
            log::warn!("{}", err);
            LoadOutcome::Failed(err)
        }
    }
}
