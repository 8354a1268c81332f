//! Per-frame particle update strategies
//!
//! `InProcessCompute` runs every update on the calling thread.
//! `OffloadedCompute` splits the active slice across worker threads and
//! waits for the results up to a deadline; anything that does not come
//! back in time is updated synchronously for that frame instead.

use crate::config::{ComputeMode, ParticleConfig};
use crate::particle::Particle;
use crossbeam::channel::{self, Receiver, Sender};
use mosaic_core::{MosaicError, Result};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub trait ParticleCompute: Send {
    fn name(&self) -> &str;

    /// Advance every particle in `particles` to `now`
    fn update(&mut self, particles: &mut [Particle], now: f64, config: &ParticleConfig);
}

#[derive(Debug, Default)]
pub struct InProcessCompute;

impl ParticleCompute for InProcessCompute {
    fn name(&self) -> &str {
        "in_process"
    }

    fn update(&mut self, particles: &mut [Particle], now: f64, config: &ParticleConfig) {
        update_slice(particles, now, config);
    }
}

fn update_slice(particles: &mut [Particle], now: f64, config: &ParticleConfig) {
    for particle in particles {
        particle.update(now, config);
    }
}

struct Job {
    offset: usize,
    chunk: Vec<Particle>,
    now: f64,
    config: Arc<ParticleConfig>,
    reply: Sender<JobResult>,
}

struct JobResult {
    offset: usize,
    chunk: Vec<Particle>,
}

pub struct OffloadedCompute {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    timeout: Duration,
    fallback_count: u64,
}

impl OffloadedCompute {
    /// Start `workers` update threads. Zero workers is allowed and makes
    /// every frame take the synchronous path.
    pub fn spawn(workers: usize, timeout_ms: u64) -> Result<Self> {
        let (job_tx, job_rx) = channel::unbounded::<Job>();
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let rx: Receiver<Job> = job_rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("particle-compute-{i}"))
                .spawn(move || {
                    for mut job in rx.iter() {
                        update_slice(&mut job.chunk, job.now, &job.config);
                        // The frame may have given up on us; that is fine
                        let _ = job.reply.send(JobResult {
                            offset: job.offset,
                            chunk: job.chunk,
                        });
                    }
                })
                .map_err(|e| MosaicError::ComputeError(format!("worker {i}: {e}")))?;
            handles.push(handle);
        }
        log::debug!("Spawned {} particle compute workers", workers);

        Ok(Self {
            jobs: Some(job_tx),
            workers: handles,
            timeout: Duration::from_millis(timeout_ms),
            fallback_count: 0,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Frames (or parts of frames) that were computed synchronously
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count
    }

    fn fall_back(&mut self, particles: &mut [Particle], now: f64, config: &ParticleConfig) {
        self.fallback_count += 1;
        update_slice(particles, now, config);
    }
}

impl ParticleCompute for OffloadedCompute {
    fn name(&self) -> &str {
        "offloaded"
    }

    fn update(&mut self, particles: &mut [Particle], now: f64, config: &ParticleConfig) {
        if particles.is_empty() {
            return;
        }
        let jobs = match (&self.jobs, self.workers.is_empty()) {
            (Some(jobs), false) => jobs.clone(),
            _ => {
                self.fall_back(particles, now, config);
                return;
            }
        };

        let chunk_size = particles.len().div_ceil(self.workers.len());
        let chunk_count = particles.len().div_ceil(chunk_size);
        let (reply_tx, reply_rx) = channel::bounded::<JobResult>(chunk_count);
        let shared = Arc::new(config.clone());

        let mut done = vec![false; chunk_count];
        for (i, chunk) in particles.chunks(chunk_size).enumerate() {
            let job = Job {
                offset: i * chunk_size,
                chunk: chunk.to_vec(),
                now,
                config: Arc::clone(&shared),
                reply: reply_tx.clone(),
            };
            if jobs.send(job).is_err() {
                log::warn!("Particle compute workers are gone; updating in process");
                break;
            }
        }
        drop(reply_tx);

        let deadline = Instant::now() + self.timeout;
        let mut received = 0;
        while received < chunk_count {
            match reply_rx.recv_deadline(deadline) {
                Ok(result) => {
                    let end = result.offset + result.chunk.len();
                    particles[result.offset..end].clone_from_slice(&result.chunk);
                    done[result.offset / chunk_size] = true;
                    received += 1;
                }
                Err(_) => break,
            }
        }

        if received < chunk_count {
            let err = MosaicError::ComputeError(format!(
                "{}/{} chunks returned before the deadline",
                received, chunk_count
            ));
            log::warn!("{}; finishing in process", err);
            self.fallback_count += 1;
            for (i, chunk) in particles.chunks_mut(chunk_size).enumerate() {
                if !done[i] {
                    update_slice(chunk, now, config);
                }
            }
        }
    }
}

impl Drop for OffloadedCompute {
    fn drop(&mut self) {
        // Closing the job channel ends every worker loop
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Build the compute strategy for `mode`. A pool that fails to start
/// degrades to in-process updates.
pub fn create_compute(mode: &ComputeMode) -> Box<dyn ParticleCompute> {
    match mode {
        ComputeMode::InProcess => Box::new(InProcessCompute),
        ComputeMode::Offloaded {
            workers,
            timeout_ms,
        } => match OffloadedCompute::spawn(*workers, *timeout_ms) {
            Ok(compute) => Box::new(compute),
            Err(e) => {
                log::warn!("Could not start compute workers ({}); using in-process", e);
                Box::new(InProcessCompute)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::SpawnContext;
    use crate::pool::ParticlePool;
    use mosaic_core::{PixelSample, Rgb, XorShiftRng};

    fn activated_pool(config: &ParticleConfig, n: usize) -> ParticlePool {
        let samples: Vec<PixelSample> = (0..n)
            .map(|i| PixelSample::new(i as f32, (i * 2) as f32, Rgb::new(i as u8, 0, 0)))
            .collect();
        let mut pool = ParticlePool::new(n, 100.0);
        let mut rng = XorShiftRng::new(11);
        let mut ctx = SpawnContext {
            now: 0.0,
            config,
            rng: &mut rng,
        };
        pool.activate(&samples, 300.0, 300.0, 22.0, &mut ctx);
        pool
    }

    fn positions(pool: &ParticlePool) -> Vec<(f32, f32, f32)> {
        pool.active()
            .iter()
            .map(|p| (p.position.x, p.position.y, p.size))
            .collect()
    }

    #[test]
    fn offloaded_matches_in_process() {
        let config = ParticleConfig::default();
        let mut a = activated_pool(&config, 101);
        let mut b = activated_pool(&config, 101);

        let mut local = InProcessCompute;
        let mut remote = OffloadedCompute::spawn(3, 5_000).unwrap();
        for frame in 0..10 {
            let now = 500.0 + frame as f64 * 700.0;
            local.update(a.active_mut(), now, &config);
            remote.update(b.active_mut(), now, &config);
        }
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(remote.fallback_count(), 0);
    }

    #[test]
    fn missed_deadline_finishes_in_process() {
        let config = ParticleConfig::default();
        let mut a = activated_pool(&config, 20_000);
        let mut b = activated_pool(&config, 20_000);

        // A zero timeout gives the workers no chance to reply in time
        let mut local = InProcessCompute;
        let mut remote = OffloadedCompute::spawn(2, 0).unwrap();
        for frame in 0..5 {
            let now = 500.0 + frame as f64 * 700.0;
            local.update(a.active_mut(), now, &config);
            remote.update(b.active_mut(), now, &config);
        }
        assert!(remote.fallback_count() > 0);
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn zero_workers_always_falls_back() {
        let config = ParticleConfig::default();
        let mut pool = activated_pool(&config, 10);
        let mut compute = OffloadedCompute::spawn(0, 10).unwrap();
        compute.update(pool.active_mut(), 100_000.0, &config);
        assert_eq!(compute.fallback_count(), 1);
        assert!(pool.active().iter().all(Particle::is_at_target));
    }

    #[test]
    fn create_compute_picks_strategy() {
        assert_eq!(create_compute(&ComputeMode::InProcess).name(), "in_process");
        let offloaded = create_compute(&ComputeMode::Offloaded {
            workers: 2,
            timeout_ms: 50,
        });
        assert_eq!(offloaded.name(), "offloaded");
    }
}
