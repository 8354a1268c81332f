//! Mosaic Particles - pooled particle simulation for photo portraits
//!
//! Provides the per-canvas particle machinery:
//! - `Particle` - formation (falling) → hold → explosion state machine
//! - `ParticlePool` - fixed-capacity slab reused on every photo activation
//! - Easing curves and a serde-backed `ParticleConfig` for every tunable constant
//! - `RenderSurface` - the 2D draw-call boundary particles render into
//! - `ParticleCompute` - in-process or worker-offloaded per-frame updates

pub mod compute;
pub mod config;
pub mod curves;
pub mod particle;
pub mod pool;
pub mod surface;

pub use compute::{create_compute, InProcessCompute, OffloadedCompute, ParticleCompute};
pub use config::{ComputeMode, FormationVariant, ParticleConfig};
pub use curves::Easing;
pub use particle::{Particle, Phase, SpawnContext};
pub use pool::ParticlePool;
pub use surface::{RecordingSurface, RenderSurface};
