//! Mosaic Cache - photos to pixel samples, a batch at a time
//!
//! This crate provides the playback roster, the image sampling boundary,
//! and a pixel cache keyed by absolute photo index with background batch
//! loading and eviction.

mod cache;
mod config;
mod roster;
mod sampler;

pub use cache::{BatchHandle, BatchReport, PixelCache};
pub use config::CacheConfig;
pub use roster::{format_caption, FileRoster, Person, Roster, RosterProvider};
pub use sampler::{sample_pixels, ImageSampler, PixelSampler};
