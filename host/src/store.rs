//! ==============================================================================
//! store.rs - bounded time-series store
//! ==============================================================================
//!
//! purpose:
//!     holds the most recent `capacity` samples, oldest first.
//!     the sampler pushes, http handlers take snapshots.
//!
//! concurrency:
//!     one rwlock around the whole window. a push and a snapshot copy-out are
//!     the only critical sections, so a reader sees the window either before
//!     or after a push, never halfway through one. no lock is held across an
//!     await point other than the lock acquisition itself.
//!
//! ==============================================================================

use crate::domain::{ReadingsSnapshot, Sample};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_CAPACITY: usize = 100;

/// cheaply cloneable handle; clones share the same window
#[derive(Clone)]
pub struct ReadingStore {
    capacity: usize,
    with_aqi: bool,
    window: Arc<RwLock<VecDeque<Sample>>>,
}

impl ReadingStore {
    /// `capacity` is clamped to at least one sample
    pub fn new(capacity: usize, with_aqi: bool) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            with_aqi,
            window: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// append `sample`, evicting the oldest one if the window is full
    pub async fn push(&self, sample: Sample) {
        let mut window = self.window.write().await;
        window.push_back(sample);
        while window.len() > self.capacity {
            window.pop_front();
        }
    }

    /// independent copy of the current window in the wire shape
    pub async fn snapshot(&self) -> ReadingsSnapshot {
        let window = self.window.read().await;
        ReadingsSnapshot::from_samples(window.iter(), self.with_aqi)
    }

    pub async fn len(&self) -> usize {
        self.window.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.window.read().await.is_empty()
    }
}
