#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cycling spawn point sampler.
//!
//! Points are drawn without replacement until every configured point has been
//! used once, after which the full set is shuffled back in.

use rand::{seq::SliceRandom, Rng};
use shooting_gallery_core::SpawnPointId;

/// Depleting pool of spawn points that refills once exhausted.
#[derive(Clone, Debug)]
pub struct SpawnPointPool {
    points: Vec<SpawnPointId>,
    available: Vec<SpawnPointId>,
}

impl SpawnPointPool {
    /// Creates a pool over the provided points.
    ///
    /// The first draw triggers the initial shuffle, so an empty working set
    /// here is expected.
    #[must_use]
    pub fn new(points: Vec<SpawnPointId>) -> Self {
        Self {
            available: Vec::with_capacity(points.len()),
            points,
        }
    }

    /// Draws a point uniformly from those not yet used in the current cycle.
    ///
    /// Returns `None` only when the pool was configured without points.
    pub fn take<R>(&mut self, rng: &mut R) -> Option<SpawnPointId>
    where
        R: Rng + ?Sized,
    {
        if self.points.is_empty() {
            return None;
        }

        if self.available.is_empty() {
            self.available.extend_from_slice(&self.points);
            self.available.shuffle(rng);
        }

        let index = rng.gen_range(0..self.available.len());
        Some(self.available.swap_remove(index))
    }

    /// Number of points left before the pool refills.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.available.len()
    }

    /// Reports whether the pool was configured without points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Discards the current cycle so the next draw starts a fresh one.
    pub fn reset(&mut self) {
        self.available.clear();
    }
}
