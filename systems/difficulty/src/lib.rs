#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Difficulty scheduler responsible for deciding when targets spawn.
//!
//! The scheduler runs a repeating spawn timer whose period shrinks
//! geometrically after every spawn, down to a configured floor. The period is
//! re-read each time the timer fires, so a shorter interval only affects the
//! wait that follows the spawn that produced it.

use std::time::Duration;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shooting_gallery_core::{
    MotionAxis, MotionTuning, PrefabId, SpawnPointId, SpawnTuning, TargetMotion,
};
use shooting_gallery_system_spawn_points::SpawnPointPool;
use tracing::{debug, warn};

/// Everything the session needs to instantiate a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnOrder {
    /// Spawn location drawn from the pool.
    pub point: SpawnPointId,
    /// Prefab drawn from the configured prefab set.
    pub prefab: PrefabId,
    /// Movement rolled for the target, if any.
    pub motion: Option<TargetMotion>,
    /// Time between the timer firing and the end of the advance that fired it.
    pub age: Duration,
}

/// Spawn timer with an escalating cadence and an active-target cap.
#[derive(Debug)]
pub struct Difficulty {
    base_interval: Duration,
    minimum_interval: Duration,
    decay_rate: f64,
    escalation: bool,
    max_active: u32,
    current_interval: Duration,
    accumulator: Duration,
    active_count: u32,
    running: bool,
    pool: SpawnPointPool,
    prefabs: Vec<PrefabId>,
    motion: MotionTuning,
    rng: ChaCha8Rng,
}

impl Difficulty {
    /// Creates a stopped scheduler from the spawn and motion tuning.
    #[must_use]
    pub fn new(spawning: &SpawnTuning, motion: &MotionTuning) -> Self {
        Self {
            base_interval: spawning.base_interval(),
            minimum_interval: spawning.minimum_interval(),
            decay_rate: spawning.decay_rate,
            escalation: spawning.escalation,
            max_active: spawning.max_active,
            current_interval: spawning.base_interval(),
            accumulator: Duration::ZERO,
            active_count: 0,
            running: false,
            pool: SpawnPointPool::new(spawning.spawn_points.clone()),
            prefabs: spawning.prefabs.clone(),
            motion: motion.clone(),
            rng: ChaCha8Rng::seed_from_u64(spawning.seed),
        }
    }

    /// Starts the spawn timer from the base interval.
    pub fn start(&mut self) {
        if self.running {
            warn!("spawn timer already running");
            return;
        }

        self.current_interval = self.base_interval;
        self.accumulator = Duration::ZERO;
        self.running = true;
        debug!(interval = ?self.current_interval, "spawn timer started");
    }

    /// Cancels the spawn timer, abandoning any partially elapsed wait.
    pub fn stop(&mut self) {
        if self.running {
            debug!(active = self.active_count, "spawn timer stopped");
        }
        self.running = false;
        self.accumulator = Duration::ZERO;
    }

    /// Stops the timer and forgets every spawned target.
    pub fn reset(&mut self) {
        self.stop();
        self.active_count = 0;
        self.current_interval = self.base_interval;
        self.pool.reset();
    }

    /// Advances the spawn timer, emitting an order for every spawn that fires.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<SpawnOrder>) {
        if !self.running || self.current_interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.running && self.accumulator >= self.current_interval {
            self.accumulator -= self.current_interval;
            let _ = self.fire(self.accumulator, out);
        }
    }

    /// Handles one firing of the spawn timer.
    ///
    /// Returns `true` when a spawn order was emitted. Firings while the
    /// active-target cap is reached spawn nothing and leave the interval
    /// untouched.
    pub fn on_timer_fired(&mut self, out: &mut Vec<SpawnOrder>) -> bool {
        self.fire(Duration::ZERO, out)
    }

    fn fire(&mut self, age: Duration, out: &mut Vec<SpawnOrder>) -> bool {
        if self.active_count >= self.max_active {
            debug!(active = self.active_count, "spawn skipped at active cap");
            return false;
        }

        let Some(point) = self.pool.take(&mut self.rng) else {
            return false;
        };
        let Some(prefab) = self.prefabs.choose(&mut self.rng).copied() else {
            return false;
        };
        let motion = self.roll_motion();

        self.active_count += 1;
        if self.escalation {
            self.current_interval = self
                .current_interval
                .mul_f64(self.decay_rate)
                .max(self.minimum_interval);
        }

        debug!(
            point = point.get(),
            prefab = prefab.get(),
            active = self.active_count,
            next_interval = ?self.current_interval,
            "spawn ordered"
        );
        out.push(SpawnOrder {
            point,
            prefab,
            motion,
            age,
        });
        true
    }

    /// Records that a spawned target was hit or expired.
    pub fn on_target_resolved(&mut self) {
        self.active_count = self.active_count.saturating_sub(1);
    }

    /// Interval the next wait will use.
    #[must_use]
    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Number of spawned targets that have not been resolved.
    #[must_use]
    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    /// Reports whether the spawn timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    fn roll_motion(&mut self) -> Option<TargetMotion> {
        let tuning = &self.motion;
        if !tuning.enabled || !(tuning.min_speed <= tuning.max_speed) {
            return None;
        }
        if self.rng.gen::<f32>() >= tuning.chance {
            return None;
        }

        let axis = MotionAxis::ALL[self.rng.gen_range(0..MotionAxis::ALL.len())];
        let speed = self.rng.gen_range(tuning.min_speed..=tuning.max_speed);
        Some(TargetMotion {
            axis,
            speed,
            distance: tuning.distance,
        })
    }
}
