//! Scripted shooter that stands in for a player.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use shooting_gallery_core::{
    Command, Event, HitZone, MotionAxis, SpawnPointId, TargetId, TargetMotion, WorldPoint,
};
use tracing::debug;

/// Radius of the arc spawn points are laid out on, in world units.
const GALLERY_RADIUS: f32 = 8.0;
/// Angle between neighbouring spawn points, in radians.
const POINT_SPACING: f32 = 0.35;
/// Height of every spawn point above the floor.
const POINT_HEIGHT: f32 = 1.5;
/// Mixed into the spawn seed so the shooter does not mirror the scheduler.
const SHOOTER_SEED_SALT: u64 = 0x5eed_0f_5407;

/// Tunable behaviour of the scripted shooter.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct ShooterProfile {
    /// Probability that an attempted shot lands.
    pub(crate) accuracy: f32,
    /// Standard deviation of the aim jitter, in world units.
    pub(crate) aim_spread: f32,
    /// Delay between a target appearing and each attempt on it.
    pub(crate) reaction_ms: u64,
}

impl Default for ShooterProfile {
    fn default() -> Self {
        Self {
            accuracy: 0.8,
            aim_spread: 0.08,
            reaction_ms: 600,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Tracked {
    origin: Vec3,
    motion: Option<TargetMotion>,
    age: Duration,
    next_attempt: Duration,
}

impl Tracked {
    /// Weak point position, following the target's back-and-forth travel.
    fn weak_point(&self) -> Vec3 {
        let Some(motion) = self.motion else {
            return self.origin;
        };
        if motion.distance <= 0.0 {
            return self.origin;
        }

        let travelled = motion.speed * self.age.as_secs_f32();
        let lap = travelled % (2.0 * motion.distance);
        let along = if lap <= motion.distance {
            lap
        } else {
            2.0 * motion.distance - lap
        };
        self.origin + axis_direction(motion.axis) * (along - motion.distance / 2.0)
    }
}

/// Tracks live targets and turns reaction time into hit reports.
#[derive(Debug)]
pub(crate) struct Shooter {
    accuracy: f32,
    reaction: Duration,
    weak_point_radius: f32,
    jitter: Normal<f32>,
    rng: ChaCha8Rng,
    targets: BTreeMap<TargetId, Tracked>,
}

impl Shooter {
    pub(crate) fn new(
        profile: &ShooterProfile,
        weak_point_radius: f32,
        seed: u64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&profile.accuracy) {
            bail!("accuracy must lie in [0, 1], got {}", profile.accuracy);
        }
        if profile.reaction_ms == 0 {
            bail!("shooter reaction_ms must be greater than zero");
        }
        let jitter = Normal::new(0.0, profile.aim_spread)
            .with_context(|| format!("invalid aim spread {}", profile.aim_spread))?;

        Ok(Self {
            accuracy: profile.accuracy,
            reaction: Duration::from_millis(profile.reaction_ms),
            weak_point_radius,
            jitter,
            rng: ChaCha8Rng::seed_from_u64(seed ^ SHOOTER_SEED_SALT),
            targets: BTreeMap::new(),
        })
    }

    /// Keeps the tracked set in step with the session's events.
    pub(crate) fn observe(&mut self, event: &Event) {
        match event {
            Event::SpawnRequested {
                target,
                point,
                motion,
                ..
            } => {
                let _ = self.targets.insert(
                    *target,
                    Tracked {
                        origin: spawn_position(*point),
                        motion: *motion,
                        age: Duration::ZERO,
                        next_attempt: self.reaction,
                    },
                );
            }
            Event::TargetResolved { target, .. } | Event::TargetShouldDestroy { target } => {
                let _ = self.targets.remove(target);
            }
            _ => {}
        }
    }

    /// Ages every tracked target and queues a hit for each attempt that lands.
    pub(crate) fn aim(&mut self, dt: Duration, out: &mut Vec<Command>) {
        for (&target, tracked) in &mut self.targets {
            tracked.age += dt;
            if tracked.age < tracked.next_attempt {
                continue;
            }
            tracked.next_attempt += self.reaction;

            if self.rng.gen::<f32>() >= self.accuracy {
                debug!(target_id = target.get(), "shot missed");
                continue;
            }

            let weak_point = tracked.weak_point();
            let offset = Vec3::new(
                self.jitter.sample(&mut self.rng),
                self.jitter.sample(&mut self.rng),
                self.jitter.sample(&mut self.rng),
            );
            let aim = weak_point + offset;
            let zone = HitZone::classify(Some(aim.distance(weak_point)), self.weak_point_radius);
            out.push(Command::ReportHit {
                target,
                point: WorldPoint::new(aim.x, aim.y, aim.z),
                zone,
            });
        }
    }
}

fn spawn_position(point: SpawnPointId) -> Vec3 {
    let angle = point.get() as f32 * POINT_SPACING - 1.2;
    Vec3::new(
        angle.sin() * GALLERY_RADIUS,
        POINT_HEIGHT,
        angle.cos() * GALLERY_RADIUS,
    )
}

fn axis_direction(axis: MotionAxis) -> Vec3 {
    match axis {
        MotionAxis::Right => Vec3::X,
        MotionAxis::Left => Vec3::NEG_X,
        MotionAxis::Forward => Vec3::Z,
        MotionAxis::Back => Vec3::NEG_Z,
    }
}
