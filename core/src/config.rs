//! Plain-value tuning consumed by the session and its systems.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PrefabId, SpawnPointId};

/// Complete configuration surface of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Match clock and countdown timing.
    pub timing: MatchTuning,
    /// Combo window, multipliers and grading reference.
    pub scoring: ScoringTuning,
    /// Spawn cadence, difficulty ramp and spawn sources.
    pub spawning: SpawnTuning,
    /// Optional movement assigned to spawned targets.
    pub motion: MotionTuning,
    /// Per-target lifetime and point values.
    pub targets: TargetTuning,
}

impl SessionConfig {
    /// Checks every value the session relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_time("timing.duration_ms", self.timing.duration_ms)?;
        require_time("scoring.combo_window_ms", self.scoring.combo_window_ms)?;
        require_time("spawning.base_interval_ms", self.spawning.base_interval_ms)?;
        require_time(
            "spawning.minimum_interval_ms",
            self.spawning.minimum_interval_ms,
        )?;
        require_time("targets.lifetime_ms", self.targets.lifetime_ms)?;

        if self.spawning.spawn_points.is_empty() {
            return Err(ConfigError::NoSpawnPoints);
        }
        if self.spawning.prefabs.is_empty() {
            return Err(ConfigError::NoPrefabs);
        }
        if self.spawning.minimum_interval_ms > self.spawning.base_interval_ms {
            return Err(ConfigError::FloorAboveBase);
        }
        let rate = self.spawning.decay_rate;
        if self.spawning.escalation && !(rate > 0.0 && rate < 1.0) {
            return Err(ConfigError::DecayRateOutOfRange { rate });
        }
        if self.spawning.max_active == 0 {
            return Err(ConfigError::ZeroMaxActive);
        }

        if self.scoring.perfect_score == 0 {
            return Err(ConfigError::ZeroPerfectScore);
        }
        if self.scoring.weak_point_multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier);
        }
        if self.targets.body_points == 0 {
            return Err(ConfigError::ZeroPoints {
                field: "targets.body_points",
            });
        }
        if self.targets.weak_point_points == 0 {
            return Err(ConfigError::ZeroPoints {
                field: "targets.weak_point_points",
            });
        }
        if !(self.targets.weak_point_radius >= 0.0) {
            return Err(ConfigError::NegativeRadius);
        }

        if self.motion.enabled {
            let chance = self.motion.chance;
            if !(0.0..=1.0).contains(&chance) {
                return Err(ConfigError::MotionChanceOutOfRange { chance });
            }
            let speeds_valid = self.motion.min_speed >= 0.0
                && self.motion.min_speed <= self.motion.max_speed
                && self.motion.max_speed.is_finite();
            if !speeds_valid {
                return Err(ConfigError::InvalidSpeedRange);
            }
        }

        Ok(())
    }
}

fn require_time(field: &'static str, millis: u64) -> Result<(), ConfigError> {
    if millis == 0 {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(())
}

/// Problems that prevent a session from starting.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No spawn points were configured.
    #[error("no spawn points configured")]
    NoSpawnPoints,
    /// No target prefabs were configured.
    #[error("no target prefabs configured")]
    NoPrefabs,
    /// A duration that must elapse was configured as zero.
    #[error("`{field}` must be greater than zero")]
    ZeroDuration {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The spawn interval floor exceeds the starting interval.
    #[error("minimum spawn interval exceeds the base interval")]
    FloorAboveBase,
    /// The difficulty decay rate does not shrink the interval.
    #[error("spawn interval decay rate {rate} must lie strictly between 0 and 1")]
    DecayRateOutOfRange {
        /// Configured rate.
        rate: f64,
    },
    /// The active target cap is zero.
    #[error("maximum active targets must be at least 1")]
    ZeroMaxActive,
    /// The perfect score reference is zero.
    #[error("perfect score must be at least 1")]
    ZeroPerfectScore,
    /// The weak point multiplier is zero.
    #[error("weak point multiplier must be at least 1")]
    ZeroMultiplier,
    /// A base point award is zero.
    #[error("`{field}` must award at least 1 point")]
    ZeroPoints {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The weak point radius is negative or not a number.
    #[error("weak point radius must be a non-negative number")]
    NegativeRadius,
    /// The movement probability lies outside `[0, 1]`.
    #[error("motion chance {chance} must lie within [0, 1]")]
    MotionChanceOutOfRange {
        /// Configured probability.
        chance: f32,
    },
    /// The movement speed bounds are inverted or negative.
    #[error("motion speed range is invalid")]
    InvalidSpeedRange,
}

/// Match clock and countdown timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Length of the match once the countdown completes.
    pub duration_ms: u64,
    /// How long each countdown numeral is held.
    pub countdown_step_ms: u64,
    /// How long "GO!" is held before the match starts.
    pub go_hold_ms: u64,
    /// Delay between the match ending and the end report.
    pub end_report_delay_ms: u64,
    /// Final stretch of the match during which warning beeps play.
    pub warning_window_ms: u64,
    /// Begins the countdown on the first tick without an explicit start request.
    pub auto_start: bool,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            duration_ms: 90_000,
            countdown_step_ms: 1_000,
            go_hold_ms: 500,
            end_report_delay_ms: 1_500,
            warning_window_ms: 10_000,
            auto_start: false,
        }
    }
}

impl MatchTuning {
    /// Length of the match.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Hold time of each countdown numeral.
    #[must_use]
    pub const fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }

    /// Hold time of "GO!".
    #[must_use]
    pub const fn go_hold(&self) -> Duration {
        Duration::from_millis(self.go_hold_ms)
    }

    /// Delay before the end report is published.
    #[must_use]
    pub const fn end_report_delay(&self) -> Duration {
        Duration::from_millis(self.end_report_delay_ms)
    }

    /// Final stretch of the match that triggers warnings.
    #[must_use]
    pub const fn warning_window(&self) -> Duration {
        Duration::from_millis(self.warning_window_ms)
    }
}

/// Combo window, multipliers and grading reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Time a combo survives without another hit.
    pub combo_window_ms: u64,
    /// Extra multiplier applied to weak point hits.
    pub weak_point_multiplier: u32,
    /// Score that counts as a perfect run when grading.
    pub perfect_score: u32,
    /// How long the weak point indicator stays visible.
    pub weak_point_indicator_ms: u64,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            combo_window_ms: 2_000,
            weak_point_multiplier: 2,
            perfect_score: 1_000,
            weak_point_indicator_ms: 1_000,
        }
    }
}

impl ScoringTuning {
    /// Time a combo survives without another hit.
    #[must_use]
    pub const fn combo_window(&self) -> Duration {
        Duration::from_millis(self.combo_window_ms)
    }

    /// How long the weak point indicator stays visible.
    #[must_use]
    pub const fn weak_point_indicator(&self) -> Duration {
        Duration::from_millis(self.weak_point_indicator_ms)
    }
}

/// Spawn cadence, difficulty ramp and spawn sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Locations targets may appear at.
    pub spawn_points: Vec<SpawnPointId>,
    /// Target prefabs the host can instantiate.
    pub prefabs: Vec<PrefabId>,
    /// Spawn interval at the start of a match.
    pub base_interval_ms: u64,
    /// Floor the spawn interval never shrinks below.
    pub minimum_interval_ms: u64,
    /// Factor applied to the interval after every spawn while escalating.
    pub decay_rate: f64,
    /// Enables the difficulty ramp.
    pub escalation: bool,
    /// Maximum number of live targets.
    pub max_active: u32,
    /// Seed for spawn point, prefab and motion selection.
    pub seed: u64,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            spawn_points: (0..8).map(SpawnPointId::new).collect(),
            prefabs: (0..3).map(PrefabId::new).collect(),
            base_interval_ms: 2_000,
            minimum_interval_ms: 500,
            decay_rate: 0.95,
            escalation: true,
            max_active: 5,
            seed: 0x7a46_1c3d_9e05_b2f1,
        }
    }
}

impl SpawnTuning {
    /// Spawn interval at the start of a match.
    #[must_use]
    pub const fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// Floor the spawn interval never shrinks below.
    #[must_use]
    pub const fn minimum_interval(&self) -> Duration {
        Duration::from_millis(self.minimum_interval_ms)
    }
}

/// Optional movement assigned to spawned targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Allows spawned targets to move at all.
    pub enabled: bool,
    /// Probability that a spawned target moves.
    pub chance: f32,
    /// Slowest travel speed.
    pub min_speed: f32,
    /// Fastest travel speed.
    pub max_speed: f32,
    /// Travel distance of a moving target.
    pub distance: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 0.7,
            min_speed: 1.0,
            max_speed: 3.0,
            distance: 3.0,
        }
    }
}

/// Per-target lifetime and point values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetTuning {
    /// Time a target stays up before it expires unhit.
    pub lifetime_ms: u64,
    /// Base points for a body hit.
    pub body_points: u32,
    /// Base points for a weak point hit.
    pub weak_point_points: u32,
    /// Distance from the weak point surface within which a hit counts as a weak point hit.
    pub weak_point_radius: f32,
    /// Delay between a hit and the target's removal from the scene.
    pub destroy_delay_ms: u64,
}

impl Default for TargetTuning {
    fn default() -> Self {
        Self {
            lifetime_ms: 5_000,
            body_points: 10,
            weak_point_points: 50,
            weak_point_radius: 0.1,
            destroy_delay_ms: 100,
        }
    }
}

impl TargetTuning {
    /// Time a target stays up before it expires unhit.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Delay between a hit and the target's removal.
    #[must_use]
    pub const fn destroy_delay(&self) -> Duration {
        Duration::from_millis(self.destroy_delay_ms)
    }
}
