#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the shooting gallery engine.
//!
//! This crate defines the message surface that connects the host, the
//! authoritative session, and the pure systems it owns. Hosts submit
//! [`Command`] values describing input (elapsed time, start and restart
//! requests, reported hits), the session executes them through its `apply`
//! entry point, and then emits [`Event`] values describing everything the host
//! should render, play or destroy. Nothing in this crate knows how those
//! events are presented.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod config;

pub use config::{
    ConfigError, MatchTuning, MotionTuning, ScoringTuning, SessionConfig, SpawnTuning,
    TargetTuning,
};

/// Commands that express every input the host may deliver to a session.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an idle session begin its countdown.
    RequestStart,
    /// Requests that the session discard all progress and count down again.
    RequestRestart,
    /// Reports that the player's shot struck a live target.
    ReportHit {
        /// Identifier of the target that was struck.
        target: TargetId,
        /// World-space location of the impact.
        point: WorldPoint,
        /// Region of the target that absorbed the shot.
        zone: HitZone,
    },
}

/// Events emitted by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the session entered a new match phase.
    PhaseChanged {
        /// Phase that became active.
        phase: MatchPhase,
        /// Timer values the host should display alongside the phase.
        timer: TimerDisplay,
    },
    /// Announces the countdown label that should currently be shown.
    CountdownStep {
        /// Step that just began.
        step: CountdownStep,
    },
    /// Requests that the host play a one-shot audio cue.
    CueRequested {
        /// Cue that should be played.
        cue: Cue,
    },
    /// Reports the latest match timer values while the match is running.
    TimerChanged {
        /// Timer values derived from the remaining match time.
        timer: TimerDisplay,
    },
    /// Reports a new score snapshot after a hit or reset.
    ScoreChanged {
        /// Complete combo and scoring state after the change.
        combo: ComboState,
    },
    /// Reports that the combo counter changed.
    ComboChanged {
        /// Current combo count; zero means the combo was broken.
        combo_count: u32,
        /// Highlight strength in `[0, 1]` the host may use for the combo label.
        intensity: f32,
    },
    /// Toggles the transient weak point indicator.
    WeakPointIndicator {
        /// Whether the indicator should be visible.
        visible: bool,
    },
    /// Requests that the host instantiate a new target.
    SpawnRequested {
        /// Identifier the session assigned to the target.
        target: TargetId,
        /// Spawn location selected from the pool.
        point: SpawnPointId,
        /// Prefab the host should instantiate.
        prefab: PrefabId,
        /// Optional oscillating movement to apply to the target.
        motion: Option<TargetMotion>,
    },
    /// Reports that a target stopped accepting hits.
    TargetResolved {
        /// Identifier of the resolved target.
        target: TargetId,
        /// Reason the target was resolved.
        resolution: Resolution,
    },
    /// Requests that the host remove a target from the scene.
    TargetShouldDestroy {
        /// Identifier of the target to remove.
        target: TargetId,
    },
    /// Publishes the end-of-match report.
    EndReport {
        /// Grade summary derived from the final scoring state.
        result: GradeResult,
        /// Raw hit statistics accumulated during the match.
        stats: MatchStats,
    },
    /// Reports that a start or restart request was refused.
    ConfigurationRejected {
        /// Configuration problem detected when the session was constructed.
        error: ConfigError,
    },
}

/// Phase of a single match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchPhase {
    /// Waiting for a start request.
    #[default]
    Idle,
    /// Counting down before the match begins.
    Countdown {
        /// Time left before the current step ends.
        remaining: Duration,
        /// Step currently displayed.
        step: CountdownStep,
    },
    /// The match clock is running and targets spawn.
    Active {
        /// Match time left.
        remaining: Duration,
    },
    /// The match clock expired.
    Ended,
}

impl MatchPhase {
    /// Reports whether hits are currently accepted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Reports whether the pre-match countdown is running.
    #[must_use]
    pub const fn is_countdown(&self) -> bool {
        matches!(self, Self::Countdown { .. })
    }
}

/// Steps of the pre-match countdown in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CountdownStep {
    /// "3"
    Three,
    /// "2"
    Two,
    /// "1"
    One,
    /// "GO!"
    Go,
}

impl CountdownStep {
    /// Text the host displays for the step.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Three => "3",
            Self::Two => "2",
            Self::One => "1",
            Self::Go => "GO!",
        }
    }

    /// Step that follows this one, or `None` once "GO!" has been shown.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Three => Some(Self::Two),
            Self::Two => Some(Self::One),
            Self::One => Some(Self::Go),
            Self::Go => None,
        }
    }

    /// Cue played when the step begins.
    #[must_use]
    pub const fn cue(self) -> Cue {
        match self {
            Self::Go => Cue::Go,
            Self::Three | Self::Two | Self::One => Cue::CountdownBeep,
        }
    }
}

/// One-shot audio cues the host is asked to realise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cue {
    /// Countdown numeral beep.
    CountdownBeep,
    /// Match start.
    Go,
    /// Final-seconds warning beep.
    TimeWarning,
    /// Match end.
    MatchEnd,
    /// Weak point struck.
    WeakPoint,
    /// Combo continued; pitch rises with the combo count.
    Combo {
        /// Playback pitch multiplier.
        pitch: f32,
    },
    /// End report revealed.
    GradeReveal,
}

/// Snapshot of the scoring engine's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComboState {
    /// Accumulated score.
    pub score: u32,
    /// Consecutive hits within the combo window.
    pub combo_count: u32,
    /// Time left before the combo breaks; zero exactly when `combo_count` is zero.
    pub combo_timer: Duration,
    /// Targets hit during the match.
    pub targets_hit: u32,
    /// Hits that landed on a weak point.
    pub weak_points_hit: u32,
    /// Targets spawned during the match.
    pub total_targets: u32,
    /// Highest combo reached during the match.
    pub max_combo: u32,
}

impl ComboState {
    /// Fraction of spawned targets that were hit, or zero before any spawn.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.targets_hit, self.total_targets)
    }

    /// Fraction of spawned targets that were hit on a weak point.
    #[must_use]
    pub fn weak_point_ratio(&self) -> f64 {
        ratio(self.weak_points_hit, self.total_targets)
    }

    /// Extracts the statistics published with the end report.
    #[must_use]
    pub const fn stats(&self) -> MatchStats {
        MatchStats {
            score: self.score,
            targets_hit: self.targets_hit,
            total_targets: self.total_targets,
            weak_points_hit: self.weak_points_hit,
            max_combo: self.max_combo,
        }
    }
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    f64::from(numerator) / f64::from(denominator)
}

/// Hit statistics published with the end report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchStats {
    /// Final score.
    pub score: u32,
    /// Targets hit.
    pub targets_hit: u32,
    /// Targets spawned.
    pub total_targets: u32,
    /// Weak points hit.
    pub weak_points_hit: u32,
    /// Best combo reached.
    pub max_combo: u32,
}

/// Categorical performance grades, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// Perfect score, near-perfect accuracy and mostly weak point hits.
    SPlus,
    /// Excellent.
    S,
    /// Very good.
    A,
    /// Good.
    B,
    /// Fair.
    C,
    /// Poor.
    D,
    /// Failing.
    F,
}

impl Grade {
    /// Classifies a performance from its score, accuracy and weak point ratios.
    ///
    /// Thresholds are checked from the best grade down and are inclusive, so a
    /// performance sitting exactly on a boundary earns the higher grade.
    #[must_use]
    pub fn classify(score_ratio: f64, accuracy: f64, weak_point_ratio: f64) -> Self {
        if score_ratio >= 1.0 && accuracy >= 0.95 && weak_point_ratio >= 0.8 {
            Self::SPlus
        } else if score_ratio >= 0.9 && accuracy >= 0.85 {
            Self::S
        } else if score_ratio >= 0.75 && accuracy >= 0.7 {
            Self::A
        } else if score_ratio >= 0.6 && accuracy >= 0.6 {
            Self::B
        } else if score_ratio >= 0.4 && accuracy >= 0.4 {
            Self::C
        } else if score_ratio >= 0.2 {
            Self::D
        } else {
            Self::F
        }
    }

    /// Text the host displays for the grade.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SPlus => "S+",
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

/// Grade summary derived from the final scoring state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    /// Awarded grade.
    pub grade: Grade,
    /// Hit accuracy expressed as a percentage in `[0, 100]`.
    pub accuracy_percent: f32,
    /// Score at the end of the match.
    pub final_score: u32,
}

/// Match timer values split for display.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimerDisplay {
    /// Whole minutes remaining.
    pub minutes: u32,
    /// Whole seconds remaining within the current minute.
    pub seconds: u32,
    /// Hundredths of a second remaining within the current second.
    pub hundredths: u32,
    /// Blend factor in `[0, 1]` from the neutral colour toward the alert colour.
    pub alert_intensity: f32,
}

impl TimerDisplay {
    /// Splits the remaining match time for display.
    ///
    /// `alert_intensity` is `1 - remaining / warning_window` clamped to
    /// `[0, 1]`, so it stays at zero until the warning window is entered.
    #[must_use]
    pub fn from_remaining(remaining: Duration, warning_window: Duration) -> Self {
        let total_seconds = remaining.as_secs();
        let minutes = u32::try_from(total_seconds / 60).unwrap_or(u32::MAX);
        let seconds = (total_seconds % 60) as u32;
        let hundredths = remaining.subsec_millis() / 10;

        let alert_intensity = if warning_window.is_zero() {
            0.0
        } else {
            let fraction = remaining.as_secs_f32() / warning_window.as_secs_f32();
            (1.0 - fraction).clamp(0.0, 1.0)
        };

        Self {
            minutes,
            seconds,
            hundredths,
            alert_intensity,
        }
    }
}

/// Region of a target that absorbed a shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitZone {
    /// Main body of the target.
    Body,
    /// Bonus sub-region of the target.
    WeakPoint,
}

impl HitZone {
    /// Classifies a hit from its distance to the closest weak point surface.
    ///
    /// Targets without a weak point pass `None`. Hits strictly closer than
    /// `radius` count as weak point hits.
    #[must_use]
    pub fn classify(distance_to_weak_point: Option<f32>, radius: f32) -> Self {
        match distance_to_weak_point {
            Some(distance) if distance < radius => Self::WeakPoint,
            _ => Self::Body,
        }
    }

    /// Reports whether the zone is a weak point.
    #[must_use]
    pub const fn is_weak_point(self) -> bool {
        matches!(self, Self::WeakPoint)
    }
}

/// Reason a target stopped accepting hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The player hit the target.
    Hit,
    /// The target outlived its lifetime.
    Expired,
}

/// Location in the host's world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
    z: f32,
}

impl WorldPoint {
    /// Creates a new world-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Depth coordinate.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }
}

/// Unique identifier assigned to a spawned target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u32);

impl TargetId {
    /// Creates a new target identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a configured spawn location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointId(u32);

impl SpawnPointId {
    /// Creates a new spawn point identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a target prefab the host knows how to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrefabId(u32);

impl PrefabId {
    /// Creates a new prefab identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Horizontal axes a moving target may oscillate along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionAxis {
    /// Positive x.
    Right,
    /// Negative x.
    Left,
    /// Positive z.
    Forward,
    /// Negative z.
    Back,
}

impl MotionAxis {
    /// Every axis, in selection order.
    pub const ALL: [Self; 4] = [Self::Right, Self::Left, Self::Forward, Self::Back];
}

/// Ping-pong movement the host applies to a spawned target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetMotion {
    /// Direction of travel from the spawn point.
    pub axis: MotionAxis,
    /// Travel speed in world units per time unit.
    pub speed: f32,
    /// Total travel distance centred on the spawn point.
    pub distance: f32,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ComboState, CountdownStep, Grade, HitZone, MatchStats, SpawnPointId, TimerDisplay};
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn spawn_point_id_round_trips_through_bincode() {
        assert_round_trip(&SpawnPointId::new(7));
    }

    #[test]
    fn match_stats_round_trip_through_bincode() {
        assert_round_trip(&MatchStats {
            score: 1_250,
            targets_hit: 14,
            total_targets: 20,
            weak_points_hit: 3,
            max_combo: 6,
        });
    }

    #[test]
    fn countdown_runs_three_two_one_go() {
        let mut labels = Vec::new();
        let mut step = Some(CountdownStep::Three);
        while let Some(current) = step {
            labels.push(current.label());
            step = current.next();
        }
        assert_eq!(labels, ["3", "2", "1", "GO!"]);
    }

    #[test]
    fn perfect_run_with_weak_points_is_s_plus() {
        let state = ComboState {
            score: 1_000,
            targets_hit: 19,
            total_targets: 20,
            weak_points_hit: 16,
            ..ComboState::default()
        };
        let grade = Grade::classify(1.0, state.accuracy(), state.weak_point_ratio());
        assert_eq!(grade, Grade::SPlus);
        assert_eq!(grade.label(), "S+");
    }

    #[test]
    fn boundaries_resolve_to_the_higher_grade() {
        assert_eq!(Grade::classify(0.75, 0.7, 0.0), Grade::A);
        assert_eq!(Grade::classify(0.6, 0.6, 0.0), Grade::B);
        assert_eq!(Grade::classify(0.4, 0.4, 0.0), Grade::C);
        assert_eq!(Grade::classify(0.2, 0.0, 0.0), Grade::D);
        assert_eq!(Grade::classify(0.19, 1.0, 1.0), Grade::F);
    }

    #[test]
    fn low_accuracy_caps_the_grade_despite_high_score() {
        assert_eq!(Grade::classify(1.5, 0.3, 0.0), Grade::D);
    }

    #[test]
    fn accuracy_is_zero_without_spawns() {
        let state = ComboState::default();
        assert_eq!(state.accuracy(), 0.0);
        assert_eq!(state.weak_point_ratio(), 0.0);
    }

    #[test]
    fn timer_display_splits_minutes_seconds_and_hundredths() {
        let display =
            TimerDisplay::from_remaining(Duration::from_millis(83_456), Duration::from_secs(10));
        assert_eq!(display.minutes, 1);
        assert_eq!(display.seconds, 23);
        assert_eq!(display.hundredths, 45);
        assert_eq!(display.alert_intensity, 0.0);
    }

    #[test]
    fn timer_alert_intensity_ramps_inside_the_warning_window() {
        let window = Duration::from_secs(10);
        let halfway = TimerDisplay::from_remaining(Duration::from_secs(5), window);
        assert!((halfway.alert_intensity - 0.5).abs() < 1e-6);

        let expired = TimerDisplay::from_remaining(Duration::ZERO, window);
        assert!((expired.alert_intensity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn weak_point_radius_is_exclusive() {
        assert_eq!(HitZone::classify(Some(0.05), 0.1), HitZone::WeakPoint);
        assert_eq!(HitZone::classify(Some(0.1), 0.1), HitZone::Body);
        assert_eq!(HitZone::classify(None, 0.1), HitZone::Body);
    }
}
