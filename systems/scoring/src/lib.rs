#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combo and scoring engine.
//!
//! Every hit extends a rolling combo window and multiplies its base points by
//! the current combo count (and by the weak point bonus when applicable).
//! Letting the window lapse silently breaks the combo. The engine also owns
//! the hit statistics the end-of-match grade is derived from.

use std::time::Duration;

use shooting_gallery_core::{
    ComboState, Cue, Event, Grade, GradeResult, HitZone, MatchStats, ScoringTuning,
};
use tracing::debug;

/// Combo count at which the combo highlight reaches full intensity.
const FULL_INTENSITY_COMBO: f32 = 10.0;
/// Pitch added to the combo cue per combo step.
const PITCH_PER_COMBO: f32 = 0.1;

/// Scoring engine that exclusively owns a session's [`ComboState`].
#[derive(Debug)]
pub struct Scoring {
    combo_window: Duration,
    weak_point_multiplier: u32,
    perfect_score: u32,
    indicator_duration: Duration,
    state: ComboState,
    indicator_remaining: Duration,
}

impl Scoring {
    /// Creates an engine with zeroed counters.
    #[must_use]
    pub fn new(tuning: &ScoringTuning) -> Self {
        Self {
            combo_window: tuning.combo_window(),
            weak_point_multiplier: tuning.weak_point_multiplier,
            perfect_score: tuning.perfect_score,
            indicator_duration: tuning.weak_point_indicator(),
            state: ComboState::default(),
            indicator_remaining: Duration::ZERO,
        }
    }

    /// Counts a newly spawned target toward accuracy.
    pub fn register_spawn(&mut self) {
        self.state.total_targets = self.state.total_targets.saturating_add(1);
    }

    /// Scores a hit worth `base_points` before multipliers.
    ///
    /// `base_points` must be positive; the caller owns that contract.
    pub fn apply_hit(
        &mut self,
        base_points: u32,
        zone: HitZone,
        out: &mut Vec<Event>,
    ) -> ComboState {
        debug_assert!(base_points > 0, "hits must award positive base points");

        let state = &mut self.state;
        state.combo_count = state.combo_count.saturating_add(1);
        state.combo_timer = self.combo_window;
        state.targets_hit = state.targets_hit.saturating_add(1);
        state.max_combo = state.max_combo.max(state.combo_count);

        let mut multiplier = state.combo_count;
        if zone.is_weak_point() {
            multiplier = multiplier.saturating_mul(self.weak_point_multiplier);
            state.weak_points_hit = state.weak_points_hit.saturating_add(1);
            self.indicator_remaining = self.indicator_duration;
            out.push(Event::CueRequested { cue: Cue::WeakPoint });
            out.push(Event::WeakPointIndicator { visible: true });
        }

        let awarded = base_points.saturating_mul(multiplier);
        state.score = state.score.saturating_add(awarded);
        debug!(
            awarded,
            base_points,
            multiplier,
            score = state.score,
            combo = state.combo_count,
            "hit scored"
        );

        if state.combo_count > 1 {
            let pitch = 1.0 + state.combo_count as f32 * PITCH_PER_COMBO;
            out.push(Event::CueRequested {
                cue: Cue::Combo { pitch },
            });
        }

        let snapshot = *state;
        out.push(Event::ScoreChanged { combo: snapshot });
        out.push(combo_changed(snapshot.combo_count));
        snapshot
    }

    /// Runs down the combo window and the weak point indicator.
    pub fn decay(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.state.combo_count > 0 {
            self.state.combo_timer = self.state.combo_timer.saturating_sub(dt);
            if self.state.combo_timer.is_zero() {
                debug!(combo = self.state.combo_count, "combo expired");
                self.state.combo_count = 0;
                out.push(combo_changed(0));
            }
        }

        if !self.indicator_remaining.is_zero() {
            self.indicator_remaining = self.indicator_remaining.saturating_sub(dt);
            if self.indicator_remaining.is_zero() {
                out.push(Event::WeakPointIndicator { visible: false });
            }
        }
    }

    /// Grades the current state against the perfect score.
    #[must_use]
    pub fn grade(&self) -> GradeResult {
        let score_ratio = if self.perfect_score == 0 {
            0.0
        } else {
            f64::from(self.state.score) / f64::from(self.perfect_score)
        };
        let accuracy = self.state.accuracy();
        let grade = Grade::classify(score_ratio, accuracy, self.state.weak_point_ratio());

        GradeResult {
            grade,
            accuracy_percent: (accuracy * 100.0) as f32,
            final_score: self.state.score,
        }
    }

    /// Zeroes every counter and hides the weak point indicator.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        debug!(score = self.state.score, "score reset");
        self.state = ComboState::default();
        if !self.indicator_remaining.is_zero() {
            self.indicator_remaining = Duration::ZERO;
            out.push(Event::WeakPointIndicator { visible: false });
        }
        out.push(Event::ScoreChanged { combo: self.state });
        out.push(combo_changed(0));
    }

    /// Snapshot of the current counters.
    #[must_use]
    pub fn state(&self) -> ComboState {
        self.state
    }

    /// Statistics published with the end report.
    #[must_use]
    pub fn stats(&self) -> MatchStats {
        self.state.stats()
    }

    /// Reports whether the weak point indicator is showing.
    #[must_use]
    pub fn weak_point_indicator_visible(&self) -> bool {
        !self.indicator_remaining.is_zero()
    }
}

fn combo_changed(combo_count: u32) -> Event {
    let intensity = (combo_count as f32 / FULL_INTENSITY_COMBO).min(1.0);
    Event::ComboChanged {
        combo_count,
        intensity,
    }
}
