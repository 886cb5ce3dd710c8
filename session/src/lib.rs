#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for a timed shooting gallery match.
//!
//! A [`Session`] owns the match phase together with the scoring engine, the
//! difficulty scheduler and the target registry. Hosts drive it exclusively
//! through [`apply`], one [`Command`] at a time, and read it back through
//! [`query`]. Hits delivered after a tick observe any combo decay that tick
//! produced.

use std::{mem, time::Duration};

use shooting_gallery_core::{
    Command, ConfigError, CountdownStep, Cue, Event, HitZone, MatchPhase, SessionConfig,
    TargetId, TimerDisplay, WorldPoint,
};
use shooting_gallery_system_difficulty::{Difficulty, SpawnOrder};
use shooting_gallery_system_scoring::Scoring;
use shooting_gallery_system_targets::{TargetEvent, TargetRegistry};
use tracing::{debug, info, warn};

pub use shooting_gallery_system_targets::{TargetRecord, TargetState};

/// Represents one shooting gallery session and everything it owns.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    config_error: Option<ConfigError>,
    phase: MatchPhase,
    report_in: Option<Duration>,
    auto_start_pending: bool,
    scoring: Scoring,
    difficulty: Difficulty,
    targets: TargetRegistry,
    spawn_scratch: Vec<SpawnOrder>,
    target_scratch: Vec<TargetEvent>,
}

impl Session {
    /// Creates an idle session.
    ///
    /// The configuration is validated here. An invalid configuration does not
    /// prevent construction, but every start or restart request is answered
    /// with [`Event::ConfigurationRejected`] and the session stays idle.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let config_error = config.validate().err();
        if let Some(error) = &config_error {
            warn!(%error, "session configuration rejected");
        }

        Self {
            config_error,
            phase: MatchPhase::Idle,
            report_in: None,
            auto_start_pending: config.timing.auto_start,
            scoring: Scoring::new(&config.scoring),
            difficulty: Difficulty::new(&config.spawning, &config.motion),
            targets: TargetRegistry::new(config.targets.destroy_delay()),
            spawn_scratch: Vec::new(),
            target_scratch: Vec::new(),
            config,
        }
    }

    /// Targets spawned during the tick are backdated to the moment the spawn
    /// timer fired, so an overlong tick does not stretch their lifetimes.
    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.auto_start_pending && self.phase == MatchPhase::Idle {
            self.auto_start_pending = false;
            self.request_start(out);
        }

        let active_dt = match self.phase {
            MatchPhase::Idle => Duration::ZERO,
            MatchPhase::Countdown { .. } => {
                let leftover = self.advance_countdown(dt, out);
                if !leftover.is_zero() {
                    self.advance_match(leftover, out);
                }
                leftover
            }
            MatchPhase::Active { .. } => {
                self.advance_match(dt, out);
                dt
            }
            MatchPhase::Ended => {
                self.advance_report_delay(dt, out);
                Duration::ZERO
            }
        };

        self.scoring.decay(dt, out);

        let mut target_events = mem::take(&mut self.target_scratch);
        self.targets.advance(dt, &mut target_events);
        self.route_target_events(&mut target_events, out);
        self.target_scratch = target_events;

        if self.phase.is_active() && !active_dt.is_zero() {
            let mut orders = mem::take(&mut self.spawn_scratch);
            self.difficulty.advance(active_dt, &mut orders);
            for order in orders.drain(..) {
                self.spawn_target(order, out);
            }
            self.spawn_scratch = orders;
        }
    }

    fn request_start(&mut self, out: &mut Vec<Event>) {
        if let Some(error) = &self.config_error {
            warn!(%error, "start refused");
            out.push(Event::ConfigurationRejected {
                error: error.clone(),
            });
            return;
        }

        if self.phase != MatchPhase::Idle {
            debug!(phase = ?self.phase, "start ignored; session already started");
            return;
        }

        self.begin_countdown(out);
    }

    fn request_restart(&mut self, out: &mut Vec<Event>) {
        if let Some(error) = &self.config_error {
            warn!(%error, "restart refused");
            out.push(Event::ConfigurationRejected {
                error: error.clone(),
            });
            return;
        }

        if self.phase.is_countdown() {
            debug!("restart ignored during countdown");
            return;
        }

        info!(phase = ?self.phase, "restarting session");
        self.scoring.reset(out);

        let mut cleared = Vec::new();
        self.targets.reset_all(&mut cleared);
        out.extend(
            cleared
                .into_iter()
                .map(|target| Event::TargetShouldDestroy { target }),
        );

        self.difficulty.reset();
        self.report_in = None;
        self.set_phase(MatchPhase::Idle, out);
        self.begin_countdown(out);
    }

    fn report_hit(
        &mut self,
        target: TargetId,
        point: WorldPoint,
        zone: HitZone,
        out: &mut Vec<Event>,
    ) {
        if !self.phase.is_active() {
            debug!(
                target_id = target.get(),
                phase = ?self.phase,
                "hit ignored outside active play"
            );
            return;
        }

        let mut target_events = mem::take(&mut self.target_scratch);
        let resolved = self.targets.resolve_by_hit(target, &mut target_events);
        self.route_target_events(&mut target_events, out);
        self.target_scratch = target_events;

        if !resolved {
            debug!(target_id = target.get(), "late hit ignored");
            return;
        }

        let base_points = match zone {
            HitZone::Body => self.config.targets.body_points,
            HitZone::WeakPoint => self.config.targets.weak_point_points,
        };
        debug!(
            target_id = target.get(),
            x = point.x(),
            y = point.y(),
            z = point.z(),
            ?zone,
            "hit registered"
        );
        let _ = self.scoring.apply_hit(base_points, zone, out);
    }

    fn begin_countdown(&mut self, out: &mut Vec<Event>) {
        let step = CountdownStep::Three;
        self.set_phase(
            MatchPhase::Countdown {
                remaining: self.step_hold(step),
                step,
            },
            out,
        );
        announce_step(step, out);
    }

    /// Runs the countdown, returning the part of `dt` left over once the
    /// match has started.
    fn advance_countdown(&mut self, dt: Duration, out: &mut Vec<Event>) -> Duration {
        let mut dt = dt;
        while let MatchPhase::Countdown { remaining, step } = self.phase {
            if dt < remaining {
                self.phase = MatchPhase::Countdown {
                    remaining: remaining - dt,
                    step,
                };
                return Duration::ZERO;
            }

            dt -= remaining;
            match step.next() {
                Some(next) => {
                    self.phase = MatchPhase::Countdown {
                        remaining: self.step_hold(next),
                        step: next,
                    };
                    announce_step(next, out);
                }
                None => self.begin_match(out),
            }
        }
        dt
    }

    fn begin_match(&mut self, out: &mut Vec<Event>) {
        let remaining = self.config.timing.duration();
        self.set_phase(MatchPhase::Active { remaining }, out);
        self.difficulty.start();
        info!(duration = ?remaining, "match started");
    }

    fn advance_match(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let MatchPhase::Active { remaining } = self.phase else {
            return;
        };

        let next = remaining.saturating_sub(dt);
        self.phase = MatchPhase::Active { remaining: next };
        out.push(Event::TimerChanged {
            timer: self.timer_display(),
        });

        let window = self.config.timing.warning_window();
        let crossed = (ceil_secs(next).max(1)..ceil_secs(remaining))
            .filter(|&boundary| Duration::from_secs(boundary) <= window)
            .count();
        for _ in 0..crossed {
            out.push(Event::CueRequested {
                cue: Cue::TimeWarning,
            });
        }

        if next.is_zero() {
            self.end_match(out);
        }
    }

    fn end_match(&mut self, out: &mut Vec<Event>) {
        self.difficulty.stop();
        out.push(Event::CueRequested { cue: Cue::MatchEnd });
        self.set_phase(MatchPhase::Ended, out);
        info!(score = self.scoring.state().score, "match ended");

        let delay = self.config.timing.end_report_delay();
        if delay.is_zero() {
            self.publish_report(out);
        } else {
            self.report_in = Some(delay);
        }
    }

    fn advance_report_delay(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let Some(remaining) = self.report_in else {
            return;
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.report_in = None;
            self.publish_report(out);
        } else {
            self.report_in = Some(remaining);
        }
    }

    fn publish_report(&mut self, out: &mut Vec<Event>) {
        let result = self.scoring.grade();
        let stats = self.scoring.stats();
        info!(
            grade = result.grade.label(),
            score = result.final_score,
            accuracy = result.accuracy_percent,
            hits = stats.targets_hit,
            targets = stats.total_targets,
            max_combo = stats.max_combo,
            "end report"
        );
        out.push(Event::CueRequested {
            cue: Cue::GradeReveal,
        });
        out.push(Event::EndReport { result, stats });
    }

    fn spawn_target(&mut self, order: SpawnOrder, out: &mut Vec<Event>) {
        let target = self
            .targets
            .spawn_aged(self.config.targets.lifetime(), order.age);
        self.scoring.register_spawn();
        out.push(Event::SpawnRequested {
            target,
            point: order.point,
            prefab: order.prefab,
            motion: order.motion,
        });
    }

    fn route_target_events(&mut self, events: &mut Vec<TargetEvent>, out: &mut Vec<Event>) {
        for event in events.drain(..) {
            match event {
                TargetEvent::Resolved { target, resolution } => {
                    self.difficulty.on_target_resolved();
                    out.push(Event::TargetResolved { target, resolution });
                }
                TargetEvent::Despawned { target } => {
                    out.push(Event::TargetShouldDestroy { target });
                }
            }
        }
    }

    fn set_phase(&mut self, phase: MatchPhase, out: &mut Vec<Event>) {
        self.phase = phase;
        out.push(Event::PhaseChanged {
            phase,
            timer: self.timer_display(),
        });
    }

    fn step_hold(&self, step: CountdownStep) -> Duration {
        match step {
            CountdownStep::Go => self.config.timing.go_hold(),
            CountdownStep::Three | CountdownStep::Two | CountdownStep::One => {
                self.config.timing.countdown_step()
            }
        }
    }

    fn remaining(&self) -> Duration {
        match self.phase {
            MatchPhase::Idle | MatchPhase::Countdown { .. } => self.config.timing.duration(),
            MatchPhase::Active { remaining } => remaining,
            MatchPhase::Ended => Duration::ZERO,
        }
    }

    fn timer_display(&self) -> TimerDisplay {
        TimerDisplay::from_remaining(self.remaining(), self.config.timing.warning_window())
    }
}

fn announce_step(step: CountdownStep, out: &mut Vec<Event>) {
    out.push(Event::CountdownStep { step });
    out.push(Event::CueRequested { cue: step.cue() });
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// Applies the provided command to the session, emitting resulting events.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => session.tick(dt, out_events),
        Command::RequestStart => session.request_start(out_events),
        Command::RequestRestart => session.request_restart(out_events),
        Command::ReportHit {
            target,
            point,
            zone,
        } => session.report_hit(target, point, zone, out_events),
    }
}

/// Read-only queries over a session.
pub mod query {
    use std::time::Duration;

    use super::{Session, TargetRecord};
    use shooting_gallery_core::{
        ComboState, ConfigError, GradeResult, MatchPhase, SessionConfig, TargetId, TimerDisplay,
    };

    /// Current match phase.
    #[must_use]
    pub fn phase(session: &Session) -> MatchPhase {
        session.phase
    }

    /// Match time left; the full duration before the match starts and zero
    /// once it has ended.
    #[must_use]
    pub fn remaining(session: &Session) -> Duration {
        session.remaining()
    }

    /// Timer values the host should display.
    #[must_use]
    pub fn timer_display(session: &Session) -> TimerDisplay {
        session.timer_display()
    }

    /// Snapshot of the scoring counters.
    #[must_use]
    pub fn combo(session: &Session) -> ComboState {
        session.scoring.state()
    }

    /// Grade the current scoring state would earn.
    #[must_use]
    pub fn grade(session: &Session) -> GradeResult {
        session.scoring.grade()
    }

    /// Reports whether the weak point indicator is showing.
    #[must_use]
    pub fn weak_point_indicator_visible(session: &Session) -> bool {
        session.scoring.weak_point_indicator_visible()
    }

    /// Spawned targets that have not been hit or expired.
    #[must_use]
    pub fn active_targets(session: &Session) -> u32 {
        session.difficulty.active_count()
    }

    /// Interval the next spawn wait will use.
    #[must_use]
    pub fn spawn_interval(session: &Session) -> Duration {
        session.difficulty.current_interval()
    }

    /// Reports whether the spawn timer is running.
    #[must_use]
    pub fn is_spawning(session: &Session) -> bool {
        session.difficulty.is_running()
    }

    /// Looks up a tracked target.
    #[must_use]
    pub fn target(session: &Session, id: TargetId) -> Option<TargetRecord> {
        session.targets.record(id).copied()
    }

    /// Identifiers of every tracked target, including those awaiting removal.
    #[must_use]
    pub fn targets(session: &Session) -> Vec<TargetId> {
        session.targets.records().map(|record| record.id).collect()
    }

    /// Configuration problem detected at construction, if any.
    #[must_use]
    pub fn configuration_error(session: &Session) -> Option<&ConfigError> {
        session.config_error.as_ref()
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(session: &Session) -> &SessionConfig {
        &session.config
    }
}
