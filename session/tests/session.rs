use std::time::Duration;

use shooting_gallery_core::{
    Command, ConfigError, CountdownStep, Cue, Event, Grade, HitZone, MatchPhase, MatchTuning,
    Resolution, SessionConfig, SpawnTuning, TargetId, TimerDisplay, WorldPoint,
};
use shooting_gallery_session::{apply, query, Session, TargetState};

const FRAME: Duration = Duration::from_millis(100);

fn started(config: SessionConfig) -> Session {
    let mut session = Session::new(config);
    let mut events = Vec::new();
    apply(&mut session, Command::RequestStart, &mut events);
    session
}

fn tick(session: &mut Session, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    apply(session, Command::Tick { dt }, &mut events);
    events
}

fn run_frames(session: &mut Session, frames: usize) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..frames {
        apply(session, Command::Tick { dt: FRAME }, &mut events);
    }
    events
}

fn hit(session: &mut Session, target: TargetId, zone: HitZone) -> Vec<Event> {
    let mut events = Vec::new();
    apply(
        session,
        Command::ReportHit {
            target,
            point: WorldPoint::new(0.0, 1.5, 4.0),
            zone,
        },
        &mut events,
    );
    events
}

fn spawned(events: &[Event]) -> Vec<TargetId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::SpawnRequested { target, .. } => Some(*target),
            _ => None,
        })
        .collect()
}

fn count_cues(events: &[Event], cue: Cue) -> usize {
    events
        .iter()
        .filter(|event| **event == Event::CueRequested { cue })
        .count()
}

/// Ticks an active session until `count` targets have spawned.
fn await_spawns(session: &mut Session, count: usize) -> Vec<TargetId> {
    let mut targets = Vec::new();
    for _ in 0..200 {
        targets.extend(spawned(&tick(session, FRAME)));
        if targets.len() >= count {
            return targets;
        }
    }
    panic!("only {} targets spawned", targets.len());
}

#[test]
fn full_match_without_hits_grades_f() {
    let mut session = started(SessionConfig::default());
    let mut events = Vec::new();

    let mut frames = 0;
    while query::phase(&session) != MatchPhase::Ended {
        frames += 1;
        assert!(frames <= 2_000, "match never ended");
        apply(&mut session, Command::Tick { dt: FRAME }, &mut events);
    }

    assert_eq!(frames, 935, "3.5s countdown plus 90s of play");
    assert_eq!(query::remaining(&session), Duration::ZERO);
    assert!(!query::is_spawning(&session));
    assert_eq!(count_cues(&events, Cue::TimeWarning), 10);
    assert_eq!(count_cues(&events, Cue::MatchEnd), 1);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EndReport { .. })));

    let tail = run_frames(&mut session, 15);
    let reports: Vec<&Event> = tail
        .iter()
        .filter(|event| matches!(event, Event::EndReport { .. }))
        .collect();
    assert_eq!(reports.len(), 1);
    let Event::EndReport { result, stats } = reports[0] else {
        unreachable!();
    };
    assert_eq!(*result, query::grade(&session));
    assert_eq!(result.grade, Grade::F);
    assert_eq!(result.accuracy_percent, 0.0);
    assert_eq!(result.final_score, 0);
    assert!(stats.total_targets > 0, "targets spawned during play");
    assert_eq!(count_cues(&tail, Cue::GradeReveal), 1);

    let later = run_frames(&mut session, 50);
    assert!(!later
        .iter()
        .any(|event| matches!(event, Event::EndReport { .. })));
}

#[test]
fn countdown_announces_each_step_then_starts_play() {
    let mut session = Session::new(SessionConfig::default());
    let mut events = Vec::new();
    apply(&mut session, Command::RequestStart, &mut events);
    events.extend(tick(&mut session, Duration::from_millis(3_600)));

    let steps: Vec<CountdownStep> = events
        .iter()
        .filter_map(|event| match event {
            Event::CountdownStep { step } => Some(*step),
            _ => None,
        })
        .collect();
    assert_eq!(
        steps,
        [
            CountdownStep::Three,
            CountdownStep::Two,
            CountdownStep::One,
            CountdownStep::Go
        ]
    );
    assert_eq!(count_cues(&events, Cue::CountdownBeep), 3);
    assert_eq!(count_cues(&events, Cue::Go), 1);
    assert_eq!(
        query::phase(&session),
        MatchPhase::Active {
            remaining: Duration::from_millis(89_900)
        }
    );
    assert!(query::is_spawning(&session));
}

#[test]
fn start_is_ignored_once_started() {
    let mut session = started(SessionConfig::default());
    let mut events = Vec::new();
    apply(&mut session, Command::RequestStart, &mut events);
    assert!(events.is_empty());
}

#[test]
fn auto_start_begins_the_countdown_on_the_first_tick() {
    let mut session = Session::new(SessionConfig {
        timing: MatchTuning {
            auto_start: true,
            ..MatchTuning::default()
        },
        ..SessionConfig::default()
    });

    let events = tick(&mut session, FRAME);
    assert!(events.contains(&Event::CountdownStep {
        step: CountdownStep::Three
    }));
    assert_eq!(
        query::phase(&session),
        MatchPhase::Countdown {
            remaining: Duration::from_millis(900),
            step: CountdownStep::Three,
        }
    );
}

#[test]
fn hit_resolves_scores_and_destroys_after_a_delay() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 35);
    let target = await_spawns(&mut session, 1)[0];
    assert_eq!(query::active_targets(&session), 1);

    let events = hit(&mut session, target, HitZone::Body);
    assert!(events.contains(&Event::TargetResolved {
        target,
        resolution: Resolution::Hit,
    }));
    assert_eq!(query::combo(&session).score, 10);
    assert_eq!(query::active_targets(&session), 0);
    assert!(!events.contains(&Event::TargetShouldDestroy { target }));

    let events = tick(&mut session, FRAME);
    assert!(events.contains(&Event::TargetShouldDestroy { target }));
    assert!(query::target(&session, target).is_none());
}

#[test]
fn repeated_hits_on_one_target_score_once() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 35);
    let target = await_spawns(&mut session, 1)[0];

    let before = query::active_targets(&session);
    let _ = hit(&mut session, target, HitZone::WeakPoint);
    let second = hit(&mut session, target, HitZone::WeakPoint);

    assert!(second.is_empty());
    assert_eq!(query::active_targets(&session), before - 1);
    let combo = query::combo(&session);
    assert_eq!(combo.score, 100);
    assert_eq!(combo.targets_hit, 1);
    assert_eq!(combo.weak_points_hit, 1);
}

#[test]
fn combo_decay_in_a_tick_precedes_hits_reported_after_it() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 35);
    let targets = await_spawns(&mut session, 2);

    let _ = hit(&mut session, targets[0], HitZone::Body);
    assert_eq!(query::combo(&session).combo_count, 1);

    let _ = tick(&mut session, Duration::from_secs(2));
    let _ = hit(&mut session, targets[1], HitZone::Body);

    let combo = query::combo(&session);
    assert_eq!(combo.combo_count, 1);
    assert_eq!(combo.score, 20);
    assert_eq!(combo.max_combo, 1);
}

#[test]
fn unhit_targets_expire_and_free_their_slot() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 35);
    let target = await_spawns(&mut session, 1)[0];

    let events = run_frames(&mut session, 50);
    assert!(events.contains(&Event::TargetResolved {
        target,
        resolution: Resolution::Expired,
    }));
    assert!(events.contains(&Event::TargetShouldDestroy { target }));
    assert!(query::target(&session, target).is_none());
}

#[test]
fn hits_outside_active_play_are_ignored() {
    let config = SessionConfig {
        timing: MatchTuning {
            duration_ms: 3_000,
            ..MatchTuning::default()
        },
        ..SessionConfig::default()
    };
    let mut session = Session::new(config);
    assert!(hit(&mut session, TargetId::new(0), HitZone::Body).is_empty());

    let mut events = Vec::new();
    apply(&mut session, Command::RequestStart, &mut events);
    assert!(hit(&mut session, TargetId::new(0), HitZone::Body).is_empty());

    let _ = run_frames(&mut session, 35);
    let target = await_spawns(&mut session, 1)[0];
    let _ = run_frames(&mut session, 10);
    assert_eq!(query::phase(&session), MatchPhase::Ended);

    assert!(hit(&mut session, target, HitZone::Body).is_empty());
    assert_eq!(query::combo(&session).score, 0);
    let record = query::target(&session, target).expect("target still tracked");
    assert_eq!(record.state, TargetState::Alive);
}

#[test]
fn restart_clears_targets_and_counts_down_again() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 35);
    let targets = await_spawns(&mut session, 2);
    let _ = hit(&mut session, targets[0], HitZone::Body);

    let tracked = query::targets(&session);
    let mut events = Vec::new();
    apply(&mut session, Command::RequestRestart, &mut events);

    for target in tracked {
        assert!(events.contains(&Event::TargetShouldDestroy { target }));
    }
    let phases: Vec<MatchPhase> = events
        .iter()
        .filter_map(|event| match event {
            Event::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0], MatchPhase::Idle);
    assert!(phases[1].is_countdown());

    assert!(query::targets(&session).is_empty());
    assert_eq!(query::active_targets(&session), 0);
    assert_eq!(query::combo(&session).score, 0);
    assert_eq!(query::combo(&session).total_targets, 0);
    assert_eq!(query::spawn_interval(&session), Duration::from_secs(2));
    assert!(!query::is_spawning(&session));
}

#[test]
fn restart_during_countdown_is_ignored() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 5);

    let mut events = Vec::new();
    apply(&mut session, Command::RequestRestart, &mut events);

    assert!(events.is_empty());
    assert_eq!(
        query::phase(&session),
        MatchPhase::Countdown {
            remaining: Duration::from_millis(500),
            step: CountdownStep::Three,
        }
    );
}

#[test]
fn restart_after_the_match_ends_starts_a_new_one() {
    let config = SessionConfig {
        timing: MatchTuning {
            duration_ms: 1_000,
            ..MatchTuning::default()
        },
        ..SessionConfig::default()
    };
    let mut session = started(config);
    let _ = run_frames(&mut session, 60);
    assert_eq!(query::phase(&session), MatchPhase::Ended);

    let mut events = Vec::new();
    apply(&mut session, Command::RequestRestart, &mut events);
    assert!(query::phase(&session).is_countdown());

    let events = run_frames(&mut session, 40);
    assert!(query::phase(&session).is_active());
    assert_eq!(count_cues(&events, Cue::Go), 1);
}

#[test]
fn invalid_configuration_keeps_the_session_idle() {
    let mut session = Session::new(SessionConfig {
        spawning: SpawnTuning {
            spawn_points: Vec::new(),
            ..SpawnTuning::default()
        },
        ..SessionConfig::default()
    });
    assert_eq!(
        query::configuration_error(&session),
        Some(&ConfigError::NoSpawnPoints)
    );

    for command in [Command::RequestStart, Command::RequestRestart] {
        let mut events = Vec::new();
        apply(&mut session, command, &mut events);
        assert_eq!(
            events,
            [Event::ConfigurationRejected {
                error: ConfigError::NoSpawnPoints
            }]
        );
    }

    let _ = run_frames(&mut session, 50);
    assert_eq!(query::phase(&session), MatchPhase::Idle);
}

#[test]
fn identical_command_streams_replay_identically() {
    let run = || {
        let mut session = Session::new(SessionConfig::default());
        let mut events = Vec::new();
        apply(&mut session, Command::RequestStart, &mut events);
        for frame in 0..600 {
            apply(&mut session, Command::Tick { dt: FRAME }, &mut events);
            if frame % 7 == 0 {
                if let Some(target) = query::targets(&session).first().copied() {
                    apply(
                        &mut session,
                        Command::ReportHit {
                            target,
                            point: WorldPoint::new(0.0, 0.0, 0.0),
                            zone: HitZone::Body,
                        },
                        &mut events,
                    );
                }
            }
        }
        events
    };

    assert_eq!(run(), run());
}

fn short_match(duration_ms: u64) -> Session {
    let mut session = started(SessionConfig {
        timing: MatchTuning {
            duration_ms,
            ..MatchTuning::default()
        },
        ..SessionConfig::default()
    });
    let _ = tick(&mut session, Duration::from_millis(3_500));
    assert!(query::phase(&session).is_active());
    session
}

#[test]
fn every_active_tick_reports_the_timer() {
    let mut session = started(SessionConfig::default());
    let countdown = run_frames(&mut session, 35);
    assert!(!countdown
        .iter()
        .any(|event| matches!(event, Event::TimerChanged { .. })));

    let events = run_frames(&mut session, 10);
    let timers: Vec<TimerDisplay> = events
        .iter()
        .filter_map(|event| match event {
            Event::TimerChanged { timer } => Some(*timer),
            _ => None,
        })
        .collect();
    assert_eq!(timers.len(), 10);

    let expected = TimerDisplay {
        minutes: 1,
        seconds: 29,
        hundredths: 0,
        alert_intensity: 0.0,
    };
    assert_eq!(timers[9], expected);
    assert_eq!(query::timer_display(&session), expected);
}

#[test]
fn overlong_tick_sounds_every_crossed_warning() {
    let mut session = short_match(12_000);

    let events = tick(&mut session, Duration::from_secs(7));

    assert_eq!(count_cues(&events, Cue::TimeWarning), 6);
    let expected = TimerDisplay {
        minutes: 0,
        seconds: 5,
        hundredths: 0,
        alert_intensity: 0.5,
    };
    assert!(events.contains(&Event::TimerChanged { timer: expected }));
    assert_eq!(query::timer_display(&session), expected);
    assert_eq!(query::remaining(&session), Duration::from_secs(5));
}

#[test]
fn final_tick_sounds_its_warnings_before_the_end_cue() {
    let mut session = short_match(5_000);

    let events = tick(&mut session, Duration::from_secs(5));

    assert_eq!(count_cues(&events, Cue::TimeWarning), 4);
    let last_warning = events
        .iter()
        .rposition(|event| *event == Event::CueRequested { cue: Cue::TimeWarning })
        .expect("warnings emitted");
    let end_cue = events
        .iter()
        .position(|event| *event == Event::CueRequested { cue: Cue::MatchEnd })
        .expect("end cue emitted");
    assert!(last_warning < end_cue);
    assert_eq!(query::phase(&session), MatchPhase::Ended);
    assert_eq!(
        query::timer_display(&session),
        TimerDisplay {
            minutes: 0,
            seconds: 0,
            hundredths: 0,
            alert_intensity: 1.0,
        }
    );
}

#[test]
fn weak_point_indicator_clears_after_its_window() {
    let mut session = started(SessionConfig::default());
    let _ = run_frames(&mut session, 35);
    let target = await_spawns(&mut session, 1)[0];
    assert!(!query::weak_point_indicator_visible(&session));

    let events = hit(&mut session, target, HitZone::WeakPoint);
    assert!(events.contains(&Event::WeakPointIndicator { visible: true }));
    assert!(query::weak_point_indicator_visible(&session));

    let events = run_frames(&mut session, 10);
    assert!(events.contains(&Event::WeakPointIndicator { visible: false }));
    assert!(!query::weak_point_indicator_visible(&session));
}

#[test]
fn targets_spawned_mid_tick_age_from_the_timer_firing() {
    let mut session = short_match(90_000);

    let first = spawned(&tick(&mut session, Duration::from_secs(4)));
    assert_eq!(first.len(), 2);
    let early = query::target(&session, first[0]).expect("first target tracked");
    let late = query::target(&session, first[1]).expect("second target tracked");
    assert_eq!(early.spawned_at, Duration::from_millis(5_500));
    assert!(late.spawned_at > early.spawned_at);

    let events = tick(&mut session, Duration::from_secs(3));
    assert!(events.contains(&Event::TargetResolved {
        target: first[0],
        resolution: Resolution::Expired,
    }));
    assert!(!events.contains(&Event::TargetResolved {
        target: first[1],
        resolution: Resolution::Expired,
    }));
}
