//! End-to-end races driven through the public `Simulation` API

use approx::assert_relative_eq;
use regatta_sim::course::Course;
use regatta_sim::geometry::LineFrame;
use regatta_sim::progress::ProgressEvent;
use regatta_sim::wind::WindField;
use regatta_sim::{SimConfig, Simulation};
use regatta_types::{ControlCommand, RacePhase, RaceStatus, SailingStyle, Vec2};

const DT: f64 = 1.0 / 60.0;

fn solo_config(seed: u64) -> SimConfig {
    let mut cfg = SimConfig::default();
    cfg.race.seed = Some(seed);
    cfg.race.staging_seconds = 3.0;
    cfg.race.human_boats = 0;
    cfg.race.ai_styles = vec![SailingStyle::Perfectionist];
    cfg.race.total_laps = 2;
    cfg.race.total_races = 1;
    cfg.wind.speed_change_rate = 0.0;
    cfg.wind.direction_change_rate = 0.0;
    cfg.course.sandbar_count = 0;
    cfg.scoring.results_timeout_s = None;
    cfg
}

fn three_mark_course() -> Course {
    Course::from_parts(
        vec![Vec2::new(300.0, -250.0), Vec2::new(300.0, 250.0), Vec2::new(-450.0, 350.0)],
        LineFrame::new(Vec2::new(-100.0, -150.0), Vec2::new(-100.0, 150.0)),
        vec![],
    )
}

#[test]
fn autopilot_sails_a_full_race() {
    for (seed, wind_direction) in [(1_u64, 0.0), (2, 135.0), (3, 250.0)] {
        let cfg = solo_config(seed);
        let wind = WindField::with_state(&cfg.wind, 2.8, wind_direction);
        let mut sim = Simulation::new(cfg).unwrap();
        sim.set_wind(wind);
        sim.set_course(three_mark_course());

        let mut events = Vec::new();
        while matches!(sim.phase(), RacePhase::Staging { .. }) {
            assert!(sim.tick(DT).is_empty());
        }
        let max_ticks = (1500.0 / DT) as usize;
        for _ in 0..max_ticks {
            events.extend(sim.tick(DT));
            if sim.is_concluded() {
                break;
            }
        }
        assert!(sim.is_concluded(), "wind {wind_direction}: race never finished");

        let boat = &sim.boats()[0];
        assert_eq!(boat.progress.status, RaceStatus::Finished);
        assert_eq!(boat.progress.lap_times.len(), 2);
        let total: f64 = boat.progress.lap_times.iter().sum();
        let finish = boat.progress.finish_time.unwrap();
        assert_relative_eq!(finish, total, epsilon = 1e-6);

        let kinds: Vec<&ProgressEvent> = events.iter().map(|e| &e.event).collect();
        assert!(matches!(kinds.first(), Some(ProgressEvent::Started)));
        assert!(matches!(kinds.last(), Some(ProgressEvent::Finished { .. })));
        let rounded = kinds.iter().filter(|k| matches!(k, ProgressEvent::MarkRounded { .. })).count();
        assert_eq!(rounded, 6);

        let results = sim.last_results();
        assert_eq!(results.len(), 1);
        assert!(results[0].finished);
        assert_eq!(results[0].points, 10);
        assert_eq!(sim.boats()[0].score, 10);
    }
}

#[test]
fn boats_stay_within_physical_bounds() {
    let mut cfg = SimConfig::default();
    cfg.race.seed = Some(99);
    cfg.race.human_boats = 0;
    cfg.race.ai_styles = vec![
        SailingStyle::Perfectionist,
        SailingStyle::Aggressive,
        SailingStyle::Cautious,
        SailingStyle::Erratic,
    ];
    let max_speed = cfg.boat.max_speed;
    let max_sail = cfg.boat.max_sail_angle;
    let mut sim = Simulation::new(cfg).unwrap();

    for _ in 0..6000 {
        sim.tick(DT);
        for boat in sim.boats() {
            assert!(boat.speed >= 0.0 && boat.speed <= max_speed + 1e-9);
            assert!(boat.sail_angle.abs() <= max_sail + 1e-9);
            assert!((0.0..=1.0).contains(&boat.wind_effectiveness));
            assert!((0.0..360.0).contains(&boat.heading));
        }
    }
}

#[test]
fn series_runs_to_completion_and_accumulates_points() {
    let mut cfg = SimConfig::default();
    cfg.race.seed = Some(5);
    cfg.race.total_races = 3;
    cfg.race.staging_seconds = 0.0;
    cfg.race.human_boats = 1;
    let mut sim = Simulation::new(cfg).unwrap();

    for race in 1..=3 {
        assert_eq!(sim.race_index(), race);
        assert_eq!(sim.phase(), RacePhase::Racing);
        sim.tick(DT);
        // the only human walks away, results are called at once
        assert!(sim.apply(&ControlCommand::Forfeit { boat: 0 }));
        assert!(sim.is_concluded());
        assert_eq!(sim.races_scored(), race);
        let last = sim.last_results().last().unwrap();
        assert_eq!(last.boat_id, 0);
        assert_eq!(last.points, 1);
        if race < 3 {
            assert!(sim.apply(&ControlCommand::NextRace));
        }
    }

    assert!(sim.is_series_complete());
    assert!(!sim.apply(&ControlCommand::NextRace));
    let standings = sim.standings();
    assert_eq!(standings.iter().map(|s| s.score).sum::<u32>(), 3 * (10 + 6 + 3 + 1));
    assert_eq!(standings.last().map(|s| (s.boat_id, s.score)), Some((0, 3)));
    for pair in standings.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let run = || {
        let mut cfg = SimConfig::default();
        cfg.race.seed = Some(1234);
        cfg.race.human_boats = 0;
        let mut sim = Simulation::new(cfg).unwrap();
        for _ in 0..2000 {
            sim.tick(DT);
        }
        sim.boats().iter().map(|b| (b.pos, b.heading, b.speed)).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
