//! simulation.rs — Race and series orchestration
//!
//! Owns the world: wind, course, boats and the seeded RNG stream. One `tick`
//! runs, in fixed order:
//!   wind → autopilots → sandbar contact + physics → collisions → progress
//! Autopilots all decide before any boat moves, so every decision sees the
//! previous tick's world.
//!
//! Race lifecycle:
//!   STAGING (countdown) → RACING → CONCLUDED ──next_race──▶ STAGING …

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use regatta_types::{
    ControlCommand, RacePhase, RaceResultRow, Standing, TickSnapshot, Vec2,
};
use tracing::{debug, info, warn};

use crate::boat::Boat;
use crate::collision;
use crate::config::{ConfigError, SimConfig};
use crate::course::Course;
use crate::geometry::format_time;
use crate::navigation::{Autopilot, NavContext};
use crate::progress::ProgressEvent;
use crate::propulsion;
use crate::scoring::{self, ScoreEntry};
use crate::wind::WindField;

/// Human boats line up on the y axis this far apart
const HUMAN_SPACING: f64 = 40.0;
const AI_FIRST_X: f64 = -50.0;
const AI_SPACING_X: f64 = 25.0;
const AI_SPREAD_Y: f64 = 100.0;
const SPAWN_HEADING: f64 = 90.0;

/// A progress event tagged with the boat it happened to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceEvent {
    pub boat_id: usize,
    pub race_time: f64,
    pub event: ProgressEvent,
}

pub struct Simulation {
    cfg: SimConfig,
    rng: ChaCha8Rng,
    wind: WindField,
    course: Course,
    /// Index == boat id
    boats: Vec<Boat>,
    phase: RacePhase,
    /// Seconds since the gun; zero while staging
    race_time: f64,
    /// 1-based
    race_index: u32,
    races_scored: u32,
    last_results: Vec<RaceResultRow>,
}

impl Simulation {
    pub fn new(cfg: SimConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut rng = match cfg.race.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let wind = WindField::new(&cfg.wind, &mut rng);

        let mut boats = Vec::with_capacity(cfg.boat_count());
        for i in 0..cfg.race.human_boats {
            boats.push(Boat::new(i, format!("Player {}", i + 1), Vec2::ZERO, cfg.boat.collision_radius));
        }
        for (n, &style) in cfg.race.ai_styles.iter().enumerate() {
            let id = boats.len();
            let name = format!("AI {} ({:?})", n + 1, style);
            let autopilot = Autopilot::new(style, &mut rng);
            boats.push(
                Boat::new(id, name, Vec2::ZERO, cfg.boat.collision_radius).with_autopilot(autopilot),
            );
        }

        let course = Course::generate(&cfg.course, &mut rng);
        let mut sim = Self {
            cfg,
            rng,
            wind,
            course,
            boats,
            phase: RacePhase::Racing,
            race_time: 0.0,
            race_index: 1,
            races_scored: 0,
            last_results: Vec::new(),
        };
        sim.line_up();
        info!(
            "Series ready: {} boats, {} race(s) of {} lap(s)",
            sim.boats.len(),
            sim.cfg.race.total_races,
            sim.cfg.race.total_laps
        );
        Ok(sim)
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig { &self.cfg }
    pub fn boats(&self) -> &[Boat] { &self.boats }
    pub fn boat(&self, id: usize) -> Option<&Boat> { self.boats.get(id) }
    pub fn course(&self) -> &Course { &self.course }
    pub fn wind(&self) -> &WindField { &self.wind }
    pub fn phase(&self) -> RacePhase { self.phase }
    pub fn race_time(&self) -> f64 { self.race_time }
    pub fn race_index(&self) -> u32 { self.race_index }
    pub fn races_scored(&self) -> u32 { self.races_scored }
    /// Results of the most recently concluded race
    pub fn last_results(&self) -> &[RaceResultRow] { &self.last_results }

    pub fn is_concluded(&self) -> bool { matches!(self.phase, RacePhase::Concluded) }

    pub fn is_series_complete(&self) -> bool {
        self.races_scored >= self.cfg.race.total_races
    }

    pub fn standings(&self) -> Vec<Standing> {
        scoring::standings(self.boats.iter().map(|b| (b.id, b.name.as_str(), b.score)))
    }

    /// Swap in a prepared course (progress is reset)
    pub fn set_course(&mut self, course: Course) {
        self.course = course;
        for boat in &mut self.boats {
            boat.progress = Default::default();
        }
    }

    pub fn set_wind(&mut self, wind: WindField) {
        self.wind = wind;
    }

    pub fn snapshot(&self) -> TickSnapshot {
        TickSnapshot {
            race_index: self.race_index,
            total_races: self.cfg.race.total_races,
            total_laps: self.cfg.race.total_laps,
            race_time: self.race_time,
            phase: self.phase,
            wind: self.wind.telemetry(),
            boats: self.boats.iter().map(Boat::telemetry).collect(),
        }
    }

    // ── Host input ───────────────────────────────────────────────────────────

    /// Rudder intent for a human boat, clamped to -1..=1
    pub fn turn(&mut self, boat_id: usize, direction: f64) -> bool {
        match self.human_mut(boat_id) {
            Some(boat) => {
                boat.turn(direction.clamp(-1.0, 1.0));
                true
            }
            None => false,
        }
    }

    /// Sail-trim intent for a human boat, clamped to -1..=1
    pub fn trim(&mut self, boat_id: usize, direction: f64) -> bool {
        match self.human_mut(boat_id) {
            Some(boat) => {
                boat.trim(direction.clamp(-1.0, 1.0));
                true
            }
            None => false,
        }
    }

    pub fn randomize_wind(&mut self) {
        self.wind.randomize(&mut self.rng);
    }

    /// Withdraw a boat from the current race
    pub fn forfeit(&mut self, boat_id: usize) -> bool {
        if self.is_concluded() {
            return false;
        }
        let Some(boat) = self.boats.get_mut(boat_id) else {
            warn!("Forfeit for unknown boat {boat_id}");
            return false;
        };
        boat.progress.forfeit();
        info!("🏳 {} forfeits race {}", boat.name, self.race_index);
        if matches!(self.phase, RacePhase::Racing) && self.should_conclude() {
            self.conclude();
        }
        true
    }

    /// Apply a host command. Pause, resume and speed belong to the host loop
    /// and are reported as not handled.
    pub fn apply(&mut self, cmd: &ControlCommand) -> bool {
        match *cmd {
            ControlCommand::Turn { boat, direction } => self.turn(boat, f64::from(direction)),
            ControlCommand::Trim { boat, direction } => self.trim(boat, f64::from(direction)),
            ControlCommand::RandomizeWind => {
                self.randomize_wind();
                true
            }
            ControlCommand::Forfeit { boat } => self.forfeit(boat),
            ControlCommand::NextRace => self.next_race(),
            ControlCommand::Pause | ControlCommand::Resume | ControlCommand::SetSpeed { .. } => false,
        }
    }

    fn human_mut(&mut self, boat_id: usize) -> Option<&mut Boat> {
        match self.boats.get_mut(boat_id) {
            Some(boat) if boat.is_human() => Some(boat),
            Some(boat) => {
                warn!("Ignoring helm input for autopilot boat {}", boat.name);
                None
            }
            None => {
                warn!("Ignoring helm input for unknown boat {boat_id}");
                None
            }
        }
    }

    // ── Series flow ──────────────────────────────────────────────────────────

    /// Start the next race of the series once the current one is scored
    pub fn next_race(&mut self) -> bool {
        if !self.is_concluded() {
            warn!("Race {} is still running", self.race_index);
            return false;
        }
        if self.is_series_complete() {
            warn!("Series complete after {} race(s)", self.races_scored);
            return false;
        }
        self.race_index += 1;
        self.start_race();
        true
    }

    /// Wipe scores and start again from race 1
    pub fn new_series(&mut self) {
        for boat in &mut self.boats {
            boat.score = 0;
        }
        self.races_scored = 0;
        self.race_index = 1;
        self.start_race();
    }

    fn start_race(&mut self) {
        self.course = Course::generate(&self.cfg.course, &mut self.rng);
        self.line_up();
        info!("Race {}/{} set up", self.race_index, self.cfg.race.total_races);
    }

    /// Spawn positions, fresh progress, countdown
    fn line_up(&mut self) {
        let humans = self.cfg.race.human_boats;
        for (i, boat) in self.boats.iter_mut().enumerate() {
            let pos = if boat.is_human() {
                Vec2::new(0.0, HUMAN_SPACING * i as f64)
            } else {
                let n = i.saturating_sub(humans) as f64;
                Vec2::new(
                    AI_FIRST_X - AI_SPACING_X * n,
                    self.rng.gen_range(-AI_SPREAD_Y..=AI_SPREAD_Y),
                )
            };
            boat.reset_for_race(pos, SPAWN_HEADING);
        }
        self.race_time = 0.0;
        self.last_results.clear();
        self.phase = if self.cfg.race.staging_seconds > 0.0 {
            RacePhase::Staging { remaining_s: self.cfg.race.staging_seconds }
        } else {
            RacePhase::Racing
        };
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Advance by `dt` seconds, clamped to the configured maximum.
    /// Non-positive dt is a no-op (pause).
    pub fn tick(&mut self, dt: f64) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        if !(dt > 0.0) || self.is_concluded() {
            return events;
        }
        let dt = dt.min(self.cfg.race.max_tick_s);

        self.wind.update(dt, &mut self.rng);
        let (wind_speed, wind_direction) = (self.wind.speed(), self.wind.direction());

        // Autopilots decide on last tick's world
        let countdown = match self.phase {
            RacePhase::Staging { remaining_s } => Some(remaining_s),
            _ => None,
        };
        let ctx = NavContext {
            wind_direction,
            course: &self.course,
            countdown,
            dt,
            boat: &self.cfg.boat,
            ai: &self.cfg.ai,
            world_bounds: self.cfg.course.world_bounds,
        };
        for boat in self.boats.iter_mut() {
            if let Some(mut autopilot) = boat.autopilot.take() {
                if let Some(helm) = autopilot.steer(boat, &ctx, &mut self.rng) {
                    boat.helm = helm;
                }
                boat.autopilot = Some(autopilot);
            }
        }

        for boat in self.boats.iter_mut() {
            boat.on_obstacle = self.course.hits_sandbar(&boat.collision_box());
            propulsion::step(boat, wind_speed, wind_direction, dt, &self.cfg.boat);
        }

        let contacts = collision::resolve_all(&mut self.boats, self.cfg.scoring.collision_speed_factor);
        if contacts > 0 {
            debug!("{contacts} boat contact(s)");
        }

        match self.phase {
            RacePhase::Staging { remaining_s } => {
                let remaining_s = remaining_s - dt;
                if remaining_s > 0.0 {
                    self.phase = RacePhase::Staging { remaining_s };
                } else {
                    // the part of this tick after the gun counts as race time;
                    // line crossings are first evaluated on the next tick
                    self.phase = RacePhase::Racing;
                    self.race_time = -remaining_s;
                    info!("🔫 Race {} started", self.race_index);
                }
            }
            RacePhase::Racing => {
                self.race_time += dt;
                self.evaluate_progress(&mut events);
                if self.should_conclude() {
                    self.conclude();
                }
            }
            RacePhase::Concluded => {}
        }
        events
    }

    fn evaluate_progress(&mut self, events: &mut Vec<RaceEvent>) {
        let now = self.race_time;
        let laps = self.cfg.race.total_laps;
        for boat in self.boats.iter_mut() {
            let happened = boat.progress.evaluate(
                boat.prev_pos,
                boat.pos,
                now,
                &self.course,
                &self.cfg.progress,
                laps,
            );
            for event in happened {
                match event {
                    ProgressEvent::Started => info!("{} crossed the line", boat.name),
                    ProgressEvent::MarkRounded { index } => {
                        debug!("{} rounded mark {}", boat.name, index + 1)
                    }
                    ProgressEvent::LapCompleted { lap, lap_time } => {
                        info!("{} lap {}: {}", boat.name, lap, format_time(lap_time))
                    }
                    ProgressEvent::Finished { total_time } => {
                        info!("🏁 {} finished in {}", boat.name, format_time(total_time))
                    }
                }
                events.push(RaceEvent { boat_id: boat.id, race_time: now, event });
            }
        }
    }

    /// Every human finished (every boat when nobody is human), or time is up
    fn should_conclude(&self) -> bool {
        let any_human = self.boats.iter().any(Boat::is_human);
        let all_in = self
            .boats
            .iter()
            .filter(|b| !any_human || b.is_human())
            .all(|b| b.progress.is_finished());
        let timed_out = self
            .cfg
            .scoring
            .results_timeout_s
            .is_some_and(|limit| self.race_time >= limit);
        all_in || timed_out
    }

    fn conclude(&mut self) {
        let laps = self.cfg.race.total_laps;
        let entries: Vec<ScoreEntry> = self
            .boats
            .iter()
            .map(|b| ScoreEntry {
                boat_id: b.id,
                name: b.name.clone(),
                ranked_time: scoring::ranked_time(
                    &b.progress,
                    b.progress.remaining_distance(b.pos, &self.course, laps),
                    self.race_time,
                    self.cfg.scoring.penalty_seconds_per_unit,
                ),
                finished: b.progress.is_finished() && !b.progress.forfeited,
            })
            .collect();
        let rows = scoring::rank(entries, &self.cfg.scoring.points);
        for row in &rows {
            if let Some(boat) = self.boats.get_mut(row.boat_id) {
                boat.score += row.points;
            }
        }
        self.races_scored += 1;
        self.phase = RacePhase::Concluded;

        info!("Race {} results:", self.race_index);
        for row in &rows {
            info!(
                "  {}. {:<24} {:>9}  +{}",
                row.position,
                row.name,
                format_time(row.ranked_time),
                row.points
            );
        }
        for s in self.standings() {
            info!("  standing: {:<24} {}", s.name, s.score);
        }
        self.last_results = rows;
    }
}
