//! boat.rs — The one boat entity shared by human and autopilot skippers
//!
//! A boat only differs by where its helm intent comes from: the host writes it
//! for human boats, an attached `Autopilot` writes it for the rest. Physics and
//! race progress run through a single code path either way.

use regatta_types::{BoatTelemetry, Vec2};

use crate::geometry::{normalize_angle, Aabb};
use crate::navigation::Autopilot;
use crate::progress::RaceProgress;

// ── Helm intent ───────────────────────────────────────────────────────────────

/// What to do with the sail this tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrimIntent {
    #[default]
    Hold,
    /// Move the sail at this signed fraction of the boat's trim rate
    Adjust(f64),
    /// Put the sail at this angle (clamped to the physical range)
    Set(f64),
}

/// Transient steering input, consumed by the next physics step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Helm {
    /// Signed rudder; ±1 is a normal full turn, autopilots may push harder
    pub rudder: f64,
    pub trim: TrimIntent,
}

// ── Boat ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Boat {
    pub id: usize,
    pub name: String,
    /// World position
    pub pos: Vec2,
    /// Position before the latest physics step (line-crossing segment start)
    pub prev_pos: Vec2,
    /// Degrees, [0, 360)
    pub heading: f64,
    pub speed: f64,
    /// Sail trim relative to the centreline, degrees
    pub sail_angle: f64,
    /// Where the boom actually sits (a luffing sail cannot be held tighter than the wind allows)
    pub visual_sail_angle: f64,
    /// Derived each step
    pub wind_effectiveness: f64,
    /// Derived each step
    pub optimal_trim: f64,
    pub on_obstacle: bool,
    pub collision_radius: f64,
    pub helm: Helm,
    pub progress: RaceProgress,
    /// Cumulative series score
    pub score: u32,
    /// Present on non-human boats
    pub autopilot: Option<Autopilot>,
}

impl Boat {
    pub fn new(id: usize, name: impl Into<String>, pos: Vec2, collision_radius: f64) -> Self {
        Self {
            id,
            name: name.into(),
            pos,
            prev_pos: pos,
            heading: 90.0,
            speed: 0.0,
            sail_angle: 0.0,
            visual_sail_angle: 0.0,
            wind_effectiveness: 0.0,
            optimal_trim: 0.0,
            on_obstacle: false,
            collision_radius,
            helm: Helm::default(),
            progress: RaceProgress::default(),
            score: 0,
            autopilot: None,
        }
    }

    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = Some(autopilot);
        self
    }

    pub fn is_human(&self) -> bool { self.autopilot.is_none() }

    /// Rudder intent for the next step
    pub fn turn(&mut self, direction: f64) {
        self.helm.rudder = direction;
    }

    /// Sail-trim intent for the next step
    pub fn trim(&mut self, direction: f64) {
        self.helm.trim = TrimIntent::Adjust(direction);
    }

    /// Back to the start area for a new race. Series score is kept.
    pub fn reset_for_race(&mut self, pos: Vec2, heading: f64) {
        self.pos = pos;
        self.prev_pos = pos;
        self.heading = normalize_angle(heading);
        self.speed = 0.0;
        self.sail_angle = 0.0;
        self.visual_sail_angle = 0.0;
        self.wind_effectiveness = 0.0;
        self.optimal_trim = 0.0;
        self.on_obstacle = false;
        self.helm = Helm::default();
        self.progress = RaceProgress::default();
        if let Some(ap) = self.autopilot.as_mut() {
            ap.reset();
        }
    }

    pub fn collision_box(&self) -> Aabb {
        Aabb::around(self.pos, self.collision_radius)
    }

    pub fn telemetry(&self) -> BoatTelemetry {
        BoatTelemetry {
            boat_id: self.id,
            name: self.name.clone(),
            style: self.autopilot.as_ref().map(|ap| ap.style()),
            pos: self.pos,
            heading: self.heading,
            speed: self.speed,
            sail_angle: self.sail_angle,
            visual_sail_angle: self.visual_sail_angle,
            optimal_trim: self.optimal_trim,
            wind_effectiveness: self.wind_effectiveness,
            on_obstacle: self.on_obstacle,
            status: self.progress.status,
            current_lap: self.progress.current_lap,
            next_buoy_index: self.progress.next_buoy_index,
            lap_times: self.progress.lap_times.clone(),
            finish_time: self.progress.finish_time,
            score: self.score,
        }
    }
}
