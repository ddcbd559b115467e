//! # regatta-types
//!
//! Plain data shared between the race simulation core and whatever hosts it.
//!
//! These types are used by:
//! - `regatta-sim` (library): produces `TickSnapshot`s and race results every tick
//! - `regatta-sim` (binary): prints snapshots as JSON lines, parses `ControlCommand`s
//! - any renderer / minimap / menu layer that only consumes core state
//!
//! ## Coordinate Conventions
//!
//! - **World frame**: 2D Cartesian, origin at the course centre, x right, y down
//!   (screen convention)
//! - **Headings**: degrees in [0, 360), 0 = +x, increasing towards +y
//! - **Wind direction**: the heading a boat would point if sailing straight into the wind

use serde::{Deserialize, Serialize};

// ── 2D Vector ─────────────────────────────────────────────────────────────────

/// 2D point or displacement in world units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    /// Unit vector for a heading in degrees
    pub fn from_heading(heading_deg: f64) -> Self {
        let rad = heading_deg.to_radians();
        Self::new(rad.cos(), rad.sin())
    }

    pub fn add(&self, other: &Vec2) -> Vec2 { Vec2::new(self.x + other.x, self.y + other.y) }
    pub fn sub(&self, other: &Vec2) -> Vec2 { Vec2::new(self.x - other.x, self.y - other.y) }
    pub fn scale(&self, s: f64) -> Vec2 { Vec2::new(self.x * s, self.y * s) }
    pub fn dot(&self, other: &Vec2) -> f64 { self.x * other.x + self.y * other.y }
    /// z-component of the 3D cross product
    pub fn cross(&self, other: &Vec2) -> f64 { self.x * other.y - self.y * other.x }
    pub fn length_sq(&self) -> f64 { self.x * self.x + self.y * self.y }
    pub fn length(&self) -> f64 { self.length_sq().sqrt() }
    pub fn dist_sq(&self, other: &Vec2) -> f64 { self.sub(other).length_sq() }
    pub fn dist(&self, other: &Vec2) -> f64 { self.dist_sq(other).sqrt() }
    pub fn midpoint(&self, other: &Vec2) -> Vec2 {
        Vec2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Heading in degrees [0, 360) of this vector (0 for the zero vector)
    pub fn heading_deg(&self) -> f64 {
        let deg = self.y.atan2(self.x).to_degrees().rem_euclid(360.0);
        // rem_euclid rounds tiny negative angles up to exactly 360.0
        if deg >= 360.0 { 0.0 } else { deg }
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(p: [f64; 2]) -> Self { Vec2::new(p[0], p[1]) }
}

// ── Race Status ───────────────────────────────────────────────────────────────

/// Per-boat race progress state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaceStatus {
    #[default]
    NotStarted,
    Racing,
    Finished,
}

/// Whole-race lifecycle as seen by a host
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "phase")]
pub enum RacePhase {
    /// Pre-start countdown; boats manoeuvre but no progress is scored
    Staging { remaining_s: f64 },
    Racing,
    /// Results are in; waiting for the host to start the next race
    Concluded,
}

// ── Sailing Style ─────────────────────────────────────────────────────────────

/// Personality of an autopilot. One navigation algorithm, four parameter sets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SailingStyle {
    /// Precise, low-noise
    Perfectionist,
    Aggressive,
    Cautious,
    /// High-noise, overshoots
    Erratic,
}

impl SailingStyle {
    pub const ALL: [SailingStyle; 4] = [
        SailingStyle::Perfectionist,
        SailingStyle::Aggressive,
        SailingStyle::Cautious,
        SailingStyle::Erratic,
    ];
}

// ── Per-Tick Telemetry (Core → Host) ──────────────────────────────────────────

/// Everything a renderer needs to draw one boat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoatTelemetry {
    pub boat_id: usize,
    pub name: String,
    /// None for human-controlled boats
    pub style: Option<SailingStyle>,
    pub pos: Vec2,
    /// Degrees, [0, 360)
    pub heading: f64,
    pub speed: f64,
    /// Commanded sail trim relative to the centreline, degrees
    pub sail_angle: f64,
    /// Where the boom actually sits once the wind has its say, degrees
    pub visual_sail_angle: f64,
    pub optimal_trim: f64,
    /// 0.0–1.0
    pub wind_effectiveness: f64,
    pub on_obstacle: bool,
    pub status: RaceStatus,
    /// 1-based; stays 1 until the boat starts
    pub current_lap: u32,
    /// -1 before the start
    pub next_buoy_index: i32,
    pub lap_times: Vec<f64>,
    pub finish_time: Option<f64>,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindTelemetry {
    pub speed: f64,
    /// Degrees, [0, 360)
    pub direction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandbarTelemetry {
    pub center: Vec2,
    pub size: f64,
    /// Closed outline in world coordinates
    pub polygon: Vec<Vec2>,
}

/// Generated course, sent once per race for map rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseTelemetry {
    pub buoys: Vec<Vec2>,
    pub gates: [Vec2; 2],
    pub sandbars: Vec<SandbarTelemetry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub race_index: u32,
    pub total_races: u32,
    pub total_laps: u32,
    pub race_time: f64,
    pub phase: RacePhase,
    pub wind: WindTelemetry,
    pub boats: Vec<BoatTelemetry>,
}

// ── Results (Core → Host, once per race) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceResultRow {
    pub boat_id: usize,
    pub name: String,
    /// 1-based finishing position
    pub position: usize,
    /// Actual finish time, or the synthetic penalty time for unfinished boats
    pub ranked_time: f64,
    pub finished: bool,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standing {
    pub boat_id: usize,
    pub name: String,
    pub score: u32,
}

// ── Host Commands (Host → Core) ───────────────────────────────────────────────

/// Input accepted from a host. JSON: `{ "cmd": "turn", "boat": 0, "direction": -1 }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "cmd")]
pub enum ControlCommand {
    Pause,
    Resume,
    RandomizeWind,
    /// Rudder intent -1 / 0 / +1 for a human-controlled boat
    Turn { boat: usize, direction: i8 },
    /// Sail-trim intent -1 / 0 / +1 for a human-controlled boat
    Trim { boat: usize, direction: i8 },
    SetSpeed { speed: f64 },
    NextRace,
    Forfeit { boat: usize },
}

impl ControlCommand {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_of_axis_vectors() {
        assert_eq!(Vec2::new(1.0, 0.0).heading_deg(), 0.0);
        assert!((Vec2::new(0.0, 1.0).heading_deg() - 90.0).abs() < 1e-9);
        assert!((Vec2::new(0.0, -1.0).heading_deg() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn heading_just_below_the_x_axis_wraps_to_zero() {
        let h = Vec2::new(1.0, -1e-300).heading_deg();
        assert!(h < 360.0);
        assert_eq!(h, 0.0);
        assert!(Vec2::new(1.0, -1e-3).heading_deg() > 359.9);
    }

    #[test]
    fn parses_tagged_commands() {
        let cmd = ControlCommand::parse(r#"{"cmd":"turn","boat":0,"direction":-1}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Turn { boat: 0, direction: -1 });
        assert_eq!(
            ControlCommand::parse(r#"{"cmd":"randomize_wind"}"#).unwrap(),
            ControlCommand::RandomizeWind
        );
        assert!(ControlCommand::parse(r#"{"cmd":"launch_missiles"}"#).is_err());
    }

    #[test]
    fn phase_serializes_with_tag() {
        let json = serde_json::to_string(&RacePhase::Staging { remaining_s: 3.0 }).unwrap();
        assert_eq!(json, r#"{"phase":"STAGING","remaining_s":3.0}"#);
    }
}
