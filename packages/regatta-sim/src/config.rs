//! config.rs — Simulation configuration (populated from config.toml)
//!
//! Every tuned constant of the game lives here so a host can reshape the world
//! without touching the core. Defaults are the playtested values.

use regatta_types::{SailingStyle, Vec2};
use serde::Deserialize;
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("total_laps must be at least 1")]
    NoLaps,
    #[error("total_races must be at least 1")]
    NoRaces,
    #[error("a race needs at least one boat (human_boats + ai_styles)")]
    NoBoats,
    #[error("scoring points table is empty")]
    EmptyPointsTable,
    #[error("wind speed bounds inverted: min {min} > max {max}")]
    WindBounds { min: f64, max: f64 },
    #[error("max_tick_s must be positive, got {0}")]
    TickClamp(f64),
    #[error("sandbar size bounds inverted: min {min} > max {max}")]
    SandbarSize { min: f64, max: f64 },
    #[error("sandbar vertex bounds must satisfy 3 <= min <= max, got {min}..={max}")]
    SandbarVertices { min: usize, max: usize },
    #[error("start line endpoints coincide")]
    DegenerateStartLine,
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must lie in [0, 1], got {value}")]
    NotAFraction { field: &'static str, value: f64 },
    #[error("sandbar_radius_variation must lie in [0, 1), got {0}")]
    RadiusVariation(f64),
}

// NaN fails every check below

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 { Ok(()) } else { Err(ConfigError::NotPositive { field, value }) }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 { Ok(()) } else { Err(ConfigError::Negative { field, value }) }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAFraction { field, value })
    }
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub total_laps: u32,
    pub total_races: u32,
    /// Boats steered by the host (player input). Ids 0..human_boats.
    pub human_boats: usize,
    /// One autopilot boat per entry
    pub ai_styles: Vec<SailingStyle>,
    /// Pre-start countdown length
    pub staging_seconds: f64,
    /// Upper bound on a single tick's dt (stall protection)
    pub max_tick_s: f64,
    /// Fixed seed for reproducible races; random when absent
    pub seed: Option<u64>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            total_laps: 3,
            total_races: 1,
            human_boats: 1,
            ai_styles: vec![
                SailingStyle::Perfectionist,
                SailingStyle::Aggressive,
                SailingStyle::Cautious,
            ],
            staging_seconds: 10.0,
            max_tick_s: 0.1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub min_speed: f64,
    pub max_speed: f64,
    /// Max speed change per elapsed second
    pub speed_change_rate: f64,
    /// Max direction change (degrees) per elapsed second
    pub direction_change_rate: f64,
    /// Walk steps are only taken once this much time has accumulated
    pub update_interval_s: f64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            min_speed: 1.0,
            max_speed: 4.0,
            speed_change_rate: 0.02,
            direction_change_rate: 0.6,
            update_interval_s: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoatConfig {
    /// Heading change at full rudder and full turn effectiveness
    pub turn_rate_deg_s: f64,
    /// Turn effectiveness at zero speed
    pub min_turn_effectiveness: f64,
    /// Fraction of max speed at which turn effectiveness reaches 1.0
    pub full_turn_speed_fraction: f64,
    pub accel_factor: f64,
    pub drag_coefficient: f64,
    pub drag_exponent: f64,
    pub sandbar_drag_multiplier: f64,
    /// Extra deceleration when the sail gives no drive
    pub no_power_decel: f64,
    pub max_speed: f64,
    pub max_sail_angle: f64,
    /// Half-width of the no-go zone
    pub min_sailing_angle: f64,
    /// Sail trim change per second at full trim intent
    pub trim_rate_deg_s: f64,
    /// World units travelled per speed unit per second
    pub world_scale: f64,
    pub collision_radius: f64,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            turn_rate_deg_s: 150.0,
            min_turn_effectiveness: 0.15,
            full_turn_speed_fraction: 0.7,
            accel_factor: 0.35,
            drag_coefficient: 0.01,
            drag_exponent: 1.8,
            sandbar_drag_multiplier: 25.0,
            no_power_decel: 0.75,
            max_speed: 5.5,
            max_sail_angle: 85.0,
            min_sailing_angle: 45.0,
            trim_rate_deg_s: 60.0,
            world_scale: 40.0,
            collision_radius: 18.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CourseConfig {
    /// Half-extent of the playable square
    pub world_bounds: f64,
    pub buoy_count: usize,
    pub sandbar_count: usize,
    pub min_object_separation: f64,
    /// Buoy-to-buoy spacing = min_object_separation × this
    pub buoy_separation_factor: f64,
    pub buoy_radius: f64,
    pub sandbar_min_size: f64,
    pub sandbar_max_size: f64,
    pub sandbar_min_vertices: usize,
    pub sandbar_max_vertices: usize,
    pub sandbar_radius_variation: f64,
    /// Sandbars are sampled within ± world_bounds × this
    pub sandbar_area_fraction: f64,
    /// Extra clearance between neighbouring sandbars
    pub sandbar_margin: f64,
    /// Start/finish gate buoys
    pub start_line: [[f64; 2]; 2],
    /// Buoy exclusion half-width perpendicular to the start line
    pub line_exclusion_across: f64,
    /// Buoy exclusion overhang beyond each gate along the line
    pub line_exclusion_along: f64,
    /// Sandbar exclusion half-width beyond the sandbar's own half-size
    pub sandbar_line_clearance: f64,
    /// Fallback buoy is sampled within ± world_bounds × this
    pub fallback_area_fraction: f64,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            world_bounds: 2000.0,
            buoy_count: 3,
            sandbar_count: 15,
            min_object_separation: 150.0,
            buoy_separation_factor: 1.5,
            buoy_radius: 15.0,
            sandbar_min_size: 60.0,
            sandbar_max_size: 200.0,
            sandbar_min_vertices: 7,
            sandbar_max_vertices: 12,
            sandbar_radius_variation: 0.4,
            sandbar_area_fraction: 0.85,
            sandbar_margin: 20.0,
            start_line: [[-100.0, -150.0], [-100.0, 150.0]],
            line_exclusion_across: 150.0,
            line_exclusion_along: 50.0,
            sandbar_line_clearance: 50.0,
            fallback_area_fraction: 0.7,
        }
    }
}

impl CourseConfig {
    pub fn start_line(&self) -> (Vec2, Vec2) {
        (Vec2::from(self.start_line[0]), Vec2::from(self.start_line[1]))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub rounding_radius: f64,
    pub crossing_debounce_s: f64,
    /// Orientation values below this are treated as collinear
    pub crossing_epsilon: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { rounding_radius: 40.0, crossing_debounce_s: 1.0, crossing_epsilon: 1e-6 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Time chasing the same mark before a forced bear-away
    pub stuck_timeout_s: f64,
    pub in_irons_speed: f64,
    pub in_irons_effectiveness: f64,
    /// Added to min_sailing_angle when testing "head to wind"
    pub in_irons_angle_margin: f64,
    /// Rudder magnitude for recovery manoeuvres
    pub recovery_rudder: f64,
    /// Boats beyond world_bounds × this steer home
    pub recovery_radius_factor: f64,
    /// Remaining countdown below which boats leave staging for the line
    pub staging_handoff_s: f64,
    pub heading_deadband: f64,
    pub trim_deadband: f64,
    pub wind_perception_noise: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            stuck_timeout_s: 15.0,
            in_irons_speed: 1.5,
            in_irons_effectiveness: 0.1,
            in_irons_angle_margin: 5.0,
            recovery_rudder: 1.5,
            recovery_radius_factor: 1.5,
            staging_handoff_s: 5.0,
            heading_deadband: 3.0,
            trim_deadband: 2.0,
            wind_perception_noise: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points by finishing position; positions past the end score 0
    pub points: Vec<u32>,
    /// Race time after which unfinished boats are scored with penalty times
    pub results_timeout_s: Option<f64>,
    pub penalty_seconds_per_unit: f64,
    pub collision_speed_factor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points: vec![10, 6, 3, 1],
            results_timeout_s: Some(600.0),
            penalty_seconds_per_unit: 0.05,
            collision_speed_factor: 0.95,
        }
    }
}

// ── Full config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub race: RaceConfig,
    pub wind: WindConfig,
    pub boat: BoatConfig,
    pub course: CourseConfig,
    pub progress: ProgressConfig,
    pub ai: AiConfig,
    pub scoring: ScoringConfig,
}

impl SimConfig {
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.race.total_laps == 0 {
            return Err(ConfigError::NoLaps);
        }
        if self.race.total_races == 0 {
            return Err(ConfigError::NoRaces);
        }
        if self.race.human_boats + self.race.ai_styles.len() == 0 {
            return Err(ConfigError::NoBoats);
        }
        if self.scoring.points.is_empty() {
            return Err(ConfigError::EmptyPointsTable);
        }
        if !(self.race.max_tick_s > 0.0) {
            return Err(ConfigError::TickClamp(self.race.max_tick_s));
        }
        non_negative("race.staging_seconds", self.race.staging_seconds)?;

        let w = &self.wind;
        non_negative("wind.min_speed", w.min_speed)?;
        if !(w.min_speed <= w.max_speed) {
            return Err(ConfigError::WindBounds { min: w.min_speed, max: w.max_speed });
        }
        non_negative("wind.speed_change_rate", w.speed_change_rate)?;
        non_negative("wind.direction_change_rate", w.direction_change_rate)?;
        non_negative("wind.update_interval_s", w.update_interval_s)?;

        let bt = &self.boat;
        positive("boat.max_speed", bt.max_speed)?;
        positive("boat.max_sail_angle", bt.max_sail_angle)?;
        non_negative("boat.min_sailing_angle", bt.min_sailing_angle)?;
        non_negative("boat.trim_rate_deg_s", bt.trim_rate_deg_s)?;
        non_negative("boat.collision_radius", bt.collision_radius)?;

        let c = &self.course;
        positive("course.world_bounds", c.world_bounds)?;
        non_negative("course.min_object_separation", c.min_object_separation)?;
        non_negative("course.buoy_separation_factor", c.buoy_separation_factor)?;
        non_negative("course.buoy_radius", c.buoy_radius)?;
        positive("course.sandbar_min_size", c.sandbar_min_size)?;
        if !(c.sandbar_min_size <= c.sandbar_max_size) {
            return Err(ConfigError::SandbarSize { min: c.sandbar_min_size, max: c.sandbar_max_size });
        }
        if !(0.0..1.0).contains(&c.sandbar_radius_variation) {
            return Err(ConfigError::RadiusVariation(c.sandbar_radius_variation));
        }
        fraction("course.sandbar_area_fraction", c.sandbar_area_fraction)?;
        fraction("course.fallback_area_fraction", c.fallback_area_fraction)?;
        non_negative("course.sandbar_margin", c.sandbar_margin)?;
        non_negative("course.line_exclusion_across", c.line_exclusion_across)?;
        non_negative("course.line_exclusion_along", c.line_exclusion_along)?;
        non_negative("course.sandbar_line_clearance", c.sandbar_line_clearance)?;
        if c.sandbar_min_vertices < 3 || c.sandbar_min_vertices > c.sandbar_max_vertices {
            return Err(ConfigError::SandbarVertices {
                min: c.sandbar_min_vertices,
                max: c.sandbar_max_vertices,
            });
        }
        let (a, b) = c.start_line();
        if a.dist_sq(&b) == 0.0 {
            return Err(ConfigError::DegenerateStartLine);
        }

        non_negative("progress.rounding_radius", self.progress.rounding_radius)?;
        non_negative("progress.crossing_debounce_s", self.progress.crossing_debounce_s)?;
        non_negative("ai.wind_perception_noise", self.ai.wind_perception_noise)?;

        let sc = &self.scoring;
        if let Some(limit) = sc.results_timeout_s {
            positive("scoring.results_timeout_s", limit)?;
        }
        non_negative("scoring.penalty_seconds_per_unit", sc.penalty_seconds_per_unit)?;
        fraction("scoring.collision_speed_factor", sc.collision_speed_factor)?;
        Ok(())
    }

    pub fn boat_count(&self) -> usize {
        self.race.human_boats + self.race.ai_styles.len()
    }
}
