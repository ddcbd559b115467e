//! propulsion.rs — Wind-driven boat physics, one step per tick
//!
//! Stylised, playable sailing model:
//! - Rudder authority grows with speed (floor at rest, full at 70% of max speed)
//! - No drive at all inside the no-go zone; this is the only discontinuity
//! - Outside it, drive = trim effectiveness × point-of-sail effectiveness
//! - Drag ∝ speed^1.8 gives a soft top speed; sandbars multiply drag
//!
//! Identical for every boat. Only the origin of the `Helm` differs.

use crate::boat::{Boat, TrimIntent};
use crate::config::BoatConfig;
use crate::geometry::{angle_difference, normalize_angle};
use regatta_types::Vec2;

/// Drive below this counts as "no power" for coasting decay
const MIN_DRIVE: f64 = 0.01;
/// Point-of-sail effectiveness never drops below this outside the no-go zone
const MIN_POINT_OF_SAIL: f64 = 0.1;

/// Sail state for a given apparent wind angle and trim
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SailForces {
    pub optimal_trim: f64,
    /// 0.0–1.0
    pub effectiveness: f64,
}

/// Fraction of full rudder authority available at `speed`
pub fn turn_effectiveness(speed: f64, cfg: &BoatConfig) -> f64 {
    let full_at = cfg.max_speed * cfg.full_turn_speed_fraction;
    let ratio = if full_at > 0.0 { (speed / full_at).clamp(0.0, 1.0) } else { 1.0 };
    cfg.min_turn_effectiveness + (1.0 - cfg.min_turn_effectiveness) * ratio
}

/// Trim that best uses a wind at `apparent` degrees off the bow, clamped to the sail range
pub fn optimal_trim(apparent: f64, cfg: &BoatConfig) -> f64 {
    angle_difference(apparent + 180.0, 90.0).clamp(-cfg.max_sail_angle, cfg.max_sail_angle)
}

/// `apparent` is the signed wind angle relative to the heading (wind − heading)
pub fn sail_forces(apparent: f64, sail_angle: f64, cfg: &BoatConfig) -> SailForces {
    let abs_apparent = apparent.abs();
    if abs_apparent <= cfg.min_sailing_angle {
        return SailForces { optimal_trim: 0.0, effectiveness: 0.0 };
    }
    let optimal = optimal_trim(apparent, cfg);
    let trim_diff = angle_difference(sail_angle, optimal);
    let trim_eff = trim_diff.to_radians().cos().max(0.0).powi(2);
    let reach_offset = (abs_apparent - 90.0).abs();
    let point_of_sail = reach_offset.to_radians().cos().max(MIN_POINT_OF_SAIL);
    SailForces {
        optimal_trim: optimal,
        effectiveness: (trim_eff * point_of_sail).max(0.0),
    }
}

/// Angle the wind would blow the boom out to, clamped to the sail range
fn natural_sail_angle(apparent: f64, cfg: &BoatConfig) -> f64 {
    angle_difference(180.0, apparent).clamp(-cfg.max_sail_angle, cfg.max_sail_angle)
}

/// Advance one boat by dt seconds under the given wind.
/// Consumes the boat's helm intent.
pub fn step(boat: &mut Boat, wind_speed: f64, wind_direction: f64, dt: f64, cfg: &BoatConfig) {
    boat.prev_pos = boat.pos;

    // Sail trim
    boat.sail_angle = match boat.helm.trim {
        TrimIntent::Hold => boat.sail_angle,
        TrimIntent::Adjust(rate) => boat.sail_angle + rate * cfg.trim_rate_deg_s * dt,
        TrimIntent::Set(angle) => angle,
    }
    .clamp(-cfg.max_sail_angle, cfg.max_sail_angle);

    // Rudder
    let turn = boat.helm.rudder * cfg.turn_rate_deg_s * turn_effectiveness(boat.speed, cfg) * dt;
    boat.heading = normalize_angle(boat.heading + turn);
    boat.helm = Default::default();

    // Visual sail: the boom cannot be sheeted past where the wind holds it
    let apparent = angle_difference(wind_direction, boat.heading);
    let natural = natural_sail_angle(apparent, cfg);
    boat.visual_sail_angle = if natural < 0.0 {
        natural.max(boat.sail_angle)
    } else {
        natural.min(boat.sail_angle)
    };

    // Drive
    let forces = sail_forces(apparent, boat.sail_angle, cfg);
    boat.optimal_trim = forces.optimal_trim;
    boat.wind_effectiveness = forces.effectiveness;
    let drive = (wind_speed * cfg.accel_factor * forces.effectiveness).max(0.0);

    // Drag
    boat.speed += drive * dt;
    let mut drag_factor = cfg.drag_coefficient;
    if boat.on_obstacle {
        drag_factor *= cfg.sandbar_drag_multiplier;
    }
    boat.speed -= boat.speed.max(0.0).powf(cfg.drag_exponent) * drag_factor * dt;
    if drive < MIN_DRIVE && boat.speed > 0.0 {
        boat.speed -= cfg.no_power_decel * dt;
    }
    boat.speed = boat.speed.clamp(0.0, cfg.max_speed);

    // Position
    let travel = boat.speed * dt * cfg.world_scale;
    boat.pos = boat.pos.add(&Vec2::from_heading(boat.heading).scale(travel));
}
