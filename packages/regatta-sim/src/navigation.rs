//! navigation.rs — Autopilot skippers for non-human boats
//!
//! One algorithm, four personalities. Each tick the autopilot:
//!   1. Checks for in-irons (slow, powerless, head to wind) and forces the sail out
//!   2. Checks the stuck-at-mark timer; a hard bear-away ends the tick early
//!   3. Picks a target (recovery → staging → next mark → finish line)
//!   4. Decides between sailing direct and tacking
//!   5. Steers with a deadband (gybing round when too slow to tack) and trims
//!      towards the optimal angle
//!
//! Once its race is over a boat heads up into the wind and stops.
//!
//! It only ever writes a `Helm`. Physics applies it like any human input.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use regatta_types::{RaceStatus, SailingStyle, Vec2};
use tracing::debug;

use crate::boat::{Boat, Helm, TrimIntent};
use crate::config::{AiConfig, BoatConfig};
use crate::course::Course;
use crate::geometry::{angle_difference, normalize_angle};
use crate::propulsion::optimal_trim;

/// Distance across the line a boat aims for when it still has to start
const START_PASS_DISTANCE: f64 = 60.0;
const START_PASS_SPREAD: f64 = 20.0;
/// Staging point relative to where the boat was when the countdown first ran
const STAGING_SETBACK: f64 = 100.0;
const STAGING_SPREAD: f64 = 50.0;
const TARGET_OFFSET: f64 = 10.0;
/// Extra angle beyond the no-go edge when tacking
const TACK_MARGIN: (f64, f64) = (5.0, 20.0);
const TACK_JITTER: f64 = 3.0;

// ── Style profiles ────────────────────────────────────────────────────────────

/// Distributions a style draws its parameters from, plus its fixed traits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleProfile {
    pub turn_rate: (f64, f64),
    /// Symmetric ± bound
    pub trim_error: f64,
    /// Symmetric ± bound
    pub heading_error: f64,
    pub tack_anticipation: (f64, f64),
    /// Scales the random jitter applied to every target
    pub offset_factor: f64,
    /// Heading bias when sailing direct
    pub overshoot: Option<(f64, f64)>,
    /// Fraction of the boat's trim rate used when trimming
    pub trim_rate_factor: f64,
}

pub fn profile(style: SailingStyle) -> StyleProfile {
    match style {
        SailingStyle::Perfectionist => StyleProfile {
            turn_rate: (1.0, 1.1),
            trim_error: 2.0,
            heading_error: 1.0,
            tack_anticipation: (10.0, 15.0),
            offset_factor: 1.0,
            overshoot: None,
            trim_rate_factor: 0.3,
        },
        SailingStyle::Aggressive => StyleProfile {
            turn_rate: (0.9, 1.15),
            trim_error: 5.0,
            heading_error: 3.0,
            tack_anticipation: (5.0, 10.0),
            offset_factor: 1.0,
            overshoot: Some((-2.0, 5.0)),
            trim_rate_factor: 0.3,
        },
        SailingStyle::Cautious => StyleProfile {
            turn_rate: (0.85, 1.0),
            trim_error: 8.0,
            heading_error: 5.0,
            tack_anticipation: (12.0, 18.0),
            offset_factor: 1.5,
            overshoot: None,
            trim_rate_factor: 0.1,
        },
        SailingStyle::Erratic => StyleProfile {
            turn_rate: (0.8, 1.2),
            trim_error: 10.0,
            heading_error: 7.0,
            tack_anticipation: (5.0, 15.0),
            offset_factor: 2.0,
            overshoot: Some((-10.0, 10.0)),
            trim_rate_factor: 0.3,
        },
    }
}

/// Drawn once when the boat is created, never changed afterwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParams {
    pub turn_rate_modifier: f64,
    pub sail_trim_error: f64,
    pub heading_error: f64,
    pub tack_anticipation: f64,
}

impl StyleParams {
    pub fn sample(style: SailingStyle, rng: &mut impl Rng) -> Self {
        let p = profile(style);
        Self {
            turn_rate_modifier: Uniform::new_inclusive(p.turn_rate.0, p.turn_rate.1).sample(rng),
            sail_trim_error: Uniform::new_inclusive(-p.trim_error, p.trim_error).sample(rng),
            heading_error: Uniform::new_inclusive(-p.heading_error, p.heading_error).sample(rng),
            tack_anticipation: Uniform::new_inclusive(p.tack_anticipation.0, p.tack_anticipation.1)
                .sample(rng),
        }
    }
}

// ── Tick context ──────────────────────────────────────────────────────────────

/// Read-only world state an autopilot decides from
#[derive(Debug, Clone, Copy)]
pub struct NavContext<'a> {
    pub wind_direction: f64,
    pub course: &'a Course,
    /// Remaining pre-start countdown; None once the race is running
    pub countdown: Option<f64>,
    pub dt: f64,
    pub boat: &'a BoatConfig,
    pub ai: &'a AiConfig,
    pub world_bounds: f64,
}

// ── Autopilot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Autopilot {
    style: SailingStyle,
    params: StyleParams,
    profile: StyleProfile,
    /// Time spent chasing the same mark index
    time_on_mark: f64,
    last_mark: i32,
    staging_point: Option<Vec2>,
}

impl Autopilot {
    pub fn new(style: SailingStyle, rng: &mut impl Rng) -> Self {
        Self::with_params(style, StyleParams::sample(style, rng))
    }

    pub fn with_params(style: SailingStyle, params: StyleParams) -> Self {
        Self {
            style,
            params,
            profile: profile(style),
            time_on_mark: 0.0,
            last_mark: -1,
            staging_point: None,
        }
    }

    pub fn style(&self) -> SailingStyle { self.style }
    pub fn params(&self) -> &StyleParams { &self.params }
    pub fn time_on_mark(&self) -> f64 { self.time_on_mark }
    pub fn staging_point(&self) -> Option<Vec2> { self.staging_point }

    /// Per-race state only; style parameters survive
    pub fn reset(&mut self) {
        self.time_on_mark = 0.0;
        self.last_mark = -1;
        self.staging_point = None;
    }

    /// Decide this tick's helm. `None` leaves the boat's helm untouched.
    pub fn steer(&mut self, boat: &Boat, ctx: &NavContext, rng: &mut impl Rng) -> Option<Helm> {
        if boat.progress.is_finished() {
            return Some(self.heave_to(boat, ctx));
        }
        let ai = ctx.ai;
        let max_sail = ctx.boat.max_sail_angle;
        let mut helm = Helm::default();
        let mut sail = boat.sail_angle;

        let apparent = angle_difference(ctx.wind_direction, boat.heading);
        let bear_away = if apparent > 0.0 { -ai.recovery_rudder } else { ai.recovery_rudder };
        let in_irons = boat.speed < ai.in_irons_speed
            && boat.wind_effectiveness < ai.in_irons_effectiveness
            && apparent.abs() < ctx.boat.min_sailing_angle + ai.in_irons_angle_margin;
        if in_irons {
            sail = max_sail;
            helm.trim = TrimIntent::Set(max_sail);
            helm.rudder = bear_away;
            debug!("{} in irons, bearing away", boat.name);
        }

        if ctx.countdown.is_none() {
            if boat.progress.next_buoy_index != self.last_mark {
                self.time_on_mark = 0.0;
                self.last_mark = boat.progress.next_buoy_index;
            } else {
                self.time_on_mark += ctx.dt;
            }
            if self.time_on_mark > ai.stuck_timeout_s {
                debug!("{} stuck on mark {}, forcing a turn", boat.name, self.last_mark);
                helm.rudder = bear_away;
                self.time_on_mark = 0.0;
                return Some(helm);
            }
        }

        let Some(target) = self.choose_target(boat, ctx, rng) else {
            return Some(helm);
        };

        let noise = ai.wind_perception_noise;
        let perceived_wind = if noise > 0.0 {
            normalize_angle(ctx.wind_direction + rng.gen_range(-noise..=noise))
        } else {
            ctx.wind_direction
        };

        let desired = self.desired_heading(boat.pos, target, perceived_wind, ctx.boat, rng);
        let desired = normalize_angle(desired + self.params.heading_error);
        let heading_error = angle_difference(desired, boat.heading);
        if !in_irons {
            helm.rudder = if heading_error.abs() > ai.heading_deadband {
                self.turn_direction(heading_error, apparent, boat.speed < ai.in_irons_speed)
                    * self.params.turn_rate_modifier
            } else {
                0.0
            };
        }

        // Trim towards optimal plus the style's persistent error
        let apparent_perceived = angle_difference(perceived_wind, boat.heading);
        let target_trim = optimal_trim(apparent_perceived, ctx.boat) + self.params.sail_trim_error;
        let trim_error = angle_difference(target_trim, sail);
        if trim_error.abs() > ai.trim_deadband {
            let rate = self.profile.trim_rate_factor * ctx.boat.trim_rate_deg_s;
            sail = (sail + trim_error.signum() * rate * ctx.dt).clamp(-max_sail, max_sail);
            helm.trim = TrimIntent::Set(sail);
        }

        Some(helm)
    }

    /// Done racing: point into the wind with the sail centred and coast to a
    /// stop inside the no-go zone, out of the way of boats still racing
    fn heave_to(&self, boat: &Boat, ctx: &NavContext) -> Helm {
        let to_wind = angle_difference(ctx.wind_direction, boat.heading);
        let rudder = if to_wind.abs() > ctx.ai.heading_deadband {
            to_wind.signum() * self.params.turn_rate_modifier
        } else {
            0.0
        };
        Helm { rudder, trim: TrimIntent::Set(0.0) }
    }

    /// Sign of the rudder needed to close `heading_error`. Too slow to tack,
    /// a boat whose short way round passes through the wind goes the long way.
    fn turn_direction(&self, heading_error: f64, apparent: f64, slow: bool) -> f64 {
        let short_way = heading_error.signum();
        let through_wind = apparent.signum() == short_way && apparent.abs() < heading_error.abs();
        if slow && through_wind { -short_way } else { short_way }
    }

    /// Where to sail this tick, with the style's jitter applied
    pub fn choose_target(&mut self, boat: &Boat, ctx: &NavContext, rng: &mut impl Rng) -> Option<Vec2> {
        let line = &ctx.course.line;
        let mid = line.midpoint();

        if let Some(remaining) = ctx.countdown {
            let staging = *self.staging_point.get_or_insert_with(|| {
                Vec2::new(
                    boat.pos.x - STAGING_SETBACK,
                    boat.pos.y + rng.gen_range(-STAGING_SPREAD..=STAGING_SPREAD),
                )
            });
            return Some(if remaining > ctx.ai.staging_handoff_s { staging } else { mid });
        }

        let recovery_radius = ctx.world_bounds * ctx.ai.recovery_radius_factor;
        if boat.pos.length_sq() > recovery_radius * recovery_radius {
            return Some(Vec2::ZERO);
        }

        let base = match boat.progress.status {
            RaceStatus::NotStarted => {
                // a point just across the line from wherever the boat is
                let (_, across) = line.to_line_frame(boat.pos);
                let side = if across >= 0.0 { -1.0 } else { 1.0 };
                let along = rng.gen_range(-START_PASS_SPREAD..=START_PASS_SPREAD);
                mid.add(&line.normal().scale(side * START_PASS_DISTANCE))
                    .add(&line.unit().scale(along))
            }
            RaceStatus::Racing => match boat.progress.next_mark(ctx.course) {
                Some(idx) => ctx.course.buoys[idx],
                None => mid,
            },
            RaceStatus::Finished => return None,
        };
        let spread = TARGET_OFFSET * self.profile.offset_factor;
        Some(Vec2::new(
            base.x + rng.gen_range(-spread..=spread),
            base.y + rng.gen_range(-spread..=spread),
        ))
    }

    /// Direct heading when the target can be fetched, otherwise the better tack
    pub fn desired_heading(
        &self,
        pos: Vec2,
        target: Vec2,
        wind_direction: f64,
        cfg: &BoatConfig,
        rng: &mut impl Rng,
    ) -> f64 {
        let direct = target.sub(&pos).heading_deg();
        let off_wind = angle_difference(direct, wind_direction).abs();

        if off_wind < cfg.min_sailing_angle + self.params.tack_anticipation {
            let tack_angle = cfg.min_sailing_angle + rng.gen_range(TACK_MARGIN.0..=TACK_MARGIN.1);
            let port = normalize_angle(wind_direction + tack_angle);
            let starboard = normalize_angle(wind_direction - tack_angle);
            let chosen = if angle_difference(port, direct).abs() < angle_difference(starboard, direct).abs() {
                port
            } else {
                starboard
            };
            return normalize_angle(chosen + rng.gen_range(-TACK_JITTER..=TACK_JITTER));
        }

        let overshoot = match self.profile.overshoot {
            Some((lo, hi)) => rng.gen_range(lo..=hi),
            None => 0.0,
        };
        normalize_angle(direct + overshoot)
    }
}
