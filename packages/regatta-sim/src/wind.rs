//! wind.rs — Bounded random-walk wind field
//!
//! Speed and direction drift by at most `rate × elapsed` per step. Steps are
//! throttled: elapsed time accumulates until `update_interval_s` has passed,
//! then one step covering the whole interval is taken.

use rand::Rng;
use regatta_types::WindTelemetry;
use tracing::debug;

use crate::config::WindConfig;
use crate::geometry::normalize_angle;

#[derive(Debug, Clone)]
pub struct WindField {
    speed: f64,
    /// Degrees, [0, 360)
    direction: f64,
    /// Time accumulated since the last walk step
    since_update: f64,
    cfg: WindConfig,
}

impl WindField {
    /// Uniformly random speed within bounds and random direction
    pub fn new(cfg: &WindConfig, rng: &mut impl Rng) -> Self {
        let speed = if cfg.max_speed > cfg.min_speed {
            rng.gen_range(cfg.min_speed..=cfg.max_speed)
        } else {
            cfg.min_speed
        };
        Self {
            speed,
            direction: normalize_angle(rng.gen_range(0.0..360.0)),
            since_update: 0.0,
            cfg: cfg.clone(),
        }
    }

    /// Fixed initial state (still clamped into bounds)
    pub fn with_state(cfg: &WindConfig, speed: f64, direction: f64) -> Self {
        Self {
            speed: speed.clamp(cfg.min_speed, cfg.max_speed),
            direction: normalize_angle(direction),
            since_update: 0.0,
            cfg: cfg.clone(),
        }
    }

    pub fn speed(&self) -> f64 { self.speed }
    pub fn direction(&self) -> f64 { self.direction }

    pub fn telemetry(&self) -> WindTelemetry {
        WindTelemetry { speed: self.speed, direction: self.direction }
    }

    /// Advance the walk by dt seconds
    pub fn update(&mut self, dt: f64, rng: &mut impl Rng) {
        if dt <= 0.0 {
            return;
        }
        self.since_update += dt;
        if self.since_update < self.cfg.update_interval_s {
            return;
        }
        let elapsed = self.since_update;
        self.since_update = 0.0;

        let speed_step = self.cfg.speed_change_rate * elapsed;
        if speed_step > 0.0 {
            self.speed += rng.gen_range(-speed_step..=speed_step);
        }
        self.speed = self.speed.clamp(self.cfg.min_speed, self.cfg.max_speed);

        let dir_step = self.cfg.direction_change_rate * elapsed;
        if dir_step > 0.0 {
            self.direction += rng.gen_range(-dir_step..=dir_step);
        }
        self.direction = normalize_angle(self.direction);
    }

    /// Jump to a uniformly random direction right now
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        self.direction = normalize_angle(rng.gen_range(0.0..360.0));
        self.since_update = 0.0;
        debug!("Wind direction randomized to {:.1}°", self.direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn stays_in_bounds_over_long_walk() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let cfg = WindConfig { speed_change_rate: 2.0, direction_change_rate: 90.0, ..Default::default() };
        let mut wind = WindField::new(&cfg, &mut rng);
        for i in 0..20_000 {
            wind.update(if i % 3 == 0 { 0.1 } else { 0.9 }, &mut rng);
            assert!(wind.speed() >= cfg.min_speed && wind.speed() <= cfg.max_speed);
            assert!(wind.direction() >= 0.0 && wind.direction() < 360.0);
        }
    }

    #[test]
    fn step_is_bounded_by_elapsed_time() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let cfg = WindConfig::default();
        let mut wind = WindField::with_state(&cfg, 2.5, 180.0);
        // below the throttle interval nothing moves
        wind.update(0.5, &mut rng);
        assert_eq!(wind.speed(), 2.5);
        assert_eq!(wind.direction(), 180.0);
        // 0.5 + 0.75 = 1.25s accumulated → one step
        wind.update(0.75, &mut rng);
        assert!((wind.speed() - 2.5).abs() <= cfg.speed_change_rate * 1.25 + 1e-12);
        assert!((wind.direction() - 180.0).abs() <= cfg.direction_change_rate * 1.25 + 1e-12);
    }

    #[test]
    fn zero_dt_is_a_no_op() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut wind = WindField::with_state(&WindConfig::default(), 3.0, 10.0);
        for _ in 0..100 {
            wind.update(0.0, &mut rng);
        }
        assert_eq!(wind.speed(), 3.0);
        assert_eq!(wind.direction(), 10.0);
    }

    #[test]
    fn randomize_changes_direction_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut wind = WindField::with_state(&WindConfig::default(), 3.0, 10.0);
        wind.randomize(&mut rng);
        assert_eq!(wind.speed(), 3.0);
        assert!(wind.direction() >= 0.0 && wind.direction() < 360.0);
    }
}
