//! course.rs — Procedural course: marks, start/finish gate, sandbars
//!
//! Generation is rejection sampling against a shared RNG stream:
//!   1. Marks, one per shuffled zone, clear of the start line and each other
//!   2. Sandbars across the central area, clear of the line, the marks and each other
//!
//! Shortfalls are logged and tolerated. A race always gets at least one mark.

use std::f64::consts::TAU;

use rand::seq::SliceRandom;
use rand::Rng;
use regatta_types::{CourseTelemetry, SandbarTelemetry, Vec2};
use tracing::{info, warn};

use crate::config::CourseConfig;
use crate::geometry::{Aabb, LineFrame};

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Sandbar {
    pub center: Vec2,
    /// Nominal diameter
    pub size: f64,
    /// Outline in world coordinates
    pub polygon: Vec<Vec2>,
    pub bbox: Aabb,
}

impl Sandbar {
    /// Irregular polygon of `vertices` points around `center`
    pub fn generate(
        center: Vec2,
        size: f64,
        vertices: usize,
        radius_variation: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let n = vertices.max(3);
        let avg_radius = size / 2.0;
        let jitter = 0.5 / n as f64;
        let polygon: Vec<Vec2> = (0..n)
            .map(|i| {
                let radius = avg_radius * rng.gen_range(1.0 - radius_variation..=1.0 + radius_variation);
                let angle = (i as f64 / n as f64 + rng.gen_range(-jitter..=jitter)) * TAU;
                center.add(&Vec2::new(angle.cos(), angle.sin()).scale(radius))
            })
            .collect();
        let bbox = Aabb::from_points(&polygon, center);
        Self { center, size, polygon, bbox }
    }

    pub fn telemetry(&self) -> SandbarTelemetry {
        SandbarTelemetry { center: self.center, size: self.size, polygon: self.polygon.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct Course {
    /// Marks to round, in order
    pub buoys: Vec<Vec2>,
    /// Start/finish line between the two gate buoys
    pub line: LineFrame,
    pub sandbars: Vec<Sandbar>,
}

impl Course {
    pub fn from_parts(buoys: Vec<Vec2>, line: LineFrame, sandbars: Vec<Sandbar>) -> Self {
        Self { buoys, line, sandbars }
    }

    /// Fresh random course for one race
    pub fn generate(cfg: &CourseConfig, rng: &mut impl Rng) -> Self {
        let (a, b) = cfg.start_line();
        let line = LineFrame::new(a, b);
        let buoys = generate_buoys(cfg, &line, rng);
        let sandbars = generate_sandbars(cfg, &line, &buoys, rng);
        info!("Course generated: {} marks, {} sandbars", buoys.len(), sandbars.len());
        Self { buoys, line, sandbars }
    }

    /// Line midpoint → every mark in order → line midpoint
    pub fn lap_length(&self) -> f64 {
        let mid = self.line.midpoint();
        let mut prev = mid;
        let mut total = 0.0;
        for mark in &self.buoys {
            total += prev.dist(mark);
            prev = *mark;
        }
        total + prev.dist(&mid)
    }

    /// True when a box overlaps any sandbar's bounding box
    pub fn hits_sandbar(&self, bbox: &Aabb) -> bool {
        self.sandbars.iter().any(|s| s.bbox.overlaps(bbox))
    }

    pub fn telemetry(&self) -> CourseTelemetry {
        CourseTelemetry {
            buoys: self.buoys.clone(),
            gates: [self.line.a, self.line.b],
            sandbars: self.sandbars.iter().map(Sandbar::telemetry).collect(),
        }
    }
}

// ── Marks ─────────────────────────────────────────────────────────────────────

/// Placement zones as fractions of world_bounds: (min_x, max_x, min_y, max_y)
const BASE_ZONES: [(f64, f64, f64, f64); 3] = [
    (0.25, 0.75, -0.75, -0.25),
    (-0.75, -0.25, -0.75, -0.25),
    (-0.5, 0.5, 0.25, 0.75),
];
const EXTRA_ZONES: [(f64, f64, f64, f64); 2] = [
    (-0.75, -0.25, 0.25, 0.75),
    (0.25, 0.75, 0.25, 0.75),
];
const BUOY_ATTEMPTS_PER_MARK: usize = 30;
const SANDBAR_ATTEMPTS_PER_BAR: usize = 20;
const FALLBACK_ATTEMPTS: usize = 50;

/// One mark per shuffled zone. Zones are filled in order; the pass stops when
/// the attempt budget or the zones run out.
pub fn generate_buoys(cfg: &CourseConfig, line: &LineFrame, rng: &mut impl Rng) -> Vec<Vec2> {
    let count = cfg.buoy_count;
    let bounds = cfg.world_bounds;
    let min_sep = cfg.min_object_separation * cfg.buoy_separation_factor;
    let min_sep_sq = min_sep * min_sep;

    let mut zones = BASE_ZONES.to_vec();
    if count > BASE_ZONES.len() {
        zones.extend_from_slice(&EXTRA_ZONES);
    }
    zones.shuffle(rng);

    let mut buoys: Vec<Vec2> = Vec::with_capacity(count);
    let max_attempts = count * BUOY_ATTEMPTS_PER_MARK;
    let mut attempts = 0;
    let mut zone = 0;

    while buoys.len() < count && attempts < max_attempts && zone < zones.len() {
        attempts += 1;
        let (x0, x1, y0, y1) = zones[zone];
        let candidate = Vec2::new(
            rng.gen_range(x0 * bounds..=x1 * bounds),
            rng.gen_range(y0 * bounds..=y1 * bounds),
        );
        if line.in_band(candidate, cfg.line_exclusion_across, cfg.line_exclusion_along) {
            continue;
        }
        let crowded = [line.a, line.b]
            .iter()
            .chain(buoys.iter())
            .any(|p| p.dist_sq(&candidate) < min_sep_sq);
        if crowded {
            continue;
        }
        buoys.push(candidate);
        zone += 1;
    }

    if buoys.len() < count {
        warn!("Could only place {}/{} marks after {} attempts", buoys.len(), count, attempts);
    }
    if buoys.is_empty() && count > 0 {
        let fallback = fallback_mark(cfg, line, rng);
        warn!("Adding fallback mark at ({:.0}, {:.0})", fallback.x, fallback.y);
        buoys.push(fallback);
    }
    buoys
}

/// A single mark anywhere in the central area, clear of the line band and the
/// gates when that is possible within the attempt budget. The last candidate
/// is used otherwise, so a race always has a mark.
pub fn fallback_mark(cfg: &CourseConfig, line: &LineFrame, rng: &mut impl Rng) -> Vec2 {
    let reach = cfg.world_bounds * cfg.fallback_area_fraction;
    let min_sep = cfg.min_object_separation * cfg.buoy_separation_factor;
    let mut candidate = Vec2::ZERO;
    for _ in 0..FALLBACK_ATTEMPTS {
        candidate = Vec2::new(rng.gen_range(-reach..=reach), rng.gen_range(-reach..=reach));
        let clear = !line.in_band(candidate, cfg.line_exclusion_across, cfg.line_exclusion_along)
            && [line.a, line.b].iter().all(|g| g.dist_sq(&candidate) >= min_sep * min_sep);
        if clear {
            return candidate;
        }
    }
    warn!("Fallback mark could not clear the start line after {FALLBACK_ATTEMPTS} attempts");
    candidate
}

// ── Sandbars ──────────────────────────────────────────────────────────────────

pub fn generate_sandbars(
    cfg: &CourseConfig,
    line: &LineFrame,
    buoys: &[Vec2],
    rng: &mut impl Rng,
) -> Vec<Sandbar> {
    let count = cfg.sandbar_count;
    let reach = cfg.world_bounds * cfg.sandbar_area_fraction;
    let mut sandbars: Vec<Sandbar> = Vec::with_capacity(count);
    let max_attempts = count * SANDBAR_ATTEMPTS_PER_BAR;
    let mut attempts = 0;

    while sandbars.len() < count && attempts < max_attempts {
        attempts += 1;
        let size = if cfg.sandbar_max_size > cfg.sandbar_min_size {
            rng.gen_range(cfg.sandbar_min_size..=cfg.sandbar_max_size)
        } else {
            cfg.sandbar_min_size
        };
        let half = size / 2.0;
        let center = Vec2::new(rng.gen_range(-reach..=reach), rng.gen_range(-reach..=reach));

        if line.in_band(center, half + cfg.sandbar_line_clearance, half) {
            continue;
        }
        let mark_clearance = half + cfg.buoy_radius + cfg.min_object_separation;
        if buoys.iter().any(|b| b.dist_sq(&center) < mark_clearance * mark_clearance) {
            continue;
        }
        let overlaps_bar = sandbars.iter().any(|s| {
            let clearance = half + s.size / 2.0 + cfg.sandbar_margin;
            s.center.dist_sq(&center) < clearance * clearance
        });
        if overlaps_bar {
            continue;
        }

        let vertices = rng.gen_range(cfg.sandbar_min_vertices..=cfg.sandbar_max_vertices);
        sandbars.push(Sandbar::generate(center, size, vertices, cfg.sandbar_radius_variation, rng));
    }

    if sandbars.len() < count {
        warn!("Could only place {}/{} sandbars after {} attempts", sandbars.len(), count, attempts);
    }
    sandbars
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn line(cfg: &CourseConfig) -> LineFrame {
        let (a, b) = cfg.start_line();
        LineFrame::new(a, b)
    }

    #[test]
    fn sandbar_polygon_stays_within_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let center = Vec2::new(300.0, -200.0);
        for n in 7..=12 {
            let s = Sandbar::generate(center, 100.0, n, 0.4, &mut rng);
            assert_eq!(s.polygon.len(), n);
            for p in &s.polygon {
                let r = p.dist(&center);
                assert!(r >= 30.0 - 1e-9 && r <= 70.0 + 1e-9);
                assert!(s.bbox.contains(*p));
            }
        }
    }

    #[test]
    fn marks_respect_line_and_spacing() {
        let cfg = CourseConfig::default();
        let l = line(&cfg);
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let buoys = generate_buoys(&cfg, &l, &mut rng);
            assert!(!buoys.is_empty());
            let min_sep = cfg.min_object_separation * cfg.buoy_separation_factor;
            for (i, a) in buoys.iter().enumerate() {
                assert!(!l.in_band(*a, cfg.line_exclusion_across, cfg.line_exclusion_along));
                for b in &buoys[i + 1..] {
                    assert!(a.dist(b) >= min_sep - 1e-9);
                }
            }
        }
    }

    #[test]
    fn sandbars_keep_clear_of_line_marks_and_each_other() {
        let cfg = CourseConfig::default();
        for seed in 0..30 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let course = Course::generate(&cfg, &mut rng);
            let reach = cfg.world_bounds * cfg.sandbar_area_fraction;
            for (i, s) in course.sandbars.iter().enumerate() {
                let half = s.size / 2.0;
                assert!(s.size >= cfg.sandbar_min_size && s.size <= cfg.sandbar_max_size);
                assert!(s.center.x.abs() <= reach && s.center.y.abs() <= reach);
                assert!((cfg.sandbar_min_vertices..=cfg.sandbar_max_vertices).contains(&s.polygon.len()));
                assert!(!course.line.in_band(s.center, half + cfg.sandbar_line_clearance, half));
                for mark in &course.buoys {
                    assert!(mark.dist(&s.center) >= half + cfg.buoy_radius + cfg.min_object_separation - 1e-9);
                }
                for other in &course.sandbars[i + 1..] {
                    let clearance = half + other.size / 2.0 + cfg.sandbar_margin;
                    assert!(other.center.dist(&s.center) >= clearance - 1e-9);
                }
            }
        }
    }

    #[test]
    fn hits_sandbar_uses_bounding_boxes() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let bar = Sandbar::generate(Vec2::new(500.0, 500.0), 100.0, 8, 0.4, &mut rng);
        let l = LineFrame::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 10.0));
        let course = Course::from_parts(vec![Vec2::new(300.0, 0.0)], l, vec![bar]);
        assert!(course.hits_sandbar(&Aabb::around(Vec2::new(500.0, 500.0), 18.0)));
        assert!(!course.hits_sandbar(&Aabb::around(Vec2::new(0.0, 0.0), 18.0)));
    }

    #[test]
    fn five_marks_use_the_extra_zones() {
        let cfg = CourseConfig { buoy_count: 5, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let buoys = generate_buoys(&cfg, &line(&cfg), &mut rng);
        assert_eq!(buoys.len(), 5);
    }

    #[test]
    fn impossible_request_falls_back_to_one_mark() {
        // every zone lies inside the exclusion band
        let cfg = CourseConfig {
            line_exclusion_across: 10_000.0,
            line_exclusion_along: 10_000.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let buoys = generate_buoys(&cfg, &line(&cfg), &mut rng);
        assert_eq!(buoys.len(), 1);
        let reach = cfg.world_bounds * cfg.fallback_area_fraction;
        assert!(buoys[0].x.abs() <= reach && buoys[0].y.abs() <= reach);
    }

    #[test]
    fn fallback_mark_keeps_clear_of_the_line() {
        // a long line whose band covers most of the fallback area
        let cfg = CourseConfig {
            start_line: [[0.0, -1400.0], [0.0, 1400.0]],
            line_exclusion_across: 900.0,
            ..Default::default()
        };
        let l = line(&cfg);
        let reach = cfg.world_bounds * cfg.fallback_area_fraction;
        let min_sep = cfg.min_object_separation * cfg.buoy_separation_factor;
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mark = fallback_mark(&cfg, &l, &mut rng);
            assert!(!l.in_band(mark, cfg.line_exclusion_across, cfg.line_exclusion_along));
            assert!(mark.x.abs() <= reach && mark.y.abs() <= reach);
            assert!(mark.dist(&l.a) >= min_sep - 1e-9 && mark.dist(&l.b) >= min_sep - 1e-9);
        }
    }

    #[test]
    fn zero_marks_requested_means_none() {
        let cfg = CourseConfig { buoy_count: 0, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(generate_buoys(&cfg, &line(&cfg), &mut rng).is_empty());
    }

    #[test]
    fn lap_length_of_a_known_course() {
        let l = LineFrame::new(Vec2::new(0.0, -10.0), Vec2::new(0.0, 10.0));
        let c = Course::from_parts(vec![Vec2::new(300.0, 0.0), Vec2::new(300.0, 400.0)], l, Vec::new());
        assert!((c.lap_length() - (300.0 + 400.0 + 500.0)).abs() < 1e-9);
    }
}
