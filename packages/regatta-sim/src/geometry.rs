//! geometry.rs — Angle helpers and the start-line frame
//!
//! All headings are degrees. `angle_difference` is the workhorse: every
//! point-of-sail, tack and trim decision is phrased in terms of it.

use regatta_types::Vec2;

/// Wrap any angle into [0, 360)
pub fn normalize_angle(deg: f64) -> f64 {
    let a = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Signed difference a − b wrapped into [−180, 180)
pub fn angle_difference(a: f64, b: f64) -> f64 {
    (a - b + 180.0).rem_euclid(360.0) - 180.0
}

/// Orientation of the ordered triplet (p, q, r)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Vec2, q: Vec2, r: Vec2, epsilon: f64) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val.abs() < epsilon {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// True when movement segment p1→p2 crosses segment a→b.
/// Orientation values within `epsilon` of zero classify as collinear, so a boat
/// sliding along the line or a zero-length move never registers.
pub fn segments_cross(p1: Vec2, p2: Vec2, a: Vec2, b: Vec2, epsilon: f64) -> bool {
    let o1 = orientation(a, b, p1, epsilon);
    let o2 = orientation(a, b, p2, epsilon);
    let o3 = orientation(p1, p2, a, epsilon);
    let o4 = orientation(p1, p2, b, epsilon);
    o1 != o2 && o3 != o4
}

// ── Start-line frame ──────────────────────────────────────────────────────────

/// The start/finish line between its two gate buoys
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFrame {
    pub a: Vec2,
    pub b: Vec2,
}

impl LineFrame {
    pub fn new(a: Vec2, b: Vec2) -> Self { Self { a, b } }

    pub fn length(&self) -> f64 { self.a.dist(&self.b) }

    pub fn midpoint(&self) -> Vec2 { self.a.midpoint(&self.b) }

    /// Unit vector along the line (a → b)
    pub fn unit(&self) -> Vec2 {
        let d = self.b.sub(&self.a);
        let len = d.length();
        if len == 0.0 { Vec2::new(1.0, 0.0) } else { d.scale(1.0 / len) }
    }

    /// Unit normal (90° rotation of `unit`)
    pub fn normal(&self) -> Vec2 {
        let u = self.unit();
        Vec2::new(-u.y, u.x)
    }

    /// (along, across): along measured from `a`, across signed along the normal
    pub fn to_line_frame(&self, p: Vec2) -> (f64, f64) {
        let rel = p.sub(&self.a);
        (rel.dot(&self.unit()), rel.dot(&self.normal()))
    }

    /// Inside the rectangle |across| < half_across, −overhang < along < length + overhang
    pub fn in_band(&self, p: Vec2, half_across: f64, overhang: f64) -> bool {
        let (along, across) = self.to_line_frame(p);
        across.abs() < half_across && along > -overhang && along < self.length() + overhang
    }
}

// ── Axis-aligned boxes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box around a circle
    pub fn around(center: Vec2, radius: f64) -> Self {
        Self {
            min: Vec2::new(center.x - radius, center.y - radius),
            max: Vec2::new(center.x + radius, center.y + radius),
        }
    }

    /// Tight box around a point set; a degenerate box at `fallback` when empty
    pub fn from_points(points: &[Vec2], fallback: Vec2) -> Self {
        if points.is_empty() {
            return Self { min: fallback, max: fallback };
        }
        let mut min = Vec2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { min, max }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// MM:SS.hh, or `--:--.--` for negative / non-finite values
pub fn format_time(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "--:--.--".to_string();
    }
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let hunds = ((seconds * 100.0) % 100.0).floor() as u64;
    format!("{mins:02}:{secs:02}.{hunds:02}")
}
