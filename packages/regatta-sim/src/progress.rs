//! progress.rs — Per-boat race progress state machine
//!
//! NOT_STARTED ──line──▶ RACING ──line (all marks, final lap)──▶ FINISHED
//!                         │ ▲
//!                         └─┘ line (all marks, laps remain) / mark rounded
//!
//! Evaluated once per tick on the collision-corrected movement segment.
//! Marks are checked before the line, so a boat that rounds the last mark
//! and crosses in the same tick completes the lap.

use regatta_types::{RaceStatus, Vec2};

use crate::config::ProgressConfig;
use crate::course::Course;
use crate::geometry::segments_cross;

/// What happened to a boat during one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    Started,
    MarkRounded { index: usize },
    LapCompleted { lap: u32, lap_time: f64 },
    Finished { total_time: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaceProgress {
    pub status: RaceStatus,
    /// 1-based; the first lap begins at the start crossing
    pub current_lap: u32,
    /// Index into the course marks; -1 before the start
    pub next_buoy_index: i32,
    pub race_start: f64,
    pub lap_start: f64,
    pub finish_time: Option<f64>,
    pub lap_times: Vec<f64>,
    /// Time of the last accepted line crossing
    pub last_crossing: f64,
    pub forfeited: bool,
}

impl Default for RaceProgress {
    fn default() -> Self {
        Self {
            status: RaceStatus::NotStarted,
            current_lap: 1,
            next_buoy_index: -1,
            race_start: 0.0,
            lap_start: 0.0,
            finish_time: None,
            lap_times: Vec::new(),
            last_crossing: f64::NEG_INFINITY,
            forfeited: false,
        }
    }
}

impl RaceProgress {
    pub fn has_started(&self) -> bool { self.status != RaceStatus::NotStarted }
    pub fn is_finished(&self) -> bool { self.status == RaceStatus::Finished }

    /// The mark currently being sailed to, if any remain this lap
    pub fn next_mark(&self, course: &Course) -> Option<usize> {
        if self.status != RaceStatus::Racing || self.next_buoy_index < 0 {
            return None;
        }
        let idx = self.next_buoy_index as usize;
        (idx < course.buoys.len()).then_some(idx)
    }

    /// Withdraw from the current race; ranks last with an infinite time
    pub fn forfeit(&mut self) {
        self.status = RaceStatus::Finished;
        self.forfeited = true;
        self.finish_time = Some(f64::INFINITY);
    }

    /// Apply one tick of movement `prev → pos` at simulation time `now`
    pub fn evaluate(
        &mut self,
        prev: Vec2,
        pos: Vec2,
        now: f64,
        course: &Course,
        cfg: &ProgressConfig,
        total_laps: u32,
    ) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        if self.is_finished() {
            return events;
        }

        // Mark rounding: at most one per tick
        if let Some(idx) = self.next_mark(course) {
            if pos.dist_sq(&course.buoys[idx]) < cfg.rounding_radius * cfg.rounding_radius {
                self.next_buoy_index += 1;
                events.push(ProgressEvent::MarkRounded { index: idx });
            }
        }

        // Line crossing
        if now - self.last_crossing < cfg.crossing_debounce_s {
            return events;
        }
        let line = &course.line;
        if !segments_cross(prev, pos, line.a, line.b, cfg.crossing_epsilon) {
            return events;
        }
        self.last_crossing = now;

        match self.status {
            RaceStatus::NotStarted => {
                self.status = RaceStatus::Racing;
                self.current_lap = 1;
                self.next_buoy_index = 0;
                self.race_start = now;
                self.lap_start = now;
                self.lap_times.clear();
                events.push(ProgressEvent::Started);
            }
            RaceStatus::Racing if self.next_buoy_index as usize >= course.buoys.len() => {
                let lap_time = now - self.lap_start;
                self.lap_times.push(lap_time);
                events.push(ProgressEvent::LapCompleted { lap: self.current_lap, lap_time });
                if self.current_lap >= total_laps {
                    let total_time = now - self.race_start;
                    self.status = RaceStatus::Finished;
                    self.finish_time = Some(total_time);
                    events.push(ProgressEvent::Finished { total_time });
                } else {
                    self.current_lap += 1;
                    self.next_buoy_index = 0;
                    self.lap_start = now;
                }
            }
            // Crossing mid-lap with marks still to round does nothing
            _ => {}
        }
        events
    }

    /// Estimated sailing distance still to cover: the rest of this lap plus
    /// every lap not yet begun. Zero once finished.
    pub fn remaining_distance(&self, pos: Vec2, course: &Course, total_laps: u32) -> f64 {
        let finish = course.line.midpoint();
        let lap_length = course.lap_length();
        match self.status {
            RaceStatus::Finished => 0.0,
            RaceStatus::NotStarted => pos.dist(&finish) + lap_length * f64::from(total_laps),
            RaceStatus::Racing => {
                let rest_of_lap = match self.next_mark(course) {
                    Some(idx) => {
                        let mut d = pos.dist(&course.buoys[idx]);
                        for pair in course.buoys[idx..].windows(2) {
                            d += pair[0].dist(&pair[1]);
                        }
                        if let Some(last) = course.buoys.last() {
                            d += last.dist(&finish);
                        }
                        d
                    }
                    None => pos.dist(&finish),
                };
                let laps_left = total_laps.saturating_sub(self.current_lap);
                rest_of_lap + lap_length * f64::from(laps_left)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LineFrame;
    use approx::assert_relative_eq;

    fn course() -> Course {
        Course::from_parts(
            vec![Vec2::new(500.0, 0.0), Vec2::new(500.0, 400.0)],
            LineFrame::new(Vec2::new(-100.0, -150.0), Vec2::new(-100.0, 150.0)),
            Vec::new(),
        )
    }

    const WEST: Vec2 = Vec2 { x: -110.0, y: 0.0 };
    const EAST: Vec2 = Vec2 { x: -90.0, y: 0.0 };

    #[test]
    fn first_crossing_starts_the_race() {
        let cfg = ProgressConfig::default();
        let mut p = RaceProgress::default();
        assert_eq!(p.current_lap, 1);
        assert_eq!(p.next_buoy_index, -1);
        let ev = p.evaluate(WEST, EAST, 12.0, &course(), &cfg, 3);
        assert_eq!(ev, vec![ProgressEvent::Started]);
        assert_eq!(p.status, RaceStatus::Racing);
        assert_eq!(p.current_lap, 1);
        assert_eq!(p.next_buoy_index, 0);
        assert_eq!(p.race_start, 12.0);
        assert_eq!(p.lap_start, 12.0);
    }

    #[test]
    fn crossings_inside_debounce_are_ignored() {
        let cfg = ProgressConfig::default();
        let c = Course::from_parts(Vec::new(), course().line, Vec::new());
        let mut p = RaceProgress::default();
        p.evaluate(WEST, EAST, 0.0, &c, &cfg, 3);
        // with no marks, a second crossing would complete a lap
        assert!(p.evaluate(EAST, WEST, 0.5, &c, &cfg, 3).is_empty());
        assert_eq!(p.lap_times.len(), 0);
        assert_eq!(p.last_crossing, 0.0);
        let ev = p.evaluate(WEST, EAST, 1.0, &c, &cfg, 3);
        assert_eq!(ev, vec![ProgressEvent::LapCompleted { lap: 1, lap_time: 1.0 }]);
    }

    #[test]
    fn crossing_with_marks_left_changes_nothing() {
        let cfg = ProgressConfig::default();
        let mut p = RaceProgress::default();
        p.evaluate(WEST, EAST, 0.0, &course(), &cfg, 1);
        assert!(p.evaluate(EAST, WEST, 5.0, &course(), &cfg, 1).is_empty());
        assert_eq!(p.status, RaceStatus::Racing);
        assert_eq!(p.current_lap, 1);
        // the crossing still resets the debounce clock
        assert_eq!(p.last_crossing, 5.0);
    }

    #[test]
    fn marks_round_one_per_tick_in_order() {
        let cfg = ProgressConfig::default();
        let mut c = course();
        // two coincident marks
        c.buoys = vec![Vec2::new(500.0, 0.0), Vec2::new(505.0, 0.0)];
        let mut p = RaceProgress::default();
        p.evaluate(WEST, EAST, 0.0, &c, &cfg, 1);
        let at = Vec2::new(502.0, 0.0);
        assert_eq!(p.evaluate(at, at, 10.0, &c, &cfg, 1), vec![ProgressEvent::MarkRounded { index: 0 }]);
        assert_eq!(p.next_buoy_index, 1);
        assert_eq!(p.evaluate(at, at, 10.1, &c, &cfg, 1), vec![ProgressEvent::MarkRounded { index: 1 }]);
        assert_eq!(p.next_buoy_index, 2);
        assert!(p.evaluate(at, at, 10.2, &c, &cfg, 1).is_empty());
        assert_eq!(p.next_buoy_index, 2);
    }

    #[test]
    fn marks_are_ignored_before_the_start() {
        let cfg = ProgressConfig::default();
        let mut p = RaceProgress::default();
        let at = Vec2::new(500.0, 0.0);
        assert!(p.evaluate(at, at, 1.0, &course(), &cfg, 1).is_empty());
        assert_eq!(p.next_buoy_index, -1);
    }

    #[test]
    fn full_race_records_laps_and_finish() {
        let cfg = ProgressConfig::default();
        let c = course();
        let mut p = RaceProgress::default();
        p.evaluate(WEST, EAST, 2.0, &c, &cfg, 2);
        let mut t = 2.0;
        for lap in 1..=2u32 {
            for &mark in &c.buoys {
                t += 20.0;
                p.evaluate(mark, mark, t, &c, &cfg, 2);
            }
            t += 20.0;
            let ev = p.evaluate(EAST, WEST, t, &c, &cfg, 2);
            assert!(matches!(ev[0], ProgressEvent::LapCompleted { lap: l, .. } if l == lap));
        }
        assert_eq!(p.status, RaceStatus::Finished);
        assert_eq!(p.lap_times, vec![60.0, 60.0]);
        assert_relative_eq!(p.finish_time.unwrap_or_default(), 120.0);
        // nothing moves after the finish
        assert!(p.evaluate(WEST, EAST, t + 5.0, &c, &cfg, 2).is_empty());
        assert_eq!(p.lap_times.len(), 2);
    }

    #[test]
    fn remaining_distance_shrinks_with_progress() {
        let cfg = ProgressConfig::default();
        let c = course();
        let mut p = RaceProgress::default();
        let before = p.remaining_distance(WEST, &c, 2);
        assert_relative_eq!(before, WEST.dist(&c.line.midpoint()) + 2.0 * c.lap_length());
        p.evaluate(WEST, EAST, 0.0, &c, &cfg, 2);
        let started = p.remaining_distance(EAST, &c, 2);
        assert!(started < before);
        p.evaluate(c.buoys[0], c.buoys[0], 10.0, &c, &cfg, 2);
        assert!(p.remaining_distance(c.buoys[0], &c, 2) < started);
        p.forfeit();
        assert_eq!(p.remaining_distance(c.buoys[0], &c, 2), 0.0);
    }

    #[test]
    fn forfeit_finishes_with_infinite_time() {
        let mut p = RaceProgress::default();
        p.forfeit();
        assert!(p.is_finished());
        assert!(p.forfeited);
        assert_eq!(p.finish_time, Some(f64::INFINITY));
    }
}
