//! scoring.rs — Race ranking and series points
//!
//! Every boat gets a time, so the order is always total:
//! - finished: its finish time
//! - still sailing when results are called: race time + remaining distance × penalty
//! - forfeited: +∞
//! Ties keep boat order.

use regatta_types::{RaceResultRow, Standing};

use crate::progress::RaceProgress;

/// One boat's claim to a position
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub boat_id: usize,
    pub name: String,
    pub ranked_time: f64,
    pub finished: bool,
}

/// Time used for ranking a boat when results are called at `race_time`
pub fn ranked_time(
    progress: &RaceProgress,
    remaining_distance: f64,
    race_time: f64,
    penalty_per_unit: f64,
) -> f64 {
    if progress.forfeited {
        return f64::INFINITY;
    }
    match progress.finish_time {
        Some(t) if progress.is_finished() => t,
        _ => race_time + remaining_distance.max(0.0) * penalty_per_unit,
    }
}

/// Points for a 1-based position; positions past the table score nothing
pub fn points_for(position: usize, table: &[u32]) -> u32 {
    position.checked_sub(1).and_then(|i| table.get(i)).copied().unwrap_or(0)
}

/// Order entries by ascending time and award points positionally
pub fn rank(mut entries: Vec<ScoreEntry>, table: &[u32]) -> Vec<RaceResultRow> {
    entries.sort_by(|a, b| a.ranked_time.total_cmp(&b.ranked_time));
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| RaceResultRow {
            boat_id: e.boat_id,
            name: e.name,
            position: i + 1,
            ranked_time: e.ranked_time,
            finished: e.finished,
            points: points_for(i + 1, table),
        })
        .collect()
}

/// Highest cumulative score first; ties by boat id
pub fn standings<'a>(scores: impl IntoIterator<Item = (usize, &'a str, u32)>) -> Vec<Standing> {
    let mut rows: Vec<Standing> = scores
        .into_iter()
        .map(|(boat_id, name, score)| Standing { boat_id, name: name.to_string(), score })
        .collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score).then(a.boat_id.cmp(&b.boat_id)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: usize, t: f64) -> ScoreEntry {
        ScoreEntry { boat_id: id, name: format!("boat {id}"), ranked_time: t, finished: t.is_finite() }
    }

    #[test]
    fn ranks_by_time_and_awards_table() {
        let rows = rank(
            vec![entry(0, 15.0), entry(1, f64::INFINITY), entry(2, 10.0), entry(3, 12.0)],
            &[10, 6, 3, 1],
        );
        let order: Vec<usize> = rows.iter().map(|r| r.boat_id).collect();
        assert_eq!(order, vec![2, 3, 0, 1]);
        let points: Vec<u32> = rows.iter().map(|r| r.points).collect();
        assert_eq!(points, vec![10, 6, 3, 1]);
        assert_eq!(rows[3].position, 4);
    }

    #[test]
    fn positions_past_the_table_score_zero() {
        assert_eq!(points_for(1, &[5, 3]), 5);
        assert_eq!(points_for(3, &[5, 3]), 0);
        assert_eq!(points_for(0, &[5, 3]), 0);
    }

    #[test]
    fn ties_keep_entry_order() {
        let rows = rank(vec![entry(4, 9.0), entry(1, 9.0)], &[2, 1]);
        assert_eq!(rows[0].boat_id, 4);
        assert_eq!(rows[1].boat_id, 1);
    }

    #[test]
    fn unfinished_boats_get_distance_penalty() {
        let mut p = RaceProgress::default();
        assert_eq!(ranked_time(&p, 1000.0, 300.0, 0.05), 350.0);
        p.status = regatta_types::RaceStatus::Finished;
        p.finish_time = Some(200.0);
        assert_eq!(ranked_time(&p, 0.0, 300.0, 0.05), 200.0);
        p.forfeit();
        assert_eq!(ranked_time(&p, 0.0, 300.0, 0.05), f64::INFINITY);
    }

    #[test]
    fn standings_sort_by_score() {
        let rows = standings(vec![(0, "a", 6), (1, "b", 10), (2, "c", 6)]);
        let order: Vec<usize> = rows.iter().map(|r| r.boat_id).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }
}
