//! collision.rs — Pairwise boat-to-boat overlap resolution
//!
//! Runs once per tick after physics, before progress evaluation, so the line
//! and mark tests see the corrected positions.

use crate::boat::Boat;

/// Separate two overlapping boats along their centre line and bleed speed.
/// Returns true when the pair was in contact.
pub fn resolve_pair(a: &mut Boat, b: &mut Boat, speed_factor: f64) -> bool {
    let min_dist = a.collision_radius + b.collision_radius;
    let dist_sq = a.pos.dist_sq(&b.pos);
    // exact coincidence has no separating direction
    if dist_sq >= min_dist * min_dist || dist_sq <= 0.0 {
        return false;
    }
    let dist = dist_sq.sqrt();
    let push = b.pos.sub(&a.pos).scale((min_dist - dist) * 0.5 / dist);
    a.pos = a.pos.sub(&push);
    b.pos = b.pos.add(&push);
    a.speed *= speed_factor;
    b.speed *= speed_factor;
    true
}

/// Resolve every unordered pair once, in index order. Returns the contact count.
pub fn resolve_all(boats: &mut [Boat], speed_factor: f64) -> usize {
    let mut contacts = 0;
    for i in 0..boats.len() {
        let (head, tail) = boats.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if resolve_pair(a, b, speed_factor) {
                contacts += 1;
            }
        }
    }
    contacts
}
