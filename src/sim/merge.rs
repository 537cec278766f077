//! Same-tier merge detection
//!
//! A pass scans every unordered pair once. Each body takes part in at most
//! one merge per pass; disjoint pairs all merge in the same pass. The body
//! list is only rewritten after the scan, via [`MergeOutcome::apply`].

use glam::Vec2;

use super::body::Body;
use super::tier::Tier;

/// One pair of bodies fusing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Tier of the two consumed bodies
    pub tier: Tier,
    /// Midpoint of the two centers
    pub pos: Vec2,
    /// Tier spawned at `pos` (`None` when two terminal bodies cap out)
    pub result: Option<Tier>,
    pub points: u64,
}

/// Everything one merge pass decided
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Indices into the scanned slice, two per merge
    pub consumed: Vec<usize>,
    pub spawned: Vec<Body>,
    pub score_delta: u64,
    pub merges: Vec<Merge>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    /// Remove consumed bodies and append spawned ones, preserving the order of survivors
    pub fn apply(self, bodies: &mut Vec<Body>) {
        if self.consumed.is_empty() {
            return;
        }
        let mut gone = vec![false; bodies.len()];
        for &i in &self.consumed {
            gone[i] = true;
        }
        let mut index = 0;
        bodies.retain(|_| {
            let keep = !gone[index];
            index += 1;
            keep
        });
        bodies.extend(self.spawned);
    }
}

/// Points for merging two bodies of `tier`
pub fn merge_points(tier: Tier) -> u64 {
    match tier.successor() {
        Some(next) => next.score_value() as u64,
        // Capping out pays double the terminal value
        None => Tier::TERMINAL.score_value() as u64 * 2,
    }
}

/// Find merging pairs without touching `bodies`.
///
/// Two bodies of the same tier merge when their centers are closer than
/// `distance_factor` times their combined radii. `next_id` allocates ids
/// for spawned bodies.
pub fn merge_pass(
    bodies: &[Body],
    distance_factor: f32,
    mut next_id: impl FnMut() -> u32,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    let mut consumed = vec![false; bodies.len()];

    for i in 0..bodies.len() {
        for j in i + 1..bodies.len() {
            if consumed[i] || consumed[j] {
                continue;
            }
            let (a, b) = (&bodies[i], &bodies[j]);
            if a.tier != b.tier {
                continue;
            }
            let dist = a.pos.distance(b.pos);
            if dist >= (a.radius() + b.radius()) * distance_factor {
                continue;
            }

            consumed[i] = true;
            consumed[j] = true;
            outcome.consumed.extend([i, j]);

            let pos = (a.pos + b.pos) * 0.5;
            let result = a.tier.successor();
            if let Some(next) = result {
                outcome.spawned.push(Body::new(next_id(), next, pos));
            }
            let points = merge_points(a.tier);
            outcome.score_delta += points;
            outcome.merges.push(Merge {
                tier: a.tier,
                pos,
                result,
                points,
            });
            break;
        }
    }

    outcome
}
