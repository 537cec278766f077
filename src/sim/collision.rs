//! Pairwise overlap correction between bodies
//!
//! A simple relaxation: overlapping circles are pushed apart
//! half the overlap each and given a small horizontal nudge. There is no
//! contact manifold and no friction-aware impulse; several passes per tick
//! settle stacks well enough for gameplay.

use glam::Vec2;

use super::body::Body;

/// Result of a circle/circle overlap check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit axis pointing from the second body's center to the first's
    pub normal: Vec2,
    /// How far the circles interpenetrate
    pub penetration: f32,
}

/// Check two circles for overlap.
///
/// Exactly coincident centers report no contact: there is no axis to push
/// along, so the pair is left for a later tick to perturb.
pub fn circle_contact(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> Option<Contact> {
    let delta = a_pos - b_pos;
    let dist = delta.length();
    let min_dist = a_radius + b_radius;
    if dist > 0.0 && dist < min_dist {
        Some(Contact {
            normal: delta / dist,
            penetration: min_dist - dist,
        })
    } else {
        None
    }
}

/// One resolver pass over every unordered pair. Returns how many pairs were corrected.
pub fn resolve_all(bodies: &mut [Body], nudge: f32) -> usize {
    let mut corrected = 0;
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            let Some(contact) = circle_contact(a.pos, a.radius(), b.pos, b.radius()) else {
                continue;
            };
            let half = contact.normal * (contact.penetration / 2.0);
            a.pos += half;
            b.pos -= half;

            a.vel.x += nudge * contact.normal.x;
            b.vel.x -= nudge * contact.normal.x;
            corrected += 1;
        }
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Tier;

    fn body(id: u32, tier: u8, x: f32, y: f32) -> Body {
        Body::new(id, Tier::new(tier).unwrap(), Vec2::new(x, y))
    }

    #[test]
    fn test_contact_detection() {
        let c = circle_contact(Vec2::new(10.0, 0.0), 8.0, Vec2::ZERO, 8.0).unwrap();
        assert!((c.penetration - 6.0).abs() < 1e-5);
        assert!((c.normal - Vec2::X).length() < 1e-5);

        // Touching exactly is not overlapping
        assert!(circle_contact(Vec2::new(16.0, 0.0), 8.0, Vec2::ZERO, 8.0).is_none());
        // Far apart
        assert!(circle_contact(Vec2::new(100.0, 0.0), 8.0, Vec2::ZERO, 8.0).is_none());
    }

    #[test]
    fn test_coincident_centers_skipped() {
        let mut bodies = vec![body(1, 0, 100.0, 100.0), body(2, 0, 100.0, 100.0)];
        assert_eq!(resolve_all(&mut bodies, 0.2), 0);
        assert_eq!(bodies[0].pos, bodies[1].pos);
        assert_eq!(bodies[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_pushes_apart_symmetrically() {
        // Radii 16 + 24 = 40, centers 30 apart horizontally
        let mut bodies = vec![body(1, 0, 100.0, 200.0), body(2, 1, 130.0, 200.0)];
        assert_eq!(resolve_all(&mut bodies, 0.2), 1);

        assert!((bodies[0].pos.x - 95.0).abs() < 1e-4);
        assert!((bodies[1].pos.x - 135.0).abs() < 1e-4);
        assert_eq!(bodies[0].pos.y, 200.0);
        let gap = (bodies[1].pos - bodies[0].pos).length();
        assert!((gap - 40.0).abs() < 1e-3);

        // Horizontal nudge along the separation axis
        assert!((bodies[0].vel.x + 0.2).abs() < 1e-6);
        assert!((bodies[1].vel.x - 0.2).abs() < 1e-6);
        assert_eq!(bodies[0].vel.y, 0.0);
    }

    #[test]
    fn test_vertical_stack_gets_no_horizontal_nudge() {
        let mut bodies = vec![body(1, 0, 100.0, 100.0), body(2, 0, 100.0, 120.0)];
        resolve_all(&mut bodies, 0.2);
        assert!(bodies[0].vel.x.abs() < 1e-6);
        assert!(bodies[0].pos.y < 100.0);
        assert!(bodies[1].pos.y > 120.0);
    }

    #[test]
    fn test_repeated_passes_reduce_overlap() {
        let mut bodies = vec![
            body(1, 0, 100.0, 100.0),
            body(2, 0, 110.0, 100.0),
            body(3, 0, 120.0, 100.0),
        ];
        let total_overlap = |bodies: &[Body]| -> f32 {
            let mut sum = 0.0;
            for i in 0..bodies.len() {
                for j in i + 1..bodies.len() {
                    if let Some(c) = circle_contact(
                        bodies[i].pos,
                        bodies[i].radius(),
                        bodies[j].pos,
                        bodies[j].radius(),
                    ) {
                        sum += c.penetration;
                    }
                }
            }
            sum
        };
        let before = total_overlap(&bodies);
        for _ in 0..3 {
            resolve_all(&mut bodies, 0.2);
        }
        assert!(total_overlap(&bodies) < before);
    }
}
