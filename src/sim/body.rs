//! Circular bodies and the per-body integrator

use glam::Vec2;

use super::tier::Tier;
use crate::settings::Settings;

/// Playfield edges the integrator clamps against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    /// Floor y (y grows downward)
    pub floor: f32,
}

impl Bounds {
    /// Playfield spanning `[0, width] x [0, height]`
    pub fn from_surface(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            right: width,
            floor: height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// True when the playfield has positive extent on both axes
    pub fn is_valid(&self) -> bool {
        self.width() > 0.0 && self.floor > 0.0
    }
}

/// A single ball
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: u32,
    pub tier: Tier,
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rotation in radians
    pub rotation: f32,
    pub angular_vel: f32,
    pub mass: f32,
    pub moment_of_inertia: f32,
    /// Debug highlight only
    pub selected: bool,
}

impl Body {
    /// Create a resting body of `tier` centered at `pos`
    pub fn new(id: u32, tier: Tier, pos: Vec2) -> Self {
        let radius = tier.radius();
        let mass = if radius > 0.0 { radius } else { 1.0 };
        let mut moment_of_inertia = 0.5 * mass * radius * radius;
        if moment_of_inertia < 1.0 {
            moment_of_inertia = 1.0;
        }
        Self {
            id,
            tier,
            pos,
            vel: Vec2::ZERO,
            rotation: 0.0,
            angular_vel: 0.0,
            mass,
            moment_of_inertia,
            selected: false,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.tier.radius()
    }

    /// Y of the top edge
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.radius()
    }

    /// Spin the body up (or down) by `torque / moment_of_inertia`
    pub fn apply_torque(&mut self, torque: f32) {
        self.angular_vel += torque / self.moment_of_inertia;
    }

    /// Advance one timestep: gravity, motion, floor and wall response, rest snapping.
    ///
    /// Pure with respect to its inputs, so replaying the same state and `dt`
    /// always gives the same result.
    pub fn advance(&mut self, dt: f32, bounds: &Bounds, settings: &Settings) {
        let r = self.radius();

        self.vel.y += settings.gravity * dt;
        self.pos += self.vel * dt;

        self.rotation += self.angular_vel * dt;
        self.angular_vel *= settings.angular_damping;

        // Floor
        if self.pos.y + r >= bounds.floor {
            self.pos.y = bounds.floor - r;
            if self.vel.y.abs() > settings.bounce_threshold {
                self.vel.y = -self.vel.y * settings.bounce;
            } else {
                self.vel.y = 0.0;
            }
            // Rolling friction
            self.vel.x *= settings.floor_friction;
            self.angular_vel *= settings.floor_friction;
        }

        // Walls
        if self.pos.x - r < bounds.left {
            self.pos.x = bounds.left + r;
            self.vel.x = -self.vel.x * settings.bounce;
        } else if self.pos.x + r > bounds.right {
            self.pos.x = bounds.right - r;
            self.vel.x = -self.vel.x * settings.bounce;
        }

        // Kill micro-jitter
        if self.vel.y.abs() < settings.linear_rest {
            self.vel.y = 0.0;
        }
        if self.vel.x.abs() < settings.linear_rest {
            self.vel.x = 0.0;
        }
        if self.angular_vel.abs() < settings.angular_rest {
            self.angular_vel = 0.0;
        }
    }
}
