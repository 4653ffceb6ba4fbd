//! Terminal velocity and world-wall clamping
//!
//! Applied to every dynamic entity after the physics step. Both corrections
//! write position/velocity directly; no forces are involved.

use glam::Vec2;

use crate::physics::{BodyHandle, PhysicsWorld, ShapeHandle};
use crate::settings::SimConfig;

/// Horizontal limits and fall-speed cap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub left: f32,
    pub right: f32,
    pub terminal_velocity: f32,
}

impl Limits {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            left: config.left_bound(),
            right: config.right_bound(),
            terminal_velocity: config.terminal_velocity,
        }
    }
}

/// Cap the downward speed, then shift the body so all of its shapes sit
/// between the walls. Returns the horizontal shift applied.
pub fn enforce_limits(
    physics: &mut PhysicsWorld,
    body: BodyHandle,
    shapes: &[ShapeHandle],
    limits: &Limits,
) -> f32 {
    let Some(state) = physics.body(body) else {
        return 0.0;
    };
    if state.velocity.y > limits.terminal_velocity {
        physics.set_velocity(body, Vec2::new(state.velocity.x, limits.terminal_velocity));
    }

    let Some((min_x, max_x)) = physics.x_extent(shapes) else {
        return 0.0;
    };
    let mut dx = 0.0;
    if min_x < limits.left {
        dx += limits.left - min_x;
    }
    if max_x + dx > limits.right {
        dx -= max_x + dx - limits.right;
    }
    if dx != 0.0 {
        physics.translate(body, Vec2::new(dx, 0.0));
    }
    dx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDef, ShapeDef, moment_for_poly};

    fn boxed(physics: &mut PhysicsWorld, at: Vec2, velocity: Vec2) -> (BodyHandle, ShapeHandle) {
        let def = ShapeDef::box_shape(Vec2::splat(40.0)).unwrap();
        let inertia = moment_for_poly(1.0, &def.vertices);
        let body = physics
            .add_body(BodyDef::dynamic(1.0, inertia).at(at).with_velocity(velocity, 0.0))
            .unwrap();
        let shape = physics.add_shape(body, def, None).unwrap();
        (body, shape)
    }

    const LIMITS: Limits = Limits {
        left: 100.0,
        right: 900.0,
        terminal_velocity: 1000.0,
    };

    #[test]
    fn clamps_fall_speed_only() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO, 1);
        let (body, shape) = boxed(&mut physics, Vec2::new(500.0, 0.0), Vec2::new(-300.0, 2500.0));
        enforce_limits(&mut physics, body, &[shape], &LIMITS);
        assert_eq!(physics.body(body).unwrap().velocity, Vec2::new(-300.0, 1000.0));

        // Rising fast is fine
        physics.set_velocity(body, Vec2::new(-300.0, -2500.0));
        enforce_limits(&mut physics, body, &[shape], &LIMITS);
        assert_eq!(physics.body(body).unwrap().velocity.y, -2500.0);
    }

    #[test]
    fn left_overshoot_lands_exactly_on_bound() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO, 1);
        let (body, shape) = boxed(&mut physics, Vec2::new(90.0, 0.0), Vec2::new(-50.0, 0.0));
        let dx = enforce_limits(&mut physics, body, &[shape], &LIMITS);
        assert!((dx - 30.0).abs() < 1e-4);
        let (min_x, _) = physics.x_extent(&[shape]).unwrap();
        assert!((min_x - 100.0).abs() < 1e-4);
        // Positional only: velocity untouched
        assert_eq!(physics.body(body).unwrap().velocity.x, -50.0);
    }

    #[test]
    fn right_overshoot_lands_exactly_on_bound() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO, 1);
        let (body, shape) = boxed(&mut physics, Vec2::new(895.0, 0.0), Vec2::ZERO);
        enforce_limits(&mut physics, body, &[shape], &LIMITS);
        let (_, max_x) = physics.x_extent(&[shape]).unwrap();
        assert!((max_x - 900.0).abs() < 1e-4);
    }

    #[test]
    fn inside_bounds_is_untouched() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO, 1);
        let (body, shape) = boxed(&mut physics, Vec2::new(500.0, 0.0), Vec2::ZERO);
        assert_eq!(enforce_limits(&mut physics, body, &[shape], &LIMITS), 0.0);
        assert_eq!(physics.body(body).unwrap().position.x, 500.0);
    }

    #[test]
    fn removed_body_is_ignored() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO, 1);
        let (body, shape) = boxed(&mut physics, Vec2::new(0.0, 0.0), Vec2::ZERO);
        physics.remove_body(body);
        assert_eq!(enforce_limits(&mut physics, body, &[shape], &LIMITS), 0.0);
    }
}
