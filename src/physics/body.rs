//! Rigid bodies

use glam::Vec2;
use rapier2d::prelude::{MassProperties, Point, RigidBody, RigidBodyBuilder, RigidBodyHandle};
use serde::{Deserialize, Serialize};

use super::{from_vector, to_vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Moved by gravity, velocity and contacts
    Dynamic,
    /// Immovable
    Static,
}

/// Construction parameters for a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    /// Total mass, independent of the attached shapes
    pub mass: f32,
    /// Moment of inertia about the body origin
    pub inertia: f32,
    /// Sweep fast motion against other shapes instead of stepping through them
    pub ccd: bool,
}

impl BodyDef {
    pub fn dynamic(mass: f32, inertia: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass,
            inertia,
            ccd: false,
        }
    }

    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            ..Self::dynamic(0.0, 0.0)
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2, angular_velocity: f32) -> Self {
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_ccd(mut self) -> Self {
        self.ccd = true;
        self
    }

    /// Shapes carry no density; the body's mass comes from here alone, so
    /// swapping shapes never changes how heavy it is.
    pub(crate) fn build(&self) -> RigidBody {
        let builder = match self.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .additional_mass_properties(MassProperties::new(Point::origin(), self.mass, self.inertia))
                .linvel(to_vector(self.velocity))
                .angvel(self.angular_velocity)
                .ccd_enabled(self.ccd)
                .can_sleep(false),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        builder
            .translation(to_vector(self.position))
            .rotation(self.angle)
            .build()
    }
}

/// Snapshot of a body's motion state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub kind: BodyKind,
    pub position: Vec2,
    /// Radians
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

impl BodyState {
    pub(crate) fn of(body: &RigidBody) -> Self {
        Self {
            kind: if body.is_dynamic() {
                BodyKind::Dynamic
            } else {
                BodyKind::Static
            },
            position: from_vector(body.translation()),
            angle: body.rotation().angle(),
            velocity: from_vector(body.linvel()),
            angular_velocity: body.angvel(),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_body_keeps_its_pose() {
        let body = BodyDef::dynamic(2.0, 3.0)
            .at(Vec2::new(10.0, -4.0))
            .with_angle(0.5)
            .with_velocity(Vec2::new(1.0, 2.0), -1.5)
            .build();
        let state = BodyState::of(&body);
        assert!(state.is_dynamic());
        assert_eq!(state.position, Vec2::new(10.0, -4.0));
        assert!((state.angle - 0.5).abs() < 1e-6);
        assert_eq!(state.velocity, Vec2::new(1.0, 2.0));
        assert_eq!(state.angular_velocity, -1.5);
    }

    #[test]
    fn fixed_bodies_are_static() {
        let body = BodyDef::fixed().at(Vec2::new(5.0, 5.0)).build();
        let state = BodyState::of(&body);
        assert_eq!(state.kind, BodyKind::Static);
        assert_eq!(state.position, Vec2::new(5.0, 5.0));
    }
}
