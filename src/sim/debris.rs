//! Short-lived pickaxes released when a debris-triggering block breaks
//!
//! Debris collides physically but its shape has no collision type, so it
//! never reaches a damage handler.

use glam::Vec2;
use rand::Rng;

use super::bounds::{Limits, enforce_limits};
use super::tool::{HEAD_OUTLINE, SPRITE_ROTATION};
use crate::atlas::Sprite;
use crate::consts::{DEBRIS_ELASTICITY, DEBRIS_FRICTION, DEBRIS_MASS};
use crate::error::Result;
use crate::physics::{BodyDef, BodyHandle, PhysicsWorld, ShapeDef, ShapeHandle, moment_for_poly};
use crate::rotate_outline;
use crate::settings::SimConfig;

#[derive(Debug, Clone)]
pub struct Debris {
    pub body: BodyHandle,
    pub shape: ShapeHandle,
    /// Shared atlas sprite; not owned
    pub sprite: Sprite,
    pub created_ms: u64,
    pub ttl_ms: u64,
    removed: bool,
}

impl Debris {
    pub fn spawn(
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        position: Vec2,
        sprite: Sprite,
        velocity: Vec2,
        spin: f32,
        now_ms: u64,
    ) -> Result<Self> {
        let outline = rotate_outline(HEAD_OUTLINE, config.block_size, SPRITE_ROTATION);
        let def = ShapeDef::polygon(&outline)?.with_material(DEBRIS_ELASTICITY, DEBRIS_FRICTION);
        let inertia = moment_for_poly(DEBRIS_MASS, &def.vertices);
        let body = physics.add_body(
            BodyDef::dynamic(DEBRIS_MASS, inertia)
                .at(position)
                .with_velocity(velocity, spin)
                .with_ccd(),
        )?;
        let shape = physics.add_shape(body, def, None)?;
        Ok(Self {
            body,
            shape,
            sprite,
            created_ms: now_ms,
            ttl_ms: config.debris_ttl_ms,
            removed: false,
        })
    }

    /// Spawn flying upward and outward with a random spin
    pub fn spawn_scattered(
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        position: Vec2,
        sprite: Sprite,
        now_ms: u64,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let velocity = Vec2::new(rng.random_range(-200.0..200.0), rng.random_range(-400.0..-100.0));
        let spin = rng.random_range(-5.0..5.0);
        Self::spawn(physics, config, position, sprite, velocity, spin, now_ms)
    }

    /// Strictly older than its time-to-live
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_ms) > self.ttl_ms
    }

    pub fn update(&mut self, physics: &mut PhysicsWorld, limits: &Limits) {
        if !self.removed {
            enforce_limits(physics, self.body, &[self.shape], limits);
        }
    }

    /// Release the physics body. Returns true only on the call that removed it.
    pub fn cleanup(&mut self, physics: &mut PhysicsWorld) -> bool {
        if self.removed {
            return false;
        }
        self.removed = true;
        physics.remove_body(self.body)
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}
