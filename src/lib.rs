//! Pickaxe Sim - destructible-terrain physics core for a mining sandbox
//!
//! Core modules:
//! - `physics`: 2D rigid-body world (bodies, convex shapes, contact dispatch)
//! - `sim`: World grid, tool, explosives, debris, camera and the tick loop
//! - `settings`: Static configuration (materials, sizes, timers)
//! - `atlas`: Texture atlas regions (geometry only, no image data)
//! - `audio`: Sound cue vocabulary handed to the sound collaborator

pub mod atlas;
pub mod audio;
pub mod error;
pub mod physics;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::SimConfig;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Atlas width in pixels; regions wrap to a new row past this
    pub const ATLAS_WIDTH: u32 = 512;

    /// Tool defaults
    pub const TOOL_MASS: f32 = 100.0;
    pub const TOOL_ELASTICITY: f32 = 0.7;
    pub const TOOL_FRICTION: f32 = 0.7;
    /// Angle nudge applied on every hit (radians)
    pub const HIT_PERTURBATION: f32 = 0.01;

    /// Debris defaults
    pub const DEBRIS_MASS: f32 = 50.0;
    pub const DEBRIS_ELASTICITY: f32 = 0.3;
    pub const DEBRIS_FRICTION: f32 = 0.3;

    /// Explosive defaults
    pub const TNT_MASS: f32 = 70.0;
    pub const MEGA_TNT_MASS: f32 = 100.0;
    pub const EXPLOSIVE_ELASTICITY: f32 = 1.0;
    pub const EXPLOSIVE_FRICTION: f32 = 0.7;
    /// Explosion radius in block sizes (scaled by the variant multiplier)
    pub const EXPLOSION_RADIUS_BLOCKS: f32 = 3.0;
    /// Peak explosion damage at the detonation point (scaled by the multiplier)
    pub const EXPLOSION_BASE_DAMAGE: f32 = 100.0;

    /// Block surface material
    pub const BLOCK_ELASTICITY: f32 = 0.0;
    pub const BLOCK_FRICTION: f32 = 0.7;
}

/// Rotate a point around the origin by `angle` radians
#[inline]
pub fn rotate_point(p: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(cos * p.x - sin * p.y, sin * p.x + cos * p.y)
}

/// Re-center a sprite-space outline on a block-sized cell, then rotate it
pub fn rotate_outline(points: &[(f32, f32)], block_size: f32, angle: f32) -> Vec<Vec2> {
    let half = block_size / 2.0;
    points
        .iter()
        .map(|&(x, y)| rotate_point(Vec2::new(x - half, y - half), angle))
        .collect()
}
