//! Outgoing simulation events
//!
//! Requests for the presentation collaborators (sound, particles, camera)
//! and notifications of destruction. Drained by the caller after each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::camera::ShakeRequest;
use super::grid::GridPos;
use crate::audio::SoundCue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Fire-and-forget sound request
    Sound(SoundCue),
    /// Create one explosion effect
    Explosion { position: Vec2, particle_count: u32 },
    /// Shake the camera
    CameraShake(ShakeRequest),
    /// A block left the grid
    BlockDestroyed { pos: GridPos, material: String, center: Vec2 },
    /// A debris pickaxe was released
    DebrisSpawned { position: Vec2 },
    /// Debris pieces timed out this tick
    DebrisExpired { count: usize },
}
