//! Camera follow and screen shake
//!
//! The camera only consumes shake requests; nothing in the simulation reads
//! camera state back.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Share of the shake applied horizontally
const HORIZONTAL_SHAKE: f32 = 0.5;

/// A shake request issued by an explosion or impact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShakeRequest {
    /// Updates the shake lasts
    pub duration: u32,
    /// Peak random offset per update
    pub intensity: f32,
    /// Constant push added every update while shaking
    pub bias: Vec2,
}

impl ShakeRequest {
    pub fn new(duration: u32, intensity: f32) -> Self {
        Self {
            duration,
            intensity,
            bias: Vec2::ZERO,
        }
    }

    pub fn with_bias(mut self, bias: Vec2) -> Self {
        self.bias = bias;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ActiveShake {
    remaining: u32,
    intensity: f32,
    bias: Vec2,
}

/// Jitter scale for a shake with `remaining` updates left; decays toward zero
#[inline]
pub fn damping(remaining: u32) -> f32 {
    let t = remaining as f32;
    t / (t + 1.0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Camera {
    /// View offset subtracted from world positions when drawing
    pub offset: Vec2,
    shake: Option<ActiveShake>,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a shake, replacing any shake in progress
    pub fn shake(&mut self, request: ShakeRequest) {
        self.shake = (request.duration > 0).then_some(ActiveShake {
            remaining: request.duration,
            intensity: request.intensity.abs(),
            bias: request.bias,
        });
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Follow `target_y` vertically, then apply shake or let the horizontal
    /// offset settle back to zero
    pub fn update(&mut self, target_y: f32, viewport_height: f32, smoothing: f32, rng: &mut impl Rng) {
        let desired = target_y - viewport_height / 2.0;
        self.offset.y += (desired - self.offset.y) * smoothing;

        match self.shake.as_mut() {
            Some(shake) => {
                let k = damping(shake.remaining);
                let (jx, jy) = if shake.intensity > 0.0 {
                    (
                        rng.random_range(-shake.intensity..shake.intensity),
                        rng.random_range(-shake.intensity..shake.intensity),
                    )
                } else {
                    (0.0, 0.0)
                };
                self.offset.y += jy * k + shake.bias.y;
                self.offset.x += (jx * k + shake.bias.x) * HORIZONTAL_SHAKE;

                shake.remaining -= 1;
                if shake.remaining == 0 {
                    self.shake = None;
                }
            }
            None => {
                self.offset.x += (0.0 - self.offset.x) * smoothing;
            }
        }
    }
}
