//! The player's pickaxe: hitbox, damage and the enlarge power-up
//!
//! The hitbox is three convex pieces that together form the L-shaped head.
//! While enlarged, every piece is the original scaled about the body origin;
//! leaving the effect restores the original pieces. Exactly one set of pieces
//! is registered with the physics world at any time.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::bounds::{Limits, enforce_limits};
use super::debris::Debris;
use crate::atlas::{AtlasCategory, Sprite, TextureAtlas};
use crate::consts::{HIT_PERTURBATION, TOOL_ELASTICITY, TOOL_FRICTION, TOOL_MASS};
use crate::error::{Result, SimError};
use crate::physics::{BodyDef, BodyHandle, CollisionType, PhysicsWorld, ShapeDef, ShapeHandle, moment_for_poly};
use crate::rotate_outline;
use crate::settings::SimConfig;

/// Sprite-space outlines are drawn pointing right; bodies use them rotated
pub const SPRITE_ROTATION: f32 = -FRAC_PI_2;

/// Diagonal handle plus the blade tip
pub const HEAD_OUTLINE: &[(f32, f32)] = &[
    (0.0, 0.0),
    (10.0, 0.0),
    (110.0, 100.0),
    (100.0, 110.0),
    (0.0, 10.0),
    (110.0, 110.0),
];

const UPPER_BLADE_OUTLINE: &[(f32, f32)] = &[
    (110.0, 30.0),
    (120.0, 40.0),
    (120.0, 90.0),
    (100.0, 90.0),
    (100.0, 40.0),
    (110.0, 100.0),
];

const LOWER_BLADE_OUTLINE: &[(f32, f32)] = &[
    (30.0, 110.0),
    (40.0, 120.0),
    (90.0, 120.0),
    (40.0, 100.0),
    (90.0, 100.0),
    (100.0, 110.0),
];

/// Equippable pickaxe variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolKind {
    Wooden,
    Stone,
    Iron,
    Golden,
    Diamond,
    Netherite,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Wooden,
        ToolKind::Stone,
        ToolKind::Iron,
        ToolKind::Golden,
        ToolKind::Diamond,
        ToolKind::Netherite,
    ];

    /// Hit points removed per contact
    pub fn damage(&self) -> i32 {
        match self {
            ToolKind::Wooden => 2,
            ToolKind::Stone => 4,
            ToolKind::Iron => 6,
            ToolKind::Golden => 8,
            ToolKind::Diamond => 10,
            ToolKind::Netherite => 12,
        }
    }

    pub fn atlas_name(&self) -> &'static str {
        match self {
            ToolKind::Wooden => "wooden_pickaxe",
            ToolKind::Stone => "stone_pickaxe",
            ToolKind::Iron => "iron_pickaxe",
            ToolKind::Golden => "golden_pickaxe",
            ToolKind::Diamond => "diamond_pickaxe",
            ToolKind::Netherite => "netherite_pickaxe",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.atlas_name() == name)
            .ok_or_else(|| SimError::UnknownTool(name.to_string()))
    }
}

/// Temporary enlarge power-up
#[derive(Debug, Clone, Copy, PartialEq)]
struct EnlargeEffect {
    until_ms: u64,
    /// Sprite to restore when the effect ends
    original_sprite: Sprite,
}

#[derive(Debug, Clone)]
pub struct Pickaxe {
    pub body: BodyHandle,
    pub kind: ToolKind,
    pub damage: i32,
    pub sprite: Sprite,
    /// Unscaled hitbox pieces
    base_hitbox: Vec<ShapeDef>,
    /// Pieces currently registered with the physics world
    shapes: Vec<ShapeHandle>,
    enlarge: Option<EnlargeEffect>,
    /// Debris released by this pickaxe
    pub debris: Vec<Debris>,
}

impl Pickaxe {
    pub fn new(
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        atlas: &TextureAtlas,
        kind: ToolKind,
        position: Vec2,
    ) -> Result<Self> {
        let sprite = atlas.sprite(AtlasCategory::Pickaxe, kind.atlas_name())?;
        let base_hitbox = [HEAD_OUTLINE, UPPER_BLADE_OUTLINE, LOWER_BLADE_OUTLINE]
            .into_iter()
            .map(|outline| {
                let points = rotate_outline(outline, config.block_size, SPRITE_ROTATION);
                Ok(ShapeDef::polygon(&points)?
                    .with_material(TOOL_ELASTICITY, TOOL_FRICTION)
                    .with_collision_type(CollisionType::TOOL))
            })
            .collect::<Result<Vec<_>>>()?;

        let inertia = moment_for_poly(TOOL_MASS, &base_hitbox[0].vertices);
        let body = physics.add_body(BodyDef::dynamic(TOOL_MASS, inertia).at(position).with_ccd())?;
        physics.add_collision_handler(CollisionType::TOOL, CollisionType::BLOCK);

        let mut tool = Self {
            body,
            kind,
            damage: kind.damage(),
            sprite,
            base_hitbox,
            shapes: Vec::new(),
            enlarge: None,
            debris: Vec::new(),
        };
        tool.register_hitbox(physics, tool.base_hitbox.clone())?;
        Ok(tool)
    }

    pub fn shapes(&self) -> &[ShapeHandle] {
        &self.shapes
    }

    pub fn is_enlarged(&self) -> bool {
        self.enlarge.is_some()
    }

    /// When the enlarge effect ends, if active
    pub fn enlarged_until(&self) -> Option<u64> {
        self.enlarge.map(|e| e.until_ms)
    }

    /// Replace the registered pieces: all old pieces leave the world before
    /// any new piece is added
    fn register_hitbox(&mut self, physics: &mut PhysicsWorld, pieces: Vec<ShapeDef>) -> Result<()> {
        for shape in self.shapes.drain(..) {
            physics.remove_shape(shape);
        }
        for piece in pieces {
            self.shapes.push(physics.add_shape(self.body, piece, None)?);
        }
        Ok(())
    }

    fn enlarged_sprite(base: Sprite, config: &SimConfig) -> Sprite {
        base.with_draw_size(Vec2::splat(config.block_size * config.enlarge_factor))
    }

    /// Grow the pickaxe for `duration_ms`. While already enlarged the
    /// deadline is extended instead; the hitbox is never scaled twice.
    pub fn enlarge(
        &mut self,
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        duration_ms: u64,
        now_ms: u64,
    ) -> Result<()> {
        if let Some(effect) = self.enlarge.as_mut() {
            effect.until_ms += duration_ms;
            log::info!("Enlarge extended until {} ms", effect.until_ms);
            return Ok(());
        }

        let scaled = self
            .base_hitbox
            .iter()
            .map(|def| def.scaled(config.enlarge_factor))
            .collect();
        self.register_hitbox(physics, scaled)?;
        self.enlarge = Some(EnlargeEffect {
            until_ms: now_ms + duration_ms,
            original_sprite: self.sprite,
        });
        self.sprite = Self::enlarged_sprite(self.sprite, config);
        log::info!("Pickaxe enlarged until {} ms", now_ms + duration_ms);
        Ok(())
    }

    /// Restore the original hitbox and sprite; no-op when not enlarged
    pub fn reset_size(&mut self, physics: &mut PhysicsWorld) -> Result<()> {
        let Some(effect) = self.enlarge.take() else {
            return Ok(());
        };
        self.sprite = effect.original_sprite;
        self.register_hitbox(physics, self.base_hitbox.clone())?;
        log::info!("Pickaxe back to normal size");
        Ok(())
    }

    /// Switch variant: new damage and sprite, keeping the enlarge scale
    pub fn equip(&mut self, kind: ToolKind, atlas: &TextureAtlas, config: &SimConfig) -> Result<()> {
        let sprite = atlas.sprite(AtlasCategory::Pickaxe, kind.atlas_name())?;
        self.kind = kind;
        self.damage = kind.damage();
        match self.enlarge.as_mut() {
            Some(effect) => {
                effect.original_sprite = sprite;
                self.sprite = Self::enlarged_sprite(sprite, config);
            }
            None => self.sprite = sprite,
        }
        log::info!("Setting pickaxe to: {}", kind.atlas_name());
        Ok(())
    }

    pub fn equip_random(&mut self, atlas: &TextureAtlas, config: &SimConfig, rng: &mut impl Rng) -> Result<()> {
        let kind = *ToolKind::ALL.choose(rng).unwrap_or(&ToolKind::Wooden);
        self.equip(kind, atlas, config)
    }

    /// Small random twist so contacts never settle into a dead stop
    pub fn perturb(&self, physics: &mut PhysicsWorld, rng: &mut impl Rng) {
        let twist = if rng.random_bool(0.5) {
            HIT_PERTURBATION
        } else {
            -HIT_PERTURBATION
        };
        physics.rotate(self.body, twist);
    }

    /// Release one debris pickaxe at `position`
    pub fn spawn_debris(
        &mut self,
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        position: Vec2,
        now_ms: u64,
        rng: &mut impl Rng,
    ) -> Result<()> {
        let debris = Debris::spawn_scattered(physics, config, position, self.sprite, now_ms, rng)?;
        log::debug!("Debris spawned at {position}");
        self.debris.push(debris);
        Ok(())
    }

    /// Post-step update: limits, enlarge expiry, then debris upkeep.
    /// Returns how many debris pieces expired this tick.
    pub fn update(&mut self, physics: &mut PhysicsWorld, limits: &Limits, now_ms: u64) -> Result<usize> {
        enforce_limits(physics, self.body, &self.shapes, limits);

        if self.enlarge.is_some_and(|e| now_ms > e.until_ms) {
            self.reset_size(physics)?;
        }

        let mut expired = 0;
        for debris in &mut self.debris {
            debris.update(physics, limits);
            if debris.is_expired(now_ms) && debris.cleanup(physics) {
                expired += 1;
            }
        }
        self.debris.retain(|d| !d.is_removed());
        if expired > 0 {
            log::debug!("{expired} debris expired");
        }
        Ok(expired)
    }
}
