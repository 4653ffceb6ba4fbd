//! Static simulation configuration
//!
//! Loaded once from JSON and consumed read-only by the simulation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Per-material block properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Hit points a fresh block of this material starts with
    pub max_hp: i32,
}

fn default_materials() -> BTreeMap<String, MaterialDef> {
    [
        ("grass_block", 6),
        ("dirt", 6),
        ("stone", 20),
        ("coal_ore", 24),
        ("iron_ore", 30),
        ("gold_ore", 36),
        ("diamond_ore", 50),
        ("obsidian", 100),
    ]
    .into_iter()
    .map(|(name, max_hp)| (name.to_string(), MaterialDef { max_hp }))
    .collect()
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === World ===
    /// Edge length of a block in world units
    pub block_size: f32,
    /// Columns per chunk row (outermost columns are the world walls)
    pub chunk_width: u32,
    /// Rows per chunk
    pub chunk_height: u32,

    // === Physics ===
    /// Gravity (world units/s², +y is down)
    pub gravity: Vec2,
    /// Maximum downward speed
    pub terminal_velocity: f32,
    /// Physics substeps per tick. Every substep can report contacts, so
    /// sustained tool contact deals damage up to this many times per tick.
    pub substeps: u32,

    // === Timers (ms) ===
    pub fuse_ms: u64,
    pub debris_ttl_ms: u64,
    pub default_enlarge_ms: u64,
    /// Uniform hitbox and sprite scale while enlarged
    pub enlarge_factor: f32,

    // === Camera ===
    pub camera_smoothing: f32,
    pub viewport_height: f32,

    // === Materials ===
    /// Breaking a block of this material releases one debris pickaxe
    pub debris_material: String,
    /// Materials that use the grass sound family (others sound like stone)
    pub grass_sound_materials: BTreeSet<String>,
    pub materials: BTreeMap<String, MaterialDef>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            block_size: 100.0,
            chunk_width: 10,
            chunk_height: 10,

            gravity: Vec2::new(0.0, 900.0),
            terminal_velocity: 1000.0,
            substeps: 1,

            fuse_ms: 4000,
            debris_ttl_ms: 120_000,
            default_enlarge_ms: 5000,
            enlarge_factor: 3.0,

            camera_smoothing: 0.1,
            viewport_height: 720.0,

            debris_material: "obsidian".to_string(),
            grass_sound_materials: ["grass_block", "dirt"]
                .into_iter()
                .map(String::from)
                .collect(),
            materials: default_materials(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.block_size.is_finite() && self.block_size > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "block_size must be positive, got {}",
                self.block_size
            )));
        }
        if self.chunk_width < 3 {
            return Err(SimError::InvalidConfig(
                "chunk_width must leave room between the two wall columns".into(),
            ));
        }
        if self.chunk_height == 0 {
            return Err(SimError::InvalidConfig("chunk_height must be non-zero".into()));
        }
        if self.substeps == 0 {
            return Err(SimError::InvalidConfig("substeps must be at least 1".into()));
        }
        if self.enlarge_factor <= 0.0 {
            return Err(SimError::InvalidConfig("enlarge_factor must be positive".into()));
        }
        if let Some((name, _)) = self.materials.iter().find(|(_, m)| m.max_hp <= 0) {
            return Err(SimError::InvalidConfig(format!(
                "material {name} must have positive max_hp"
            )));
        }
        Ok(())
    }

    /// Material properties by name
    pub fn material(&self, name: &str) -> Result<&MaterialDef> {
        self.materials
            .get(name)
            .ok_or_else(|| SimError::UnknownMaterial(name.to_string()))
    }

    /// Leftmost x any body may reach (inner edge of the left wall)
    pub fn left_bound(&self) -> f32 {
        self.block_size
    }

    /// Rightmost x any body may reach (inner edge of the right wall)
    pub fn right_bound(&self) -> f32 {
        self.block_size * (self.chunk_width as f32 - 1.0)
    }

    /// Explosion radius for a variant multiplier
    pub fn explosion_radius(&self, scale: f32) -> f32 {
        crate::consts::EXPLOSION_RADIUS_BLOCKS * self.block_size * scale
    }
}
