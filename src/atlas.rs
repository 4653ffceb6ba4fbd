//! Texture atlas regions
//!
//! The simulation only needs the geometry of each sprite (its rectangle in the
//! shared atlas surface); decoding and blitting belong to the renderer.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::ATLAS_WIDTH;
use crate::error::{Result, SimError};

/// Atlas sections, packed in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AtlasCategory {
    Block,
    Item,
    DestroyStage,
    Particle,
    Pickaxe,
}

impl AtlasCategory {
    pub const ALL: [AtlasCategory; 5] = [
        AtlasCategory::Block,
        AtlasCategory::Item,
        AtlasCategory::DestroyStage,
        AtlasCategory::Particle,
        AtlasCategory::Pickaxe,
    ];
}

/// A rectangle inside the atlas surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// A region plus the size it is drawn at. Copies share the atlas surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub region: Region,
    pub draw_size: Vec2,
}

impl Sprite {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            draw_size: region.size(),
        }
    }

    pub fn scaled_by(&self, factor: f32) -> Self {
        Self {
            region: self.region,
            draw_size: self.draw_size * factor,
        }
    }

    pub fn with_draw_size(&self, draw_size: Vec2) -> Self {
        Self {
            region: self.region,
            draw_size,
        }
    }
}

/// Named sprite regions, grouped by category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureAtlas {
    pub width: u32,
    pub height: u32,
    regions: BTreeMap<AtlasCategory, BTreeMap<String, Region>>,
}

impl TextureAtlas {
    /// Shelf-pack `(category, name, width, height)` entries.
    ///
    /// Entries are placed category by category, then by name, left to right;
    /// an entry that would overflow the atlas width starts a new row below the
    /// tallest entry of the current one.
    pub fn pack<'a>(entries: impl IntoIterator<Item = (AtlasCategory, &'a str, u32, u32)>) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut regions: BTreeMap<AtlasCategory, BTreeMap<String, Region>> = BTreeMap::new();
        let (mut x, mut y, mut row_height) = (0u32, 0u32, 0u32);

        for (category, name, width, height) in sorted {
            if x + width > ATLAS_WIDTH {
                x = 0;
                y += row_height;
                row_height = 0;
            }
            regions.entry(category).or_default().insert(
                name.to_string(),
                Region {
                    x,
                    y,
                    width,
                    height,
                },
            );
            x += width;
            row_height = row_height.max(height);
        }

        Self {
            width: ATLAS_WIDTH,
            height: y + row_height,
            regions,
        }
    }

    /// Pack square entries of one size
    pub fn uniform<'a>(entries: impl IntoIterator<Item = (AtlasCategory, &'a str)>, size: u32) -> Self {
        Self::pack(entries.into_iter().map(|(category, name)| (category, name, size, size)))
    }

    pub fn region(&self, category: AtlasCategory, name: &str) -> Result<Region> {
        self.regions
            .get(&category)
            .and_then(|names| names.get(name))
            .copied()
            .ok_or_else(|| SimError::UnknownTexture {
                category,
                name: name.to_string(),
            })
    }

    pub fn sprite(&self, category: AtlasCategory, name: &str) -> Result<Sprite> {
        self.region(category, name).map(Sprite::new)
    }

    /// Names registered under a category, in packing order
    pub fn names(&self, category: AtlasCategory) -> impl Iterator<Item = &str> {
        self.regions
            .get(&category)
            .into_iter()
            .flat_map(|names| names.keys().map(String::as_str))
    }
}
