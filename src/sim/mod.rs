//! Destructible-terrain simulation
//!
//! One tick runs in a fixed order on a single thread:
//! - Apply queued commands
//! - Step physics; dispatch contacts (damage, debris)
//! - Update the tool (and its debris) and every explosive exactly once
//! - Sweep broken blocks out of the grid and the physics world
//! - Update the camera

pub mod bounds;
pub mod camera;
pub mod damage;
pub mod debris;
pub mod events;
pub mod explosive;
pub mod grid;
pub mod state;
pub mod tick;
pub mod tool;

pub use bounds::{Limits, enforce_limits};
pub use camera::{Camera, ShakeRequest};
pub use debris::Debris;
pub use events::SimEvent;
pub use explosive::{Explosive, ExplosiveKind, FuseState, apply_explosion, explosion_damage};
pub use grid::{Block, BlockId, GridPos, RemovedBlock, WorldGrid};
pub use state::Simulation;
pub use tick::{Command, TickInput, tick};
pub use tool::{Pickaxe, ToolKind};

/// Every sprite the simulation looks up
pub fn required_sprites() -> impl Iterator<Item = (crate::atlas::AtlasCategory, &'static str)> {
    use crate::atlas::AtlasCategory;
    [ExplosiveKind::Tnt, ExplosiveKind::MegaTnt]
        .into_iter()
        .map(|k| (AtlasCategory::Block, k.atlas_name()))
        .chain(ToolKind::ALL.into_iter().map(|k| (AtlasCategory::Pickaxe, k.atlas_name())))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::atlas::TextureAtlas;
    use crate::physics::PhysicsWorld;
    use crate::settings::SimConfig;

    /// Block-sized sprites for every required name
    pub fn atlas() -> TextureAtlas {
        TextureAtlas::uniform(super::required_sprites(), 100)
    }

    pub fn physics(config: &SimConfig) -> PhysicsWorld {
        PhysicsWorld::new(config.gravity, config.substeps).with_length_unit(config.block_size)
    }
}
