//! Simulation state
//!
//! Everything one tick reads or writes lives here and is passed explicitly;
//! there is no ambient world state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bounds::Limits;
use super::camera::Camera;
use super::events::SimEvent;
use super::explosive::{Explosive, ExplosiveKind};
use super::grid::WorldGrid;
use super::tool::{Pickaxe, ToolKind};
use crate::atlas::TextureAtlas;
use crate::audio::SoundCue;
use crate::error::Result;
use crate::physics::PhysicsWorld;
use crate::settings::SimConfig;

#[derive(Debug)]
pub struct Simulation {
    pub config: SimConfig,
    pub atlas: TextureAtlas,
    pub physics: PhysicsWorld,
    pub grid: WorldGrid,
    pub tool: Pickaxe,
    /// Explosives that have not been removed yet, in spawn order
    pub explosives: Vec<Explosive>,
    pub camera: Camera,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds since start
    pub(crate) elapsed: f64,
    pub(crate) events: Vec<SimEvent>,
    next_id: u32,
}

impl Simulation {
    /// Empty world with a wooden pickaxe at `tool_position`
    pub fn new(config: SimConfig, atlas: TextureAtlas, seed: u64, tool_position: Vec2) -> Result<Self> {
        config.validate()?;
        let mut physics = PhysicsWorld::new(config.gravity, config.substeps).with_length_unit(config.block_size);
        let grid = WorldGrid::new(&config);
        let tool = Pickaxe::new(&mut physics, &config, &atlas, ToolKind::Wooden, tool_position)?;
        log::info!("Simulation created with seed {seed}");

        Ok(Self {
            config,
            atlas,
            physics,
            grid,
            tool,
            explosives: Vec::new(),
            camera: Camera::new(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            elapsed: 0.0,
            events: Vec::new(),
            next_id: 1,
        })
    }

    /// Simulation clock in milliseconds
    pub fn now_ms(&self) -> u64 {
        (self.elapsed * 1000.0) as u64
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn limits(&self) -> Limits {
        Limits::from_config(&self.config)
    }

    /// Fill a chunk; `material_at(row, col)` returns `None` for air
    pub fn populate_chunk<'a>(
        &mut self,
        chunk: i32,
        material_at: impl FnMut(u32, u32) -> Option<&'a str>,
    ) -> Result<usize> {
        self.grid
            .populate_chunk(&mut self.physics, &self.config, chunk, material_at)
    }

    /// Drop a fresh explosive into the world and light its fuse
    pub fn spawn_explosive(&mut self, kind: ExplosiveKind, position: Vec2, owner: Option<String>) -> Result<u32> {
        let id = self.next_entity_id();
        let now = self.now_ms();
        let explosive = Explosive::spawn(
            &mut self.physics,
            &self.config,
            &self.atlas,
            id,
            kind,
            position,
            owner,
            now,
        )?;
        self.explosives.push(explosive);
        self.events.push(SimEvent::Sound(SoundCue::Fuse));
        Ok(id)
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}
