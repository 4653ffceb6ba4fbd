//! Chunked block storage and shape-to-block resolution
//!
//! Blocks live in a generational table owned by the grid. Each block's
//! physics shape carries the packed `BlockId` as user data, so a contact
//! resolves back to its block in O(1), and a shape left over from a removed
//! block resolves to nothing instead of a stale block.

use std::collections::BTreeMap;

use glam::Vec2;
use rapier2d::data::{Arena, Index};
use serde::{Deserialize, Serialize};

use crate::consts::{BLOCK_ELASTICITY, BLOCK_FRICTION};
use crate::error::{Result, SimError};
use crate::physics::{BodyDef, BodyHandle, CollisionType, PhysicsWorld, ShapeDef, ShapeHandle};
use crate::settings::SimConfig;

/// Stable reference to a block in the grid's table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(Index);

impl BlockId {
    /// Generation in the high half, slot in the low half
    pub fn to_user_data(self) -> u64 {
        let (slot, generation) = self.0.into_raw_parts();
        (u64::from(generation) << 32) | u64::from(slot)
    }

    pub fn from_user_data(bits: u64) -> Self {
        Self(Index::from_raw_parts(bits as u32, (bits >> 32) as u32))
    }
}

/// Cell address: chunk index, then row and column within the chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub chunk: i32,
    pub row: u32,
    pub col: u32,
}

impl GridPos {
    pub fn new(chunk: i32, row: u32, col: u32) -> Self {
        Self { chunk, row, col }
    }
}

/// A destructible cell
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    pub pos: GridPos,
    pub material: String,
    pub hp: i32,
    pub max_hp: i32,
    pub destroyed: bool,
    /// Last tool hit (ms); read by regeneration outside this crate
    pub first_hit_ms: Option<u64>,
    pub last_heal_ms: Option<u64>,
    /// World-space centre
    pub center: Vec2,
    pub body: BodyHandle,
    pub shape: ShapeHandle,
}

impl Block {
    /// Still intact and eligible for damage
    pub fn is_live(&self) -> bool {
        !self.destroyed && self.hp > 0
    }

    /// Subtract hit points. Returns true when this hit broke the block.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if !self.is_live() {
            return false;
        }
        self.hp -= amount;
        self.hp <= 0
    }
}

/// Fixed-height horizontal slice of the grid, row-major
#[derive(Debug, Clone)]
struct Chunk {
    cells: Vec<Option<BlockId>>,
}

/// What was swept out of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedBlock {
    pub id: BlockId,
    pub pos: GridPos,
    pub material: String,
    pub center: Vec2,
}

#[derive(Debug, Clone)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    block_size: f32,
    chunks: BTreeMap<i32, Chunk>,
    blocks: Arena<Block>,
}

impl WorldGrid {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            width: config.chunk_width,
            height: config.chunk_height,
            block_size: config.block_size,
            chunks: BTreeMap::new(),
            blocks: Arena::new(),
        }
    }

    /// World-space centre of a cell
    pub fn cell_center(&self, pos: GridPos) -> Vec2 {
        let row = pos.chunk as f32 * self.height as f32 + pos.row as f32;
        Vec2::new(
            pos.col as f32 * self.block_size + self.block_size / 2.0,
            row * self.block_size + self.block_size / 2.0,
        )
    }

    fn cell_index(&self, pos: GridPos) -> Result<usize> {
        if pos.row >= self.height || pos.col >= self.width {
            return Err(SimError::CellOutOfRange {
                row: pos.row,
                col: pos.col,
            });
        }
        Ok((pos.row * self.width + pos.col) as usize)
    }

    /// Create a block (static body + category-2 box) at `pos`, replacing
    /// whatever occupied the cell
    pub fn insert_block(
        &mut self,
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        pos: GridPos,
        material: &str,
    ) -> Result<BlockId> {
        let max_hp = config.material(material)?.max_hp;
        let cell = self.cell_index(pos)?;
        if let Some(old) = self.chunks.get(&pos.chunk).and_then(|c| c.cells[cell]) {
            self.remove_block(physics, old);
        }

        let center = self.cell_center(pos);
        let def = ShapeDef::box_shape(Vec2::splat(self.block_size))?
            .with_material(BLOCK_ELASTICITY, BLOCK_FRICTION)
            .with_collision_type(CollisionType::BLOCK);
        let body = physics.add_body(BodyDef::fixed().at(center))?;
        let shape = physics.add_shape(body, def, None)?;

        let index = self.blocks.insert(Block {
            id: BlockId(Index::from_raw_parts(0, 0)),
            pos,
            material: material.to_string(),
            hp: max_hp,
            max_hp,
            destroyed: false,
            first_hit_ms: None,
            last_heal_ms: None,
            center,
            body,
            shape,
        });
        let id = BlockId(index);
        if let Some(block) = self.blocks.get_mut(index) {
            block.id = id;
        }
        physics.set_user_data(shape, Some(id.to_user_data()));

        let size = (self.width * self.height) as usize;
        let chunk = self
            .chunks
            .entry(pos.chunk)
            .or_insert_with(|| Chunk {
                cells: vec![None; size],
            });
        chunk.cells[cell] = Some(id);
        Ok(id)
    }

    /// Fill a chunk cell by cell; `material_at(row, col)` returns `None` for air
    pub fn populate_chunk<'a>(
        &mut self,
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        chunk: i32,
        mut material_at: impl FnMut(u32, u32) -> Option<&'a str>,
    ) -> Result<usize> {
        let mut count = 0;
        for row in 0..self.height {
            for col in 0..self.width {
                if let Some(material) = material_at(row, col) {
                    self.insert_block(physics, config, GridPos::new(chunk, row, col), material)?;
                    count += 1;
                }
            }
        }
        log::debug!("Populated chunk {chunk} with {count} blocks");
        Ok(count)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0)
    }

    pub fn block_at(&self, pos: GridPos) -> Option<&Block> {
        let cell = self.cell_index(pos).ok()?;
        let id = self.chunks.get(&pos.chunk)?.cells[cell]?;
        self.get(id)
    }

    /// Block a physics shape stands for, if it is still in the grid
    pub fn resolve_shape(&self, physics: &PhysicsWorld, shape: ShapeHandle) -> Option<BlockId> {
        let bits = physics.user_data(shape)?;
        let block = self.get(BlockId::from_user_data(bits))?;
        (block.shape == shape).then_some(block.id)
    }

    /// Every block that is not destroyed
    pub fn iter_live(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().map(|(_, b)| b).filter(|b| !b.destroyed)
    }

    pub fn iter_live_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut().map(|(_, b)| b).filter(|b| !b.destroyed)
    }

    /// Number of blocks currently in the grid
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn remove_block(&mut self, physics: &mut PhysicsWorld, id: BlockId) -> Option<RemovedBlock> {
        let mut block = self.blocks.remove(id.0)?;
        block.destroyed = true;
        physics.remove_body(block.body);
        if let Some(chunk) = self.chunks.get_mut(&block.pos.chunk) {
            let cell = (block.pos.row * self.width + block.pos.col) as usize;
            if chunk.cells[cell] == Some(id) {
                chunk.cells[cell] = None;
            }
        }
        Some(RemovedBlock {
            id,
            pos: block.pos,
            material: block.material,
            center: block.center,
        })
    }

    /// Remove every block at or below zero hp from the grid and the physics world
    pub fn sweep_destroyed(&mut self, physics: &mut PhysicsWorld) -> Vec<RemovedBlock> {
        let broken: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|(_, b)| !b.is_live())
            .map(|(_, b)| b.id)
            .collect();

        let removed: Vec<RemovedBlock> = broken
            .into_iter()
            .filter_map(|id| self.remove_block(physics, id))
            .collect();
        for block in &removed {
            log::debug!("Destroyed {} at {:?}", block.material, block.pos);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SimConfig, PhysicsWorld, WorldGrid) {
        let config = SimConfig::default();
        let physics = crate::sim::testing::physics(&config);
        let grid = WorldGrid::new(&config);
        (config, physics, grid)
    }

    #[test]
    fn insert_registers_tagged_shape() {
        let (config, mut physics, mut grid) = setup();
        let pos = GridPos::new(0, 2, 3);
        let id = grid.insert_block(&mut physics, &config, pos, "stone").unwrap();
        let block = grid.get(id).unwrap();
        assert_eq!(block.hp, 20);
        assert_eq!(block.center, Vec2::new(350.0, 250.0));
        assert_eq!(grid.resolve_shape(&physics, block.shape), Some(id));
        assert_eq!(
            physics.collision_type(block.shape),
            Some(CollisionType::BLOCK)
        );
        assert_eq!(grid.block_at(pos).map(|b| b.id), Some(id));
    }

    #[test]
    fn stale_user_data_resolves_to_nothing() {
        let (config, mut physics, mut grid) = setup();
        let id = grid
            .insert_block(&mut physics, &config, GridPos::new(0, 0, 1), "dirt")
            .unwrap();
        assert_eq!(BlockId::from_user_data(id.to_user_data()), id);

        let shape = grid.get(id).unwrap().shape;
        grid.get_mut(id).unwrap().apply_damage(100);
        grid.sweep_destroyed(&mut physics);
        // The slot gets reused with a new generation
        let next = grid
            .insert_block(&mut physics, &config, GridPos::new(0, 0, 2), "dirt")
            .unwrap();
        assert_ne!(next, id);
        assert!(grid.get(id).is_none());
        assert_eq!(grid.resolve_shape(&physics, shape), None);
    }

    #[test]
    fn chunk_offsets_rows() {
        let (_, _, grid) = setup();
        assert_eq!(grid.cell_center(GridPos::new(1, 0, 0)), Vec2::new(50.0, 1050.0));
    }

    #[test]
    fn unknown_material_and_bad_cell_fail() {
        let (config, mut physics, mut grid) = setup();
        assert!(matches!(
            grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 0), "lava"),
            Err(SimError::UnknownMaterial(_))
        ));
        assert!(matches!(
            grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 10), "stone"),
            Err(SimError::CellOutOfRange { .. })
        ));
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn sweep_removes_broken_blocks_everywhere() {
        let (config, mut physics, mut grid) = setup();
        let pos = GridPos::new(0, 0, 1);
        let id = grid.insert_block(&mut physics, &config, pos, "dirt").unwrap();
        let shape = grid.get(id).unwrap().shape;
        grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 2), "dirt").unwrap();

        assert!(grid.get_mut(id).unwrap().apply_damage(6));
        let removed = grid.sweep_destroyed(&mut physics);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, id);
        assert!(grid.get(id).is_none());
        assert!(grid.block_at(pos).is_none());
        assert!(!physics.contains_shape(shape));
        assert_eq!(grid.resolve_shape(&physics, shape), None);
        assert_eq!(grid.len(), 1);

        // Nothing left to sweep
        assert!(grid.sweep_destroyed(&mut physics).is_empty());
    }

    #[test]
    fn broken_block_takes_no_more_damage() {
        let (config, mut physics, mut grid) = setup();
        let id = grid
            .insert_block(&mut physics, &config, GridPos::new(0, 0, 1), "dirt")
            .unwrap();
        let block = grid.get_mut(id).unwrap();
        assert!(!block.apply_damage(4));
        assert!(block.apply_damage(4));
        assert_eq!(block.hp, -2);
        assert!(!block.apply_damage(4));
        assert_eq!(block.hp, -2);
    }

    #[test]
    fn replacing_a_cell_releases_the_old_block() {
        let (config, mut physics, mut grid) = setup();
        let pos = GridPos::new(0, 0, 1);
        let first = grid.insert_block(&mut physics, &config, pos, "dirt").unwrap();
        let second = grid.insert_block(&mut physics, &config, pos, "stone").unwrap();
        assert!(grid.get(first).is_none());
        assert_eq!(grid.block_at(pos).unwrap().id, second);
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn populate_fills_requested_cells() {
        let (config, mut physics, mut grid) = setup();
        let count = grid
            .populate_chunk(&mut physics, &config, 0, |row, _| (row >= 5).then_some("stone"))
            .unwrap();
        assert_eq!(count, 50);
        assert_eq!(grid.iter_live().count(), 50);
    }
}
