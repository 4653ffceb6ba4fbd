//! Timed explosives and the area-damage sweep
//!
//! An explosive is Armed until its fuse runs out, performs exactly one sweep
//! when it detonates, and leaves the physics world on the following update.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bounds::{Limits, enforce_limits};
use super::camera::ShakeRequest;
use super::events::SimEvent;
use super::grid::WorldGrid;
use crate::atlas::{AtlasCategory, Sprite, TextureAtlas};
use crate::consts::{EXPLOSION_BASE_DAMAGE, EXPLOSIVE_ELASTICITY, EXPLOSIVE_FRICTION, MEGA_TNT_MASS, TNT_MASS};
use crate::error::Result;
use crate::physics::{BodyDef, BodyHandle, CollisionType, PhysicsWorld, ShapeDef, ShapeHandle, moment_for_poly};
use crate::settings::SimConfig;

/// Explosive variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosiveKind {
    Tnt,
    MegaTnt,
}

impl ExplosiveKind {
    pub fn atlas_name(&self) -> &'static str {
        match self {
            ExplosiveKind::Tnt => "tnt",
            ExplosiveKind::MegaTnt => "mega_tnt",
        }
    }

    /// Multiplies sprite size, radius and peak damage
    pub fn scale(&self) -> f32 {
        match self {
            ExplosiveKind::Tnt => 1.0,
            ExplosiveKind::MegaTnt => 2.0,
        }
    }

    pub fn mass(&self) -> f32 {
        match self {
            ExplosiveKind::Tnt => TNT_MASS,
            ExplosiveKind::MegaTnt => MEGA_TNT_MASS,
        }
    }

    pub fn particle_count(&self) -> u32 {
        match self {
            ExplosiveKind::Tnt => 20,
            ExplosiveKind::MegaTnt => 40,
        }
    }

    pub fn shake(&self) -> ShakeRequest {
        match self {
            ExplosiveKind::Tnt => ShakeRequest::new(10, 10.0),
            ExplosiveKind::MegaTnt => ShakeRequest::new(15, 30.0).with_bias(Vec2::new(0.0, 2.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseState {
    Armed,
    /// Swept; body still registered until the next update
    Detonated,
    /// Gone from the physics world; drop from the collection
    Removed,
}

/// Falloff damage at `distance`, or `None` outside the radius.
/// Computed in f64 so whole-number distances floor to the exact quotient.
pub fn explosion_damage(distance: f32, radius: f32, scale: f32) -> Option<i32> {
    if distance > radius {
        return None;
    }
    let (distance, radius) = (f64::from(distance), f64::from(radius));
    let peak = f64::from(EXPLOSION_BASE_DAMAGE) * f64::from(scale);
    Some((peak * (radius - distance) / radius).floor() as i32)
}

/// Damage every intact block within `radius` of `center`.
/// Returns how many blocks were inside the blast.
pub fn apply_explosion(grid: &mut WorldGrid, center: Vec2, radius: f32, scale: f32) -> usize {
    let mut hit = 0;
    for block in grid.iter_live_mut() {
        if !block.is_live() {
            continue;
        }
        if let Some(damage) = explosion_damage(block.center.distance(center), radius, scale) {
            block.apply_damage(damage);
            hit += 1;
        }
    }
    hit
}

#[derive(Debug, Clone)]
pub struct Explosive {
    pub id: u32,
    pub kind: ExplosiveKind,
    pub body: BodyHandle,
    pub shape: ShapeHandle,
    pub sprite: Sprite,
    pub spawned_ms: u64,
    pub fuse_ms: u64,
    /// Who requested it (shown above the sprite)
    pub owner: Option<String>,
    state: FuseState,
}

impl Explosive {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        physics: &mut PhysicsWorld,
        config: &SimConfig,
        atlas: &TextureAtlas,
        id: u32,
        kind: ExplosiveKind,
        position: Vec2,
        owner: Option<String>,
        now_ms: u64,
    ) -> Result<Self> {
        let sprite = atlas
            .sprite(AtlasCategory::Block, kind.atlas_name())?
            .scaled_by(kind.scale());
        let def = ShapeDef::box_shape(sprite.draw_size)?
            .with_material(EXPLOSIVE_ELASTICITY, EXPLOSIVE_FRICTION)
            .with_collision_type(CollisionType::EXPLOSIVE);
        let inertia = moment_for_poly(kind.mass(), &def.vertices);
        let body = physics.add_body(BodyDef::dynamic(kind.mass(), inertia).at(position).with_ccd())?;
        let shape = physics.add_shape(body, def, Some(u64::from(id)))?;
        physics.add_collision_handler(CollisionType::EXPLOSIVE, CollisionType::BLOCK);

        log::info!(
            "Spawning {} #{id} for {}",
            kind.atlas_name(),
            owner.as_deref().unwrap_or("nobody")
        );
        Ok(Self {
            id,
            kind,
            body,
            shape,
            sprite,
            spawned_ms: now_ms,
            fuse_ms: config.fuse_ms,
            owner,
            state: FuseState::Armed,
        })
    }

    pub fn state(&self) -> FuseState {
        self.state
    }

    pub fn is_detonated(&self) -> bool {
        self.state != FuseState::Armed
    }

    /// Sweep the blast area once. Later calls do nothing and return `None`.
    pub fn detonate(
        &mut self,
        physics: &PhysicsWorld,
        grid: &mut WorldGrid,
        config: &SimConfig,
        events: &mut Vec<SimEvent>,
    ) -> Option<usize> {
        if self.state != FuseState::Armed {
            return None;
        }
        self.state = FuseState::Detonated;

        let center = physics.body(self.body).map(|b| b.position)?;
        let scale = self.kind.scale();
        let hit = apply_explosion(grid, center, config.explosion_radius(scale), scale);

        events.push(SimEvent::Explosion {
            position: center,
            particle_count: self.kind.particle_count(),
        });
        events.push(SimEvent::CameraShake(self.kind.shake()));
        log::info!("{} #{} detonated, {hit} blocks in range", self.kind.atlas_name(), self.id);
        Some(hit)
    }

    /// Post-step update: limits and fuse while armed, removal once detonated
    pub fn update(
        &mut self,
        physics: &mut PhysicsWorld,
        grid: &mut WorldGrid,
        config: &SimConfig,
        limits: &Limits,
        now_ms: u64,
        events: &mut Vec<SimEvent>,
    ) -> FuseState {
        match self.state {
            FuseState::Removed => {}
            FuseState::Detonated => {
                physics.remove_body(self.body);
                self.state = FuseState::Removed;
            }
            FuseState::Armed => {
                enforce_limits(physics, self.body, &[self.shape], limits);
                if now_ms.saturating_sub(self.spawned_ms) >= self.fuse_ms {
                    self.detonate(physics, grid, config, events);
                }
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::GridPos;
    use crate::sim::testing::{atlas, physics};
    use proptest::prelude::*;

    #[test]
    fn falloff_matches_reference_points() {
        assert_eq!(explosion_damage(150.0, 300.0, 1.0), Some(50));
        assert_eq!(explosion_damage(300.0, 300.0, 1.0), Some(0));
        assert_eq!(explosion_damage(301.0, 300.0, 1.0), None);
        assert_eq!(explosion_damage(0.0, 300.0, 1.0), Some(100));
        assert_eq!(explosion_damage(300.0, 600.0, 2.0), Some(100));
    }

    #[test]
    fn whole_distances_floor_to_the_exact_quotient() {
        for d in 0..=300 {
            let expected = 100 * (300 - d) / 300;
            assert_eq!(explosion_damage(d as f32, 300.0, 1.0), Some(expected), "distance {d}");
        }
        for d in 0..=600 {
            let expected = 200 * (600 - d) / 600;
            assert_eq!(explosion_damage(d as f32, 600.0, 2.0), Some(expected), "mega distance {d}");
        }
    }

    #[test]
    fn armed_explosive_is_pushed_back_inside_the_walls() {
        let config = SimConfig::default();
        let mut physics = physics(&config);
        let mut grid = WorldGrid::new(&config);
        let limits = Limits::from_config(&config);
        let mut events = Vec::new();

        let mut left = Explosive::spawn(&mut physics, &config, &atlas(), 1, ExplosiveKind::Tnt, Vec2::new(30.0, 0.0), None, 0)
            .unwrap();
        left.update(&mut physics, &mut grid, &config, &limits, 16, &mut events);
        let (min_x, _) = physics.x_extent(&[left.shape]).unwrap();
        assert!((min_x - limits.left).abs() < 1e-3);

        let mut mega =
            Explosive::spawn(&mut physics, &config, &atlas(), 2, ExplosiveKind::MegaTnt, Vec2::new(880.0, 0.0), None, 0)
                .unwrap();
        mega.update(&mut physics, &mut grid, &config, &limits, 16, &mut events);
        let (_, max_x) = physics.x_extent(&[mega.shape]).unwrap();
        assert!((max_x - limits.right).abs() < 1e-3);
        assert!(events.is_empty());
    }

    #[test]
    fn sweep_only_touches_blocks_in_range() {
        let config = SimConfig::default();
        let mut physics = physics(&config);
        let mut grid = WorldGrid::new(&config);
        // Row 0: centres at x = 150, 450, 750 (y = 50)
        let near = grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 1), "obsidian").unwrap();
        let mid = grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 4), "obsidian").unwrap();
        let far = grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 7), "obsidian").unwrap();

        let hit = apply_explosion(&mut grid, Vec2::new(150.0, 50.0), 300.0, 1.0);
        assert_eq!(hit, 2);
        assert_eq!(grid.get(near).unwrap().hp, 0);
        assert_eq!(grid.get(mid).unwrap().hp, 100);
        assert_eq!(grid.get(far).unwrap().hp, 100);
    }

    #[test]
    fn mega_variant_doubles_size() {
        let config = SimConfig::default();
        let mut physics = physics(&config);
        let tnt = Explosive::spawn(&mut physics, &config, &atlas(), 1, ExplosiveKind::MegaTnt, Vec2::new(500.0, 0.0), None, 0)
            .unwrap();
        assert_eq!(tnt.sprite.draw_size, Vec2::splat(200.0));
        assert_eq!(
            physics.collision_type(tnt.shape),
            Some(CollisionType::EXPLOSIVE)
        );
    }

    #[test]
    fn fuse_then_single_sweep_then_removal() {
        let config = SimConfig::default();
        let mut physics = physics(&config);
        let mut grid = WorldGrid::new(&config);
        let limits = Limits::from_config(&config);
        let block = grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 5), "obsidian").unwrap();
        let mut tnt = Explosive::spawn(
            &mut physics,
            &config,
            &atlas(),
            1,
            ExplosiveKind::Tnt,
            Vec2::new(550.0, -100.0),
            Some("viewer".into()),
            0,
        )
        .unwrap();
        let mut events = Vec::new();

        assert_eq!(tnt.update(&mut physics, &mut grid, &config, &limits, 3999, &mut events), FuseState::Armed);
        assert!(events.is_empty());

        assert_eq!(tnt.update(&mut physics, &mut grid, &config, &limits, 4000, &mut events), FuseState::Detonated);
        let hp_after_blast = grid.get(block).unwrap().hp;
        assert!(hp_after_blast < 100);
        assert!(physics.contains_body(tnt.body));

        // Duplicate updates: removal happens once, no second sweep
        assert_eq!(tnt.update(&mut physics, &mut grid, &config, &limits, 4016, &mut events), FuseState::Removed);
        assert!(!physics.contains_body(tnt.body));
        assert_eq!(tnt.update(&mut physics, &mut grid, &config, &limits, 4032, &mut events), FuseState::Removed);
        assert_eq!(grid.get(block).unwrap().hp, hp_after_blast);

        let explosions = events.iter().filter(|e| matches!(e, SimEvent::Explosion { .. })).count();
        let shakes = events.iter().filter(|e| matches!(e, SimEvent::CameraShake(_))).count();
        assert_eq!((explosions, shakes), (1, 1));
        assert!(events.contains(&SimEvent::CameraShake(ShakeRequest::new(10, 10.0))));
    }

    #[test]
    fn explicit_detonate_is_idempotent() {
        let config = SimConfig::default();
        let mut physics = physics(&config);
        let mut grid = WorldGrid::new(&config);
        let block = grid.insert_block(&mut physics, &config, GridPos::new(0, 0, 5), "obsidian").unwrap();
        let mut tnt =
            Explosive::spawn(&mut physics, &config, &atlas(), 1, ExplosiveKind::Tnt, Vec2::new(550.0, 50.0), None, 0)
                .unwrap();
        let mut events = Vec::new();
        assert_eq!(tnt.detonate(&physics, &mut grid, &config, &mut events), Some(1));
        assert_eq!(tnt.detonate(&physics, &mut grid, &config, &mut events), None);
        assert_eq!(grid.get(block).unwrap().hp, 0);
        assert_eq!(events.len(), 2);
    }

    proptest! {
        #[test]
        fn damage_is_bounded_and_monotone(d1 in 0.0f32..300.0, d2 in 0.0f32..300.0, mega in any::<bool>()) {
            let scale = if mega { 2.0 } else { 1.0 };
            let radius = 300.0 * scale;
            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let a = explosion_damage(near * scale, radius, scale).unwrap();
            let b = explosion_damage(far * scale, radius, scale).unwrap();
            prop_assert!(a >= b);
            prop_assert!(b >= 0);
            prop_assert!(a as f32 <= 100.0 * scale);
        }
    }
}
