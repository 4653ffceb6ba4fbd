//! Contact-to-damage translation
//!
//! Contacts are dispatched in the order the physics step resolved them.
//! Every tool-block contact deals the tool's damage once, so a resting tool
//! keeps chipping at the block on every step (and every substep) it touches.

use rand::Rng;

use super::events::SimEvent;
use super::explosive::Explosive;
use super::grid::WorldGrid;
use super::state::Simulation;
use super::tool::Pickaxe;
use crate::audio::SoundCue;
use crate::consts::HIT_PERTURBATION;
use crate::error::Result;
use crate::physics::{CollisionType, ContactEvent, PhysicsWorld, ShapeHandle};
use crate::settings::SimConfig;

/// Apply one tool hit to the block behind `block_shape`.
///
/// Returns false when the shape no longer maps to an intact block; such a hit
/// changes nothing.
#[allow(clippy::too_many_arguments)]
pub fn tool_hit_block(
    physics: &mut PhysicsWorld,
    grid: &mut WorldGrid,
    tool: &mut Pickaxe,
    config: &SimConfig,
    block_shape: ShapeHandle,
    now_ms: u64,
    rng: &mut impl Rng,
    events: &mut Vec<SimEvent>,
) -> Result<bool> {
    let Some(id) = grid.resolve_shape(physics, block_shape) else {
        return Ok(false);
    };
    let Some(block) = grid.get_mut(id) else {
        return Ok(false);
    };
    if !block.is_live() {
        return Ok(false);
    }

    block.first_hit_ms = Some(now_ms);
    block.last_heal_ms = Some(now_ms);
    let broke = block.apply_damage(tool.damage);
    let center = block.center;
    let grass = config.grass_sound_materials.contains(&block.material);
    let releases_debris = broke && block.material == config.debris_material;

    if releases_debris {
        tool.spawn_debris(physics, config, center, now_ms, rng)?;
        events.push(SimEvent::DebrisSpawned { position: center });
    }
    events.push(SimEvent::Sound(SoundCue::hit(grass, rng)));
    tool.perturb(physics, rng);
    Ok(true)
}

/// Explosive touching a block: cosmetic twist only
pub fn explosive_touch_block(
    physics: &mut PhysicsWorld,
    explosives: &[Explosive],
    explosive_shape: ShapeHandle,
    rng: &mut impl Rng,
) {
    let Some(explosive) = explosives.iter().find(|e| e.shape == explosive_shape) else {
        return;
    };
    let twist = if rng.random_bool(0.5) {
        HIT_PERTURBATION
    } else {
        -HIT_PERTURBATION
    };
    physics.rotate(explosive.body, twist);
}

/// Route every handled contact from this step
pub fn dispatch_contacts(state: &mut Simulation, contacts: &[ContactEvent]) -> Result<()> {
    let now = state.now_ms();
    let Simulation {
        config,
        physics,
        grid,
        tool,
        explosives,
        rng,
        events,
        ..
    } = state;

    for contact in contacts {
        match contact.types {
            (CollisionType::TOOL, CollisionType::BLOCK) => {
                tool_hit_block(physics, grid, tool, config, contact.shapes.1, now, rng, events)?;
            }
            (CollisionType::EXPLOSIVE, CollisionType::BLOCK) => {
                explosive_touch_block(physics, explosives, contact.shapes.0, rng);
            }
            _ => {}
        }
    }
    Ok(())
}
