//! Fixed timestep simulation tick
//!
//! Advances the world deterministically: same seed, same commands, same dt
//! sequence gives the same world and the same event stream.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::damage::dispatch_contacts;
use super::events::SimEvent;
use super::explosive::{ExplosiveKind, FuseState};
use super::state::Simulation;
use super::tool::ToolKind;
use crate::error::Result;

/// External requests applied at the start of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    SpawnExplosive {
        kind: ExplosiveKind,
        position: Vec2,
        owner: Option<String>,
    },
    /// Enlarge the pickaxe; `None` uses the configured default duration
    Enlarge { duration_ms: Option<u64> },
    Equip(ToolKind),
    EquipRandom,
    /// Set the pickaxe velocity; the downward part is capped at terminal velocity
    Push { velocity: Vec2 },
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub commands: Vec<Command>,
}

impl TickInput {
    pub fn with(command: Command) -> Self {
        Self {
            commands: vec![command],
        }
    }
}

fn apply_command(state: &mut Simulation, command: &Command) -> Result<()> {
    let now = state.now_ms();
    match command {
        Command::SpawnExplosive { kind, position, owner } => {
            state.spawn_explosive(*kind, *position, owner.clone())?;
        }
        Command::Enlarge { duration_ms } => {
            let duration = duration_ms.unwrap_or(state.config.default_enlarge_ms);
            state.tool.enlarge(&mut state.physics, &state.config, duration, now)?;
        }
        Command::Equip(kind) => state.tool.equip(*kind, &state.atlas, &state.config)?,
        Command::EquipRandom => {
            state
                .tool
                .equip_random(&state.atlas, &state.config, &mut state.rng)?;
        }
        Command::Push { velocity } => {
            let capped = Vec2::new(velocity.x, velocity.y.min(state.config.terminal_velocity));
            state.physics.set_velocity(state.tool.body, capped);
        }
    }
    Ok(())
}

/// Advance the simulation by one timestep
pub fn tick(state: &mut Simulation, input: &TickInput, dt: f32) -> Result<()> {
    state.time_ticks += 1;
    state.elapsed += f64::from(dt);

    for command in &input.commands {
        apply_command(state, command)?;
    }

    let contacts = state.physics.step(dt);
    dispatch_contacts(state, &contacts)?;

    let now = state.now_ms();
    let limits = state.limits();

    let expired = state.tool.update(&mut state.physics, &limits, now)?;
    if expired > 0 {
        state.events.push(SimEvent::DebrisExpired { count: expired });
    }

    let first_new = state.events.len();
    for explosive in &mut state.explosives {
        explosive.update(
            &mut state.physics,
            &mut state.grid,
            &state.config,
            &limits,
            now,
            &mut state.events,
        );
    }
    state.explosives.retain(|e| e.state() != FuseState::Removed);
    for event in &state.events[first_new..] {
        if let SimEvent::CameraShake(request) = event {
            state.camera.shake(*request);
        }
    }

    for block in state.grid.sweep_destroyed(&mut state.physics) {
        state.events.push(SimEvent::BlockDestroyed {
            pos: block.pos,
            material: block.material,
            center: block.center,
        });
    }

    let target_y = state
        .physics
        .body(state.tool.body)
        .map_or(state.camera.offset.y, |b| b.position.y);
    state.camera.update(
        target_y,
        state.config.viewport_height,
        state.config.camera_smoothing,
        &mut state.rng,
    );
    Ok(())
}
