//! Pickaxe Sim headless driver
//!
//! Builds a small world, drops a pickaxe and two explosives into it and runs
//! fixed ticks, logging what happened. Usage: `pickaxe-sim [config.json] [ticks]`

fn main() {
    env_logger::init();
    log::info!("Pickaxe Sim (native) starting...");

    if let Err(e) = native::run(std::env::args().skip(1).collect()) {
        log::error!("Simulation failed: {e}");
        std::process::exit(1);
    }
}

mod native {
    use std::collections::BTreeMap;

    use glam::Vec2;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use pickaxe_sim::atlas::TextureAtlas;
    use pickaxe_sim::consts::SIM_DT;
    use pickaxe_sim::sim::{Command, ExplosiveKind, SimEvent, Simulation, TickInput, required_sprites, tick};
    use pickaxe_sim::{Result, SimConfig, SimError};

    const DEFAULT_TICKS: u64 = 600;
    const CHUNKS: i32 = 3;
    const SEED: u64 = 0x5EED;

    /// Layered terrain: grass on top, dirt, stone with scattered ores, obsidian floor
    fn material_for(row: u32, chunk: i32, rng: &mut Pcg32, config: &SimConfig) -> &'static str {
        let depth = chunk * config.chunk_height as i32 + row as i32;
        match depth {
            0..=2 => "",
            3 => "grass_block",
            4..=5 => "dirt",
            _ if row == config.chunk_height - 1 && chunk == CHUNKS - 1 => "obsidian",
            _ => match rng.random_range(0..20) {
                0 => "coal_ore",
                1 => "iron_ore",
                2 => "gold_ore",
                3 => "diamond_ore",
                _ => "stone",
            },
        }
    }

    pub fn run(args: Vec<String>) -> Result<()> {
        let config = match args.first() {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        let ticks = match args.get(1) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| SimError::InvalidConfig(format!("tick count {raw:?}: {e}")))?,
            None => DEFAULT_TICKS,
        };

        let atlas = TextureAtlas::uniform(required_sprites(), config.block_size as u32);
        let center_x = config.block_size * config.chunk_width as f32 / 2.0;
        let mut sim = Simulation::new(config.clone(), atlas, SEED, Vec2::new(center_x, config.block_size))?;

        let mut terrain_rng = Pcg32::seed_from_u64(SEED);
        for chunk in 0..CHUNKS {
            let placed = sim.populate_chunk(chunk, |row, _col| {
                Some(material_for(row, chunk, &mut terrain_rng, &config)).filter(|m| !m.is_empty())
            })?;
            log::info!("Chunk {chunk}: {placed} blocks");
        }

        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for i in 0..ticks {
            let input = match i {
                30 => TickInput::with(Command::SpawnExplosive {
                    kind: ExplosiveKind::Tnt,
                    position: Vec2::new(center_x - config.block_size * 2.0, 0.0),
                    owner: Some("demo".into()),
                }),
                60 => TickInput::with(Command::SpawnExplosive {
                    kind: ExplosiveKind::MegaTnt,
                    position: Vec2::new(center_x + config.block_size * 2.0, 0.0),
                    owner: None,
                }),
                120 => TickInput::with(Command::Enlarge { duration_ms: None }),
                240 => TickInput::with(Command::EquipRandom),
                _ => TickInput::default(),
            };
            tick(&mut sim, &input, SIM_DT)?;

            for event in sim.drain_events() {
                let key = match event {
                    SimEvent::Sound(_) => "sound",
                    SimEvent::Explosion { position, .. } => {
                        log::info!("Explosion at {position} (t = {} ms)", sim.now_ms());
                        "explosion"
                    }
                    SimEvent::CameraShake(_) => "camera_shake",
                    SimEvent::BlockDestroyed { .. } => "block_destroyed",
                    SimEvent::DebrisSpawned { .. } => "debris_spawned",
                    SimEvent::DebrisExpired { .. } => "debris_expired",
                };
                *counts.entry(key).or_default() += 1;
            }
        }

        let tool = sim
            .physics
            .body(sim.tool.body)
            .ok_or(SimError::MissingBody)?;
        log::info!(
            "After {ticks} ticks: pickaxe {:?} at {}, {} blocks left, camera {}",
            sim.tool.kind,
            tool.position,
            sim.grid.len(),
            sim.camera.offset
        );
        for (kind, count) in &counts {
            log::info!("  {kind}: {count}");
        }
        Ok(())
    }
}
