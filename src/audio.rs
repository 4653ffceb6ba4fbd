//! Sound cues requested by the simulation
//!
//! Playback is fire-and-forget: the simulation emits cues as events and never
//! waits on the sound collaborator.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of recorded variants per hit family
pub const HIT_VARIANTS: u8 = 4;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Tool hits a soft block (grass, dirt); variant 1..=4
    Grass(u8),
    /// Tool hits any other block; variant 1..=4
    Stone(u8),
    /// Explosive spawned, fuse lit
    Fuse,
}

impl SoundCue {
    /// Random hit cue for a block material family
    pub fn hit(grass: bool, rng: &mut impl Rng) -> Self {
        let variant = rng.random_range(1..=HIT_VARIANTS);
        if grass {
            SoundCue::Grass(variant)
        } else {
            SoundCue::Stone(variant)
        }
    }

    /// Asset name the sound collaborator is keyed by
    pub fn name(&self) -> String {
        match self {
            SoundCue::Grass(v) => format!("grass{v}"),
            SoundCue::Stone(v) => format!("stone{v}"),
            SoundCue::Fuse => "tnt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn cue_names() {
        assert_eq!(SoundCue::Grass(3).name(), "grass3");
        assert_eq!(SoundCue::Stone(1).name(), "stone1");
        assert_eq!(SoundCue::Fuse.name(), "tnt");
    }

    #[test]
    fn hit_variants_stay_in_range() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            match SoundCue::hit(false, &mut rng) {
                SoundCue::Stone(v) => assert!((1..=HIT_VARIANTS).contains(&v)),
                other => panic!("unexpected cue {other:?}"),
            }
        }
        assert!(matches!(SoundCue::hit(true, &mut rng), SoundCue::Grass(_)));
    }
}
