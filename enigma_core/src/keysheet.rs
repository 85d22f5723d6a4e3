//! Deterministic daily key sheets.
//!
//! Every day's settings come from its own `ChaCha20Rng`, seeded with a BLAKE3
//! digest of the caller's seed, the day number, and a label. The same inputs
//! always yield the same sheet.

use blake3::Hasher;
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::catalog::machine_spec;
use crate::error::Result;
use crate::machine::MachineSpec;
use crate::pairs::{UHR_PAIRS, UHR_POSITIONS, WiringPair, format_pairs};
use crate::settings::{
    DialValue, MachineSettings, PlugboardSettings, ReflectorSettings, RotorSettings, UhrDial,
};

pub const KEYSHEET_LABEL: &[u8] = b"enigma-keysheet";
/// Cables issued with a plugboard machine.
pub const PLUGBOARD_CABLES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySheetEntry {
    pub day: u32,
    pub settings: MachineSettings,
}

/// RNG for one day of a sheet.
pub fn derive_keysheet_rng(seed: &[u8], day: u32, label: &[u8]) -> ChaCha20Rng {
    let mut hasher = Hasher::new();
    hasher.update(seed);
    hasher.update(&day.to_le_bytes());
    hasher.update(label);
    let digest = hasher.finalize();
    ChaCha20Rng::from_seed(*digest.as_bytes())
}

/// Settings for days `1..=days` of model `machine`.
pub fn generate_keysheet(machine: &str, seed: &[u8], days: u32) -> Result<Vec<KeySheetEntry>> {
    let spec = machine_spec(machine)?;
    let entries = (1..=days)
        .map(|day| {
            let mut rng = derive_keysheet_rng(seed, day, KEYSHEET_LABEL);
            KeySheetEntry {
                day,
                settings: random_settings(&spec, &mut rng),
            }
        })
        .collect();
    debug!("keysheet machine={} days={}", spec.name(), days);
    Ok(entries)
}

/// One random but valid setup of `spec`.
pub fn random_settings<R: Rng>(spec: &MachineSpec, rng: &mut R) -> MachineSettings {
    let alphabet = spec.alphabet();
    let size = alphabet.len();
    let features = spec.features();
    let dial = |rng: &mut R| {
        let position = rng.gen_range(1..=size);
        alphabet
            .symbol(position)
            .map_or(DialValue::Number(position), DialValue::Letter)
    };

    let mut settings = MachineSettings::new(spec.name());

    if let Some(reflector) = spec.reflectors().choose(rng) {
        let (ring, position) = if features.settable_reflector {
            (dial(rng), dial(rng))
        } else {
            (DialValue::Number(1), DialValue::Number(1))
        };
        settings.reflector = Some(ReflectorSettings {
            name: reflector.name().to_string(),
            ring,
            position,
            rewiring: None,
        });
    }

    let mut picks: Vec<_> = spec.rotors().choose_multiple(rng, 3).collect();
    picks.shuffle(rng);
    for (idx, rotor) in picks.into_iter().enumerate() {
        settings.rotors.push(RotorSettings {
            slot: idx + 1,
            name: rotor.name().to_string(),
            ring: dial(rng),
            position: dial(rng),
        });
    }
    if let Some(rotor) = spec.fourth_rotors().choose(rng) {
        settings.rotors.push(RotorSettings {
            slot: 4,
            name: rotor.name().to_string(),
            ring: dial(rng),
            position: dial(rng),
        });
    }
    // Leftmost slot first, as printed on the sheets.
    settings.rotors.reverse();

    if features.plugboard && size >= PLUGBOARD_CABLES * 2 {
        let mut letters = alphabet.symbols().to_vec();
        letters.shuffle(rng);
        let pairs: Vec<WiringPair> = letters
            .chunks_exact(2)
            .take(PLUGBOARD_CABLES)
            .map(|pair| WiringPair::new(pair[0], pair[1]))
            .collect();
        let uhr = (features.uhr && pairs.len() == UHR_PAIRS)
            .then(|| UhrDial::Number(rng.gen_range(0..UHR_POSITIONS)));
        settings.plugboard = Some(PlugboardSettings {
            pairs: format_pairs(&pairs),
            uhr,
        });
    }
    settings
}
