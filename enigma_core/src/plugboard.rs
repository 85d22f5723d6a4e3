use log::debug;

use crate::alphabet::Alphabet;
use crate::error::{EnigmaError, Result};
use crate::pairs::{WiringPair, check_distinct, pairs_to_wiring, pairs_to_wiring_uhr};
use crate::permutation::Permutation;
use crate::wheel::{DeviceKind, Wheel};

pub const PLUGBOARD_NAME: &str = "Plugboard";
pub const UHR_NAME: &str = "Uhr";

/// Plain plugboard: each pair swaps two letters, everything else passes
/// straight through.
pub fn plugboard(alphabet: &Alphabet, pairs: &[WiringPair]) -> Result<Wheel> {
    check_pairs(alphabet, pairs)?;
    let letters = alphabet.to_string();
    let wiring = pairs_to_wiring(&letters, pairs)?;
    let permutation = Permutation::from_wiring(&letters, &wiring)?;
    Ok(Wheel::new(
        DeviceKind::Plugboard,
        PLUGBOARD_NAME,
        permutation,
        None,
    ))
}

/// Plugboard with the Uhr accessory set to `setting`. Takes exactly ten
/// pairs.
pub fn plugboard_uhr(alphabet: &Alphabet, pairs: &[WiringPair], setting: usize) -> Result<Wheel> {
    check_pairs(alphabet, pairs)?;
    let letters = alphabet.to_string();
    let wiring = pairs_to_wiring_uhr(&letters, pairs, setting)?;
    debug!("uhr setting={} wiring={}", setting, wiring);
    let permutation = Permutation::from_wiring(&letters, &wiring)?;
    Ok(Wheel::new(DeviceKind::Plugboard, UHR_NAME, permutation, None))
}

fn check_pairs(alphabet: &Alphabet, pairs: &[WiringPair]) -> Result<()> {
    check_distinct(pairs)?;
    for pair in pairs {
        for symbol in [pair.first, pair.second] {
            if !alphabet.contains(symbol) {
                return Err(EnigmaError::UnknownSymbol { symbol });
            }
        }
    }
    Ok(())
}
