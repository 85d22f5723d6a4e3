//! Field-rewirable reflector (UKW-D).
//!
//! The reflector has 26 contacts, 24 of them wired by the operator in twelve
//! pairs. The remaining pair is soldered in place. Two notations exist for
//! the same plug positions: the native dial lettering, where the fixed pair
//! sits on the two `-` contacts, and the alphabetic notation used at
//! Bletchley Park, where the fixed pair reads `BO`.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::alphabet::LETTERS_26;
use crate::error::{EnigmaError, Result};
use crate::pairs::{WiringPair, check_distinct, pairs_to_wiring};
use crate::permutation::{PLACEHOLDER, Permutation};
use crate::wheel::{DeviceKind, Wheel};

pub const UKW_D_NAME: &str = "UKW-D";
/// Contact lettering on the reflector itself.
pub const UKW_D_NATIVE_LETTERS: &str = "A-ZXWVUTSRQPON-MLKIHGFEDCB";
/// Number of operator-wired pairs.
pub const UKW_D_PAIRS: usize = 12;

const NATIVE_FIXED: WiringPair = WiringPair::new(PLACEHOLDER, PLACEHOLDER);
const BP_FIXED: WiringPair = WiringPair::new('B', 'O');

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewiringNotation {
    Native,
    Bp,
}

/// UKW-D wired from `pairs` read in the given notation.
pub fn ukw_d_with(notation: RewiringNotation, pairs: &[WiringPair]) -> Result<Wheel> {
    match notation {
        RewiringNotation::Native => ukw_d(pairs),
        RewiringNotation::Bp => ukw_d_bp(pairs),
    }
}

/// UKW-D wired from pairs given in native dial notation.
pub fn ukw_d(pairs: &[WiringPair]) -> Result<Wheel> {
    build(UKW_D_NATIVE_LETTERS, pairs, NATIVE_FIXED)
}

/// UKW-D wired from pairs given in Bletchley Park notation.
pub fn ukw_d_bp(pairs: &[WiringPair]) -> Result<Wheel> {
    build(LETTERS_26, pairs, BP_FIXED)
}

fn build(letters: &str, pairs: &[WiringPair], fixed: WiringPair) -> Result<Wheel> {
    let operator: Vec<WiringPair> = pairs
        .iter()
        .filter(|pair| !pair.same_cable(&fixed))
        .copied()
        .collect();
    check_distinct(&operator)?;
    for pair in &operator {
        for symbol in [pair.first, pair.second] {
            if fixed.contains(symbol) {
                return Err(EnigmaError::FixedPairLetter { symbol });
            }
            if !letters.contains(symbol) {
                return Err(EnigmaError::UnknownSymbol { symbol });
            }
        }
    }
    if operator.len() != UKW_D_PAIRS {
        return Err(EnigmaError::IncompletePairs {
            expected: UKW_D_PAIRS * 2,
            found: operator.len() * 2,
        });
    }
    let mut all = operator;
    all.push(fixed);
    let wiring = pairs_to_wiring(letters, &all)?;
    debug!("ukw-d letters={} wiring={}", letters, wiring);
    let permutation = Permutation::from_wiring(letters, &wiring)?;
    Ok(Wheel::new(
        DeviceKind::Reflector,
        UKW_D_NAME,
        permutation,
        None,
    ))
}
