//! Built-in machine models.
//!
//! Wiring tables are static data; the corresponding [`MachineSpec`] values
//! are assembled on first use and shared afterwards.

use std::sync::Arc;

use log::debug;
use once_cell::sync::OnceCell;

use crate::alphabet::{Alphabet, LETTERS_10, LETTERS_26, LETTERS_28};
use crate::chain::TurnoverMechanism;
use crate::error::{EnigmaError, Result};
use crate::machine::{Features, Machine, MachineSpec};
use crate::wheel::Wheel;

/// Keyboard order (QWERTZ) wired to the contacts in alphabetical order.
const ETW_QWERTZ: &str = "JWULCMNOHPQZYXIRADKEGVBTSF";

struct WheelDef {
    name: &'static str,
    wiring: &'static str,
    turnovers: Option<&'static str>,
}

const fn rotor(name: &'static str, wiring: &'static str, turnovers: &'static str) -> WheelDef {
    WheelDef {
        name,
        wiring,
        turnovers: Some(turnovers),
    }
}

const fn fixed(name: &'static str, wiring: &'static str) -> WheelDef {
    WheelDef {
        name,
        wiring,
        turnovers: None,
    }
}

struct ModelDef {
    name: &'static str,
    letters: &'static str,
    etw: &'static str,
    rotors: &'static [WheelDef],
    fourth_rotors: &'static [WheelDef],
    reflectors: &'static [WheelDef],
    mechanism: TurnoverMechanism,
    features: Features,
}

const SETTABLE: Features = Features {
    settable_reflector: true,
    ..Features::NONE
};

static MODELS: [ModelDef; 12] = [
    ModelDef {
        name: "A-133",
        letters: LETTERS_28,
        etw: LETTERS_28,
        rotors: &[
            rotor("I", "PSBGÖXQJDHOÄUCFRTEZVÅINLYMKA", "Ä"),
            rotor("II", "CHNSYÖADMOTRZXBÄIGÅEKQUPFLVJ", "Ä"),
            rotor("III", "ÅVQIAÄXRJBÖZSPCFYUNTHDOMEKGL", "Ä"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "LDGBÄNCPSKJAVFZHXUIÅRMQÖOTEY")],
        mechanism: TurnoverMechanism::Regular,
        features: Features::NONE,
    },
    ModelDef {
        name: "G-111",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "WLRHBQUNDKJCZSEXOTMAGYFPVI", "SUVWZABCEFGIKLOPQ"),
            rotor("II", "TFJQAZWMHLCUIXRDYGOEVBNSKP", "STVYZACDFGHKMNQ"),
            rotor("V", "QTPIXWVDFRMUSLJOHCANEZKYBG", "SWZFHMQ"),
        ],
        fourth_rotors: &[],
        // Turns with the rotors but carries nothing further.
        reflectors: &[rotor("UKW", "IMETCGFRAYSQBZXWLHKDVUPOJN", "")],
        mechanism: TurnoverMechanism::CogWheel,
        features: SETTABLE,
    },
    ModelDef {
        name: "G-260",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "RCSPBLKQAUMHWYTIFZVGOJNEXD", "SUVWZABCEFGIKLOPQ"),
            rotor("II", "WCMIBVPJXAROSGNDLZKEYHUFQT", "STVYZACDFGHKMNQ"),
            rotor("III", "FVDHZELSQMAXOKYIWPGCBUJTNR", "UWXAEFHKMNR"),
        ],
        fourth_rotors: &[],
        reflectors: &[rotor("UKW", "IMETCGFRAYSQBZXWLHKDVUPOJN", "")],
        mechanism: TurnoverMechanism::CogWheel,
        features: SETTABLE,
    },
    ModelDef {
        name: "I",
        letters: LETTERS_26,
        etw: LETTERS_26,
        rotors: &[
            rotor("I", "EKMFLGDQVZNTOWYHXUSPAIBRCJ", "Q"),
            rotor("II", "AJDKSIRUXBLHWTMCQGZNPYFVOE", "E"),
            rotor("III", "BDFHJLCPRTXVZNYEIWGAKMUSQO", "V"),
            rotor("IV", "ESOVPZJAYQUIRHXLNFTGKDCMWB", "J"),
            rotor("V", "VZBRGITYUPSDNHLXAWMJQOFECK", "Z"),
        ],
        fourth_rotors: &[],
        reflectors: &[
            fixed("UKW-A", "EJMZALYXVBWFCRQUONTSPIKHGD"),
            fixed("UKW-B", "YRUHQSLDPXNGOKMIEBFZCWVJAT"),
            fixed("UKW-C", "FVPJIAOYEDRZXWGCTKUQSBNMHL"),
        ],
        mechanism: TurnoverMechanism::Regular,
        features: Features {
            plugboard: true,
            uhr: true,
            ukw_d: true,
            settable_reflector: false,
        },
    },
    ModelDef {
        name: "K",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "LPGSZMHAEOQKVXRFYBUTNICJDW", "Y"),
            rotor("II", "SLVGBTFXJQOHEWIRZYAMKPCNDU", "E"),
            rotor("III", "CJGDPSHKTURAWZXFMYNQOBVLIE", "N"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "IMETCGFRAYSQBZXWLHKDVUPOJN")],
        mechanism: TurnoverMechanism::Regular,
        features: SETTABLE,
    },
    ModelDef {
        name: "KD",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "VEZIOJCXKYDUNTWAPLQGBHSFMR", "SUYAEHLNQ"),
            rotor("II", "HGRBSJZETDLVPMQYCXAOKINFUW", "SUYAEHLNQ"),
            rotor("III", "NWLHXGRBYOJSAZDVTPKFQMEUIC", "SUYAEHLNQ"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "KOTVPNLMJIAGHFBEWYXCZDQSRU")],
        mechanism: TurnoverMechanism::Regular,
        features: Features {
            ukw_d: true,
            ..Features::NONE
        },
    },
    ModelDef {
        name: "M4",
        letters: LETTERS_26,
        etw: LETTERS_26,
        rotors: &[
            rotor("I", "EKMFLGDQVZNTOWYHXUSPAIBRCJ", "Q"),
            rotor("II", "AJDKSIRUXBLHWTMCQGZNPYFVOE", "E"),
            rotor("III", "BDFHJLCPRTXVZNYEIWGAKMUSQO", "V"),
            rotor("IV", "ESOVPZJAYQUIRHXLNFTGKDCMWB", "J"),
            rotor("V", "VZBRGITYUPSDNHLXAWMJQOFECK", "Z"),
            rotor("VI", "JPGVOUMFYQBENHZRDKASXLICTW", "ZM"),
            rotor("VII", "NZJHGRCXMYSWBOUFAIVLPEKQDT", "ZM"),
            rotor("VIII", "FKQHTLXOCBJSPDZRAMEWNIUYGV", "ZM"),
        ],
        fourth_rotors: &[
            fixed("Beta", "LEYJVCNIXWPBQMDRTAKZGFUHOS"),
            fixed("Gamma", "FSOKANUERHMBTIYCWLQPZXVGJD"),
        ],
        reflectors: &[
            fixed("UKW-B", "ENKQAUYWJICOPBLMDXZVFTHRGS"),
            fixed("UKW-C", "RDOBJNTKVEHMLFCWZAXGYIPSUQ"),
        ],
        mechanism: TurnoverMechanism::Regular,
        features: Features {
            plugboard: true,
            ukw_d: true,
            ..Features::NONE
        },
    },
    ModelDef {
        name: "Norway",
        letters: LETTERS_26,
        etw: LETTERS_26,
        rotors: &[
            rotor("I", "WTOKASUYVRBXJHQCPZEFMDINLG", "Q"),
            rotor("II", "GJLPUBSWEMCTQVHXAOFZDRKYNI", "E"),
            rotor("III", "JWFMHNBPUSDYTIXVZGRQLAOEKC", "V"),
            rotor("IV", "FGZJMVXEPBWSHQTLIUDYKCNRAO", "J"),
            rotor("V", "HEJXQOTZBVFDASCILWPGYNMURK", "Z"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "MOWJYPUXNDSRAIBFVLKZGQCHET")],
        mechanism: TurnoverMechanism::Regular,
        features: Features {
            plugboard: true,
            ..Features::NONE
        },
    },
    ModelDef {
        name: "Railway",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "JGDQOXUSCAMIFRVTPNEWKBLZYH", "N"),
            rotor("II", "NTZPSFBOKMWRCJDIVLAEYUXHGQ", "E"),
            rotor("III", "JVIUBHTCDYAKEQZPOSGXNRMWFL", "Y"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "QYHOGNECVPUZTFDJAXWMKISRBL")],
        mechanism: TurnoverMechanism::Regular,
        features: SETTABLE,
    },
    ModelDef {
        name: "Spanish-D",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "CIAHFQOYBXNUWJLVGEMSZKPDTR", "Y"),
            rotor("II", "KEDXVBSQHNCZTRUFLOAYWIPMJG", "E"),
            rotor("III", "NUJPHWFMGDOBAVZQTXECLKYSIR", "N"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "IMETCGFRAYSQBZXWLHKDVUPOJN")],
        mechanism: TurnoverMechanism::Regular,
        features: SETTABLE,
    },
    ModelDef {
        name: "Swiss-K",
        letters: LETTERS_26,
        etw: ETW_QWERTZ,
        rotors: &[
            rotor("I", "PEZUOHXSCVFMTBGLRINQJWAYDK", "Y"),
            rotor("II", "ZOUESYDKFWPCIQXHMVBLGNJRAT", "E"),
            rotor("III", "EHRVXGAOBQUSIMZFLYNWKTPDJC", "N"),
        ],
        fourth_rotors: &[],
        reflectors: &[fixed("UKW", "IMETCGFRAYSQBZXWLHKDVUPOJN")],
        mechanism: TurnoverMechanism::Regular,
        features: SETTABLE,
    },
    ModelDef {
        name: "Z",
        letters: LETTERS_10,
        etw: LETTERS_10,
        rotors: &[
            rotor("I", "6418270359", "9"),
            rotor("II", "5841097632", "9"),
            rotor("III", "3581620794", "9"),
        ],
        fourth_rotors: &[],
        reflectors: &[rotor("UKW", "5079183642", "9")],
        mechanism: TurnoverMechanism::Regular,
        features: SETTABLE,
    },
];

static SPEC_CACHE: [OnceCell<Arc<MachineSpec>>; 12] = [const { OnceCell::new() }; 12];

/// Names of every built-in model, in catalog order.
pub fn machine_names() -> Vec<&'static str> {
    MODELS.iter().map(|model| model.name).collect()
}

/// Shared description of the model called `name` (case-insensitive).
pub fn machine_spec(name: &str) -> Result<Arc<MachineSpec>> {
    let idx = MODELS
        .iter()
        .position(|model| model.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| EnigmaError::UnknownMachine {
            name: name.to_string(),
        })?;
    SPEC_CACHE[idx]
        .get_or_try_init(|| build_spec(&MODELS[idx]).map(Arc::new))
        .cloned()
}

/// Fresh machine of model `name`: default reflector, empty rotor slots.
pub fn machine(name: &str) -> Result<Machine> {
    Machine::new(machine_spec(name)?)
}

fn build_spec(model: &ModelDef) -> Result<MachineSpec> {
    debug!("building machine spec name={}", model.name);
    let alphabet = Alphabet::new(model.letters)?;
    let etw = Wheel::entry_wheel("ETW", &alphabet, model.etw)?;
    let rotors = build_wheels(&alphabet, model.rotors, Wheel::rotor)?;
    let fourth_rotors = build_wheels(&alphabet, model.fourth_rotors, Wheel::rotor)?;
    let reflectors = build_wheels(&alphabet, model.reflectors, Wheel::reflector)?;
    MachineSpec::new(model.name, alphabet, etw)
        .with_rotors(rotors)
        .with_fourth_rotors(fourth_rotors)
        .with_reflectors(reflectors)
        .with_mechanism(model.mechanism)
        .with_features(model.features)
        .validate()
}

fn build_wheels(
    alphabet: &Alphabet,
    defs: &[WheelDef],
    make: fn(&str, &Alphabet, &str, Option<&str>) -> Result<Wheel>,
) -> Result<Vec<Wheel>> {
    defs.iter()
        .map(|def| make(def.name, alphabet, def.wiring, def.turnovers))
        .collect()
}
