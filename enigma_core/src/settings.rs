//! JSON description of a machine setup.
//!
//! Dial values may be written as numbers (`3`) or as letters of the machine
//! alphabet (`"C"`). The Uhr dial accepts a number or a bigram (`"AB"`).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::catalog::machine;
use crate::error::{EnigmaError, Result};
use crate::machine::Machine;
use crate::pairs::{WiringPair, format_pairs, uhr_setting};
use crate::reflector::{RewiringNotation, UKW_D_NAME};
use crate::session::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DialValue {
    Number(usize),
    Letter(char),
}

impl DialValue {
    pub fn resolve(&self, alphabet: &Alphabet) -> Result<usize> {
        match *self {
            DialValue::Number(n) => alphabet.check_position(n),
            DialValue::Letter(c) => alphabet.require_position(c),
        }
    }

    fn capture(alphabet: &Alphabet, position: usize) -> Self {
        alphabet
            .symbol(position)
            .map_or(DialValue::Number(position), DialValue::Letter)
    }
}

impl Default for DialValue {
    fn default() -> Self {
        DialValue::Number(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UhrDial {
    Number(usize),
    Bigram(String),
}

impl UhrDial {
    pub fn resolve(&self) -> Result<usize> {
        match self {
            UhrDial::Number(n) => Ok(*n),
            UhrDial::Bigram(bigram) => uhr_setting(bigram),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewiringSettings {
    pub notation: RewiringNotation,
    /// Space separated pairs, e.g. `"AQ BG CK"`.
    pub pairs: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectorSettings {
    pub name: String,
    #[serde(default)]
    pub ring: DialValue,
    #[serde(default)]
    pub position: DialValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewiring: Option<RewiringSettings>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotorSettings {
    pub slot: usize,
    pub name: String,
    #[serde(default)]
    pub ring: DialValue,
    #[serde(default)]
    pub position: DialValue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlugboardSettings {
    pub pairs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uhr: Option<UhrDial>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSettings {
    pub machine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflector: Option<ReflectorSettings>,
    #[serde(default)]
    pub rotors: Vec<RotorSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugboard: Option<PlugboardSettings>,
}

impl MachineSettings {
    pub fn new(machine: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            reflector: None,
            rotors: Vec::new(),
            plugboard: None,
        }
    }

    /// Builds the described machine from the built-in catalog.
    pub fn build(&self) -> Result<Machine> {
        let mut m = machine(&self.machine)?;
        let alphabet = m.spec().alphabet().clone();
        if let Some(reflector) = &self.reflector {
            m = match &reflector.rewiring {
                Some(rewiring) => {
                    if reflector.name != UKW_D_NAME {
                        return Err(EnigmaError::UnknownReflector {
                            machine: self.machine.clone(),
                            name: reflector.name.clone(),
                        });
                    }
                    // the rewirable reflector only sits at ring 1, position 1
                    if reflector.ring.resolve(&alphabet)? != 1
                        || reflector.position.resolve(&alphabet)? != 1
                    {
                        return Err(EnigmaError::FeatureUnsupported {
                            machine: self.machine.clone(),
                            feature: "settable UKW-D",
                        });
                    }
                    let pairs = WiringPair::parse_list(&rewiring.pairs)?;
                    m.with_rewired_reflector(rewiring.notation, &pairs)?
                }
                None => m.with_reflector(
                    &reflector.name,
                    reflector.ring.resolve(&alphabet)?,
                    reflector.position.resolve(&alphabet)?,
                )?,
            };
        }
        for rotor in &self.rotors {
            m = m.with_rotor(
                rotor.slot,
                &rotor.name,
                rotor.ring.resolve(&alphabet)?,
                rotor.position.resolve(&alphabet)?,
            )?;
        }
        if let Some(plugboard) = &self.plugboard {
            let pairs = WiringPair::parse_list(&plugboard.pairs)?;
            m = match &plugboard.uhr {
                Some(dial) => m.with_uhr(&pairs, dial.resolve()?)?,
                None => m.with_plugboard(&pairs)?,
            };
        }
        debug!(
            "settings built machine={} positions={}",
            self.machine,
            m.position_letters()
        );
        Ok(m)
    }

    /// Snapshot of `machine`, current positions included.
    pub fn capture(machine: &Machine) -> Self {
        let alphabet = machine.spec().alphabet();
        let reflector = machine.reflector();
        let rewiring = machine
            .reflector_rewiring()
            .map(|(notation, pairs)| RewiringSettings {
                notation,
                pairs: format_pairs(pairs),
            });
        let rotors = (1..=machine.spec().rotor_slot_count())
            .filter_map(|slot| {
                let rotor = machine.rotor(slot)?;
                let position = machine.rotor_position(slot)?;
                Some(RotorSettings {
                    slot,
                    name: rotor.name().to_string(),
                    ring: DialValue::capture(alphabet, rotor.ring_setting()),
                    position: DialValue::capture(alphabet, position),
                })
            })
            .collect();
        let plugboard = machine.plugboard_pairs().map(|pairs| PlugboardSettings {
            pairs: format_pairs(pairs),
            uhr: machine.uhr_setting().map(UhrDial::Number),
        });
        Self {
            machine: machine.name().to_string(),
            reflector: Some(ReflectorSettings {
                name: reflector.name().to_string(),
                ring: DialValue::capture(alphabet, reflector.ring_setting()),
                position: DialValue::capture(alphabet, machine.reflector_position()),
                rewiring,
            }),
            rotors,
            plugboard,
        }
    }

    pub fn load(path: &Path) -> std::result::Result<Self, SessionError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save(&self, path: &Path) -> std::result::Result<(), SessionError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::UnsupportedLetterHandling;
    use tempfile::NamedTempFile;

    const MANUAL_1930: &str = r#"{
        "machine": "I",
        "reflector": { "name": "UKW-A" },
        "rotors": [
            { "slot": 3, "name": "II", "ring": 24, "position": "A" },
            { "slot": 2, "name": "I", "ring": 13, "position": "B" },
            { "slot": 1, "name": "III", "ring": 22, "position": "L" }
        ],
        "plugboard": { "pairs": "AM FI NV PS TU WZ" }
    }"#;

    #[test]
    fn builds_from_json() {
        let settings: MachineSettings = serde_json::from_str(MANUAL_1930).unwrap();
        let mut m = settings.build().unwrap();
        assert_eq!(m.position_letters(), "ABL");
        let plain = m
            .translate("GCDSE AHUGW TQGRK", UnsupportedLetterHandling::PassThrough)
            .unwrap();
        assert_eq!(plain, "FEIND LIQEI NFANT");
    }

    #[test]
    fn capture_round_trips_through_json() {
        let settings: MachineSettings = serde_json::from_str(MANUAL_1930).unwrap();
        let mut m = settings.build().unwrap();
        m.translate("GCDSE", UnsupportedLetterHandling::PassThrough)
            .unwrap();
        let captured = MachineSettings::capture(&m);
        let json = serde_json::to_string(&captured).unwrap();
        let restored: MachineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, captured);
        let mut resumed = restored.build().unwrap();
        assert_eq!(resumed.positions(), m.positions());
        assert_eq!(
            resumed
                .translate("AHUGW", UnsupportedLetterHandling::PassThrough)
                .unwrap(),
            "LIQEI"
        );
    }

    #[test]
    fn letters_and_numbers_agree() {
        let alphabet = Alphabet::new(crate::alphabet::LETTERS_26).unwrap();
        assert_eq!(DialValue::Letter('C').resolve(&alphabet), Ok(3));
        assert_eq!(DialValue::Number(3).resolve(&alphabet), Ok(3));
        assert!(DialValue::Number(27).resolve(&alphabet).is_err());
        assert_eq!(
            DialValue::Letter('3').resolve(&alphabet),
            Err(EnigmaError::UnknownSymbol { symbol: '3' })
        );
    }

    #[test]
    fn uhr_and_ukw_d_settings() {
        let json = r#"{
            "machine": "I",
            "reflector": {
                "name": "UKW-D",
                "rewiring": { "notation": "bp", "pairs": "AC DE FG HI JK LM NP QR ST UV WX YZ" }
            },
            "rotors": [
                { "slot": 3, "name": "I", "ring": "A", "position": "B" },
                { "slot": 2, "name": "II", "ring": "B", "position": "A" },
                { "slot": 1, "name": "III", "ring": "C", "position": "Z" }
            ],
            "plugboard": { "pairs": "AB CD EF GH IJ KL MN OP QR ST", "uhr": "AA" }
        }"#;
        let settings: MachineSettings = serde_json::from_str(json).unwrap();
        let m = settings.build().unwrap();
        assert_eq!(m.uhr_setting(), Some(0));
        assert_eq!(m.reflector().name(), "UKW-D");
        let captured = MachineSettings::capture(&m);
        let rewiring = captured.reflector.unwrap().rewiring.unwrap();
        assert_eq!(rewiring.notation, RewiringNotation::Bp);
    }

    fn rewired(name: &str, ring: &str, position: &str) -> MachineSettings {
        let json = format!(
            r#"{{
                "machine": "I",
                "reflector": {{
                    "name": "{name}", "ring": {ring}, "position": {position},
                    "rewiring": {{ "notation": "bp", "pairs": "AC DE FG HI JK LM NP QR ST UV WX YZ" }}
                }}
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn rewiring_rejects_ring_and_position() {
        assert_eq!(
            rewired("UKW-D", "5", "3").build().map(|_| ()),
            Err(EnigmaError::FeatureUnsupported {
                machine: "I".to_string(),
                feature: "settable UKW-D",
            })
        );
        assert!(rewired("UKW-D", "1", "\"C\"").build().is_err());
        let m = rewired("UKW-D", "\"A\"", "1").build().unwrap();
        assert_eq!(m.reflector().name(), UKW_D_NAME);
    }

    #[test]
    fn rewiring_rejects_other_reflector_name() {
        assert_eq!(
            rewired("UKW-B", "1", "1").build().map(|_| ()),
            Err(EnigmaError::UnknownReflector {
                machine: "I".to_string(),
                name: "UKW-B".to_string(),
            })
        );
    }

    #[test]
    fn unknown_machine_is_reported() {
        let settings = MachineSettings::new("Typex");
        assert!(matches!(
            settings.build(),
            Err(EnigmaError::UnknownMachine { .. })
        ));
    }

    #[test]
    fn save_and_load() {
        let settings: MachineSettings = serde_json::from_str(MANUAL_1930).unwrap();
        let file = NamedTempFile::new().unwrap();
        settings.save(file.path()).unwrap();
        let loaded = MachineSettings::load(file.path()).unwrap();
        assert_eq!(loaded, settings);
    }
}
