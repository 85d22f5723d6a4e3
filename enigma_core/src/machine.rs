use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::alphabet::Alphabet;
use crate::chain::{MAX_CHAIN_LEN, SignalChain, TurnoverMechanism};
use crate::error::{EnigmaError, Result};
use crate::pairs::WiringPair;
use crate::plugboard::{plugboard, plugboard_uhr};
use crate::reflector::{RewiringNotation, ukw_d_with};
use crate::tracer::ScrambleTracer;
use crate::wheel::Wheel;

/// Rotor slots on a three-rotor machine; machines with a fourth-rotor
/// catalog get one more.
pub const BASE_ROTOR_SLOTS: usize = 3;

/// Optional hardware a model was built with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Features {
    pub plugboard: bool,
    pub uhr: bool,
    pub ukw_d: bool,
    pub settable_reflector: bool,
}

impl Features {
    pub const NONE: Features = Features {
        plugboard: false,
        uhr: false,
        ukw_d: false,
        settable_reflector: false,
    };

    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.plugboard, "plugboard"),
            (self.uhr, "Uhr"),
            (self.ukw_d, "UKW-D"),
            (self.settable_reflector, "settable reflector"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}

/// What to do with characters outside the machine alphabet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsupportedLetterHandling {
    #[default]
    PassThrough,
    Remove,
    Error,
}

/// Static description of a machine model.
#[derive(Clone, Debug)]
pub struct MachineSpec {
    name: String,
    alphabet: Alphabet,
    entry_wheel: Wheel,
    rotors: Vec<Wheel>,
    fourth_rotors: Vec<Wheel>,
    reflectors: Vec<Wheel>,
    mechanism: TurnoverMechanism,
    features: Features,
}

impl MachineSpec {
    pub fn new(name: impl Into<String>, alphabet: Alphabet, entry_wheel: Wheel) -> Self {
        Self {
            name: name.into(),
            alphabet,
            entry_wheel,
            rotors: Vec::new(),
            fourth_rotors: Vec::new(),
            reflectors: Vec::new(),
            mechanism: TurnoverMechanism::Regular,
            features: Features::NONE,
        }
    }

    pub fn with_rotors(mut self, rotors: Vec<Wheel>) -> Self {
        self.rotors = rotors;
        self
    }

    pub fn with_fourth_rotors(mut self, rotors: Vec<Wheel>) -> Self {
        self.fourth_rotors = rotors;
        self
    }

    pub fn with_reflectors(mut self, reflectors: Vec<Wheel>) -> Self {
        self.reflectors = reflectors;
        self
    }

    pub fn with_mechanism(mut self, mechanism: TurnoverMechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Checks that the catalogs are usable and every wheel matches the
    /// alphabet size.
    pub fn validate(self) -> Result<Self> {
        if self.rotors.is_empty() {
            return Err(self.empty_catalog("rotor"));
        }
        if self.reflectors.is_empty() {
            return Err(self.empty_catalog("reflector"));
        }
        let size = self.alphabet.len();
        let wheels = std::iter::once(&self.entry_wheel)
            .chain(&self.rotors)
            .chain(&self.fourth_rotors)
            .chain(&self.reflectors);
        for wheel in wheels {
            if wheel.size() != size {
                return Err(EnigmaError::DeviceSizeMismatch {
                    name: wheel.name().to_string(),
                    expected: size,
                    found: wheel.size(),
                });
            }
        }
        Ok(self)
    }

    fn empty_catalog(&self, catalog: &'static str) -> EnigmaError {
        EnigmaError::EmptyCatalog {
            machine: self.name.clone(),
            catalog,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn entry_wheel(&self) -> &Wheel {
        &self.entry_wheel
    }

    pub fn rotors(&self) -> &[Wheel] {
        &self.rotors
    }

    pub fn fourth_rotors(&self) -> &[Wheel] {
        &self.fourth_rotors
    }

    pub fn reflectors(&self) -> &[Wheel] {
        &self.reflectors
    }

    pub fn mechanism(&self) -> TurnoverMechanism {
        self.mechanism
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn rotor_slot_count(&self) -> usize {
        if self.fourth_rotors.is_empty() {
            BASE_ROTOR_SLOTS
        } else {
            BASE_ROTOR_SLOTS + 1
        }
    }

    /// Looks a rotor up in the main catalog, then the fourth-rotor catalog.
    pub fn rotor(&self, name: &str) -> Option<&Wheel> {
        self.rotors
            .iter()
            .chain(&self.fourth_rotors)
            .find(|wheel| wheel.name() == name)
    }

    pub fn reflector(&self, name: &str) -> Option<&Wheel> {
        self.reflectors.iter().find(|wheel| wheel.name() == name)
    }

    pub fn default_reflector(&self) -> Option<&Wheel> {
        self.reflectors.first()
    }

    fn require(&self, enabled: bool, feature: &'static str) -> Result<()> {
        if enabled {
            Ok(())
        } else {
            Err(EnigmaError::FeatureUnsupported {
                machine: self.name.clone(),
                feature,
            })
        }
    }
}

#[derive(Clone, Debug)]
struct PlugboardSetup {
    wheel: Wheel,
    pairs: Vec<WiringPair>,
    uhr: Option<usize>,
}

#[derive(Clone, Debug)]
struct Rewiring {
    notation: RewiringNotation,
    pairs: Vec<WiringPair>,
}

/// A configured machine. Positions advance with every enciphered letter and
/// persist between calls.
#[derive(Clone, Debug)]
pub struct Machine {
    spec: Arc<MachineSpec>,
    plugboard: Option<PlugboardSetup>,
    // Index 0 is slot 1, the rightmost and fastest rotor.
    rotors: Vec<Option<Wheel>>,
    rotor_positions: Vec<usize>,
    reflector: Wheel,
    reflector_position: usize,
    rewiring: Option<Rewiring>,
}

impl Machine {
    /// Empty rotor slots, default reflector, no plugboard cables.
    pub fn new(spec: Arc<MachineSpec>) -> Result<Self> {
        let reflector = spec
            .default_reflector()
            .cloned()
            .ok_or_else(|| spec.empty_catalog("reflector"))?;
        let slots = spec.rotor_slot_count();
        Ok(Self {
            spec,
            plugboard: None,
            rotors: vec![None; slots],
            rotor_positions: vec![1; slots],
            reflector,
            reflector_position: 1,
            rewiring: None,
        })
    }

    /// Installs rotor `name` in `slot` (1 = rightmost).
    pub fn with_rotor(mut self, slot: usize, name: &str, ring: usize, position: usize) -> Result<Self> {
        let idx = self.slot_index(slot)?;
        let rotor = self
            .spec
            .rotor(name)
            .ok_or_else(|| EnigmaError::UnknownRotor {
                machine: self.spec.name.clone(),
                name: name.to_string(),
            })?
            .ring(ring)?;
        let position = self.spec.alphabet.check_position(position)?;
        debug!(
            "machine={} slot={} rotor={} ring={} position={}",
            self.spec.name, slot, name, ring, position
        );
        self.rotors[idx] = Some(rotor);
        self.rotor_positions[idx] = position;
        Ok(self)
    }

    /// Same as [`Machine::with_rotor`] with ring and position given as letters.
    pub fn with_rotor_letters(self, slot: usize, name: &str, ring: char, position: char) -> Result<Self> {
        let ring = self.letter_number(ring)?;
        let position = self.letter_number(position)?;
        self.with_rotor(slot, name, ring, position)
    }

    /// Selects a catalog reflector. Ring and position other than 1 need a
    /// settable reflector.
    pub fn with_reflector(mut self, name: &str, ring: usize, position: usize) -> Result<Self> {
        if ring != 1 || position != 1 {
            self.spec
                .require(self.spec.features.settable_reflector, "settable reflector")?;
        }
        let reflector = self
            .spec
            .reflector(name)
            .ok_or_else(|| EnigmaError::UnknownReflector {
                machine: self.spec.name.clone(),
                name: name.to_string(),
            })?
            .ring(ring)?;
        let position = self.spec.alphabet.check_position(position)?;
        debug!(
            "machine={} reflector={} ring={} position={}",
            self.spec.name, name, ring, position
        );
        self.reflector = reflector;
        self.reflector_position = position;
        self.rewiring = None;
        Ok(self)
    }

    pub fn with_reflector_letters(self, name: &str, ring: char, position: char) -> Result<Self> {
        let ring = self.letter_number(ring)?;
        let position = self.letter_number(position)?;
        self.with_reflector(name, ring, position)
    }

    /// Installs a UKW-D wired from pairs in native dial notation.
    pub fn with_ukw_d(self, pairs: &[WiringPair]) -> Result<Self> {
        self.with_rewired_reflector(RewiringNotation::Native, pairs)
    }

    /// Installs a UKW-D wired from pairs in Bletchley Park notation.
    pub fn with_ukw_d_bp(self, pairs: &[WiringPair]) -> Result<Self> {
        self.with_rewired_reflector(RewiringNotation::Bp, pairs)
    }

    pub fn with_rewired_reflector(
        mut self,
        notation: RewiringNotation,
        pairs: &[WiringPair],
    ) -> Result<Self> {
        self.spec.require(self.spec.features.ukw_d, "UKW-D")?;
        let reflector = ukw_d_with(notation, pairs)?;
        if reflector.size() != self.spec.alphabet.len() {
            return Err(EnigmaError::DeviceSizeMismatch {
                name: reflector.name().to_string(),
                expected: self.spec.alphabet.len(),
                found: reflector.size(),
            });
        }
        debug!(
            "machine={} reflector={} notation={:?} pairs={}",
            self.spec.name,
            reflector.name(),
            notation,
            pairs.len()
        );
        self.reflector = reflector;
        self.reflector_position = 1;
        self.rewiring = Some(Rewiring {
            notation,
            pairs: pairs.to_vec(),
        });
        Ok(self)
    }

    pub fn with_plugboard(mut self, pairs: &[WiringPair]) -> Result<Self> {
        self.spec.require(self.spec.features.plugboard, "plugboard")?;
        let wheel = plugboard(&self.spec.alphabet, pairs)?;
        debug!("machine={} plugboard pairs={}", self.spec.name, pairs.len());
        self.plugboard = Some(PlugboardSetup {
            wheel,
            pairs: pairs.to_vec(),
            uhr: None,
        });
        Ok(self)
    }

    /// Plugboard cables routed through the Uhr at dial `setting`.
    pub fn with_uhr(mut self, pairs: &[WiringPair], setting: usize) -> Result<Self> {
        self.spec.require(self.spec.features.uhr, "Uhr")?;
        let wheel = plugboard_uhr(&self.spec.alphabet, pairs, setting)?;
        debug!("machine={} uhr setting={}", self.spec.name, setting);
        self.plugboard = Some(PlugboardSetup {
            wheel,
            pairs: pairs.to_vec(),
            uhr: Some(setting),
        });
        Ok(self)
    }

    pub fn set_rotor_position(&mut self, slot: usize, position: usize) -> Result<()> {
        let idx = self.slot_index(slot)?;
        self.rotor_positions[idx] = self.spec.alphabet.check_position(position)?;
        Ok(())
    }

    pub fn set_reflector_position(&mut self, position: usize) -> Result<()> {
        let position = self.spec.alphabet.check_position(position)?;
        if position != 1 {
            self.spec
                .require(self.spec.features.settable_reflector, "settable reflector")?;
        }
        self.reflector_position = position;
        Ok(())
    }

    fn slot_index(&self, slot: usize) -> Result<usize> {
        let slots = self.rotors.len();
        if slot == 0 || slot > slots {
            return Err(EnigmaError::SlotOutOfRange { slot, slots });
        }
        Ok(slot - 1)
    }

    pub fn spec(&self) -> &Arc<MachineSpec> {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn rotor(&self, slot: usize) -> Option<&Wheel> {
        slot.checked_sub(1)
            .and_then(|idx| self.rotors.get(idx))
            .and_then(Option::as_ref)
    }

    pub fn rotor_position(&self, slot: usize) -> Option<usize> {
        slot.checked_sub(1)
            .and_then(|idx| self.rotor_positions.get(idx))
            .copied()
    }

    /// Rotor positions indexed by slot - 1.
    pub fn positions(&self) -> &[usize] {
        &self.rotor_positions
    }

    pub fn reflector(&self) -> &Wheel {
        &self.reflector
    }

    pub fn reflector_position(&self) -> usize {
        self.reflector_position
    }

    pub fn plugboard(&self) -> Option<&Wheel> {
        self.plugboard.as_ref().map(|setup| &setup.wheel)
    }

    pub fn plugboard_pairs(&self) -> Option<&[WiringPair]> {
        self.plugboard.as_ref().map(|setup| setup.pairs.as_slice())
    }

    pub fn uhr_setting(&self) -> Option<usize> {
        self.plugboard.as_ref().and_then(|setup| setup.uhr)
    }

    pub fn reflector_rewiring(&self) -> Option<(RewiringNotation, &[WiringPair])> {
        self.rewiring
            .as_ref()
            .map(|rewiring| (rewiring.notation, rewiring.pairs.as_slice()))
    }

    /// Letters showing in the rotor windows, leftmost first. Empty slots are
    /// skipped.
    pub fn position_letters(&self) -> String {
        self.rotors
            .iter()
            .zip(&self.rotor_positions)
            .rev()
            .filter(|(rotor, _)| rotor.is_some())
            .filter_map(|(_, position)| self.spec.alphabet.symbol(*position))
            .collect()
    }

    pub fn letter_number(&self, letter: char) -> Result<usize> {
        self.spec.alphabet.require_position(letter)
    }

    pub fn letter_of(&self, number: usize) -> Result<char> {
        self.spec
            .alphabet
            .symbol(number)
            .ok_or(EnigmaError::PositionOutOfRange {
                position: number,
                size: self.spec.alphabet.len(),
            })
    }

    /// Signal chain for the current positions.
    pub fn chain(&self) -> Result<SignalChain<'_>> {
        let mut chain = SignalChain::new();
        if let Some(setup) = &self.plugboard {
            chain.push(&setup.wheel, 1)?;
        }
        chain.push(&self.spec.entry_wheel, 1)?;
        for (rotor, position) in self.rotors.iter().zip(&self.rotor_positions) {
            if let Some(rotor) = rotor {
                chain.push(rotor, *position)?;
            }
        }
        chain.push(&self.reflector, self.reflector_position)?;
        Ok(chain)
    }

    pub fn translate(&mut self, text: &str, handling: UnsupportedLetterHandling) -> Result<String> {
        self.run(text, handling, None)
    }

    pub fn translate_traced(
        &mut self,
        text: &str,
        handling: UnsupportedLetterHandling,
        tracer: &mut dyn ScrambleTracer,
    ) -> Result<String> {
        self.run(text, handling, Some(tracer))
    }

    fn run(
        &mut self,
        text: &str,
        handling: UnsupportedLetterHandling,
        mut tracer: Option<&mut (dyn ScrambleTracer + '_)>,
    ) -> Result<String> {
        debug!(
            "translate machine={} chars={} handling={:?} start={}",
            self.spec.name,
            text.chars().count(),
            handling,
            self.position_letters()
        );
        if handling == UnsupportedLetterHandling::Error {
            let rejected = text
                .chars()
                .enumerate()
                .find(|(_, letter)| self.lookup(*letter).is_none());
            if let Some((index, letter)) = rejected {
                return Err(EnigmaError::UnsupportedLetter { letter, index });
            }
        }
        let mut out = String::with_capacity(text.len());
        for letter in text.chars() {
            let Some((number, lower)) = self.lookup(letter) else {
                if handling == UnsupportedLetterHandling::PassThrough {
                    out.push(letter);
                }
                continue;
            };
            let scrambled = self.press(number, tracer.as_deref_mut())?;
            let symbol = self.letter_of(scrambled)?;
            if lower {
                out.extend(symbol.to_lowercase());
            } else {
                out.push(symbol);
            }
        }
        debug!(
            "translate machine={} end={}",
            self.spec.name,
            self.position_letters()
        );
        Ok(out)
    }

    // Alphabet number of `letter` and whether it was typed in lower case.
    fn lookup(&self, letter: char) -> Option<(usize, bool)> {
        let mut upper = letter.to_uppercase();
        let symbol = match (upper.next(), upper.next()) {
            (Some(symbol), None) => symbol,
            _ => return None,
        };
        let number = self.spec.alphabet.position(symbol)?;
        Some((number, symbol != letter))
    }

    /// One key press: step, scramble, and keep the new positions.
    fn press(&mut self, input: usize, tracer: Option<&mut (dyn ScrambleTracer + '_)>) -> Result<usize> {
        let mut stepped = [0usize; MAX_CHAIN_LEN];
        let output = {
            let mut chain = self.chain()?;
            chain.step(self.spec.mechanism);
            for (slot, node) in stepped.iter_mut().zip(chain.nodes()) {
                *slot = node.position;
            }
            chain.scramble(Some(input), tracer)
        };
        self.store_positions(&stepped);
        trace!("press in={} out={:?}", input, output);
        output.ok_or(EnigmaError::PositionOutOfRange {
            position: input,
            size: self.spec.alphabet.len(),
        })
    }

    fn store_positions(&mut self, stepped: &[usize; MAX_CHAIN_LEN]) {
        let mut idx = if self.plugboard.is_some() { 2 } else { 1 };
        for (rotor, position) in self.rotors.iter().zip(self.rotor_positions.iter_mut()) {
            if rotor.is_some() {
                *position = stepped[idx];
                idx += 1;
            }
        }
        self.reflector_position = stepped[idx];
    }
}
