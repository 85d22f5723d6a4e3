use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::alphabet::{Alphabet, normalize};
use crate::error::{EnigmaError, Result};
use crate::permutation::Permutation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Plugboard,
    EntryWheel,
    Rotor,
    Reflector,
}

impl DeviceKind {
    pub fn is_ring_adjustable(self) -> bool {
        matches!(self, DeviceKind::Rotor | DeviceKind::Reflector)
    }
}

/// A wired permutation device: plugboard, entry wheel, rotor, or reflector.
///
/// Wiring and turnover marks are shared behind `Arc`, so `ring` is cheap and
/// wheels can be handed to any number of machines.
#[derive(Clone, PartialEq, Eq)]
pub struct Wheel {
    kind: DeviceKind,
    name: Arc<str>,
    permutation: Arc<Permutation>,
    // `None` means the wheel never rotates.
    turnovers: Option<Arc<[usize]>>,
    ring: usize,
}

impl Wheel {
    pub fn new(
        kind: DeviceKind,
        name: impl Into<Arc<str>>,
        permutation: Permutation,
        turnovers: Option<Vec<usize>>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            permutation: Arc::new(permutation),
            turnovers: turnovers.map(Into::into),
            ring: 1,
        }
    }

    /// Builds a rotor from its wiring. `turnovers` lists the mark letters;
    /// `None` makes a fixed, non-turnable rotor.
    pub fn rotor(
        name: &str,
        alphabet: &Alphabet,
        wiring: &str,
        turnovers: Option<&str>,
    ) -> Result<Self> {
        Self::wired(DeviceKind::Rotor, name, alphabet, wiring, turnovers)
    }

    pub fn reflector(
        name: &str,
        alphabet: &Alphabet,
        wiring: &str,
        turnovers: Option<&str>,
    ) -> Result<Self> {
        Self::wired(DeviceKind::Reflector, name, alphabet, wiring, turnovers)
    }

    pub fn entry_wheel(name: &str, alphabet: &Alphabet, wiring: &str) -> Result<Self> {
        Self::wired(DeviceKind::EntryWheel, name, alphabet, wiring, None)
    }

    fn wired(
        kind: DeviceKind,
        name: &str,
        alphabet: &Alphabet,
        wiring: &str,
        turnovers: Option<&str>,
    ) -> Result<Self> {
        let permutation = Permutation::from_wiring(&alphabet.to_string(), wiring)?;
        let marks = turnovers
            .map(|letters| {
                letters
                    .chars()
                    .map(|symbol| alphabet.require_position(symbol))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        Ok(Self::new(kind, name, permutation, marks))
    }

    /// Same wiring and marks with a different ring setting.
    pub fn ring(&self, setting: usize) -> Result<Self> {
        let size = self.size();
        if setting == 0 || setting > size {
            return Err(EnigmaError::RingSettingOutOfRange {
                ring: setting,
                size,
            });
        }
        if setting != 1 && !self.kind.is_ring_adjustable() {
            return Err(EnigmaError::NotRingAdjustable {
                kind: self.kind,
                name: self.name.to_string(),
            });
        }
        Ok(Self {
            ring: setting,
            ..self.clone()
        })
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.permutation.size()
    }

    pub fn ring_setting(&self) -> usize {
        self.ring
    }

    pub fn permutation(&self) -> &Permutation {
        &self.permutation
    }

    pub fn is_turnable(&self) -> bool {
        self.turnovers.is_some()
    }

    pub fn turnovers(&self) -> &[usize] {
        self.turnovers.as_deref().unwrap_or(&[])
    }

    pub fn is_turnover(&self, position: usize) -> bool {
        self.turnovers().contains(&position)
    }

    /// True when both wheels share the same wiring allocation.
    pub fn shares_wiring(&self, other: &Wheel) -> bool {
        Arc::ptr_eq(&self.permutation, &other.permutation)
    }

    pub fn scramble_forward(&self, position: usize) -> Option<usize> {
        self.through_ring(position, |shifted| self.permutation.forward(shifted))
    }

    pub fn scramble_backward(&self, position: usize) -> Option<usize> {
        self.through_ring(position, |shifted| self.permutation.backward(shifted))
    }

    fn through_ring(&self, position: usize, map: impl Fn(usize) -> Option<usize>) -> Option<usize> {
        let size = self.size();
        if position == 0 || position > size {
            return None;
        }
        let offset = self.ring as i64 - 1;
        let shifted = normalize(position as i64 - offset, size);
        let mapped = map(shifted)?;
        Some(normalize(mapped as i64 + offset, size))
    }
}

impl fmt::Debug for Wheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wheel")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("ring", &self.ring)
            .field("turnovers", &self.turnovers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::LETTERS_26;
    use proptest::prelude::*;

    fn alphabet() -> Alphabet {
        Alphabet::new(LETTERS_26).unwrap()
    }

    fn rotor_i() -> Wheel {
        Wheel::rotor("I", &alphabet(), "EKMFLGDQVZNTOWYHXUSPAIBRCJ", Some("Q")).unwrap()
    }

    #[test]
    fn ring_one_is_plain_wiring() {
        let rotor = rotor_i();
        assert_eq!(rotor.scramble_forward(1), Some(5));
        assert_eq!(rotor.scramble_backward(5), Some(1));
    }

    #[test]
    fn ring_shifts_wiring() {
        // Ring B: A -> K
        let rotor = rotor_i().ring(2).unwrap();
        assert_eq!(rotor.scramble_forward(1), Some(11));
        assert_eq!(rotor.scramble_backward(11), Some(1));
        assert_eq!(rotor.ring_setting(), 2);
    }

    #[test]
    fn ring_returns_new_wheel_sharing_wiring() {
        let base = rotor_i();
        let shifted = base.ring(5).unwrap();
        assert_eq!(base.ring_setting(), 1);
        assert!(base.shares_wiring(&shifted));
        assert_eq!(base.turnovers(), shifted.turnovers());
        assert_ne!(base, shifted);
    }

    #[test]
    fn ring_out_of_range() {
        let rotor = rotor_i();
        assert_eq!(
            rotor.ring(0),
            Err(EnigmaError::RingSettingOutOfRange { ring: 0, size: 26 })
        );
        assert!(rotor.ring(27).is_err());
        assert!(rotor.ring(26).is_ok());
    }

    #[test]
    fn entry_wheel_has_no_ring() {
        let etw = Wheel::entry_wheel("ETW", &alphabet(), LETTERS_26).unwrap();
        assert!(!etw.is_turnable());
        assert!(etw.ring(1).is_ok());
        assert!(matches!(
            etw.ring(2),
            Err(EnigmaError::NotRingAdjustable { .. })
        ));
    }

    #[test]
    fn turnable_flag_is_distinct_from_marks() {
        let alphabet = alphabet();
        let fixed = Wheel::reflector("UKW", &alphabet, "YRUHQSLDPXNGOKMIEBFZCWVJAT", None)
            .unwrap();
        let moving =
            Wheel::reflector("UKW", &alphabet, "YRUHQSLDPXNGOKMIEBFZCWVJAT", Some("")).unwrap();
        assert!(!fixed.is_turnable());
        assert!(moving.is_turnable());
        assert!(moving.turnovers().is_empty());
        let rotor = rotor_i();
        assert!(rotor.is_turnover(17));
        assert!(!rotor.is_turnover(16));
    }

    #[test]
    fn unknown_turnover_letter() {
        let err = Wheel::rotor("I", &alphabet(), "EKMFLGDQVZNTOWYHXUSPAIBRCJ", Some("1"));
        assert_eq!(err, Err(EnigmaError::UnknownSymbol { symbol: '1' }));
    }

    #[test]
    fn out_of_range_input_yields_none() {
        let rotor = rotor_i();
        assert_eq!(rotor.scramble_forward(0), None);
        assert_eq!(rotor.scramble_backward(27), None);
    }

    proptest! {
        #[test]
        fn ring_preserves_inverse(ring in 1usize..=26, x in 1usize..=26) {
            let rotor = rotor_i().ring(ring).unwrap();
            let y = rotor.scramble_forward(x).unwrap();
            prop_assert_eq!(rotor.scramble_backward(y), Some(x));
        }
    }
}
