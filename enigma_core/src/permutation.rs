use std::collections::HashMap;

use crate::error::{EnigmaError, Result};
use crate::pairs::{WiringPair, pairs_to_wiring};

/// Placeholder contact used by the rewirable reflector for its fixed pair.
/// A placeholder in the wiring that lands on its own slot is routed to the
/// next placeholder in the contact list instead; without one the wiring is
/// rejected.
pub const PLACEHOLDER: char = '-';

/// Immutable bijection over `1..=size`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Permutation {
    forward: Box<[u32]>,
    backward: Box<[u32]>,
}

impl Permutation {
    pub fn identity(size: usize) -> Self {
        let table: Box<[u32]> = (0..size).map(|idx| idx as u32).collect();
        Self {
            forward: table.clone(),
            backward: table,
        }
    }

    /// Builds the permutation that sends contact `i` of `letters` to the
    /// contact carrying `wiring[i]`.
    pub fn from_wiring(letters: &str, wiring: &str) -> Result<Self> {
        let contacts: Vec<char> = letters.chars().collect();
        let targets: Vec<char> = wiring.chars().collect();
        if contacts.len() != targets.len() {
            return Err(EnigmaError::WiringLengthMismatch {
                expected: contacts.len(),
                found: targets.len(),
            });
        }
        let size = contacts.len();
        let mut first: HashMap<char, usize> = HashMap::with_capacity(size);
        for (idx, &c) in contacts.iter().enumerate() {
            first.entry(c).or_insert(idx);
        }
        let mut forward = vec![u32::MAX; size];
        let mut backward = vec![u32::MAX; size];
        for (wi, &symbol) in targets.iter().enumerate() {
            let mut li = *first
                .get(&symbol)
                .ok_or(EnigmaError::UnknownSymbol { symbol })?;
            if symbol == PLACEHOLDER && li == wi {
                let next = contacts[li + 1..]
                    .iter()
                    .position(|c| *c == symbol)
                    .ok_or(EnigmaError::UnknownSymbol { symbol })?;
                li += next + 1;
            }
            if backward[li] != u32::MAX {
                return Err(EnigmaError::DuplicateWiring { symbol });
            }
            forward[wi] = li as u32;
            backward[li] = wi as u32;
        }
        Ok(Self {
            forward: forward.into(),
            backward: backward.into(),
        })
    }

    /// Pairwise swap over `letters`; unpaired contacts map to themselves.
    pub fn from_pairs(letters: &str, pairs: &[WiringPair]) -> Result<Self> {
        let wiring = pairs_to_wiring(letters, pairs)?;
        Self::from_wiring(letters, &wiring)
    }

    pub fn size(&self) -> usize {
        self.forward.len()
    }

    /// Maps a 1-based contact forward. `None` when `position` is out of range.
    pub fn forward(&self, position: usize) -> Option<usize> {
        lookup(&self.forward, position)
    }

    pub fn backward(&self, position: usize) -> Option<usize> {
        lookup(&self.backward, position)
    }

    pub fn is_involution(&self) -> bool {
        self.forward == self.backward
    }

    pub fn is_identity(&self) -> bool {
        self.forward
            .iter()
            .enumerate()
            .all(|(idx, target)| idx == *target as usize)
    }

    /// Renders the forward mapping as a wiring string over `letters`.
    pub fn wiring(&self, letters: &[char]) -> Option<String> {
        self.forward
            .iter()
            .map(|target| letters.get(*target as usize).copied())
            .collect()
    }
}

fn lookup(table: &[u32], position: usize) -> Option<usize> {
    let idx = position.checked_sub(1)?;
    table.get(idx).map(|target| *target as usize + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::LETTERS_26;
    use proptest::prelude::*;

    const ROTOR_I: &str = "EKMFLGDQVZNTOWYHXUSPAIBRCJ";

    #[test]
    fn forward_and_backward_follow_wiring() {
        let perm = Permutation::from_wiring(LETTERS_26, ROTOR_I).unwrap();
        assert_eq!(perm.size(), 26);
        // A -> E, E -> L
        assert_eq!(perm.forward(1), Some(5));
        assert_eq!(perm.forward(5), Some(12));
        assert_eq!(perm.backward(5), Some(1));
        assert_eq!(perm.forward(0), None);
        assert_eq!(perm.backward(27), None);
    }

    #[test]
    fn rejects_length_mismatch() {
        assert_eq!(
            Permutation::from_wiring(LETTERS_26, "ABC"),
            Err(EnigmaError::WiringLengthMismatch {
                expected: 26,
                found: 3
            })
        );
    }

    #[test]
    fn rejects_unknown_and_repeated_symbols() {
        assert_eq!(
            Permutation::from_wiring("ABC", "AB1"),
            Err(EnigmaError::UnknownSymbol { symbol: '1' })
        );
        assert_eq!(
            Permutation::from_wiring("ABC", "ABA"),
            Err(EnigmaError::DuplicateWiring { symbol: 'A' })
        );
    }

    #[test]
    fn placeholder_maps_to_second_occurrence() {
        let letters = "A-ZXWVUTSRQPON-MLKIHGFEDCB";
        let perm = Permutation::from_wiring(letters, letters).unwrap();
        assert_eq!(perm.forward(2), Some(15));
        assert_eq!(perm.forward(15), Some(2));
        assert_eq!(perm.forward(1), Some(1));
        assert!(!perm.is_identity());
    }

    #[test]
    fn lone_placeholder_is_rejected() {
        assert_eq!(
            Permutation::from_wiring("A-B", "A-B"),
            Err(EnigmaError::UnknownSymbol { symbol: PLACEHOLDER })
        );
        // a lone placeholder wired elsewhere is an ordinary contact
        let perm = Permutation::from_wiring("A-B", "-AB").unwrap();
        assert_eq!(perm.forward(1), Some(2));
    }

    #[test]
    fn tables_hold_alphabets_past_u16() {
        let size = u16::MAX as usize + 10;
        let letters: String = (0..size as u32)
            .map(|i| char::from_u32(0x10000 + i).unwrap())
            .collect();
        let wiring: String = letters.chars().rev().collect();
        let perm = Permutation::from_wiring(&letters, &wiring).unwrap();
        assert_eq!(perm.size(), size);
        assert_eq!(perm.forward(1), Some(size));
        assert_eq!(perm.forward(size), Some(1));
        assert_eq!(perm.backward(70_000), Some(size + 1 - 70_000));
        assert!(perm.is_involution());
        assert!(Permutation::identity(size).is_identity());
    }

    #[test]
    fn pairs_build_an_involution() {
        let pairs = WiringPair::parse_list("AB CD").unwrap();
        let perm = Permutation::from_pairs(LETTERS_26, &pairs).unwrap();
        assert!(perm.is_involution());
        assert_eq!(perm.forward(1), Some(2));
        assert_eq!(perm.forward(4), Some(3));
        assert_eq!(perm.forward(5), Some(5));
        let letters: Vec<char> = LETTERS_26.chars().collect();
        assert_eq!(
            perm.wiring(&letters).unwrap(),
            "BADCEFGHIJKLMNOPQRSTUVWXYZ"
        );
    }

    #[test]
    fn identity_is_identity() {
        let perm = Permutation::identity(10);
        assert!(perm.is_identity());
        assert!(perm.is_involution());
    }

    proptest! {
        #[test]
        fn forward_backward_are_inverse(seed in any::<u64>()) {
            use rand::SeedableRng;
            use rand::seq::SliceRandom;
            let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(seed);
            let mut shuffled: Vec<char> = LETTERS_26.chars().collect();
            shuffled.shuffle(&mut rng);
            let wiring: String = shuffled.into_iter().collect();
            let perm = Permutation::from_wiring(LETTERS_26, &wiring).unwrap();
            for x in 1..=26 {
                prop_assert_eq!(perm.forward(perm.backward(x).unwrap()), Some(x));
                prop_assert_eq!(perm.backward(perm.forward(x).unwrap()), Some(x));
            }
        }
    }
}
