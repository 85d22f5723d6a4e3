//! Signal chain: stepping and the reflecting traversal.
//!
//! A chain is a fixed-size array of `{device, position}` nodes ordered from
//! the keyboard side to the reflector: plugboard (optional), entry wheel,
//! rotors right to left, reflector. It is rebuilt from the machine's
//! positions for every key press.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::alphabet::normalize;
use crate::error::{EnigmaError, Result};
use crate::tracer::{ScrambleTracer, TraceEvent};
use crate::wheel::Wheel;

/// Plugboard, entry wheel, four rotors, reflector, and one spare slot.
pub const MAX_CHAIN_LEN: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnoverMechanism {
    /// Ratchet and pawl stepping, with the double-step anomaly.
    #[default]
    Regular,
    /// Gear driven stepping of the Abwehr machines.
    CogWheel,
}

#[derive(Clone, Copy, Debug)]
pub struct ChainNode<'a> {
    pub device: &'a Wheel,
    pub position: usize,
}

impl ChainNode<'_> {
    fn advance(&mut self) {
        self.position = normalize(self.position as i64 + 1, self.device.size());
    }

    fn offset(&self) -> i64 {
        self.position as i64 - 1
    }
}

#[derive(Clone, Debug)]
pub struct SignalChain<'a> {
    nodes: [Option<ChainNode<'a>>; MAX_CHAIN_LEN],
    len: usize,
}

impl Default for SignalChain<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SignalChain<'a> {
    pub fn new() -> Self {
        Self {
            nodes: [None; MAX_CHAIN_LEN],
            len: 0,
        }
    }

    /// Appends a device at `position`. Every device in a chain must have the
    /// same number of contacts.
    pub fn push(&mut self, device: &'a Wheel, position: usize) -> Result<()> {
        if self.len == MAX_CHAIN_LEN {
            return Err(EnigmaError::ChainFull {
                capacity: MAX_CHAIN_LEN,
            });
        }
        if let Some(first) = self.node(0) {
            if first.device.size() != device.size() {
                return Err(EnigmaError::DeviceSizeMismatch {
                    name: device.name().to_string(),
                    expected: first.device.size(),
                    found: device.size(),
                });
            }
        }
        if position == 0 || position > device.size() {
            return Err(EnigmaError::PositionOutOfRange {
                position,
                size: device.size(),
            });
        }
        self.nodes[self.len] = Some(ChainNode { device, position });
        self.len += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node(&self, index: usize) -> Option<&ChainNode<'a>> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ChainNode<'a>> + '_ {
        self.nodes[..self.len].iter().flatten()
    }

    pub fn position(&self, index: usize) -> Option<usize> {
        self.node(index).map(|node| node.position)
    }

    /// Advances the wheels for one key press.
    ///
    /// The walk starts at the keyboard side with the first node forced and
    /// carries a turnover flag toward the reflector. Fixed devices pass the
    /// flag through untouched.
    pub fn step(&mut self, mechanism: TurnoverMechanism) {
        let mut carry = true;
        for idx in 0..self.len {
            // `None` when this is the last node.
            let next_turnable = self.node(idx + 1).map(|next| next.device.is_turnable());
            let Some(node) = self.nodes[idx].as_mut() else {
                break;
            };
            if !node.device.is_turnable() {
                continue;
            }
            let at_mark = node.device.is_turnover(node.position);
            match mechanism {
                TurnoverMechanism::Regular => {
                    // A wheel on its mark pushes its neighbour, and moves
                    // itself along with it: the double step.
                    let pushes = at_mark && next_turnable.unwrap_or(true);
                    if carry || pushes {
                        node.advance();
                    }
                    carry = pushes;
                }
                TurnoverMechanism::CogWheel => {
                    if carry || at_mark {
                        node.advance();
                    }
                    if !at_mark {
                        break;
                    }
                    carry = true;
                }
            }
        }
        trace!(
            "step mechanism={:?} positions={:?}",
            mechanism,
            self.nodes().map(|node| node.position).collect::<Vec<_>>()
        );
    }

    /// Sends one contact number through the chain and back.
    ///
    /// `None` is the unsupported-symbol sentinel and comes back unchanged.
    pub fn scramble(
        &self,
        input: Option<usize>,
        mut tracer: Option<&mut (dyn ScrambleTracer + '_)>,
    ) -> Option<usize> {
        let input = input?;
        if self.len == 0 {
            return Some(input);
        }
        let mut forward_in = [0usize; MAX_CHAIN_LEN];
        let mut forward_out = [0usize; MAX_CHAIN_LEN];
        let mut signal = input;
        for (idx, node) in self.nodes().enumerate() {
            let out = pass(node, signal, Wheel::scramble_forward)?;
            forward_in[idx] = signal;
            forward_out[idx] = out;
            if let Some(tracer) = tracer.as_deref_mut() {
                let last = idx + 1 == self.len;
                tracer.trace(&TraceEvent {
                    device: node.device.name(),
                    kind: node.device.kind(),
                    position: node.position,
                    forward_in: signal,
                    forward_out: out,
                    backward_in: if last { signal } else { 0 },
                    backward_out: if last { out } else { 0 },
                });
            }
            signal = out;
        }
        for idx in (0..self.len - 1).rev() {
            let node = self.node(idx)?;
            let out = pass(node, signal, Wheel::scramble_backward)?;
            if let Some(tracer) = tracer.as_deref_mut() {
                tracer.trace(&TraceEvent {
                    device: node.device.name(),
                    kind: node.device.kind(),
                    position: node.position,
                    forward_in: forward_in[idx],
                    forward_out: forward_out[idx],
                    backward_in: signal,
                    backward_out: out,
                });
            }
            signal = out;
        }
        Some(signal)
    }
}

// Rotates the signal into the wheel's frame, maps it, and rotates it back.
fn pass(node: &ChainNode<'_>, signal: usize, map: fn(&Wheel, usize) -> Option<usize>) -> Option<usize> {
    let size = node.device.size();
    let offset = node.offset();
    let entered = normalize(signal as i64 + offset, size);
    let mapped = map(node.device, entered)?;
    Some(normalize(mapped as i64 - offset, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{Alphabet, LETTERS_26};
    use crate::tracer::TraceRecorder;
    use proptest::prelude::*;

    struct Rig {
        etw: Wheel,
        rotors: Vec<Wheel>,
        reflector: Wheel,
    }

    fn alphabet() -> Alphabet {
        Alphabet::new(LETTERS_26).unwrap()
    }

    fn rig() -> Rig {
        let a = alphabet();
        Rig {
            etw: Wheel::entry_wheel("ETW", &a, LETTERS_26).unwrap(),
            // right to left: III, II, I
            rotors: vec![
                Wheel::rotor("III", &a, "BDFHJLCPRTXVZNYEIWGAKMUSQO", Some("V")).unwrap(),
                Wheel::rotor("II", &a, "AJDKSIRUXBLHWTMCQGZNPYFVOE", Some("E")).unwrap(),
                Wheel::rotor("I", &a, "EKMFLGDQVZNTOWYHXUSPAIBRCJ", Some("Q")).unwrap(),
            ],
            reflector: Wheel::reflector("UKW-B", &a, "YRUHQSLDPXNGOKMIEBFZCWVJAT", None)
                .unwrap(),
        }
    }

    fn letter(c: char) -> usize {
        alphabet().position(c).unwrap()
    }

    // `window` reads left to right, as on the machine.
    fn rig_chain<'a>(rig: &'a Rig, window: &str) -> SignalChain<'a> {
        let mut chain = SignalChain::new();
        chain.push(&rig.etw, 1).unwrap();
        for (rotor, symbol) in rig.rotors.iter().zip(window.chars().rev()) {
            chain.push(rotor, letter(symbol)).unwrap();
        }
        chain.push(&rig.reflector, 1).unwrap();
        chain
    }

    fn window(chain: &SignalChain<'_>) -> String {
        (1..=3)
            .rev()
            .map(|idx| {
                alphabet()
                    .symbol(chain.position(idx).unwrap())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn fast_rotor_always_steps() {
        let rig = rig();
        let mut chain = rig_chain(&rig, "AAA");
        chain.step(TurnoverMechanism::Regular);
        assert_eq!(window(&chain), "AAB");
    }

    #[test]
    fn turnover_moves_middle_rotor() {
        let rig = rig();
        let mut chain = rig_chain(&rig, "AAU");
        chain.step(TurnoverMechanism::Regular);
        assert_eq!(window(&chain), "AAV");
        chain.step(TurnoverMechanism::Regular);
        assert_eq!(window(&chain), "ABW");
    }

    #[test]
    fn double_step_sequence() {
        let rig = rig();
        let mut seen = Vec::new();
        let mut current = "ADU".to_string();
        for _ in 0..4 {
            let mut chain = rig_chain(&rig, &current);
            chain.step(TurnoverMechanism::Regular);
            current = window(&chain);
            seen.push(current.clone());
        }
        assert_eq!(seen, ["ADV", "AEW", "BFX", "BFY"]);
    }

    #[test]
    fn fixed_nodes_are_skipped() {
        let rig = rig();
        let mut chain = rig_chain(&rig, "AAA");
        chain.step(TurnoverMechanism::Regular);
        assert_eq!(chain.position(0), Some(1));
        assert_eq!(chain.position(4), Some(1));
    }

    #[test]
    fn cog_wheel_only_moves_from_marks() {
        let a = alphabet();
        let etw = Wheel::entry_wheel("ETW", &a, LETTERS_26).unwrap();
        let fast = Wheel::rotor("V", &a, "QTPIXWVDFRMUSLJOHCANEZKYBG", Some("SWZFHMQ")).unwrap();
        let middle =
            Wheel::rotor("II", &a, "TFJQAZWMHLCUIXRDYGOEVBNSKP", Some("STVYZACDFGHKMNQ")).unwrap();
        let reflector =
            Wheel::reflector("UKW", &a, "IMETCGFRAYSQBZXWLHKDVUPOJN", Some("")).unwrap();
        let mut chain = SignalChain::new();
        chain.push(&etw, 1).unwrap();
        chain.push(&fast, letter('R')).unwrap();
        chain.push(&middle, letter('B')).unwrap();
        chain.push(&reflector, 1).unwrap();
        // R is not a mark: only the forced fast wheel moves.
        chain.step(TurnoverMechanism::CogWheel);
        assert_eq!(chain.position(1), Some(letter('S')));
        assert_eq!(chain.position(2), Some(letter('B')));
        assert_eq!(chain.position(3), Some(1));
        // S is a mark, B is not: the middle wheel is pushed, the reflector stays.
        chain.step(TurnoverMechanism::CogWheel);
        assert_eq!(chain.position(1), Some(letter('T')));
        assert_eq!(chain.position(2), Some(letter('C')));
        assert_eq!(chain.position(3), Some(1));
        // T is not a mark.
        chain.step(TurnoverMechanism::CogWheel);
        assert_eq!(chain.position(2), Some(letter('C')));
    }

    #[test]
    fn cog_wheel_pushes_turnable_reflector() {
        let a = alphabet();
        let etw = Wheel::entry_wheel("ETW", &a, LETTERS_26).unwrap();
        let fast = Wheel::rotor("V", &a, "QTPIXWVDFRMUSLJOHCANEZKYBG", Some("SWZFHMQ")).unwrap();
        let reflector =
            Wheel::reflector("UKW", &a, "IMETCGFRAYSQBZXWLHKDVUPOJN", Some("")).unwrap();
        let mut chain = SignalChain::new();
        chain.push(&etw, 1).unwrap();
        chain.push(&fast, letter('Q')).unwrap();
        chain.push(&reflector, 1).unwrap();
        chain.step(TurnoverMechanism::CogWheel);
        assert_eq!(chain.position(1), Some(letter('R')));
        assert_eq!(chain.position(2), Some(2));
    }

    #[test]
    fn push_validates() {
        let rig = rig();
        let mut chain = SignalChain::new();
        assert_eq!(
            chain.push(&rig.etw, 27),
            Err(EnigmaError::PositionOutOfRange {
                position: 27,
                size: 26
            })
        );
        assert!(chain.push(&rig.etw, 0).is_err());
        let digits = Alphabet::new("0123456789").unwrap();
        let small = Wheel::entry_wheel("ETW", &digits, "0123456789").unwrap();
        chain.push(&rig.etw, 1).unwrap();
        assert!(matches!(
            chain.push(&small, 1),
            Err(EnigmaError::DeviceSizeMismatch { .. })
        ));
        for _ in 1..MAX_CHAIN_LEN {
            chain.push(&rig.etw, 1).unwrap();
        }
        assert_eq!(
            chain.push(&rig.etw, 1),
            Err(EnigmaError::ChainFull {
                capacity: MAX_CHAIN_LEN
            })
        );
    }

    #[test]
    fn sentinel_passes_through() {
        let rig = rig();
        let chain = rig_chain(&rig, "AAA");
        assert_eq!(chain.scramble(None, None), None);
        assert_eq!(SignalChain::new().scramble(Some(4), None), Some(4));
    }

    #[test]
    fn tracer_sees_both_directions() {
        let rig = rig();
        let mut chain = rig_chain(&rig, "AAA");
        chain.step(TurnoverMechanism::Regular);
        let mut recorder = TraceRecorder::new();
        let out = chain.scramble(Some(1), Some(&mut recorder));
        // A -> B with I-II-III at AAA
        assert_eq!(out, Some(2));
        let records = recorder.records();
        assert_eq!(records.len(), 2 * chain.len() - 1);
        let names: Vec<_> = records.iter().map(|r| r.device.as_str()).collect();
        assert_eq!(
            names,
            ["ETW", "III", "II", "I", "UKW-B", "I", "II", "III", "ETW"]
        );
        assert_eq!(records[0].backward_in, 0);
        assert_eq!(records[4].forward_in, records[4].backward_in);
        assert_eq!(records[8].backward_out, 2);
        assert_eq!(records[1].position, 2);
    }

    proptest! {
        #[test]
        fn scramble_is_reciprocal(
            left in 1usize..=26,
            middle in 1usize..=26,
            right in 1usize..=26,
            x in 1usize..=26,
        ) {
            let rig = rig();
            let mut chain = SignalChain::new();
            chain.push(&rig.etw, 1).unwrap();
            chain.push(&rig.rotors[0], right).unwrap();
            chain.push(&rig.rotors[1], middle).unwrap();
            chain.push(&rig.rotors[2], left).unwrap();
            chain.push(&rig.reflector, 1).unwrap();
            let y = chain.scramble(Some(x), None).unwrap();
            prop_assert_ne!(x, y);
            prop_assert_eq!(chain.scramble(Some(y), None), Some(x));
        }
    }
}
