//! Machine alphabets and the 1-based position arithmetic shared by every
//! wheel.

use std::fmt;
use std::sync::Arc;

use crate::error::{EnigmaError, Result};

pub const LETTERS_26: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const LETTERS_28: &str = "ABCDEFGHIJKLMNOPQRSTUVXYZÅÄÖ";
pub const LETTERS_10: &str = "1234567890";

/// Ordered set of unique symbols. Positions are 1-based.
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Arc<[char]>,
}

impl Alphabet {
    pub fn new(letters: &str) -> Result<Self> {
        let symbols: Vec<char> = letters.chars().collect();
        if symbols.is_empty() {
            return Err(EnigmaError::EmptyAlphabet);
        }
        for (idx, symbol) in symbols.iter().enumerate() {
            if symbols[..idx].contains(symbol) {
                return Err(EnigmaError::DuplicateSymbol { symbol: *symbol });
            }
        }
        Ok(Self {
            symbols: symbols.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// 1-based position of `symbol`, or `None` when it is not in the alphabet.
    pub fn position(&self, symbol: char) -> Option<usize> {
        self.symbols
            .iter()
            .position(|candidate| *candidate == symbol)
            .map(|idx| idx + 1)
    }

    pub fn require_position(&self, symbol: char) -> Result<usize> {
        self.position(symbol)
            .ok_or(EnigmaError::UnknownSymbol { symbol })
    }

    pub fn symbol(&self, position: usize) -> Option<char> {
        position
            .checked_sub(1)
            .and_then(|idx| self.symbols.get(idx))
            .copied()
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Checks that `position` is a valid 1-based index into this alphabet.
    pub fn check_position(&self, position: usize) -> Result<usize> {
        if position == 0 || position > self.len() {
            return Err(EnigmaError::PositionOutOfRange {
                position,
                size: self.len(),
            });
        }
        Ok(position)
    }
}

impl fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alphabet({})", self)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in self.symbols.iter() {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// Wraps `n` into `1..=size`.
pub fn normalize(n: i64, size: usize) -> usize {
    let base = size as i64;
    match n.rem_euclid(base) {
        0 => size,
        r => r as usize,
    }
}

/// Wraps `n` into `0..size`.
pub fn normalize0(n: i64, size: usize) -> usize {
    n.rem_euclid(size as i64) as usize
}
