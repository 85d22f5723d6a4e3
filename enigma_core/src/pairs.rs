//! Letter pairs and the pair-to-wiring algorithms used by the plugboard,
//! the Uhr accessory, and the rewirable reflector.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alphabet::normalize0;
use crate::error::{EnigmaError, Result};

/// Number of plugboard cables the Uhr accessory takes.
pub const UHR_PAIRS: usize = 10;
/// Number of dial positions on the Uhr.
pub const UHR_POSITIONS: usize = 40;

// Socket wiring inside the Uhr, from the A side to the B side.
const UHR_A_TO_B: [usize; UHR_POSITIONS] = [
    6, 31, 4, 29, 18, 39, 16, 25, 30, 23, 28, 1, 38, 11, 36, 37, 26, 27, 24, 21, 14, 3, 12, 17, 2,
    7, 0, 33, 10, 35, 8, 5, 22, 19, 20, 13, 34, 15, 32, 9,
];
static UHR_B_TO_A: [usize; UHR_POSITIONS] = invert(&UHR_A_TO_B);

// Cable index feeding each group of four sockets on either side.
static UHR_PAIR_A: [usize; UHR_PAIRS] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
static UHR_PAIR_B: [usize; UHR_PAIRS] = [6, 0, 7, 5, 1, 8, 4, 2, 9, 3];

const fn invert(table: &[usize; UHR_POSITIONS]) -> [usize; UHR_POSITIONS] {
    let mut out = [0; UHR_POSITIONS];
    let mut i = 0;
    while i < UHR_POSITIONS {
        out[table[i]] = i;
        i += 1;
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WiringPair {
    pub first: char,
    pub second: char,
}

impl WiringPair {
    pub const fn new(first: char, second: char) -> Self {
        Self { first, second }
    }

    /// Parses a two-symbol token such as `"AV"`.
    pub fn parse(token: &str) -> Result<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(first), Some(second), None) => Ok(Self::new(first, second)),
            _ => Err(EnigmaError::InvalidPairNotation {
                token: token.to_string(),
            }),
        }
    }

    /// Parses whitespace separated pairs, `"AV BS CG"`.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        text.split_whitespace().map(Self::parse).collect()
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.first == symbol || self.second == symbol
    }

    /// True when both pairs connect the same two letters.
    pub fn same_cable(&self, other: &WiringPair) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

impl fmt::Display for WiringPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.first, self.second)
    }
}

pub fn format_pairs(pairs: &[WiringPair]) -> String {
    pairs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rejects pairs that reuse a letter or connect a letter to itself.
pub fn check_distinct(pairs: &[WiringPair]) -> Result<()> {
    let mut seen: Vec<char> = Vec::with_capacity(pairs.len() * 2);
    for pair in pairs {
        if pair.first == pair.second {
            return Err(EnigmaError::SelfPair { symbol: pair.first });
        }
        for symbol in [pair.first, pair.second] {
            if seen.contains(&symbol) {
                return Err(EnigmaError::DuplicatePair { symbol });
            }
            seen.push(symbol);
        }
    }
    Ok(())
}

/// Swaps each pair inside `letters` and returns the resulting wiring string.
///
/// Each pair takes the first free occurrence of its letters, so a pair made
/// of two identical placeholder contacts connects both of them.
pub fn pairs_to_wiring(letters: &str, pairs: &[WiringPair]) -> Result<String> {
    let contacts: Vec<char> = letters.chars().collect();
    let mut wiring = contacts.clone();
    for pair in pairs {
        let mut first = None;
        let mut second = None;
        for (idx, contact) in contacts.iter().enumerate() {
            if first.is_none() && *contact == pair.first {
                first = Some(idx);
            } else if second.is_none() && *contact == pair.second {
                second = Some(idx);
            }
        }
        let first = first.ok_or(EnigmaError::UnknownSymbol { symbol: pair.first })?;
        let second = second.ok_or(if pair.first == pair.second {
            EnigmaError::SelfPair { symbol: pair.second }
        } else {
            EnigmaError::UnknownSymbol {
                symbol: pair.second,
            }
        })?;
        wiring[first] = pair.second;
        wiring[second] = pair.first;
    }
    Ok(wiring.into_iter().collect())
}

/// Wiring produced by routing ten plugboard cables through the Uhr at dial
/// `setting`.
///
/// The `first` letters of the pairs are the A (red) plugs, the `second`
/// letters the B (white) plugs.
pub fn pairs_to_wiring_uhr(letters: &str, pairs: &[WiringPair], setting: usize) -> Result<String> {
    if pairs.len() != UHR_PAIRS {
        return Err(EnigmaError::UhrPairCount { found: pairs.len() });
    }
    if setting >= UHR_POSITIONS {
        return Err(EnigmaError::UhrSettingOutOfRange { setting });
    }
    let contacts: Vec<char> = letters.chars().collect();
    let index_of = |symbol: char| {
        contacts
            .iter()
            .position(|c| *c == symbol)
            .ok_or(EnigmaError::UnknownSymbol { symbol })
    };
    let mut wiring = contacts.clone();
    let dial = setting as i64;
    for pair_idx in 0..UHR_PAIRS {
        let letter_a = pairs[UHR_PAIR_A[pair_idx]].first;
        let letter_b = pairs[UHR_PAIR_B[pair_idx]].second;
        let pos = normalize0(pair_idx as i64 * 4 + dial, UHR_POSITIONS);
        let pos_to_b = normalize0(UHR_A_TO_B[pos] as i64 - 2 - dial, UHR_POSITIONS);
        let pos_to_a = normalize0(UHR_B_TO_A[pos] as i64 - 2 - dial, UHR_POSITIONS);
        let partner_b = pairs[UHR_PAIR_B[pos_to_b / 4]].second;
        let partner_a = pairs[UHR_PAIR_A[pos_to_a / 4]].first;
        wiring[index_of(letter_a)?] = partner_b;
        wiring[index_of(letter_b)?] = partner_a;
    }
    Ok(wiring.into_iter().collect())
}

/// Converts the two-letter Uhr indicator into a dial setting in `0..40`.
pub fn uhr_setting(bigram: &str) -> Result<usize> {
    let invalid = || EnigmaError::InvalidUhrBigram {
        bigram: bigram.to_string(),
    };
    let mut chars = bigram.chars().map(|c| c.to_ascii_uppercase());
    let (tens, units) = match (chars.next(), chars.next(), chars.next()) {
        (Some(tens), Some(units), None) => (tens, units),
        _ => return Err(invalid()),
    };
    let tens = match tens {
        'A'..='F' => 0,
        'G'..='M' => 10,
        'N'..='S' => 20,
        'T'..='Z' => 30,
        _ => return Err(invalid()),
    };
    let units = match units {
        'A'..='C' => 0,
        'D'..='E' => 1,
        'F'..='H' => 2,
        'I'..='J' => 3,
        'K'..='M' => 4,
        'N'..='O' => 5,
        'P'..='R' => 6,
        'S'..='T' => 7,
        'U'..='W' => 8,
        'X'..='Z' => 9,
        _ => return Err(invalid()),
    };
    Ok(tens + units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::LETTERS_26;

    // The historical Uhr documentation omits J.
    const LETTERS_25: &str = "ABCDEFGHIKLMNOPQRSTUVWXYZ";
    const BARBAROSSA: &str = "AV BS CG DL FU HZ IN KM OW RX";

    fn uhr(setting: usize) -> String {
        let pairs = WiringPair::parse_list(BARBAROSSA).unwrap();
        pairs_to_wiring_uhr(LETTERS_25, &pairs, setting).unwrap()
    }

    fn plain(text: &str) -> String {
        let pairs = WiringPair::parse_list(text).unwrap();
        pairs_to_wiring(LETTERS_25, &pairs).unwrap()
    }

    #[test]
    fn parse_pairs() {
        let pairs = WiringPair::parse_list(" AV  BS\tCG ").unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0], WiringPair::new('A', 'V'));
        assert_eq!(format_pairs(&pairs), "AV BS CG");
        assert!(WiringPair::parse_list("").unwrap().is_empty());
        assert_eq!(
            WiringPair::parse_list("AV BSX"),
            Err(EnigmaError::InvalidPairNotation {
                token: "BSX".to_string()
            })
        );
    }

    #[test]
    fn plain_swap() {
        let pairs = WiringPair::parse_list(BARBAROSSA).unwrap();
        assert_eq!(
            pairs_to_wiring(LETTERS_26, &pairs).unwrap(),
            "VSGLEUCZNJMDKIWPQXBTFAORYH"
        );
        assert_eq!(pairs_to_wiring(LETTERS_26, &[]).unwrap(), LETTERS_26);
    }

    #[test]
    fn plain_swap_rejects_unknown_letter() {
        let pairs = WiringPair::parse_list("AJ").unwrap();
        assert_eq!(
            pairs_to_wiring(LETTERS_25, &pairs),
            Err(EnigmaError::UnknownSymbol { symbol: 'J' })
        );
    }

    #[test]
    fn distinct_pairs() {
        assert!(check_distinct(&WiringPair::parse_list("AB CD").unwrap()).is_ok());
        assert_eq!(
            check_distinct(&WiringPair::parse_list("AB CA").unwrap()),
            Err(EnigmaError::DuplicatePair { symbol: 'A' })
        );
        assert_eq!(
            check_distinct(&WiringPair::parse_list("AA").unwrap()),
            Err(EnigmaError::SelfPair { symbol: 'A' })
        );
    }

    #[test]
    fn uhr_known_settings() {
        assert_eq!(uhr(0), plain(BARBAROSSA));
        assert_eq!(uhr(1), "GLWMEUANVXDRCSPQZHTBKFIYO");
        assert_eq!(uhr(2), "NZUXEWBMLVCIHSPQGATDRKOYF");
        assert_eq!(uhr(3), "UWLXESRZGNACFMPQVKTDHBIYO");
        assert_eq!(uhr(4), plain("AZ BU CX DW FM HL IV KS OG RN"));
        assert_eq!(uhr(36), plain("AL BM CW DX FN HG IS KV OZ RU"));
        assert_eq!(uhr(39), "MGUNELFWSXKIBVPQZRTCHOAYD");
    }

    #[test]
    fn uhr_rejects_bad_input() {
        let pairs = WiringPair::parse_list("AB CD").unwrap();
        assert_eq!(
            pairs_to_wiring_uhr(LETTERS_26, &pairs, 0),
            Err(EnigmaError::UhrPairCount { found: 2 })
        );
        let pairs = WiringPair::parse_list(BARBAROSSA).unwrap();
        assert_eq!(
            pairs_to_wiring_uhr(LETTERS_26, &pairs, 40),
            Err(EnigmaError::UhrSettingOutOfRange { setting: 40 })
        );
    }

    #[test]
    fn uhr_bigrams() {
        let cases = [
            ("AA", 0),
            ("FC", 0),
            ("AD", 1),
            ("FE", 1),
            ("AF", 2),
            ("FH", 2),
            ("AI", 3),
            ("FJ", 3),
            ("AK", 4),
            ("FM", 4),
            ("AN", 5),
            ("FO", 5),
            ("AP", 6),
            ("FR", 6),
            ("AS", 7),
            ("FT", 7),
            ("AU", 8),
            ("FW", 8),
            ("AX", 9),
            ("FZ", 9),
            ("GA", 10),
            ("MC", 10),
            ("NA", 20),
            ("SC", 20),
            ("TA", 30),
            ("ZC", 30),
            ("TX", 39),
            ("ZZ", 39),
            ("zz", 39),
        ];
        for (bigram, expected) in cases {
            assert_eq!(uhr_setting(bigram).unwrap(), expected, "bigram {bigram}");
        }
        assert!(uhr_setting("A").is_err());
        assert!(uhr_setting("AAA").is_err());
        assert!(uhr_setting("A1").is_err());
    }
}
