use thiserror::Error;

use crate::wheel::DeviceKind;

/// Errors raised while configuring or driving a machine.
///
/// Every variant except [`EnigmaError::UnsupportedLetter`] is a setup failure:
/// it is reported by the builder call that received the bad value and never
/// in the middle of a translation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnigmaError {
    #[error("wiring length mismatch: alphabet has {expected} symbols, wiring has {found}")]
    WiringLengthMismatch { expected: usize, found: usize },

    #[error("symbol {symbol:?} is not part of the alphabet")]
    UnknownSymbol { symbol: char },

    #[error("alphabet contains {symbol:?} more than once")]
    DuplicateSymbol { symbol: char },

    #[error("alphabet must not be empty")]
    EmptyAlphabet,

    #[error("wiring maps more than one contact onto {symbol:?}")]
    DuplicateWiring { symbol: char },

    #[error("position {position} is outside 1..={size}")]
    PositionOutOfRange { position: usize, size: usize },

    #[error("ring setting {ring} is outside 1..={size}")]
    RingSettingOutOfRange { ring: usize, size: usize },

    #[error("{kind:?} '{name}' does not take a ring setting")]
    NotRingAdjustable { kind: DeviceKind, name: String },

    #[error("slot {slot} is outside 1..={slots}")]
    SlotOutOfRange { slot: usize, slots: usize },

    #[error("device '{name}' has {found} contacts, the machine expects {expected}")]
    DeviceSizeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("signal chain holds at most {capacity} devices")]
    ChainFull { capacity: usize },

    #[error("letter {symbol:?} is wired more than once")]
    DuplicatePair { symbol: char },

    #[error("letter {symbol:?} cannot be paired with itself")]
    SelfPair { symbol: char },

    #[error("reflector pairs cover {found} letters, {expected} are required")]
    IncompletePairs { expected: usize, found: usize },

    #[error("letter {symbol:?} belongs to the fixed reflector pair")]
    FixedPairLetter { symbol: char },

    #[error("invalid pair notation '{token}'")]
    InvalidPairNotation { token: String },

    #[error("Uhr requires exactly 10 plugboard pairs, got {found}")]
    UhrPairCount { found: usize },

    #[error("Uhr setting {setting} is outside 0..=39")]
    UhrSettingOutOfRange { setting: usize },

    #[error("invalid Uhr setting bigram '{bigram}'")]
    InvalidUhrBigram { bigram: String },

    #[error("unknown machine '{name}'")]
    UnknownMachine { name: String },

    #[error("machine {machine} has no rotor named '{name}'")]
    UnknownRotor { machine: String, name: String },

    #[error("machine {machine} has no reflector named '{name}'")]
    UnknownReflector { machine: String, name: String },

    #[error("machine {machine} has an empty {catalog} catalog")]
    EmptyCatalog {
        machine: String,
        catalog: &'static str,
    },

    #[error("machine {machine} does not support {feature}")]
    FeatureUnsupported {
        machine: String,
        feature: &'static str,
    },

    #[error("unsupported letter {letter:?} at index {index}")]
    UnsupportedLetter { letter: char, index: usize },
}

pub type Result<T> = std::result::Result<T, EnigmaError>;
