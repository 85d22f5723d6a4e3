//! Rotor cipher machine engine.
//!
//! Wheels are immutable permutation devices; a [`Machine`] installs them in
//! slots, steps them per key press, and routes each letter through the
//! signal chain and back off the reflector. The [`catalog`] module carries
//! the wiring of twelve historical models.
//!
//! ```
//! use enigma_core::{UnsupportedLetterHandling, machine};
//!
//! let mut enigma = machine("I")?
//!     .with_rotor_letters(3, "I", 'A', 'B')?
//!     .with_rotor_letters(2, "II", 'B', 'A')?
//!     .with_rotor_letters(1, "III", 'C', 'Z')?;
//! let cipher = enigma.translate("SECRETMESSAGE", UnsupportedLetterHandling::PassThrough)?;
//! assert_eq!(cipher, "UFRJOAHRTVBWC");
//! # Ok::<(), enigma_core::EnigmaError>(())
//! ```

pub mod alphabet;
pub mod catalog;
pub mod chain;
pub mod error;
pub mod keysheet;
pub mod machine;
pub mod pairs;
pub mod permutation;
pub mod plugboard;
pub mod reflector;
pub mod session;
pub mod settings;
pub mod tracer;
pub mod wheel;

pub use crate::alphabet::{Alphabet, LETTERS_10, LETTERS_26, LETTERS_28, normalize, normalize0};
pub use crate::catalog::{machine, machine_names, machine_spec};
pub use crate::chain::{ChainNode, MAX_CHAIN_LEN, SignalChain, TurnoverMechanism};
pub use crate::error::{EnigmaError, Result};
pub use crate::keysheet::{
    KEYSHEET_LABEL, KeySheetEntry, derive_keysheet_rng, generate_keysheet, random_settings,
};
pub use crate::machine::{Features, Machine, MachineSpec, UnsupportedLetterHandling};
pub use crate::pairs::{WiringPair, format_pairs, uhr_setting};
pub use crate::permutation::Permutation;
pub use crate::plugboard::{plugboard, plugboard_uhr};
pub use crate::reflector::{RewiringNotation, ukw_d, ukw_d_bp};
pub use crate::session::{SessionError, TranslationSession};
pub use crate::settings::{
    DialValue, MachineSettings, PlugboardSettings, ReflectorSettings, RewiringSettings,
    RotorSettings, UhrDial,
};
pub use crate::tracer::{LogTracer, ScrambleTracer, TraceEvent, TraceRecord, TraceRecorder};
pub use crate::wheel::{DeviceKind, Wheel};
