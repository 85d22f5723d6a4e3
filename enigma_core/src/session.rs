use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use crate::error::EnigmaError;
use crate::machine::{Machine, UnsupportedLetterHandling};
use crate::settings::MachineSettings;

#[derive(Debug)]
pub enum SessionError {
    Machine(EnigmaError),
    Io(std::io::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Machine(err) => write!(f, "machine error: {err}"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Serde(err) => write!(f, "settings encoding error: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Machine(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serde(err) => Some(err),
        }
    }
}

impl From<EnigmaError> for SessionError {
    fn from(value: EnigmaError) -> Self {
        Self::Machine(value)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// A machine plus the policy for characters it cannot encipher. Rotor state
/// carries over from one call to the next.
#[derive(Clone, Debug)]
pub struct TranslationSession {
    machine: Machine,
    handling: UnsupportedLetterHandling,
}

impl TranslationSession {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            handling: UnsupportedLetterHandling::default(),
        }
    }

    /// Builds the machine described by `settings`.
    pub fn from_settings(settings: &MachineSettings) -> Result<Self, SessionError> {
        Ok(Self::new(settings.build()?))
    }

    pub fn with_handling(mut self, handling: UnsupportedLetterHandling) -> Self {
        self.handling = handling;
        self
    }

    pub fn handling(&self) -> UnsupportedLetterHandling {
        self.handling
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn into_machine(self) -> Machine {
        self.machine
    }

    pub fn translate_str(&mut self, text: &str) -> Result<String, SessionError> {
        self.machine.translate(text, self.handling).map_err(Into::into)
    }

    /// Translates `reader` line by line into `writer`. Line terminators are
    /// copied as-is; only the line contents reach the machine.
    ///
    /// With [`UnsupportedLetterHandling::Error`] each line is checked on its
    /// own, so lines before a rejected one have already been written.
    pub fn translate_stream<R: BufRead, W: Write>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), SessionError> {
        let mut line = String::new();
        let mut lines = 0usize;
        while reader.read_line(&mut line)? != 0 {
            let body = line.trim_end_matches(['\r', '\n']);
            let translated = self.machine.translate(body, self.handling)?;
            writer.write_all(translated.as_bytes())?;
            writer.write_all(line[body.len()..].as_bytes())?;
            lines += 1;
            line.clear();
        }
        writer.flush()?;
        debug!(
            "stream translated lines={} end={}",
            lines,
            self.machine.position_letters()
        );
        Ok(())
    }

    pub fn translate_file(&mut self, input: &Path, output: &Path) -> Result<(), SessionError> {
        let reader = BufReader::new(File::open(input)?);
        let writer = BufWriter::new(File::create(output)?);
        info!(
            "translating {} -> {} on {}",
            input.display(),
            output.display(),
            self.machine.name()
        );
        self.translate_stream(reader, writer)
    }

    /// Settings that rebuild the machine in its current state.
    pub fn settings(&self) -> MachineSettings {
        MachineSettings::capture(&self.machine)
    }
}
