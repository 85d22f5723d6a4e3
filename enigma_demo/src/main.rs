use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use enigma_core::{
    Alphabet, DialValue, KeySheetEntry, MachineSettings, PlugboardSettings, ReflectorSettings, RotorSettings,
    TraceRecorder, TranslationSession, UhrDial, UnsupportedLetterHandling, generate_keysheet,
    machine_names, machine_spec,
};
use env_logger::Env;
use hex::{FromHex, encode as hex_encode};
use log::{LevelFilter, debug, info};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_SEED_BYTES: usize = 16;

#[derive(Parser)]
#[command(name = "enigma", author, version, about = "Rotor cipher machine simulator")]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HandlingArg {
    PassThrough,
    Remove,
    Error,
}

impl From<HandlingArg> for UnsupportedLetterHandling {
    fn from(arg: HandlingArg) -> Self {
        match arg {
            HandlingArg::PassThrough => UnsupportedLetterHandling::PassThrough,
            HandlingArg::Remove => UnsupportedLetterHandling::Remove,
            HandlingArg::Error => UnsupportedLetterHandling::Error,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in machine models.
    List,
    /// Encipher or decipher text. The machine comes from a settings file or
    /// from the individual flags.
    Translate {
        #[arg(long, value_name = "FILE", conflicts_with_all = ["machine", "reflector", "rotors", "rings", "positions", "plugboard", "uhr"])]
        settings: Option<PathBuf>,
        #[arg(long, default_value = "I")]
        machine: String,
        #[arg(long)]
        reflector: Option<String>,
        /// Rotor names, leftmost first, separated by commas or spaces.
        #[arg(long, value_delimiter = ',')]
        rotors: Vec<String>,
        /// Ring settings, leftmost first; numbers or letters.
        #[arg(long, value_delimiter = ',')]
        rings: Vec<String>,
        /// Start positions, leftmost first; numbers or letters.
        #[arg(long, value_delimiter = ',')]
        positions: Vec<String>,
        /// Plugboard pairs, e.g. "AB CD EF".
        #[arg(long)]
        plugboard: Option<String>,
        /// Uhr dial, a number 0..39 or a bigram.
        #[arg(long, requires = "plugboard")]
        uhr: Option<String>,
        #[arg(long, value_name = "TEXT", conflicts_with = "input")]
        text: Option<String>,
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "pass-through")]
        handling: HandlingArg,
        /// Print every scrambler event of every key press.
        #[arg(long, conflicts_with = "input")]
        trace: bool,
        /// Write the machine settings after translation, rotor positions included.
        #[arg(long, value_name = "FILE")]
        save_state: Option<PathBuf>,
    },
    /// Generate a deterministic key sheet.
    Keysheet {
        #[arg(long, default_value = "I")]
        machine: String,
        /// Seed text, or `hex:` followed by hex bytes. Random when omitted.
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value_t = 31)]
        days: u32,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match cli.command {
        Commands::List => cmd_list(),
        Commands::Translate {
            settings,
            machine,
            reflector,
            rotors,
            rings,
            positions,
            plugboard,
            uhr,
            text,
            input,
            out,
            handling,
            trace,
            save_state,
        } => {
            let settings = match settings {
                Some(path) => load_json(&path, "machine settings")?,
                None => settings_from_flags(
                    &machine,
                    reflector.as_deref(),
                    &rotors,
                    &rings,
                    &positions,
                    plugboard.as_deref(),
                    uhr.as_deref(),
                )?,
            };
            cmd_translate(
                &settings,
                text,
                input,
                out,
                handling.into(),
                trace,
                save_state,
            )
        }
        Commands::Keysheet {
            machine,
            seed,
            days,
            out,
        } => cmd_keysheet(&machine, seed.as_deref(), days, out),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn cmd_list() -> Result<()> {
    for name in machine_names() {
        let spec = machine_spec(name)?;
        let names = |wheels: &[enigma_core::Wheel]| {
            wheels
                .iter()
                .map(|w| w.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{name}");
        println!("  alphabet:   {}", spec.alphabet().symbols().iter().collect::<String>());
        println!("  slots:      {}", spec.rotor_slot_count());
        println!("  rotors:     {}", names(spec.rotors()));
        if !spec.fourth_rotors().is_empty() {
            println!("  fourth:     {}", names(spec.fourth_rotors()));
        }
        println!("  reflectors: {}", names(spec.reflectors()));
        let features = spec.features().names();
        if !features.is_empty() {
            println!("  features:   {}", features.join(", "));
        }
    }
    Ok(())
}

fn settings_from_flags(
    machine: &str,
    reflector: Option<&str>,
    rotors: &[String],
    rings: &[String],
    positions: &[String],
    plugboard: Option<&str>,
    uhr: Option<&str>,
) -> Result<MachineSettings> {
    let rotors = split_list(rotors);
    let rings = split_list(rings);
    let positions = split_list(positions);
    if rings.len() > rotors.len() || positions.len() > rotors.len() {
        bail!(
            "{} rotors but {} rings and {} positions given",
            rotors.len(),
            rings.len(),
            positions.len()
        );
    }
    let spec = machine_spec(machine)?;
    let slots = spec.rotor_slot_count();
    if rotors.len() > slots {
        bail!("{} has {} rotor slots, got {} rotors", spec.name(), slots, rotors.len());
    }
    let mut settings = MachineSettings::new(spec.name());
    settings.reflector = reflector.map(|name| ReflectorSettings {
        name: name.to_string(),
        ring: DialValue::default(),
        position: DialValue::default(),
        rewiring: None,
    });
    // Flags list the leftmost rotor first; slot 1 is the rightmost.
    let first_slot = rotors.len();
    for (idx, name) in rotors.iter().enumerate() {
        let ring = rings.get(idx).map(|s| parse_dial(s, spec.alphabet())).transpose()?;
        let position = positions.get(idx).map(|s| parse_dial(s, spec.alphabet())).transpose()?;
        settings.rotors.push(RotorSettings {
            slot: first_slot - idx,
            name: name.to_string(),
            ring: ring.unwrap_or_default(),
            position: position.unwrap_or_default(),
        });
    }
    settings.plugboard = plugboard.map(|pairs| PlugboardSettings {
        pairs: pairs.to_string(),
        uhr: uhr.map(parse_uhr),
    });
    debug!("settings from flags: {:?}", settings);
    Ok(settings)
}

fn split_list(values: &[String]) -> Vec<&str> {
    values.iter().flat_map(|v| v.split_whitespace()).collect()
}

/// A single symbol of the machine's alphabet wins over a number, so `0` on a
/// digit-lettered machine names its tenth contact.
fn parse_dial(value: &str, alphabet: &Alphabet) -> Result<DialValue> {
    let value = value.trim();
    let mut chars = value.chars();
    if let (Some(symbol), None) = (chars.next(), chars.next()) {
        let upper = symbol.to_uppercase().next().unwrap_or(symbol);
        if alphabet.contains(upper) {
            return Ok(DialValue::Letter(upper));
        }
    }
    match value.parse::<usize>() {
        Ok(number) => Ok(DialValue::Number(number)),
        Err(_) => bail!("'{value}' is neither a number nor a symbol of the machine's alphabet"),
    }
}

fn parse_uhr(value: &str) -> UhrDial {
    let value = value.trim();
    match value.parse::<usize>() {
        Ok(number) => UhrDial::Number(number),
        Err(_) => UhrDial::Bigram(value.to_uppercase()),
    }
}

fn cmd_translate(
    settings: &MachineSettings,
    text: Option<String>,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    handling: UnsupportedLetterHandling,
    trace: bool,
    save_state: Option<PathBuf>,
) -> Result<()> {
    let mut session = TranslationSession::from_settings(settings)
        .context("building machine from settings")?
        .with_handling(handling);
    info!(
        "machine {} at {}",
        session.machine().name(),
        session.machine().position_letters()
    );
    match (text, input) {
        (Some(text), None) => {
            let result = if trace {
                let mut recorder = TraceRecorder::new();
                let result = session
                    .machine_mut()
                    .translate_traced(&text, handling, &mut recorder)?;
                print_trace(&recorder)?;
                result
            } else {
                session.translate_str(&text)?
            };
            match &out {
                Some(path) => fs::write(path, &result)
                    .with_context(|| format!("writing output to {}", path.display()))?,
                None => println!("{result}"),
            }
        }
        (None, Some(path)) => match &out {
            Some(out_path) => session.translate_file(&path, out_path)?,
            None => {
                let file = fs::File::open(&path)
                    .with_context(|| format!("opening {}", path.display()))?;
                let stdout = io::stdout();
                let mut writer = BufWriter::new(stdout.lock());
                session.translate_stream(io::BufReader::new(file), &mut writer)?;
                writer.flush()?;
            }
        },
        (Some(_), Some(_)) => bail!("Provide either --text or --input, not both."),
        (None, None) => bail!("Provide --text TEXT or --input FILE for data to translate."),
    }
    info!("final positions {}", session.machine().position_letters());
    if let Some(path) = save_state {
        save_json(&path, "machine settings", &session.settings())?;
        println!("Wrote machine state to {}", path.display());
    }
    Ok(())
}

fn print_trace(recorder: &TraceRecorder) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in recorder.records() {
        writeln!(
            out,
            "{:<10} pos {:>2}  fwd {:>2} -> {:>2}  bwd {:>2} -> {:>2}",
            record.device,
            record.position,
            record.forward_in,
            record.forward_out,
            record.backward_in,
            record.backward_out
        )?;
    }
    Ok(())
}

fn cmd_keysheet(machine: &str, seed: Option<&str>, days: u32, out: Option<PathBuf>) -> Result<()> {
    let seed_bytes = match seed {
        Some(text) => parse_seed(text)?,
        None => {
            let mut bytes = vec![0u8; DEFAULT_SEED_BYTES];
            OsRng.fill_bytes(&mut bytes);
            println!("Seed: hex:{}", hex_encode(&bytes));
            bytes
        }
    };
    let sheet = generate_keysheet(machine, &seed_bytes, days)?;
    match out {
        Some(path) => {
            save_json(&path, "key sheet", &sheet)?;
            println!("Wrote {} days for {} to {}", sheet.len(), machine, path.display());
        }
        None => print_keysheet(&sheet),
    }
    Ok(())
}

fn print_keysheet(sheet: &[KeySheetEntry]) {
    for entry in sheet {
        let s = &entry.settings;
        let dial = |value: &DialValue| match value {
            DialValue::Number(n) => format!("{n:02}"),
            DialValue::Letter(c) => c.to_string(),
        };
        let reflector = s.reflector.as_ref().map_or("-", |r| r.name.as_str());
        let rotors = s
            .rotors
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let rings = s.rotors.iter().map(|r| dial(&r.ring)).collect::<Vec<_>>().join(" ");
        let positions = s
            .rotors
            .iter()
            .map(|r| dial(&r.position))
            .collect::<Vec<_>>()
            .join(" ");
        let plugboard = s
            .plugboard
            .as_ref()
            .map_or_else(String::new, |p| match &p.uhr {
                Some(UhrDial::Number(n)) => format!("{} uhr {n:02}", p.pairs),
                Some(UhrDial::Bigram(b)) => format!("{} uhr {b}", p.pairs),
                None => p.pairs.clone(),
            });
        println!(
            "{:>2} | {:<6} | {:<18} | {:<11} | {:<11} | {}",
            entry.day, reflector, rotors, rings, positions, plugboard
        );
    }
}

fn load_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let data =
        fs::read(path).with_context(|| format!("reading {} from {}", label, path.display()))?;
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {} from {}", label, path.display()))?;
    Ok(value)
}

fn save_json<T: ?Sized + serde::Serialize>(path: &Path, label: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)
        .with_context(|| format!("writing {} to {}", label, path.display()))?;
    Ok(())
}

fn parse_seed(seed: &str) -> Result<Vec<u8>> {
    if let Some(hex) = seed.strip_prefix("hex:") {
        let bytes = Vec::from_hex(hex.trim())
            .with_context(|| "failed to parse hex-encoded seed".to_string())?;
        Ok(bytes)
    } else {
        Ok(seed.as_bytes().to_vec())
    }
}
