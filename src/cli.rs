//! Command line front end for the bench tool.
//!
//! Flags follow the single-dash style (`-freq 10`, `-freq=10` and
//! `--freq 10` are all accepted). Parsing stops at the first positional argument; it and everything
//! after it are the voltages of a step sequence.

use std::fmt;
use std::time::Duration;

use log::warn;

use crate::types::{Address, Config, StepSequence, Waveform, WaveformParameters};

pub const DEFAULT_DEVICE: &str = "/dev/i2c-1";

pub const USAGE: &str = "\
Usage: mcp4725-wavegen [flags] [voltage...]

  -fun ste|sin|saw   generator function (default sin)
  -lo V              low voltage (default 0)
  -hi V              high voltage (default 2.5)
  -freq HZ           how often the waveform or step sequence repeats (default 1)
  -a                 use address 0x61 instead of 0x60
  -dev PATH          I2C device file (default /dev/i2c-1)
  -n COUNT           number of periods to produce, 0 runs forever (default 0)
  -v                 log every voltage written
  -fs V              full-scale reference voltage (default 3.3)
  -interval-us US    minimum time between sine/sawtooth samples (default none)

With -fun ste, the voltages given after the flags are stepped through in order.";

/// Which waveform to play.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Function {
    Steps,
    Sine,
    Sawtooth,
}

impl std::str::FromStr for Function {
    type Err = CliError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "ste" => Ok(Function::Steps),
            "sin" => Ok(Function::Sine),
            "saw" => Ok(Function::Sawtooth),
            _ => Err(CliError::UnknownFunction(name.to_owned())),
        }
    }
}

/// Everything wrong with a command line.
#[derive(Debug, PartialEq)]
pub enum CliError {
    /// `-h` or `-help` was given.
    HelpRequested,
    UnknownFlag(String),
    MissingValue(String),
    InvalidValue { flag: String, value: String },
    UnknownFunction(String),
    /// Step mode without any voltages.
    NoVoltages,
    /// The first step voltage could not be parsed, so there is nothing to play.
    InvalidVoltage(String),
    /// Frequencies must be finite and positive.
    InvalidFrequency(f64),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::HelpRequested => f.write_str(USAGE),
            CliError::UnknownFlag(flag) => write!(f, "flag provided but not defined: -{}", flag),
            CliError::MissingValue(flag) => write!(f, "flag needs an argument: -{}", flag),
            CliError::InvalidValue { flag, value } => {
                write!(f, "invalid value {:?} for flag -{}", value, flag)
            }
            CliError::UnknownFunction(name) => write!(f, "function {} not supported", name),
            CliError::NoVoltages => f.write_str("please provide voltage or voltages"),
            CliError::InvalidVoltage(value) => write!(f, "invalid value {}", value),
            CliError::InvalidFrequency(freq) => {
                write!(f, "frequency must be positive, got {}", freq)
            }
        }
    }
}

impl std::error::Error for CliError {}

/// A fully parsed and validated command line.
#[derive(Debug, PartialEq)]
pub struct Invocation {
    pub function: Function,
    pub params: WaveformParameters,
    pub address: Address,
    pub device: String,
    pub config: Config,
    /// Step voltages; empty unless `function` is [`Function::Steps`].
    pub voltages: Vec<f64>,
}

impl Invocation {
    /// Parses the arguments following the program name.
    pub fn parse<I, S>(args: I) -> Result<Invocation, CliError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let mut invocation = Invocation {
            function: Function::Sine,
            params: WaveformParameters::default(),
            address: Address::A0Low,
            device: DEFAULT_DEVICE.to_owned(),
            config: Config::new(),
            voltages: Vec::new(),
        };

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if arg == "--" {
                i += 1;
                break;
            }
            if !is_flag(arg) {
                break;
            }
            let (name, inline_value) = split_flag(arg);
            i += 1;
            match name {
                "h" | "help" => return Err(CliError::HelpRequested),
                "a" => invocation.address = Address::from_a0(parse_bool(name, inline_value)?),
                "v" => invocation.params.verbose = parse_bool(name, inline_value)?,
                "fun" | "lo" | "hi" | "freq" | "dev" | "n" | "fs" | "interval-us" => {
                    let value = match inline_value {
                        Some(value) => value.to_owned(),
                        None => {
                            let value = args
                                .get(i)
                                .ok_or_else(|| CliError::MissingValue(name.to_owned()))?;
                            i += 1;
                            value.clone()
                        }
                    };
                    invocation.apply(name, &value)?;
                }
                _ => return Err(CliError::UnknownFlag(name.to_owned())),
            }
        }

        let frequency = invocation.params.frequency;
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(CliError::InvalidFrequency(frequency));
        }
        if invocation.function == Function::Steps {
            invocation.voltages = parse_voltages(&args[i..])?;
        }
        Ok(invocation)
    }

    fn apply(&mut self, name: &str, value: &str) -> Result<(), CliError> {
        match name {
            "fun" => self.function = value.parse()?,
            "lo" => self.params.lo = parse_value(name, value)?,
            "hi" => self.params.hi = parse_value(name, value)?,
            "freq" => self.params.frequency = parse_value(name, value)?,
            "dev" => self.device = value.to_owned(),
            "n" => self.params.repeat_count = parse_value(name, value)?,
            "fs" => self.config.full_scale = parse_value(name, value)?,
            "interval-us" => {
                let us: u64 = parse_value(name, value)?;
                self.config.min_sample_interval = Some(Duration::from_micros(us));
            }
            _ => return Err(CliError::UnknownFlag(name.to_owned())),
        }
        Ok(())
    }

    /// The waveform to hand to the generator, borrowing the step voltages.
    pub fn waveform(&self) -> Result<Waveform<'_>, CliError> {
        match self.function {
            Function::Sine => Ok(Waveform::Sine),
            Function::Sawtooth => Ok(Waveform::Sawtooth),
            Function::Steps => StepSequence::new(&self.voltages)
                .map(Waveform::Steps)
                .ok_or(CliError::NoVoltages),
        }
    }
}

// A leading dash followed by a digit or a dot is a negative voltage, not a flag.
fn is_flag(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) => !rest.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.'),
        None => false,
    }
}

fn split_flag(arg: &str) -> (&str, Option<&str>) {
    let stripped = arg.trim_start_matches('-');
    match stripped.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (stripped, None),
    }
}

fn parse_bool(name: &str, value: Option<&str>) -> Result<bool, CliError> {
    match value {
        None | Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(CliError::InvalidValue {
            flag: name.to_owned(),
            value: other.to_owned(),
        }),
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidValue {
        flag: name.to_owned(),
        value: value.to_owned(),
    })
}

/// Parses step voltages up to the first one that is not a number.
///
/// Everything from a malformed entry onwards is dropped with a warning; only a malformed first
/// entry, or no entries at all, is an error.
fn parse_voltages(args: &[String]) -> Result<Vec<f64>, CliError> {
    let first = args.first().ok_or(CliError::NoVoltages)?;
    let mut voltages = Vec::with_capacity(args.len());
    for arg in args {
        match arg.parse::<f64>() {
            Ok(v) => voltages.push(v),
            Err(_) if voltages.is_empty() => return Err(CliError::InvalidVoltage(first.clone())),
            Err(_) => {
                warn!(
                    "invalid value {}, using the first {} voltages",
                    arg,
                    voltages.len()
                );
                break;
            }
        }
    }
    Ok(voltages)
}
