use core::time::Duration;

use num_enum::{IntoPrimitive, TryFromPrimitive};

// Error type.

/// Error type for the crate, which can represent either an error from this driver or an inner error
/// that comes from the I2C type.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<InnerError> {
    /// A value was larger than the DAC supports.
    ///
    /// The MCP4725 is a 12-bit DAC, so values that it writes must be smaller than 2^12.
    ValueOutOfBounds(u16),
    /// The peripheral did not acknowledge its address, i.e. the bus or the device is unreachable.
    SelectError(InnerError),
    /// The write was rejected by the bus, or the device stopped acknowledging before both bytes
    /// of the frame were accepted.
    WriteError(InnerError),
    /// Bytes read back from the device did not decode into a register state.
    InvalidReadback,
}

impl<InnerError> From<InnerError> for Error<InnerError>
where
    InnerError: embedded_hal::i2c::Error,
{
    fn from(inner: InnerError) -> Self {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match inner.kind() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => Error::SelectError(inner),
            _ => Error::WriteError(inner),
        }
    }
}

// Enums for configuration.

/// I2C address of the device, selected by the A0 pin.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Address {
    /// A0 tied low.
    A0Low = 0x60,
    /// A0 tied high.
    A0High = 0x61,
}

impl Address {
    /// Picks the address variant from the state of the A0 pin.
    pub const fn from_a0(high: bool) -> Address {
        if high {
            Address::A0High
        } else {
            Address::A0Low
        }
    }
}

/// Configuration bits for the powered-down state of the output.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerDownMode {
    /// Output is driven.
    Normal = 0,
    /// Output is powered down and connected to ground through a 1K resistor.
    PowerDownOneK = 1,
    /// Output is powered down and connected to ground through a 100K resistor.
    PowerDownOneHundredK = 2,
    /// Output is powered down and connected to ground through a 500K resistor.
    PowerDownFiveHundredK = 3,
}

// Enums for status from reads.

/// Status of the EEPROM.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReadyState {
    /// An EEPROM write is in progress.
    Busy = 0,
    /// The EEPROM is not busy.
    Ready = 1,
}

/// The power-on-reset state of the device.
#[derive(IntoPrimitive, TryFromPrimitive, Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerState {
    Off = 0,
    On = 1,
}

// Container structs.

/// A 12-bit code as sent to the DAC.
///
/// The wrapped value is always in `0..=4095`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleCode(u16);

impl SampleCode {
    /// Lowest code, 0V out.
    pub const MIN: SampleCode = SampleCode(0);
    /// Highest code, full scale out.
    pub const MAX: SampleCode = SampleCode(0x0fff);

    /// Returns `None` if `value` does not fit in 12 bits.
    pub const fn new(value: u16) -> Option<SampleCode> {
        if value > 0x0fff {
            None
        } else {
            Some(SampleCode(value))
        }
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

impl From<SampleCode> for u16 {
    fn from(code: SampleCode) -> u16 {
        code.0
    }
}

/// Power-down bits and value held in either the DAC register or the EEPROM.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacState {
    pub power_down_mode: PowerDownMode,
    /// The 12-bit value.
    pub value: u16,
}

/// Representation of everything the device reports on a read.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Registers {
    /// The EEPROM Ready state of the device.
    pub ready_state: ReadyState,
    /// The Power-on-reset state of the device.
    pub power_state: PowerState,
    /// Contents of the DAC register, i.e. what is currently on the output.
    pub dac: DacState,
    /// Contents of the EEPROM, loaded into the DAC register on power-up or reset.
    pub eeprom: DacState,
}

/// Parameters of a single generator run.
///
/// `lo` and `hi` are independent: a sine or sawtooth with `lo > hi` is simply inverted.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaveformParameters {
    /// Voltage at the bottom of the wave.
    pub lo: f64,
    /// Voltage at the top of the wave.
    pub hi: f64,
    /// Periods per second. For step sequences, steps per second.
    ///
    /// Must be positive; this is not checked here.
    pub frequency: f64,
    /// Number of periods (or passes through a step sequence) to produce. 0 runs forever.
    pub repeat_count: u64,
    /// Log every voltage that is written.
    pub verbose: bool,
}

impl Default for WaveformParameters {
    fn default() -> Self {
        WaveformParameters {
            lo: 0.0,
            hi: 2.5,
            frequency: 1.0,
            repeat_count: 0,
            verbose: false,
        }
    }
}

/// Non-empty list of voltages stepped through in order, wrapping after the last one.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepSequence<'a>(&'a [f64]);

impl<'a> StepSequence<'a> {
    /// Returns `None` for an empty slice.
    pub const fn new(voltages: &'a [f64]) -> Option<StepSequence<'a>> {
        if voltages.is_empty() {
            None
        } else {
            Some(StepSequence(voltages))
        }
    }

    pub const fn voltages(&self) -> &'a [f64] {
        self.0
    }

    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// A sequence of one entry sets the output once and stops.
    pub const fn is_single(&self) -> bool {
        self.0.len() == 1
    }
}

/// The waveform a generator run produces.
#[derive(Debug, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform<'a> {
    Sine,
    Sawtooth,
    Steps(StepSequence<'a>),
}

/// What a finished run did.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunSummary {
    /// Number of codes written to the DAC.
    pub samples: u64,
    /// Completed periods, or completed passes through a step sequence.
    pub cycles: u64,
}

/// Generator settings that do not change between runs.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Config {
    /// Reference voltage corresponding to code 4095.
    pub full_scale: f64,
    /// Delay inserted after every sine or sawtooth sample.
    ///
    /// `None` polls the clock as fast as the bus allows.
    pub min_sample_interval: Option<Duration>,
}

impl Config {
    /// Creates a Config with a 3.3V reference and no delay between samples.
    pub const fn new() -> Config {
        Config {
            full_scale: 3.3,
            min_sample_interval: None,
        }
    }

    /// Convenience builder method to set the full-scale voltage.
    pub fn full_scale(mut self, new_val: f64) -> Config {
        self.full_scale = new_val;
        self
    }

    /// Convenience builder method to set the minimum sample interval.
    pub fn min_sample_interval(mut self, new_val: Option<Duration>) -> Config {
        self.min_sample_interval = new_val;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
