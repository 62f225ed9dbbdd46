//! # Waveform generator for the MCP4725 12-bit I2C DAC
//!
//! A platform agnostic driver for the MCP4725 DAC using the
//! [embedded-hal](https://github.com/rust-embedded/embedded-hal) traits, together with a small
//! engine that plays sine, sawtooth and step-sequence waveforms through it for bench testing of
//! analog circuitry.
//!
//! Voltages are quantized against a full-scale reference (3.3V unless configured otherwise) and
//! clamped into the 12-bit code range, so any voltage can be handed to the DAC.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "linux")] {
//! use linux_embedded_hal::{Delay, I2cdev};
//! use mcp4725_wavegen::{Address, Config, Generator, MonotonicClock, MCP4725, WaveformParameters};
//!
//! let i2c = I2cdev::new("/dev/i2c-1").unwrap();
//! let dac = MCP4725::new(i2c, Address::A0Low.into());
//! let mut generator = Generator::new(dac, MonotonicClock::new(), Delay, Config::new());
//!
//! // Five periods of a 1Hz sine between 0.5V and 2.5V.
//! let params = WaveformParameters { lo: 0.5, hi: 2.5, frequency: 1.0, repeat_count: 5, verbose: false };
//! generator.run_sine(&params).unwrap();
//! # }
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "async")]
mod async_impl;
#[cfg(feature = "std")]
pub mod cli;
mod clock;
mod generator;
mod internal;
mod types;
pub mod waveform;

pub use crate::clock::*;
pub use crate::generator::Generator;
pub use crate::types::*;
pub use crate::waveform::quantize;

use crate::internal::*;

/// MCP4725 12-bit I2C DAC.
pub struct MCP4725<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> MCP4725<I2C> {
    /// Creates a new [`MCP4725`] from an I2C bus and the device's 7-bit address.
    ///
    /// Works with both the blocking [`embedded_hal::i2c::I2c`] trait and, with the `async`
    /// feature, its `embedded-hal-async` counterpart.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        MCP4725 { i2c, address }
    }

    /// The 7-bit address this device is written at.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Destroy this instance and return the inner I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

/// Implementation of all commands given a blocking I2C bus.
///
/// # Errors
///
/// Errors from the I2C bus are wrapped in [`Error::SelectError`] when the device did not
/// acknowledge its address and in [`Error::WriteError`] otherwise.
#[cfg(feature = "sync")]
impl<I2C> MCP4725<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(address, bytes).map_err(Error::from)
    }

    /// Reads the DAC register, the EEPROM and the status bits.
    pub fn read(&mut self) -> Result<Registers, Error<I2C::Error>> {
        let mut bytes = [0; 5];
        self.i2c.read(self.address, &mut bytes)?;
        parse_bytes(&bytes).ok_or(Error::InvalidReadback)
    }

    /// Issues a general call command (address 0x00) to reset the device.  All devices on the bus
    /// that honour general calls will load their EEPROM into the DAC register.
    pub fn general_call_reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_bytes(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_RESET])
    }

    /// Issues a general call command (address 0x00) to wake up the device.  The power down bits
    /// are reset and the output is driven again.
    pub fn general_call_wake_up(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_bytes(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_WAKE_UP])
    }

    /// Updates the DAC register and powers the output on.
    ///
    /// This is the two-byte fast mode command used by the waveform generator. The EEPROM is not
    /// affected.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub fn fast_write(&mut self, value: u16) -> Result<(), Error<I2C::Error>> {
        self.fast_write_with_power_down_mode(PowerDownMode::Normal, value)
    }

    /// Updates the DAC register and sets the [`PowerDownMode`], using the fast mode command.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub fn fast_write_with_power_down_mode(
        &mut self,
        mode: PowerDownMode,
        value: u16,
    ) -> Result<(), Error<I2C::Error>> {
        let bytes = encode_fast_write(mode, value)?;
        self.write_bytes(self.address, &bytes)
    }

    /// Updates the DAC register and power down mode, leaving the EEPROM alone.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub fn write_dac_register(
        &mut self,
        mode: PowerDownMode,
        value: u16,
    ) -> Result<(), Error<I2C::Error>> {
        let bytes = encode_register_write(COMMAND_WRITE_DAC_REGISTER, mode, value)?;
        self.write_bytes(self.address, &bytes)
    }

    /// Updates both the DAC register and the EEPROM, so the value survives a power cycle.
    ///
    /// The device reports [`ReadyState::Busy`] while the EEPROM write is in progress and ignores
    /// further commands until it is done.
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub fn write_dac_register_and_eeprom(
        &mut self,
        mode: PowerDownMode,
        value: u16,
    ) -> Result<(), Error<I2C::Error>> {
        let bytes = encode_register_write(COMMAND_WRITE_DAC_REGISTER_AND_EEPROM, mode, value)?;
        self.write_bytes(self.address, &bytes)
    }

    /// Writes an already quantized code.
    pub fn set_code(&mut self, code: SampleCode) -> Result<(), Error<I2C::Error>> {
        self.fast_write(code.value())
    }

    /// Quantizes `voltage` against `full_scale` and writes the result, returning the code sent.
    pub fn set_voltage(
        &mut self,
        voltage: f64,
        full_scale: f64,
    ) -> Result<SampleCode, Error<I2C::Error>> {
        let code = quantize(voltage, full_scale);
        self.set_code(code)?;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    pub(crate) mod fake_i2c;
    pub(crate) mod sim_time;

    use std::rc::Rc;

    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use crate::tests::fake_i2c::*;
    use crate::*;

    #[test]
    fn fast_write() {
        let i2c = FakeI2C::new();
        let messages = Rc::clone(&i2c.messages);
        let mut mcp4725 = MCP4725::new(i2c, 0x60);
        assert_eq!(mcp4725.fast_write(0x0aaa), Ok(()));
        assert_eq!(
            *messages.borrow(),
            vec![FakeI2CMessage {
                address: 0x60,
                bytes: vec![0x0a, 0xaa]
            }]
        );
    }

    #[test]
    fn fast_write_out_of_bounds_error() {
        let i2c = FakeI2C::new();
        let messages = Rc::clone(&i2c.messages);
        let mut mcp4725 = MCP4725::new(i2c, 0x60);
        assert_eq!(mcp4725.fast_write(0x1000), Err(Error::ValueOutOfBounds(0x1000)));
        assert_eq!(*messages.borrow(), vec![]);
    }

    #[test]
    fn fast_write_with_power_down_mode() {
        let expectations = [
            I2cTransaction::write(0x61, vec![0x00, 0x00]),
            I2cTransaction::write(0x61, vec![0x1f, 0xff]),
            I2cTransaction::write(0x61, vec![0x28, 0x00]),
            I2cTransaction::write(0x61, vec![0x30, 0x01]),
        ];
        let mut mcp4725 = MCP4725::new(I2cMock::new(&expectations), Address::A0High.into());
        mcp4725
            .fast_write_with_power_down_mode(PowerDownMode::Normal, 0x0000)
            .unwrap();
        mcp4725
            .fast_write_with_power_down_mode(PowerDownMode::PowerDownOneK, 0x0fff)
            .unwrap();
        mcp4725
            .fast_write_with_power_down_mode(PowerDownMode::PowerDownOneHundredK, 0x0800)
            .unwrap();
        mcp4725
            .fast_write_with_power_down_mode(PowerDownMode::PowerDownFiveHundredK, 0x0001)
            .unwrap();
        mcp4725.release().done();
    }

    // || C C C x x PD PD x || D D D D D D D D || D D D D x x x x ||
    #[test]
    fn write_dac_register() {
        let expectations = [I2cTransaction::write(0x60, vec![0b01000000, 0xab, 0xc0])];
        let mut mcp4725 = MCP4725::new(I2cMock::new(&expectations), 0x60);
        mcp4725
            .write_dac_register(PowerDownMode::Normal, 0x0abc)
            .unwrap();
        mcp4725.release().done();
    }

    #[test]
    fn write_dac_register_and_eeprom() {
        let expectations = [I2cTransaction::write(0x60, vec![0b01100010, 0xff, 0xf0])];
        let mut mcp4725 = MCP4725::new(I2cMock::new(&expectations), 0x60);
        mcp4725
            .write_dac_register_and_eeprom(PowerDownMode::PowerDownOneK, 0x0fff)
            .unwrap();
        mcp4725.release().done();
    }

    #[test]
    fn general_calls() {
        let expectations = [
            I2cTransaction::write(0x00, vec![0b00000110]),
            I2cTransaction::write(0x00, vec![0b00001001]),
        ];
        let mut mcp4725 = MCP4725::new(I2cMock::new(&expectations), 0x60);
        mcp4725.general_call_reset().unwrap();
        mcp4725.general_call_wake_up().unwrap();
        mcp4725.release().done();
    }

    #[test]
    fn set_voltage_quantizes_and_clamps() {
        let i2c = FakeI2C::new();
        let messages = Rc::clone(&i2c.messages);
        let mut mcp4725 = MCP4725::new(i2c, 0x60);
        assert_eq!(mcp4725.set_voltage(1.65, 3.3).map(SampleCode::value), Ok(2048));
        assert_eq!(mcp4725.set_voltage(3.3, 3.3).map(SampleCode::value), Ok(4095));
        assert_eq!(mcp4725.set_voltage(-1.0, 3.3).map(SampleCode::value), Ok(0));
        assert_eq!(mcp4725.set_voltage(12.0, 3.3).map(SampleCode::value), Ok(4095));
        assert_eq!(
            *messages.borrow(),
            vec![
                FakeI2CMessage {
                    address: 0x60,
                    bytes: vec![0x08, 0x00]
                },
                FakeI2CMessage {
                    address: 0x60,
                    bytes: vec![0x0f, 0xff]
                },
                FakeI2CMessage {
                    address: 0x60,
                    bytes: vec![0x00, 0x00]
                },
                FakeI2CMessage {
                    address: 0x60,
                    bytes: vec![0x0f, 0xff]
                },
            ]
        );
    }

    #[test]
    fn address_nack_is_a_select_error() {
        let i2c = FakeI2C::failing(FakeI2CError::AddressNack, 0);
        let messages = Rc::clone(&i2c.messages);
        let mut mcp4725 = MCP4725::new(i2c, 0x60);
        assert_eq!(
            mcp4725.fast_write(0x0123),
            Err(Error::SelectError(FakeI2CError::AddressNack))
        );
        assert_eq!(*messages.borrow(), vec![]);
    }

    #[test]
    fn short_write_is_a_write_error() {
        let i2c = FakeI2C::failing(FakeI2CError::DataNack, 0);
        let mut mcp4725 = MCP4725::new(i2c, 0x60);
        assert_eq!(
            mcp4725.set_voltage(1.0, 3.3),
            Err(Error::WriteError(FakeI2CError::DataNack))
        );
    }

    #[test]
    fn read() {
        let expectations = [I2cTransaction::read(
            0x60,
            vec![0b11000100, 0xab, 0xc0, 0b00101111, 0xff],
        )];
        let mut mcp4725 = MCP4725::new(I2cMock::new(&expectations), 0x60);
        assert_eq!(
            mcp4725.read(),
            Ok(Registers {
                ready_state: ReadyState::Ready,
                power_state: PowerState::On,
                dac: DacState {
                    power_down_mode: PowerDownMode::PowerDownOneHundredK,
                    value: 0x0abc,
                },
                eeprom: DacState {
                    power_down_mode: PowerDownMode::PowerDownOneK,
                    value: 0x0fff,
                },
            })
        );
        mcp4725.release().done();
    }

    #[test]
    fn read_busy_after_power_on_reset() {
        let i2c = FakeI2C::new();
        *i2c.message_to_read.borrow_mut() = FakeI2CMessage {
            address: 0x60,
            bytes: vec![0b00000000, 0x00, 0x00, 0x00, 0x00],
        };
        let mut mcp4725 = MCP4725::new(i2c, 0x60);
        assert_eq!(
            mcp4725.read(),
            Ok(Registers {
                ready_state: ReadyState::Busy,
                power_state: PowerState::Off,
                dac: DacState {
                    power_down_mode: PowerDownMode::Normal,
                    value: 0,
                },
                eeprom: DacState {
                    power_down_mode: PowerDownMode::Normal,
                    value: 0,
                },
            })
        );
    }
}
