use core::time::Duration;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c;
use log::{debug, info};

use crate::clock::Clock;
use crate::internal::*;
use crate::types::*;
use crate::waveform::{self, Sampler};
use crate::{quantize, Generator, MCP4725};

/// Implementation of all commands given an async I2C bus.
///
/// # Errors
///
/// Errors from the I2C bus are wrapped in [`Error::SelectError`] when the device did not
/// acknowledge its address and in [`Error::WriteError`] otherwise.
impl<I> MCP4725<I>
where
    I: i2c::I2c,
{
    async fn write_bytes_async(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        self.i2c.write(address, bytes).await.map_err(Error::from)
    }

    /// Reads the DAC register, the EEPROM and the status bits.
    pub async fn read_async(&mut self) -> Result<Registers, Error<I::Error>> {
        let mut bytes = [0; 5];
        self.i2c.read(self.address, &mut bytes).await?;
        parse_bytes(&bytes).ok_or(Error::InvalidReadback)
    }

    /// Issues a general call command (address 0x00) to reset the device.
    pub async fn general_call_reset_async(&mut self) -> Result<(), Error<I::Error>> {
        self.write_bytes_async(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_RESET])
            .await
    }

    /// Issues a general call command (address 0x00) to wake up the device.
    pub async fn general_call_wake_up_async(&mut self) -> Result<(), Error<I::Error>> {
        self.write_bytes_async(ADDRESS_GENERAL_CALL, &[COMMAND_GENERAL_CALL_WAKE_UP])
            .await
    }

    /// Updates the DAC register and powers the output on.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use mcp4725_wavegen::MCP4725;
    ///
    /// let mut dac = MCP4725::new(i2c, 0x60);
    /// dac.fast_write_async(2048).await.unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// In addition to the internal I2C errors, this can return [`Error::ValueOutOfBounds`] if the
    /// value is out of range (greater than 4095).
    pub async fn fast_write_async(&mut self, value: u16) -> Result<(), Error<I::Error>> {
        self.fast_write_with_power_down_mode_async(PowerDownMode::Normal, value)
            .await
    }

    /// Updates the DAC register and sets the [`PowerDownMode`], using the fast mode command.
    pub async fn fast_write_with_power_down_mode_async(
        &mut self,
        mode: PowerDownMode,
        value: u16,
    ) -> Result<(), Error<I::Error>> {
        let bytes = encode_fast_write(mode, value)?;
        self.write_bytes_async(self.address, &bytes).await
    }

    /// Updates the DAC register and power down mode, leaving the EEPROM alone.
    pub async fn write_dac_register_async(
        &mut self,
        mode: PowerDownMode,
        value: u16,
    ) -> Result<(), Error<I::Error>> {
        let bytes = encode_register_write(COMMAND_WRITE_DAC_REGISTER, mode, value)?;
        self.write_bytes_async(self.address, &bytes).await
    }

    /// Updates both the DAC register and the EEPROM.
    pub async fn write_dac_register_and_eeprom_async(
        &mut self,
        mode: PowerDownMode,
        value: u16,
    ) -> Result<(), Error<I::Error>> {
        let bytes = encode_register_write(COMMAND_WRITE_DAC_REGISTER_AND_EEPROM, mode, value)?;
        self.write_bytes_async(self.address, &bytes).await
    }

    /// Writes an already quantized code.
    pub async fn set_code_async(&mut self, code: SampleCode) -> Result<(), Error<I::Error>> {
        self.fast_write_async(code.value()).await
    }

    /// Quantizes `voltage` against `full_scale` and writes the result, returning the code sent.
    pub async fn set_voltage_async(
        &mut self,
        voltage: f64,
        full_scale: f64,
    ) -> Result<SampleCode, Error<I::Error>> {
        let code = quantize(voltage, full_scale);
        self.set_code_async(code).await?;
        Ok(code)
    }
}

/// Async counterpart of the blocking run methods, with identical timing and termination.
impl<I, C, D> Generator<I, C, D>
where
    I: i2c::I2c,
    C: Clock,
    D: DelayNs,
{
    pub async fn run_async(
        &mut self,
        waveform: &Waveform<'_>,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I::Error>> {
        match waveform {
            Waveform::Sine => self.run_sine_async(params).await,
            Waveform::Sawtooth => self.run_sawtooth_async(params).await,
            Waveform::Steps(steps) => self.run_steps_async(steps, params).await,
        }
    }

    pub async fn run_sine_async(
        &mut self,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I::Error>> {
        debug!("sine {}..{}V at {}Hz", params.lo, params.hi, params.frequency);
        self.run_periodic_async(waveform::sine, params).await
    }

    pub async fn run_sawtooth_async(
        &mut self,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I::Error>> {
        debug!("sawtooth {}..{}V at {}Hz", params.lo, params.hi, params.frequency);
        self.run_periodic_async(waveform::sawtooth, params).await
    }

    pub async fn run_steps_async(
        &mut self,
        steps: &StepSequence<'_>,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I::Error>> {
        debug!("{} steps at {}Hz", steps.len(), params.frequency);
        let period = waveform::step_period(params.frequency).unwrap_or(Duration::ZERO);
        let mut summary = RunSummary::default();
        loop {
            for &voltage in steps.voltages() {
                let start = self.clock.now();
                self.write_sample_async(voltage, params.verbose).await?;
                summary.samples += 1;
                if steps.is_single() {
                    summary.cycles = 1;
                    return Ok(summary);
                }
                let spent = self.clock.now() - start;
                self.sleep_async(waveform::remaining_hold(period, spent))
                    .await;
            }
            summary.cycles += 1;
            if params.repeat_count > 0 && summary.cycles >= params.repeat_count {
                debug!("stopped after {} passes", summary.cycles);
                return Ok(summary);
            }
        }
    }

    async fn run_periodic_async(
        &mut self,
        sampler: Sampler,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I::Error>> {
        let t0 = self.clock.now();
        let mut samples = 0;
        loop {
            let t = self.clock.now() - t0;
            let cycles = waveform::periods_elapsed(t, params.frequency);
            if params.repeat_count > 0 && cycles >= params.repeat_count {
                debug!("stopped after {} periods, {} samples", cycles, samples);
                return Ok(RunSummary { samples, cycles });
            }
            self.write_sample_async(sampler(t, params), params.verbose)
                .await?;
            samples += 1;
            if let Some(interval) = self.config.min_sample_interval {
                self.sleep_async(interval).await;
            }
        }
    }

    async fn write_sample_async(
        &mut self,
        voltage: f64,
        verbose: bool,
    ) -> Result<(), Error<I::Error>> {
        if verbose {
            info!("v={}", voltage);
        }
        self.dac
            .set_voltage_async(voltage, self.config.full_scale)
            .await?;
        Ok(())
    }

    async fn sleep_async(&mut self, duration: Duration) {
        for ns in delay_chunks(duration) {
            self.delay.delay_ns(ns).await;
        }
    }
}
