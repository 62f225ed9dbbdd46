use core::time::Duration;

use log::{debug, info};

use crate::clock::Clock;
use crate::internal::delay_chunks;
use crate::types::*;
use crate::waveform::{self, Sampler};
use crate::MCP4725;

/// Plays waveforms on an [`MCP4725`].
///
/// The generator owns the DAC for as long as it lives, along with the clock used to time samples
/// and the delay used to hold steps. A run goes from start to its configured repeat count, or
/// until the first bus error, which ends the run and is returned as is. Nothing is retried.
pub struct Generator<I2C, C, D> {
    pub(crate) dac: MCP4725<I2C>,
    pub(crate) clock: C,
    pub(crate) delay: D,
    pub(crate) config: Config,
}

impl<I2C, C, D> Generator<I2C, C, D> {
    pub const fn new(dac: MCP4725<I2C>, clock: C, delay: D, config: Config) -> Self {
        Generator {
            dac,
            clock,
            delay,
            config,
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Direct access to the DAC between runs.
    pub fn dac(&mut self) -> &mut MCP4725<I2C> {
        &mut self.dac
    }

    /// Destroy the generator and hand back its parts.
    pub fn release(self) -> (MCP4725<I2C>, C, D) {
        (self.dac, self.clock, self.delay)
    }
}

#[cfg(feature = "sync")]
impl<I2C, C, D> Generator<I2C, C, D>
where
    I2C: embedded_hal::i2c::I2c,
    C: Clock,
    D: embedded_hal::delay::DelayNs,
{
    /// Plays `waveform` with the given parameters until it is done.
    pub fn run(
        &mut self,
        waveform: &Waveform<'_>,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I2C::Error>> {
        match waveform {
            Waveform::Sine => self.run_sine(params),
            Waveform::Sawtooth => self.run_sawtooth(params),
            Waveform::Steps(steps) => self.run_steps(steps, params),
        }
    }

    /// Plays a sine between `params.lo` and `params.hi`.
    ///
    /// Unless [`Config::min_sample_interval`] is set this polls the clock in a tight loop,
    /// writing a new sample as soon as the previous write returns.
    pub fn run_sine(&mut self, params: &WaveformParameters) -> Result<RunSummary, Error<I2C::Error>> {
        debug!("sine {}..{}V at {}Hz", params.lo, params.hi, params.frequency);
        self.run_periodic(waveform::sine, params)
    }

    /// Plays a sawtooth rising from `params.lo` to `params.hi`.
    ///
    /// Timing works as in [`Generator::run_sine`].
    pub fn run_sawtooth(
        &mut self,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I2C::Error>> {
        debug!("sawtooth {}..{}V at {}Hz", params.lo, params.hi, params.frequency);
        self.run_periodic(waveform::sawtooth, params)
    }

    /// Steps through `steps`, holding each voltage for `1 / params.frequency` seconds.
    ///
    /// `params.lo` and `params.hi` are not used. A sequence with a single entry is written once
    /// and the run ends right away, whatever `params.repeat_count` says.
    pub fn run_steps(
        &mut self,
        steps: &StepSequence<'_>,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I2C::Error>> {
        debug!("{} steps at {}Hz", steps.len(), params.frequency);
        let period = waveform::step_period(params.frequency).unwrap_or(Duration::ZERO);
        let mut summary = RunSummary::default();
        loop {
            for &voltage in steps.voltages() {
                let start = self.clock.now();
                self.write_sample(voltage, params.verbose)?;
                summary.samples += 1;
                if steps.is_single() {
                    summary.cycles = 1;
                    debug!("single step written, stopping");
                    return Ok(summary);
                }
                let spent = self.clock.now() - start;
                self.sleep(waveform::remaining_hold(period, spent));
            }
            summary.cycles += 1;
            if params.repeat_count > 0 && summary.cycles >= params.repeat_count {
                debug!("stopped after {} passes", summary.cycles);
                return Ok(summary);
            }
        }
    }

    fn run_periodic(
        &mut self,
        sampler: Sampler,
        params: &WaveformParameters,
    ) -> Result<RunSummary, Error<I2C::Error>> {
        let t0 = self.clock.now();
        let mut samples = 0;
        loop {
            let t = self.clock.now() - t0;
            let cycles = waveform::periods_elapsed(t, params.frequency);
            if params.repeat_count > 0 && cycles >= params.repeat_count {
                debug!("stopped after {} periods, {} samples", cycles, samples);
                return Ok(RunSummary { samples, cycles });
            }
            self.write_sample(sampler(t, params), params.verbose)?;
            samples += 1;
            if let Some(interval) = self.config.min_sample_interval {
                self.sleep(interval);
            }
        }
    }

    fn write_sample(&mut self, voltage: f64, verbose: bool) -> Result<(), Error<I2C::Error>> {
        if verbose {
            info!("v={}", voltage);
        }
        self.dac.set_voltage(voltage, self.config.full_scale)?;
        Ok(())
    }

    fn sleep(&mut self, duration: Duration) {
        for ns in delay_chunks(duration) {
            self.delay.delay_ns(ns);
        }
    }
}
