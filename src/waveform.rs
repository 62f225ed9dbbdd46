//! Voltage quantization and the waveform samplers.
//!
//! Every sampler is a pure function of the time `t` elapsed since the start of a run, in
//! seconds. None of them validate `frequency`; a zero or negative frequency yields NaN or
//! infinities rather than an error.

use core::f64::consts::PI;
use core::time::Duration;

use crate::types::{SampleCode, WaveformParameters};

const CODE_STEPS: f64 = 4096.0;

/// A periodic waveform: voltage at `t` seconds into the run.
pub type Sampler = fn(f64, &WaveformParameters) -> f64;

/// Maps `voltage` onto the 12-bit code range of a DAC whose code 4095 corresponds to
/// `full_scale` volts.
///
/// Negative voltages give code 0 and voltages above `full_scale` give code 4095. In between the
/// code is `floor(voltage / full_scale * 4096)`, which hits 4096 exactly at `full_scale` and is
/// clamped back to 4095. NaN gives 0.
pub fn quantize(voltage: f64, full_scale: f64) -> SampleCode {
    if voltage < 0.0 {
        return SampleCode::MIN;
    }
    if voltage > full_scale {
        return SampleCode::MAX;
    }
    // `as` saturates and maps NaN to 0.
    let raw = libm::floor(voltage / full_scale * CODE_STEPS) as u16;
    SampleCode::new(raw).unwrap_or(SampleCode::MAX)
}

/// Number of whole periods completed after `t` seconds.
pub fn periods_elapsed(t: f64, frequency: f64) -> u64 {
    // Negative and NaN products saturate to 0.
    libm::floor(t * frequency) as u64
}

/// Sine between `lo` and `hi`, starting at the midpoint and rising.
///
/// ```
/// use mcp4725_wavegen::{waveform, WaveformParameters};
///
/// let params = WaveformParameters { lo: 1.0, hi: 3.0, frequency: 2.0, ..Default::default() };
/// assert!((waveform::sine(0.125, &params) - 3.0).abs() < 1e-9);
/// ```
pub fn sine(t: f64, params: &WaveformParameters) -> f64 {
    (libm::sin(2.0 * PI * params.frequency * t) + 1.0) * (params.hi - params.lo) / 2.0 + params.lo
}

/// Linear ramp from `lo` towards `hi` over each period, jumping back to `lo` at every period
/// boundary.
pub fn sawtooth(t: f64, params: &WaveformParameters) -> f64 {
    let period = 1.0 / params.frequency;
    libm::fmod(t, period) * (params.hi - params.lo) * params.frequency + params.lo
}

/// Length of a single step of a step sequence.
///
/// Returns `None` when `frequency` does not give a finite, non-negative hold time.
pub fn step_period(frequency: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(1.0 / frequency).ok()
}

/// Time left to hold a step of length `period` once `spent` seconds have gone into writing it.
pub fn remaining_hold(period: Duration, spent: f64) -> Duration {
    match Duration::try_from_secs_f64(spent) {
        Ok(spent) => period.saturating_sub(spent),
        // Negative or NaN time spent: nothing to subtract.
        Err(_) => period,
    }
}
