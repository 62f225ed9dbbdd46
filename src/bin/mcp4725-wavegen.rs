//! Bench waveform generator for an MCP4725 on a Linux I2C bus.
//!
//! ```text
//! mcp4725-wavegen -fun sin -lo 0 -hi 2.5 -freq 1 -n 10
//! mcp4725-wavegen -fun ste -freq 2 0 1.1 2.2 3.3
//! ```

use std::process::ExitCode;

use env_logger::Env;
use linux_embedded_hal::{Delay, I2cdev};
use log::{error, info};

use mcp4725_wavegen::cli::{CliError, Invocation};
use mcp4725_wavegen::{Generator, MonotonicClock, MCP4725};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let invocation = match Invocation::parse(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(CliError::HelpRequested) => {
            println!("{}", CliError::HelpRequested);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let waveform = match invocation.waveform() {
        Ok(waveform) => waveform,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Closed when the generator is dropped, on every path out of main.
    let i2c = match I2cdev::new(&invocation.device) {
        Ok(i2c) => i2c,
        Err(e) => {
            error!("I2C error on device file {}: {}", invocation.device, e);
            return ExitCode::FAILURE;
        }
    };
    let dac = MCP4725::new(i2c, invocation.address.into());
    let mut generator = Generator::new(dac, MonotonicClock::new(), Delay, invocation.config);

    match generator.run(&waveform, &invocation.params) {
        Ok(summary) => {
            info!(
                "done: {} samples over {} cycles",
                summary.samples, summary.cycles
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("DAC error {:?}", e);
            ExitCode::FAILURE
        }
    }
}
