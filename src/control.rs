//! Line-oriented control commands.
//!
//! ```text
//! amplitude <hz>        set the shift amplitude
//! mod <hz>              set the modulation frequency
//! cutoff <hz>           set the anti-aliasing cutoff
//! set <amp> <mod> <cut> replace all three at once
//! status                log parameters and metrics
//! stop                  stop the pipeline
//! ```

use crate::controller::ControllerHandle;
use crate::{Error, Result};
use shiftline_core::ShiftParameters;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Amplitude(f32),
    ModFreq(f32),
    Cutoff(f32),
    Set(ShiftParameters),
    Status,
    Stop,
}

impl ControlCommand {
    /// Apply to a running pipeline. Returns `false` once the pipeline was told to stop.
    pub fn apply(&self, handle: &ControllerHandle) -> bool {
        let parameters = handle.parameters();
        match *self {
            ControlCommand::Amplitude(hz) => parameters.set_amplitude(hz),
            ControlCommand::ModFreq(hz) => parameters.set_mod_freq(hz),
            ControlCommand::Cutoff(hz) => parameters.set_cutoff(hz),
            ControlCommand::Set(params) => parameters.set(params),
            ControlCommand::Status => {
                let metrics = handle.metrics().snapshot();
                tracing::info!(params = ?parameters.snapshot(), ?metrics, "status");
            }
            ControlCommand::Stop => {
                handle.request_stop();
                return false;
            }
        }
        true
    }
}

impl FromStr for ControlCommand {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let keyword = words
            .next()
            .ok_or_else(|| Error::Command("empty command".into()))?;
        let args: Vec<&str> = words.collect();

        let command = match (keyword.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("amplitude" | "amp", [hz]) => ControlCommand::Amplitude(parse_hz(hz)?),
            ("mod" | "mod_freq", [hz]) => ControlCommand::ModFreq(parse_hz(hz)?),
            ("cutoff", [hz]) => ControlCommand::Cutoff(parse_hz(hz)?),
            ("set", [amplitude, mod_freq, cutoff]) => ControlCommand::Set(ShiftParameters::new(
                parse_hz(amplitude)?,
                parse_hz(mod_freq)?,
                parse_hz(cutoff)?,
            )),
            ("status", []) => ControlCommand::Status,
            ("stop" | "quit", []) => ControlCommand::Stop,
            _ => return Err(Error::Command(format!("unrecognized command `{line}`"))),
        };
        Ok(command)
    }
}

fn parse_hz(word: &str) -> Result<f32> {
    word.parse::<f32>()
        .map_err(|e| Error::Command(format!("`{word}` is not a frequency: {e}")))
}
