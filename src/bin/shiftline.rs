//! Live frequency shifter driven by stdin commands.
//!
//! ```text
//! shiftline [config.json]
//! shiftline --list-devices
//! ```
//!
//! Reads one command per line (`amplitude 800`, `mod 3`, `cutoff 1500`,
//! `set 500 2 1000`, `status`, `stop`). End of input stops the engine.
//! Set `RUST_LOG=debug` for coefficient and cache logging.

use shiftline::prelude::*;
use std::io::BufRead;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--list-devices") {
        for name in shiftline::core::device::list_input_devices()? {
            println!("input  {name}");
        }
        for name in shiftline::core::device::list_output_devices()? {
            println!("output {name}");
        }
        return Ok(());
    }

    let builder = match arg {
        Some(path) => ShiftEngine::builder().config_file(path)?,
        None => ShiftEngine::builder(),
    };
    let mut engine = builder.build()?;
    engine.start()?;

    let handle = engine
        .handle()
        .cloned()
        .ok_or_else(|| Error::InvalidState("engine has no controller".into()))?;

    tracing::info!(config = ?engine.config(), "shiftline running, type `stop` to quit");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<ControlCommand>() {
            Ok(command) => {
                if !command.apply(&handle) {
                    break;
                }
            }
            Err(e) => tracing::warn!(%e, "ignored"),
        }
        if !engine.is_running() {
            break;
        }
    }

    engine.stop()
}
