use std::borrow::Cow;
use std::env;
use std::str::FromStr;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::prelude::*;

/// The kernel hands unknown `key=value` command line words to PID 1 as
/// environment, so `EARLYINIT_LOG_LEVEL=debug` can be put there.
const LOG_LEVEL_ENV: &str = "EARLYINIT_LOG_LEVEL";

/// If in debug mode, default level is debug to get maximum logging
#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: &str = "debug";

/// If not in debug mode, default level is info so the chosen root shows up
/// on the console
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: &str = "info";

fn detect_log_level(input: Option<String>) -> Result<Level> {
    let log_level: Cow<str> = match input {
        None => DEFAULT_LOG_LEVEL.into(),
        Some(level) => level.into(),
    };

    Ok(Level::from_str(log_level.as_ref())?)
}

pub fn init() -> Result<()> {
    let level = detect_log_level(env::var(LOG_LEVEL_ENV).ok()).or_else(|err| {
        eprintln!("invalid {}: {}, using {}", LOG_LEVEL_ENV, err, DEFAULT_LOG_LEVEL);
        detect_log_level(None)
    })?;
    let log_level_filter = tracing_subscriber::filter::LevelFilter::from(level);

    // Text to stderr, which the kernel connected to the console. No
    // timestamps: the clock is meaningless this early and dmesg has its own.
    tracing_subscriber::registry()
        .with(log_level_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(false)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logger: {}", e))?;

    Ok(())
}
