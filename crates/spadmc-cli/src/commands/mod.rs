//! Command implementations and shared stdin prompting.

pub mod device;
pub mod field_sweep;

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, anyhow};

/// Prompt on stdout and parse one stdin line. Used for every run input the
/// user did not supply as a flag, matching the original interactive flow.
pub fn prompt<T>(message: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    print!("{message}: ");
    io::stdout().flush().context("flushing prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading stdin")?;
    let trimmed = line.trim();
    trimmed
        .parse::<T>()
        .map_err(|e| anyhow!("invalid input '{trimmed}': {e}"))
}

/// Use the flag value when given, otherwise prompt for it.
pub fn flag_or_prompt<T>(flag: Option<T>, message: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match flag {
        Some(value) => Ok(value),
        None => prompt(message),
    }
}
