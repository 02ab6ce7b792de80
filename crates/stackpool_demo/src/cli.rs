//! # Command Line
//!
//! Flag parsing for `arena_demo`. Every flag that takes a value fails loudly
//! when the value is missing or does not parse.

use std::str::FromStr;

/// What the command line asked for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `--config <PATH>`
    pub config_path: Option<String>,
    /// `--users <COUNT>`
    pub users: Option<usize>,
    /// `--rounds <COUNT>`
    pub rounds: Option<usize>,
    /// `--help`
    pub help: bool,
}

fn flag_value<T: FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let raw = args.get(i + 1).ok_or_else(|| format!("{flag} requires a value"))?;
    raw.parse().map_err(|_| format!("invalid value for {flag}: {raw}"))
}

impl CliArgs {
    /// Parses arguments, excluding the program name.
    ///
    /// # Errors
    ///
    /// Returns a message for unknown flags and for missing or unparsable
    /// values.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => parsed.config_path = Some(flag_value(args, i, "--config")?),
                "--users" | "-u" => parsed.users = Some(flag_value(args, i, "--users")?),
                "--rounds" | "-r" => parsed.rounds = Some(flag_value(args, i, "--rounds")?),
                "--help" | "-h" => {
                    parsed.help = true;
                    return Ok(parsed);
                }
                other => return Err(format!("unknown argument: {other}")),
            }
            i += 2;
        }
        Ok(parsed)
    }
}
