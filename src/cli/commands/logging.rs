use clap::{builder::ValueParser, Arg, ArgAction, Command};

use super::ENV_LOG_LEVEL;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names accepted by `SESAME_LOG_LEVEL`, indexed by verbosity.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

const MAX_NUMERIC_VERBOSITY: u8 = 5;

/// Parse a level name (any case) or a verbosity number up to 5.
///
/// # Errors
/// Returns an error naming the accepted levels.
pub fn parse_log_level(level: &str) -> Result<u8, String> {
    if let Ok(parsed) = level.parse::<u8>() {
        if parsed <= MAX_NUMERIC_VERBOSITY {
            return Ok(parsed);
        }
    }

    LOG_LEVELS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(level.trim()))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level '{level}', expected one of: {}",
                LOG_LEVELS.join(", ")
            )
        })
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_log_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
