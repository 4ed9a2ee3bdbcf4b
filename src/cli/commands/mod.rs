pub mod logging;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        BoolishValueParser, PossibleValuesParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};
use std::path::PathBuf;

use crate::sesame::{session::MAX_SESSION_TTL_SECONDS, SessionBackend};

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_VIEWS_DIR: &str = "views-dir";
pub const ARG_SESSION_STORE: &str = "session-store";
pub const ARG_SESSION_TTL: &str = "session-ttl";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";

pub const ENV_PORT: &str = "SESAME_PORT";
pub const ENV_DSN: &str = "SESAME_DSN";
pub const ENV_VIEWS_DIR: &str = "SESAME_VIEWS_DIR";
pub const ENV_SESSION_STORE: &str = "SESAME_SESSION_STORE";
pub const ENV_SESSION_TTL: &str = "SESAME_SESSION_TTL";
pub const ENV_COOKIE_SECURE: &str = "SESAME_COOKIE_SECURE";
pub const ENV_LOG_LEVEL: &str = "SESAME_LOG_LEVEL";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("sesame")
        .about("Session-based signup and signin")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("3333")
                .env(ENV_PORT)
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env(ENV_DSN)
                .required(true),
        )
        .arg(
            Arg::new(ARG_VIEWS_DIR)
                .long("views-dir")
                .help("Directory with index.html, login.html and protected.html (default: built-in views)")
                .env(ENV_VIEWS_DIR)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_SESSION_STORE)
                .long("session-store")
                .help("Where sessions are kept")
                .env(ENV_SESSION_STORE)
                .default_value("memory")
                .value_parser(PossibleValuesParser::new(SessionBackend::VALUES)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long("session-ttl")
                .help("Session lifetime in seconds")
                .env(ENV_SESSION_TTL)
                .default_value("86400")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long("cookie-secure")
                .help("Mark the session cookie Secure (serve behind HTTPS)")
                .env(ENV_COOKIE_SECURE)
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        );

    logging::with_args(command)
}
