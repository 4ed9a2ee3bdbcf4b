//! Server configuration assembled by the CLI.

use anyhow::{anyhow, Result};
use secrecy::SecretString;
use std::{fmt, path::PathBuf, str::FromStr};

use super::session::SessionConfig;

pub const DEFAULT_PORT: u16 = 3333;

/// Where session records live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionBackend {
    #[default]
    Memory,
    Postgres,
}

impl SessionBackend {
    pub const VALUES: [&'static str; 2] = ["memory", "postgres"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        }
    }
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => Err(anyhow!("unknown session store: {other}")),
        }
    }
}

impl fmt::Display for SessionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Config {
    port: u16,
    dsn: SecretString,
    views_dir: Option<PathBuf>,
    session_backend: SessionBackend,
    session: SessionConfig,
}

impl Config {
    #[must_use]
    pub fn new(port: u16, dsn: SecretString) -> Self {
        Self {
            port,
            dsn,
            views_dir: None,
            session_backend: SessionBackend::default(),
            session: SessionConfig::default(),
        }
    }

    #[must_use]
    pub fn with_views_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.views_dir = dir;
        self
    }

    #[must_use]
    pub fn with_session_backend(mut self, backend: SessionBackend) -> Self {
        self.session_backend = backend;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn dsn(&self) -> &SecretString {
        &self.dsn
    }

    #[must_use]
    pub fn views_dir(&self) -> Option<&PathBuf> {
        self.views_dir.as_ref()
    }

    #[must_use]
    pub fn session_backend(&self) -> SessionBackend {
        self.session_backend
    }

    #[must_use]
    pub fn session(&self) -> &SessionConfig {
        &self.session
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn session_backend_parses_known_values() {
        assert_eq!(
            "memory".parse::<SessionBackend>().unwrap(),
            SessionBackend::Memory
        );
        assert_eq!(
            "Postgres".parse::<SessionBackend>().unwrap(),
            SessionBackend::Postgres
        );
        assert!("redis".parse::<SessionBackend>().is_err());
    }

    #[test]
    fn session_backend_values_round_trip() {
        for value in SessionBackend::VALUES {
            assert_eq!(value.parse::<SessionBackend>().unwrap().as_str(), value);
        }
    }

    #[test]
    fn config_defaults() {
        let config = Config::new(DEFAULT_PORT, SecretString::from("postgres://localhost/sesame"));
        assert_eq!(config.port(), 3333);
        assert_eq!(config.dsn().expose_secret(), "postgres://localhost/sesame");
        assert!(config.views_dir().is_none());
        assert_eq!(config.session_backend(), SessionBackend::Memory);
        assert_eq!(config.session().ttl_seconds(), 86_400);
    }

    #[test]
    fn config_builder_overrides() {
        let config = Config::new(8080, SecretString::from("postgres://localhost/sesame"))
            .with_views_dir(Some(PathBuf::from("/srv/views")))
            .with_session_backend(SessionBackend::Postgres)
            .with_session(SessionConfig::new().with_cookie_secure(true));
        assert_eq!(config.views_dir(), Some(&PathBuf::from("/srv/views")));
        assert_eq!(config.session_backend(), SessionBackend::Postgres);
        assert!(config.session().cookie_secure());
    }
}
