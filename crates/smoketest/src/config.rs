//! Run configuration loaded from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use common::PartyIndex;
use reqwest::Url;
use saga::NotificationPolicy;
use saga::smoke_test::{DEFAULT_COLLABORATION_NAME, DEFAULT_CSV_HEADER_LINE};
use thiserror::Error;

/// Port the receiver binds when the callback URI carries none.
pub const DEFAULT_CALLBACK_PORT: u16 = 80;

/// Errors loading the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Smoke-test configuration.
///
/// Reads from environment variables:
/// - `COORD_SERVICE_URI`: coordination service base URI (required)
/// - `CLIENT_SERVICE_URI`: client service base URI (required)
/// - `SMOKETESTING_INSTANCE_URI`: callback URI advertised to the platform (required)
/// - `SMOKETEST_BIND_HOST`: receiver bind address (default: `"0.0.0.0"`)
/// - `MPC_PROGRAM_PATH`, `CS_CONFIG_PATH`, `TEST_DATA_PATH`: input files
/// - `COLLABORATION_NAME`, `CSV_HEADER_LINE`, `NUMBER_OF_PARTIES`, `PARTY_INDEX`
/// - `NOTIFY_POLL_INTERVAL_SECS` (default `2`), `NOTIFY_MAX_ATTEMPTS` (default `6`)
/// - `RECEIVER_STARTUP_SECS`: wait after the receiver binds (default `0`)
/// - `RUST_LOG` (default `"info"`), `LOG_FORMAT` (`text` or `json`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub coord_service_uri: String,
    pub client_service_uri: String,
    pub callback_url: String,
    pub bind_host: String,
    pub mpc_program_path: PathBuf,
    pub cs_config_path: PathBuf,
    pub test_data_path: PathBuf,
    pub collaboration_name: String,
    pub csv_header_line: String,
    pub number_of_parties: u32,
    pub party: PartyIndex,
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub receiver_startup: Duration,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));
        let string = |var: &str, default: String| lookup(var).unwrap_or(default);

        let config = Self {
            coord_service_uri: parse_uri("COORD_SERVICE_URI", required("COORD_SERVICE_URI")?)?,
            client_service_uri: parse_uri("CLIENT_SERVICE_URI", required("CLIENT_SERVICE_URI")?)?,
            callback_url: parse_uri(
                "SMOKETESTING_INSTANCE_URI",
                required("SMOKETESTING_INSTANCE_URI")?,
            )?,
            bind_host: string("SMOKETEST_BIND_HOST", defaults.bind_host),
            mpc_program_path: lookup("MPC_PROGRAM_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.mpc_program_path),
            cs_config_path: lookup("CS_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cs_config_path),
            test_data_path: lookup("TEST_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.test_data_path),
            collaboration_name: string("COLLABORATION_NAME", defaults.collaboration_name),
            csv_header_line: string("CSV_HEADER_LINE", defaults.csv_header_line),
            number_of_parties: parse_number(
                "NUMBER_OF_PARTIES",
                lookup("NUMBER_OF_PARTIES"),
                defaults.number_of_parties,
            )?,
            party: PartyIndex::new(parse_number(
                "PARTY_INDEX",
                lookup("PARTY_INDEX"),
                defaults.party.value(),
            )?),
            poll_interval: Duration::from_secs(parse_number(
                "NOTIFY_POLL_INTERVAL_SECS",
                lookup("NOTIFY_POLL_INTERVAL_SECS"),
                defaults.poll_interval.as_secs(),
            )?),
            max_attempts: parse_number(
                "NOTIFY_MAX_ATTEMPTS",
                lookup("NOTIFY_MAX_ATTEMPTS"),
                defaults.max_attempts,
            )?,
            receiver_startup: Duration::from_secs(parse_number(
                "RECEIVER_STARTUP_SECS",
                lookup("RECEIVER_STARTUP_SECS"),
                defaults.receiver_startup.as_secs(),
            )?),
            log_level: string("RUST_LOG", defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        };

        // Surface a bad bind host at load time rather than at step 3.
        config.bind_addr()?;
        Ok(config)
    }

    /// Port parsed out of the callback URI, 80 when it carries none.
    pub fn callback_port(&self) -> Result<u16, ConfigError> {
        let url = Url::parse(&self.callback_url).map_err(|e| ConfigError::Invalid {
            var: "SMOKETESTING_INSTANCE_URI",
            value: self.callback_url.clone(),
            reason: e.to_string(),
        })?;
        // `Url::port` hides a port equal to the scheme default.
        let port = match url.port() {
            Some(port) => Some(port),
            None if has_explicit_port(&self.callback_url) => url.port_or_known_default(),
            None => None,
        };
        Ok(port.unwrap_or(DEFAULT_CALLBACK_PORT))
    }

    /// Address the webhook receiver binds.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let port = self.callback_port()?;
        format!("{}:{port}", self.bind_host)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "SMOKETEST_BIND_HOST",
                value: self.bind_host.clone(),
                reason: e.to_string(),
            })
    }

    pub fn notification_policy(&self) -> NotificationPolicy {
        NotificationPolicy::new(self.poll_interval, self.max_attempts)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coord_service_uri: String::new(),
            client_service_uri: String::new(),
            callback_url: String::new(),
            bind_host: "0.0.0.0".to_string(),
            mpc_program_path: PathBuf::from("mpc_program.mpc"),
            cs_config_path: PathBuf::from("csconfig"),
            test_data_path: PathBuf::from("testdata.csv"),
            collaboration_name: DEFAULT_COLLABORATION_NAME.to_string(),
            csv_header_line: DEFAULT_CSV_HEADER_LINE.to_string(),
            number_of_parties: 1,
            party: PartyIndex::default(),
            poll_interval: NotificationPolicy::default().interval,
            max_attempts: NotificationPolicy::default().max_attempts,
            receiver_startup: Duration::ZERO,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Returns true if the URI's authority names a port.
fn has_explicit_port(uri: &str) -> bool {
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host_port)| host_port);
    // Skip a bracketed IPv6 host.
    let after_host = host_port.rsplit_once(']').map_or(host_port, |(_, tail)| tail);
    after_host.contains(':')
}

fn parse_uri(var: &'static str, value: String) -> Result<String, ConfigError> {
    match Url::parse(&value) {
        Ok(_) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_number<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value: raw,
        }),
    }
}
