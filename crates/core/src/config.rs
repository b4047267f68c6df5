use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub slack: SlackConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub verification_enabled: bool,
    pub signing_secret: Option<SecretString>,
    pub request_max_age_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub default_url: Option<String>,
    pub fetch_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub verification_enabled: Option<bool>,
    pub signing_secret: Option<String>,
    pub request_max_age_secs: Option<u64>,
    pub default_feed_url: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 5000 },
            database: DatabaseConfig {
                url: "sqlite://feedhorn.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            slack: SlackConfig {
                verification_enabled: true,
                signing_secret: None,
                request_max_age_secs: None,
            },
            feed: FeedConfig { default_url: None, fetch_timeout_secs: 10 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("feedhorn.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(verification_enabled) = slack.verification_enabled {
                self.slack.verification_enabled = verification_enabled;
            }
            if let Some(signing_secret_value) = slack.signing_secret {
                self.slack.signing_secret = Some(secret_value(signing_secret_value));
            }
            if let Some(request_max_age_secs) = slack.request_max_age_secs {
                self.slack.request_max_age_secs = Some(request_max_age_secs);
            }
        }

        if let Some(feed) = patch.feed {
            if let Some(default_url) = feed.default_url {
                self.feed.default_url = Some(default_url);
            }
            if let Some(fetch_timeout_secs) = feed.fetch_timeout_secs {
                self.feed.fetch_timeout_secs = fetch_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FEEDHORN_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FEEDHORN_SERVER_PORT") {
            self.server.port = parse_u16("FEEDHORN_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("FEEDHORN_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FEEDHORN_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("FEEDHORN_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FEEDHORN_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FEEDHORN_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FEEDHORN_SLACK_VERIFICATION") {
            self.slack.verification_enabled = parse_bool("FEEDHORN_SLACK_VERIFICATION", &value)?;
        }
        if let Some(value) = read_env("FEEDHORN_SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("FEEDHORN_SLACK_REQUEST_MAX_AGE_SECS") {
            self.slack.request_max_age_secs =
                Some(parse_u64("FEEDHORN_SLACK_REQUEST_MAX_AGE_SECS", &value)?);
        }

        if let Some(value) = read_env("FEEDHORN_FEED_DEFAULT_URL") {
            self.feed.default_url = Some(value);
        }
        if let Some(value) = read_env("FEEDHORN_FEED_FETCH_TIMEOUT_SECS") {
            self.feed.fetch_timeout_secs = parse_u64("FEEDHORN_FEED_FETCH_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("FEEDHORN_LOGGING_LEVEL").or_else(|| read_env("FEEDHORN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FEEDHORN_LOGGING_FORMAT").or_else(|| read_env("FEEDHORN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(verification_enabled) = overrides.verification_enabled {
            self.slack.verification_enabled = verification_enabled;
        }
        if let Some(signing_secret) = overrides.signing_secret {
            self.slack.signing_secret = Some(secret_value(signing_secret));
        }
        if let Some(request_max_age_secs) = overrides.request_max_age_secs {
            self.slack.request_max_age_secs = Some(request_max_age_secs);
        }
        if let Some(default_feed_url) = overrides.default_feed_url {
            self.feed.default_url = Some(default_feed_url);
        }
        if let Some(fetch_timeout_secs) = overrides.fetch_timeout_secs {
            self.feed.fetch_timeout_secs = fetch_timeout_secs;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_database(&self.database)?;
        validate_slack(&self.slack)?;
        validate_feed(&self.feed)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("feedhorn.toml"), PathBuf::from("config/feedhorn.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if slack.verification_enabled {
        let missing = slack
            .signing_secret
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "slack.signing_secret is required while signature verification is enabled. \
                 Get it from https://api.slack.com/apps > Your App > Basic Information, or set \
                 slack.verification_enabled = false for local development"
                    .to_string(),
            ));
        }
    }

    if let Some(max_age) = slack.request_max_age_secs {
        if max_age == 0 {
            return Err(ConfigError::Validation(
                "slack.request_max_age_secs must be greater than zero when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_feed(feed: &FeedConfig) -> Result<(), ConfigError> {
    if let Some(url) = &feed.default_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "feed.default_url must start with http:// or https://".to_string(),
            ));
        }
    }

    if feed.fetch_timeout_secs == 0 || feed.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "feed.fetch_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    database: Option<DatabasePatch>,
    slack: Option<SlackPatch>,
    feed: Option<FeedPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    verification_enabled: Option<bool>,
    signing_secret: Option<String>,
    request_max_age_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedPatch {
    default_url: Option<String>,
    fetch_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
