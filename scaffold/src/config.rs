//! Process configuration.
//!
//! Values come from the environment (optionally a `.env` file) or from
//! [`ScaffoldConfig::builder`]:
//!
//! | variable                        | field             | default        |
//! |---------------------------------|-------------------|----------------|
//! | `SCAFFOLD_ADDRESS`              | `address`         | `0.0.0.0:3000` |
//! | `SCAFFOLD_MONGO_URI`            | `mongo_uri`       | unset          |
//! | `SCAFFOLD_DATABASE`             | `database`        | `scaffold`     |
//! | `SCAFFOLD_LOG`                  | `log_filter`      | `info`         |
//! | `SCAFFOLD_REQUEST_TIMEOUT_SECS` | `request_timeout` | unset          |

use std::time::Duration;

use scaffold_core::error::{ScaffoldError, ScaffoldResult};

pub const ADDRESS_VAR: &str = "SCAFFOLD_ADDRESS";
pub const MONGO_URI_VAR: &str = "SCAFFOLD_MONGO_URI";
pub const DATABASE_VAR: &str = "SCAFFOLD_DATABASE";
pub const LOG_VAR: &str = "SCAFFOLD_LOG";
pub const REQUEST_TIMEOUT_VAR: &str = "SCAFFOLD_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldConfig {
    /// Address the HTTP server binds.
    pub address: String,
    /// MongoDB connection string. When unset, documents live in memory.
    pub mongo_uri: Option<String>,
    /// MongoDB database holding every collection.
    pub database: String,
    /// `tracing-subscriber` filter directive.
    pub log_filter: String,
    /// Upper bound on the time spent serving one request.
    pub request_timeout: Option<Duration>,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:3000".to_string(),
            mongo_uri: None,
            database: "scaffold".to_string(),
            log_filter: "info".to_string(),
            request_timeout: None,
        }
    }
}

impl ScaffoldConfig {
    pub fn builder() -> ScaffoldConfigBuilder {
        ScaffoldConfigBuilder::default()
    }

    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Fails if `.env` exists but cannot be parsed, or a variable is malformed.
    pub fn from_env() -> ScaffoldResult<Self> {
        match dotenvy::dotenv() {
            Err(err) if !err.not_found() => {
                return Err(ScaffoldError::Initialization(format!("cannot load .env: {err}")));
            }
            _ => {}
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ScaffoldResult<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let request_timeout = match read(REQUEST_TIMEOUT_VAR) {
            Some(raw) => parse_timeout(&raw)?,
            None => None,
        };

        Ok(Self {
            address: read(ADDRESS_VAR).unwrap_or(defaults.address),
            mongo_uri: read(MONGO_URI_VAR),
            database: read(DATABASE_VAR).unwrap_or(defaults.database),
            log_filter: read(LOG_VAR).unwrap_or(defaults.log_filter),
            request_timeout,
        })
    }
}

/// Whole seconds; zero disables the timeout.
fn parse_timeout(raw: &str) -> ScaffoldResult<Option<Duration>> {
    let seconds = raw.parse::<u64>().map_err(|_| {
        ScaffoldError::Initialization(format!(
            "{REQUEST_TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"
        ))
    })?;

    Ok((seconds > 0).then(|| Duration::from_secs(seconds)))
}

#[derive(Debug, Default)]
pub struct ScaffoldConfigBuilder {
    config: ScaffoldConfig,
}

impl ScaffoldConfigBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn mongo_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.mongo_uri = Some(uri.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ScaffoldConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(ScaffoldConfig::from_lookup(lookup(&[])).unwrap(), ScaffoldConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = ScaffoldConfig::from_lookup(lookup(&[
            (ADDRESS_VAR, "127.0.0.1:8080"),
            (MONGO_URI_VAR, "mongodb://localhost:27017"),
            (DATABASE_VAR, "app"),
            (LOG_VAR, "debug"),
            (REQUEST_TIMEOUT_VAR, "30"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ScaffoldConfig::builder()
                .address("127.0.0.1:8080")
                .mongo_uri("mongodb://localhost:27017")
                .database("app")
                .log_filter("debug")
                .request_timeout(Duration::from_secs(30))
                .build()
        );
    }

    #[test]
    fn blank_values_are_unset() {
        let config = ScaffoldConfig::from_lookup(lookup(&[(MONGO_URI_VAR, "  ")])).unwrap();

        assert_eq!(config.mongo_uri, None);
    }

    #[test]
    fn malformed_timeout_is_an_initialization_error() {
        let err = ScaffoldConfig::from_lookup(lookup(&[(REQUEST_TIMEOUT_VAR, "soon")])).unwrap_err();

        assert!(matches!(err, ScaffoldError::Initialization(_)));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = ScaffoldConfig::from_lookup(lookup(&[(REQUEST_TIMEOUT_VAR, "0")])).unwrap();

        assert_eq!(config.request_timeout, None);
    }
}
