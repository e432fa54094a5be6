use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_HORIZON_YEARS, DEFAULT_LOG_LEVEL, DEFAULT_TIMEZONE, MAX_INSTANCES,
};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub recurrence: RecurrenceConfig,
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceConfig {
    /// Cap on raw occurrences per expansion call.
    pub max_instances: usize,
    /// Horizon applied to imported series that carry no `UNTIL`.
    pub default_horizon_years: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// IANA (or Windows) zone name used for times without a `TZID`.
    pub default_timezone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recurrence: RecurrenceConfig {
                max_instances: MAX_INSTANCES,
                default_horizon_years: DEFAULT_HORIZON_YEARS,
            },
            import: ImportConfig {
                default_timezone: DEFAULT_TIMEZONE.to_string(),
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}

impl Settings {
    /// ## Summary
    /// Loads configuration from an optional `config.toml` and `MOCCA_`
    /// environment variables, e.g. `MOCCA_RECURRENCE__MAX_INSTANCES`.
    /// Environment variables take precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration, deserializing it, or
    /// validating the result fails.
    pub fn load() -> Result<Self> {
        Self::load_from(environment())
    }

    fn load_from(environment: config::Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("recurrence.max_instances", u64::try_from(MAX_INSTANCES)?)?
            .set_default("recurrence.default_horizon_years", DEFAULT_HORIZON_YEARS)?
            .set_default("import.default_timezone", DEFAULT_TIMEZONE)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env overrides
            .add_source(environment)
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Checks values the deserializer cannot reject on its own.
    ///
    /// ## Errors
    /// Returns `CoreError::ConfigError` for a zero instance cap, a zero horizon
    /// or an empty default time zone.
    pub fn validate(&self) -> CoreResult<()> {
        if self.recurrence.max_instances == 0 {
            return Err(CoreError::ConfigError(
                "recurrence.max_instances must be greater than zero".to_string(),
            ));
        }
        if self.recurrence.default_horizon_years == 0 {
            return Err(CoreError::ConfigError(
                "recurrence.default_horizon_years must be greater than zero".to_string(),
            ));
        }
        if self.import.default_timezone.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "import.default_timezone must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Section and key are split by a double underscore so that keys may
/// contain single underscores.
fn environment() -> config::Environment {
    config::Environment::with_prefix("MOCCA")
        .prefix_separator("_")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
