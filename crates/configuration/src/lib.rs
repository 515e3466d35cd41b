// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod run_config;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use run_config::{DEFAULT_AGENTS, KNOWN_AGENTS, REQUIRED_SECTORS, RunConfig};
pub use settings::{ApiSettings, LoggingSettings, PollingSettings, Settings};

const ENV_PREFIX: &str = "MARKETVIEW";

/// Loads the application settings.
///
/// Sources are layered, later ones winning: built-in defaults, an optional `config.toml`
/// in the working directory, then `MARKETVIEW__SECTION__KEY` environment variables.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from("config")
}

/// Same as [`load_settings`] but reads the file at `path` (extension optional).
pub fn load_settings_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("run.agents"),
        )
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.polling.interval_ms == 0 {
        return Err(ConfigError::Validation(
            "polling.interval_ms must be greater than zero".to_string(),
        ));
    }
    if settings.api.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("api.base_url must not be empty".to_string()));
    }
    Ok(())
}
