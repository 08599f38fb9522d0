use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime settings, layered from defaults, an optional `trivia.toml` and
/// `TRIVIA_*` environment variables (later sources win).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub bind_address: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("trivia").required(false))
                .add_source(Environment::with_prefix("TRIVIA")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("db_path", "trivia.db")?
            .set_default("bind_address", "0.0.0.0:8080")?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = Settings::from_builder(Config::builder()).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("trivia.db"));
        assert_eq!(settings.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn file_values_override_defaults() {
        let builder = Config::builder().add_source(File::from_str(
            "db_path = \"/var/lib/trivia/quiz.db\"",
            FileFormat::Toml,
        ));
        let settings = Settings::from_builder(builder).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("/var/lib/trivia/quiz.db"));
        assert_eq!(settings.bind_address, "0.0.0.0:8080");
    }
}
