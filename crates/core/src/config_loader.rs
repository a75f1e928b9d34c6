use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from `config/`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config")
    }

    /// Loads application configuration by layering defaults, `Config.toml`,
    /// `NEWSALPHA_`-prefixed environment variables, and `Config.json`.
    ///
    /// Nested keys use a double underscore, e.g. `NEWSALPHA_BACKTEST__LOOKBACK_DAYS=45`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be parsed.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<AppConfig> {
        let dir = dir.as_ref();
        tracing::debug!(dir = %dir.display(), "Loading configuration");

        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(dir.join("Config.toml")))
            .merge(Env::prefixed("NEWSALPHA_").split("__"))
            .join(Json::file(dir.join("Config.json")))
            .extract()?;

        Ok(config)
    }

    /// Loads configuration with a profile overlay (`Config.{profile}.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be parsed.
    pub fn load_with_profile(dir: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        let dir = dir.as_ref();
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(dir.join("Config.toml")))
            .merge(Toml::file(dir.join(format!("Config.{profile}.toml"))))
            .merge(Env::prefixed("NEWSALPHA_").split("__"))
            .join(Json::file(dir.join("Config.json")))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from(dir.path()).unwrap();

        assert_eq!(config.backtest.lookback_days, 30);
        assert_eq!(config.market_data.retry_attempts, 3);
        assert_eq!(config.market_data.benchmarks[0], "SH000001");
        assert_eq!(config.storage.weekly_results_file, "weekly_backtest_results.json");
    }

    #[test]
    fn toml_overrides_only_named_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Config.toml"),
            "[backtest]\nlookback_days = 45\n\n[storage]\ndata_dir = \"/var/lib/newsalpha\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from(dir.path()).unwrap();

        assert_eq!(config.backtest.lookback_days, 45);
        assert_eq!(config.backtest.age_buffer_days, 2);
        assert_eq!(config.storage.data_dir, std::path::PathBuf::from("/var/lib/newsalpha"));
        assert_eq!(config.storage.summary_file, "backtest_summary.json");
    }

    #[test]
    fn profile_overlay_wins_over_base() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Config.toml"), "[scheduler]\nenabled = true\n").unwrap();
        fs::write(dir.path().join("Config.test.toml"), "[scheduler]\nenabled = false\n").unwrap();

        let config = ConfigLoader::load_with_profile(dir.path(), "test").unwrap();
        assert!(!config.scheduler.enabled);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Config.toml"), "[backtest\nlookback_days = ").unwrap();
        assert!(ConfigLoader::load_from(dir.path()).is_err());
    }
}
