//! Configuration file loader with multi-source merging

use super::error::ConfigError;
use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: [&str; 2] = ["parley.toml", ".parley.toml"];
const ENV_PREFIX: &str = "PARLEY_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `PARLEY_*` environment variables (`__` separates nested keys)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./parley.toml` or `./.parley.toml`
    /// 4. Global config: `$XDG_CONFIG_HOME/parley/config.toml`
    /// 5. Default values
    ///
    /// The merged result is validated before it is returned.
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let config: FileConfig = Self::figment(config_path)
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// `$XDG_CONFIG_HOME/parley/config.toml`, or the platform equivalent
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("parley").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used, in priority order.
    pub fn describe_sources(config_path: Option<&Path>) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(path) = config_path {
            let status = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("[{:<7}] Explicit: {}", status, path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("[FOUND  ] Project: {}", path.display())),
            None => lines.push("[       ] Project: ./parley.toml or ./.parley.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let status = if path.exists() { "FOUND" } else { "" };
            lines.push(format!("[{:<7}] Global:  {}", status, path.display()));
        }

        lines.push(format!("[       ] Env:     {}*", ENV_PREFIX));
        lines.push("[       ] Default: built-in defaults".to_string());
        lines
    }

    /// Render a configuration as TOML (for --show-config).
    pub fn render(config: &FileConfig) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.models.is_empty());
        assert_eq!(config.backend.timeout_seconds, 120);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("parley"));
    }

    #[test]
    fn test_explicit_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[[models]]
name = "tiny"
tier = "fast"

[orchestration]
max_turns = 3
"#
        )
        .unwrap();

        let config: FileConfig = ConfigLoader::figment(Some(&path)).extract().unwrap();

        assert_eq!(config.models.len(), 1);
        assert_eq!(config.orchestration.max_turns, 3);
        // untouched keys keep their defaults
        assert_eq!(config.orchestration.moderator_max_iterations, 30);
        assert_eq!(config.backend.timeout_seconds, 120);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[backend]\ntimeout_seconds = 0\n").unwrap();

        let result = ConfigLoader::load(Some(&path));

        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLEY_BACKEND__TIMEOUT_SECONDS", "45");
            let config: FileConfig = ConfigLoader::figment(None).extract()?;
            assert_eq!(config.backend.timeout_seconds, 45);
            Ok(())
        });
    }

    #[test]
    fn test_render_is_parseable() {
        let rendered = ConfigLoader::render(&FileConfig::default()).unwrap();
        let parsed: FileConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, FileConfig::default());
    }
}
