use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::records::Period;

pub mod themes;

pub use themes::Theme;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "RunStats";
const APP_NAME: &str = "runstats";

const MIN_TICK_RATE_MS: u64 = 50;

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.save(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    /// Writes the whole config back. Used for first-run defaults and to
    /// persist in-app changes such as the theme toggle.
    pub fn save(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes()).context("writing config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("RUNSTATS_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("RUNSTATS_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let log_dir = data_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: ThemeName,
    /// Period selected at startup.
    pub default_period: Period,
    /// Where SpeedrunIGT writes record files. `None` resolves to
    /// `<home>/speedrunigt/records`. `RUNSTATS_RECORDS` overrides both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_dir: Option<PathBuf>,
    /// Runs with a final IGT below this are treated as practice resets
    /// and dropped during indexing. 0 keeps everything.
    pub min_run_igt_ms: i64,
    pub tick_rate_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            default_period: Period::Today,
            records_dir: None,
            min_run_igt_ms: 30_000,
            tick_rate_ms: 250,
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if let Ok(dir) = env::var("RUNSTATS_RECORDS") {
            self.records_dir = Some(PathBuf::from(dir));
        }
        if self.min_run_igt_ms < 0 {
            tracing::warn!(
                value = self.min_run_igt_ms,
                "negative min_run_igt_ms in config, treating as 0"
            );
            self.min_run_igt_ms = 0;
        }
        if self.tick_rate_ms < MIN_TICK_RATE_MS {
            tracing::warn!(
                value = self.tick_rate_ms,
                "tick_rate_ms too small, clamping to {}",
                MIN_TICK_RATE_MS
            );
            self.tick_rate_ms = MIN_TICK_RATE_MS;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    Dark,
    Light,
}

impl ThemeName {
    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThemeName::Dark => "dark",
            ThemeName::Light => "light",
        }
    }
}

impl Default for ThemeName {
    fn default() -> Self {
        ThemeName::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let cfg = AppConfig::default();
        let raw = toml::to_string_pretty(&cfg).expect("serializes");
        let parsed: AppConfig = toml::from_str(&raw).expect("parses");
        assert_eq!(parsed.theme, ThemeName::Dark);
        assert_eq!(parsed.default_period, Period::Today);
        assert_eq!(parsed.min_run_igt_ms, 30_000);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: AppConfig = toml::from_str("theme = \"light\"").expect("parses");
        assert_eq!(parsed.theme, ThemeName::Light);
        assert_eq!(parsed.default_period, Period::Today);
        assert_eq!(parsed.tick_rate_ms, 250);
    }

    #[test]
    fn post_load_clamps_nonsense_values() {
        let mut cfg = AppConfig {
            min_run_igt_ms: -5,
            tick_rate_ms: 1,
            ..AppConfig::default()
        };
        cfg.post_load();
        assert_eq!(cfg.min_run_igt_ms, 0);
        assert_eq!(cfg.tick_rate_ms, MIN_TICK_RATE_MS);
    }

    #[test]
    fn theme_toggle_alternates() {
        assert_eq!(ThemeName::Dark.toggled(), ThemeName::Light);
        assert_eq!(ThemeName::Light.toggled(), ThemeName::Dark);
    }
}
