use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "monitor";
const ENV_PREFIX: &str = "MONITOR";

/// Run settings. Layered: defaults, then `monitor.toml` (or an explicit file),
/// then `MONITOR_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub models: Vec<String>,
    pub pages_per_site: u32,
    pub items_per_page: usize,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agents: Vec<String>,
    pub amazon_base_url: String,
    pub mercadolivre_base_url: String,
    pub database_path: PathBuf,
    pub mirror_path: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models: [
                "asus vivobook 15",
                "lenovo ideapad 3",
                "acer nitro 5",
                "dell inspiron 15",
                "macbook",
            ]
            .map(String::from)
            .to_vec(),
            pages_per_site: 2,
            items_per_page: 5,
            delay_min_ms: 3000,
            delay_max_ms: 7000,
            request_timeout_secs: 15,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36".to_string(),
            ],
            amazon_base_url: "https://www.amazon.com.br".to_string(),
            mercadolivre_base_url: "https://lista.mercadolivre.com.br".to_string(),
            database_path: PathBuf::from("data/monitor.sqlite"),
            mirror_path: Some(PathBuf::from("resultados.csv")),
            log_file: Some(PathBuf::from("monitor.log")),
        }
    }
}

impl Settings {
    /// Load settings. An explicit `file` must exist; the default `monitor.toml` is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("models")
                    .with_list_parse_key("user_agents"),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Random pause between two fetches, within the configured bounds.
    pub fn random_delay(&self) -> Duration {
        let (lo, hi) = if self.delay_min_ms <= self.delay_max_ms {
            (self.delay_min_ms, self.delay_max_ms)
        } else {
            (self.delay_max_ms, self.delay_min_ms)
        };
        Duration::from_millis(fastrand::u64(lo..=hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.models.len(), 5);
        assert_eq!(s.pages_per_site, 2);
        assert_eq!(s.request_timeout(), Duration::from_secs(15));
        assert_eq!(s.mirror_path.as_deref(), Some(Path::new("resultados.csv")));
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
            models = ["macbook air m2"]
            pages_per_site = 1
            database_path = "/tmp/prices.sqlite"
            "#,
        )
        .unwrap();

        let s = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(s.models, vec!["macbook air m2".to_string()]);
        assert_eq!(s.pages_per_site, 1);
        assert_eq!(s.database_path, PathBuf::from("/tmp/prices.sqlite"));
        assert_eq!(s.delay_min_ms, 3000);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(dir.path().join("absent.toml").as_path())).is_err());
    }

    #[test]
    fn delay_stays_in_bounds() {
        let s = Settings {
            delay_min_ms: 20,
            delay_max_ms: 10,
            ..Settings::default()
        };
        for _ in 0..50 {
            let d = s.random_delay().as_millis();
            assert!((10..=20).contains(&d));
        }
    }
}
