//! Configuration resolution.
//!
//! Every setting is resolved in priority order:
//! 1. Command-line flag (highest priority)
//! 2. Environment variable
//! 3. Compiled default (fallback)

use crate::error::{AppError, Result};
use crate::rotation::RotationSettings;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use tubelens_core::{Language, PlanCatalog};
use tubelens_sdk::HistoryClient;

pub const ENV_API_URL: &str = "TUBELENS_API_URL";
pub const ENV_STORE: &str = "TUBELENS_STORE";
pub const ENV_LANG: &str = "TUBELENS_LANG";
pub const ENV_CATALOG: &str = "TUBELENS_CATALOG";

pub const DEFAULT_API_URL: &str = "https://api.tubelens.app";
pub const DEFAULT_STORE: &str = "tubelens.redb";

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub store: Option<PathBuf>,
    pub lang: Option<String>,
    pub catalog: Option<PathBuf>,
    pub refresh_interval: Option<Duration>,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub store_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub rotation: RotationSettings,
}

impl AppConfig {
    /// Resolve from overrides and the process environment.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve_with(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let pick = |flag: Option<String>, key: &str| {
            flag.or_else(|| {
                let value = env(key);
                if value.is_some() {
                    debug!("{key} taken from environment");
                }
                value
            })
        };

        let api_url = pick(overrides.api_url.clone(), ENV_API_URL)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API URL must start with http:// or https://, got '{}'",
                api_url
            )));
        }

        let store_path = pick(
            overrides.store.as_ref().map(|p| p.display().to_string()),
            ENV_STORE,
        )
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));

        let language = match pick(overrides.lang.clone(), ENV_LANG) {
            Some(raw) => Language::parse(&raw)
                .ok_or_else(|| AppError::Config(format!("unsupported language '{}'", raw)))?,
            None => Language::default(),
        };

        let catalog_path = pick(
            overrides.catalog.as_ref().map(|p| p.display().to_string()),
            ENV_CATALOG,
        )
        .map(PathBuf::from);

        let mut rotation = RotationSettings {
            language,
            ..RotationSettings::default()
        };
        if let Some(interval) = overrides.refresh_interval {
            if interval.is_zero() {
                return Err(AppError::Config(
                    "refresh interval must be greater than zero".to_string(),
                ));
            }
            rotation.refresh_interval = interval;
        }

        Ok(Self {
            api_url,
            store_path,
            catalog_path,
            fetch_timeout: tubelens_sdk::DEFAULT_TIMEOUT,
            rotation,
        })
    }

    pub fn language(&self) -> Language {
        self.rotation.language
    }

    /// Load the plan catalog: the configured JSON file, or the built-in one.
    ///
    /// A non-monotonic catalog is accepted but every violation is logged.
    pub fn load_catalog(&self) -> Result<PlanCatalog> {
        let catalog = match &self.catalog_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                PlanCatalog::from_json(&json)?
            }
            None => PlanCatalog::builtin(),
        };

        for violation in catalog.validate_monotonic() {
            warn!(%violation, "plan catalog is not monotonic");
        }
        Ok(catalog)
    }

    /// Build a history client for the configured backend.
    pub fn history_client(&self, token: Option<String>) -> HistoryClient {
        HistoryClient::new(self.api_url.clone())
            .with_optional_token(token)
            .with_timeout(self.fetch_timeout)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_flags_or_env() {
        let config = AppConfig::resolve_with(&ConfigOverrides::default(), env_of(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.store_path, PathBuf::from(DEFAULT_STORE));
        assert_eq!(config.language(), Language::En);
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.rotation.refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn env_overrides_default() {
        let config = AppConfig::resolve_with(
            &ConfigOverrides::default(),
            env_of(&[(ENV_API_URL, "http://localhost:9000"), (ENV_LANG, "ko-KR")]),
        )
        .unwrap();
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.language(), Language::Ko);
    }

    #[test]
    fn flag_overrides_env() {
        let overrides = ConfigOverrides {
            api_url: Some("https://staging.tubelens.app".to_string()),
            ..ConfigOverrides::default()
        };
        let config = AppConfig::resolve_with(
            &overrides,
            env_of(&[(ENV_API_URL, "http://localhost:9000")]),
        )
        .unwrap();
        assert_eq!(config.api_url, "https://staging.tubelens.app");
    }

    #[test]
    fn rejects_unknown_language() {
        let overrides = ConfigOverrides {
            lang: Some("klingon".to_string()),
            ..ConfigOverrides::default()
        };
        let result = AppConfig::resolve_with(&overrides, env_of(&[]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_non_http_url() {
        let result = AppConfig::resolve_with(
            &ConfigOverrides::default(),
            env_of(&[(ENV_API_URL, "ftp://example.com")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_interval() {
        let overrides = ConfigOverrides {
            refresh_interval: Some(Duration::ZERO),
            ..ConfigOverrides::default()
        };
        assert!(AppConfig::resolve_with(&overrides, env_of(&[])).is_err());
    }

    #[test]
    fn history_client_carries_url_token_and_timeout() {
        let overrides = ConfigOverrides {
            api_url: Some("http://localhost:9000/".to_string()),
            ..ConfigOverrides::default()
        };
        let config = AppConfig::resolve_with(&overrides, env_of(&[])).unwrap();

        let anonymous = config.history_client(None);
        assert!(!anonymous.has_token());
        assert_eq!(anonymous.base_url(), "http://localhost:9000");
        assert_eq!(anonymous.timeout(), tubelens_sdk::DEFAULT_TIMEOUT);

        let signed_in = config.history_client(Some("tok".to_string()));
        assert!(signed_in.has_token());
    }

    #[test]
    fn builtin_catalog_without_path() {
        let config = AppConfig::resolve_with(&ConfigOverrides::default(), env_of(&[])).unwrap();
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog, PlanCatalog::builtin());
    }

    #[test]
    fn missing_catalog_file_is_io_error() {
        let overrides = ConfigOverrides {
            catalog: Some(PathBuf::from("/definitely/not/here.json")),
            ..ConfigOverrides::default()
        };
        let config = AppConfig::resolve_with(&overrides, env_of(&[])).unwrap();
        assert!(matches!(config.load_catalog(), Err(AppError::Io(_))));
    }
}
