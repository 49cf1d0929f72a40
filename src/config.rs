use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const BACKEND_URL_VAR: &str = "LETMEKNOCK_BACKEND_URL";
pub const ANON_KEY_VAR: &str = "LETMEKNOCK_ANON_KEY";
pub const DATA_DIR_VAR: &str = "LETMEKNOCK_DATA_DIR";
pub const TIMEOUT_VAR: &str = "LETMEKNOCK_TIMEOUT_SECS";

const DEFAULT_DATA_DIR: &str = ".letmeknock";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted backend
    pub backend_url: Option<String>,
    /// Public (anonymous) API key of the hosted backend
    pub anon_key: Option<String>,
    /// Directory holding client-local documents
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            anon_key: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Load from process environment (and `.env`, when present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match non_empty(TIMEOUT_VAR) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid {}={}", TIMEOUT_VAR, raw);
                DEFAULT_TIMEOUT_SECS
            }),
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            backend_url: non_empty(BACKEND_URL_VAR),
            anon_key: non_empty(ANON_KEY_VAR),
            data_dir: non_empty(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            request_timeout: Duration::from_secs(timeout_secs),
        };

        if !config.is_backend_configured() {
            warn!(
                "Missing hosted backend settings ({} and {}); running on static data",
                BACKEND_URL_VAR, ANON_KEY_VAR
            );
        }

        config
    }

    pub fn is_backend_configured(&self) -> bool {
        self.backend_url.is_some() && self.anon_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_key_means_unconfigured() {
        let config = AppConfig::from_lookup(lookup(&[(BACKEND_URL_VAR, "https://x.test")]));
        assert!(!config.is_backend_configured());
        assert_eq!(config.data_dir, PathBuf::from(".letmeknock"));
    }

    #[test]
    fn reads_all_settings() {
        let config = AppConfig::from_lookup(lookup(&[
            (BACKEND_URL_VAR, "https://x.test"),
            (ANON_KEY_VAR, "anon"),
            (DATA_DIR_VAR, "/tmp/knock"),
            (TIMEOUT_VAR, "5"),
        ]));
        assert!(config.is_backend_configured());
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/knock"));
    }

    #[test]
    fn bad_timeout_falls_back_to_default() {
        let config = AppConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")]));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_env_tolerates_missing_dotenv_file() {
        let config = AppConfig::from_env();
        assert!(!config.data_dir.as_os_str().is_empty());
        assert!(config.request_timeout > Duration::ZERO);
    }
}
