//! `RuntimeConfig`: loaded via `serde_yaml` from an optional file, then
//! overridden by environment variables (SPEC_FULL §4.11).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub pool: PoolConfig,
    pub health: HealthConfig,
    pub timeouts: TimeoutConfig,
    pub trace: TraceConfig,
    pub profiles_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
    #[serde(default)]
    pub sensitive_keys: Vec<String>,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default = "default_max_retained_sessions")]
    pub max_retained_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_contexts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub max_failures: u32,
}

/// Mirrors `TimeoutTier`'s three named tiers. Not currently threaded into
/// the action engine (its tiers are fixed per spec §4.4); kept here so an
/// operator can see and validate the values a deployment expects before a
/// future pass wires per-deployment overrides through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub short_ms: u64,
    pub medium_ms: u64,
    pub long_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    pub per_session_cap: usize,
    pub global_sample_cap: usize,
}

fn default_max_retained_sessions() -> usize {
    100
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig { max_contexts: 10 },
            health: HealthConfig {
                interval_ms: 30_000,
                timeout_ms: 5_000,
                max_failures: 3,
            },
            timeouts: TimeoutConfig {
                short_ms: 5_000,
                medium_ms: 15_000,
                long_ms: 45_000,
            },
            trace: TraceConfig {
                per_session_cap: 2_000,
                global_sample_cap: 5_000,
            },
            profiles_dir: PathBuf::from("./data/profiles"),
            artifacts_dir: PathBuf::from("./data/artifacts"),
            store_path: PathBuf::from("./data/store"),
            log_dir: PathBuf::from("./data/logs"),
            sensitive_keys: Vec::new(),
            auto_approve: false,
            max_retained_sessions: default_max_retained_sessions(),
        }
    }
}

impl RuntimeConfig {
    pub async fn load(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                serde_yaml::from_str(&content)?
            }
            None => {
                // Priority: ./config/browser-runtime.yaml > ~/.config/browser-runtime/config.yaml
                let local_path = PathBuf::from("config/browser-runtime.yaml");
                let candidate = if local_path.exists() {
                    Some(local_path)
                } else {
                    dirs::config_dir().map(|mut dir| {
                        dir.push("browser-runtime");
                        dir.push("config.yaml");
                        dir
                    })
                };
                match candidate.filter(|p| p.exists()) {
                    Some(path) => {
                        let content = tokio::fs::read_to_string(&path).await?;
                        serde_yaml::from_str(&content)?
                    }
                    None => RuntimeConfig::default(),
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("BROWSER_AUTO_APPROVE") {
            self.auto_approve = value == "1";
        }
        if let Ok(value) = env::var("BROWSER_PROFILES_DIR") {
            self.profiles_dir = PathBuf::from(value);
        }
        if let Ok(value) = env::var("BROWSER_ARTIFACTS_DIR") {
            self.artifacts_dir = PathBuf::from(value);
        }
        if let Ok(value) = env::var("BROWSER_STORE_PATH") {
            self.store_path = PathBuf::from(value);
        }
        if let Ok(value) = env::var("BROWSER_LOG_DIR") {
            self.log_dir = PathBuf::from(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_config_file_falls_back_to_defaults() {
        let config = RuntimeConfig::load(None).await.unwrap();
        assert_eq!(config.pool.max_contexts, 10);
    }

    #[tokio::test]
    async fn env_overrides_win_over_defaults() {
        env::set_var("BROWSER_AUTO_APPROVE", "1");
        env::set_var("BROWSER_PROFILES_DIR", "/tmp/profiles-override");
        let config = RuntimeConfig::load(None).await.unwrap();
        assert!(config.auto_approve);
        assert_eq!(config.profiles_dir, PathBuf::from("/tmp/profiles-override"));
        env::remove_var("BROWSER_AUTO_APPROVE");
        env::remove_var("BROWSER_PROFILES_DIR");
    }
}
