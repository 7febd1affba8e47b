use crate::error::{AutoSafeError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const ENDPOINT_ENV: &str = "AUTOSAFE_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub timeout_seconds: u64,
    /// プレビュー一時ファイルの親ディレクトリ（省略時はOSの一時ディレクトリ）
    pub preview_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_seconds: 60,
            preview_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AutoSafeError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("autosafe").join("config.json"))
    }

    /// 接続先を解決（CLI引数 > 環境変数 > 設定ファイル）
    pub fn resolve_endpoint(&self, cli_endpoint: Option<&str>) -> Result<String> {
        let raw = match cli_endpoint {
            Some(e) => e.to_string(),
            None => std::env::var(ENDPOINT_ENV)
                .ok()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| self.endpoint.clone()),
        };

        let endpoint = raw.trim().trim_end_matches('/').to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AutoSafeError::Config(format!(
                "エンドポイントは http:// または https:// で始めてください: {}",
                raw
            )));
        }
        Ok(endpoint)
    }

    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        // 保存前に形式だけ検証
        self.resolve_endpoint(Some(&endpoint))?;
        self.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        self.save()
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_seconds, 60);
        assert!(config.preview_dir.is_none());
    }

    #[test]
    fn test_resolve_endpoint_cli_wins() {
        let config = Config::default();
        let endpoint = config.resolve_endpoint(Some("http://10.0.0.5:9000/")).unwrap();
        assert_eq!(endpoint, "http://10.0.0.5:9000");
    }

    #[test]
    fn test_resolve_endpoint_rejects_scheme() {
        let config = Config::default();
        let result = config.resolve_endpoint(Some("localhost:8000"));
        assert!(matches!(result, Err(AutoSafeError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            endpoint: "https://autosafe.example".into(),
            timeout_seconds: 15,
            preview_dir: None,
        };
        config.save_to(&path).expect("設定保存失敗");

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.endpoint, "https://autosafe.example");
        assert_eq!(loaded.timeout_seconds, 15);
    }

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempdir().expect("Failed to create temp dir");
        let loaded = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_load_partial_fills_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"timeout_seconds": 5}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(loaded.timeout_seconds, 5);
    }
}
