//! CLI 설정

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// CLI 설정 (`~/.fieldkit/config.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FkConfig {
    /// 기본 스키마 경로
    pub schema: Option<PathBuf>,

    /// 기본 ability 정책 경로
    pub policy: Option<PathBuf>,
}

impl FkConfig {
    /// 설정 파일 경로
    fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;
        Ok(home.join(".fieldkit").join("config.json"))
    }

    /// 설정 로드
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: FkConfig = serde_json::from_str(&content)?;
            tracing::debug!(path = %path.display(), "config loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// 스키마 경로 결정 (환경변수 > 설정 파일)
    pub fn schema_path(&self) -> Option<PathBuf> {
        std::env::var("FK_SCHEMA")
            .ok()
            .map(PathBuf::from)
            .or_else(|| self.schema.clone())
    }

    /// 정책 경로 결정 (환경변수 > 설정 파일)
    pub fn policy_path(&self) -> Option<PathBuf> {
        std::env::var("FK_POLICY")
            .ok()
            .map(PathBuf::from)
            .or_else(|| self.policy.clone())
    }
}
