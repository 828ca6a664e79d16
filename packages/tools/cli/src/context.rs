//! 실행 컨텍스트
//!
//! 명령 실행에 필요한 입력 파일 경로를 결정하고 로드합니다.

use std::path::{Path, PathBuf};

use fk_core::policy::AbilityPolicy;
use fk_core::schema::{SchemaParser, SchemaRegistry};

use crate::config::FkConfig;

/// Effective Context (최종 결정된 입력)
#[derive(Debug, Clone)]
pub struct EffectiveContext {
    pub schema: PathBuf,
    pub policy: Option<PathBuf>,
}

impl EffectiveContext {
    /// 스키마 로드
    pub fn load_registry(&self) -> anyhow::Result<SchemaRegistry> {
        let yaml = read_file(&self.schema)?;
        Ok(SchemaParser::parse_yaml(&yaml)?)
    }

    /// 정책이 지정된 경우에만 로드
    pub fn load_policy(&self) -> anyhow::Result<Option<AbilityPolicy>> {
        let Some(path) = &self.policy else {
            return Ok(None);
        };
        let policy = AbilityPolicy::from_yaml(&read_file(path)?)?;
        policy.validate()?;
        Ok(Some(policy))
    }

    /// 정책 필수 로드
    pub fn require_policy(&self) -> anyhow::Result<AbilityPolicy> {
        self.load_policy()?.ok_or_else(|| {
            anyhow::anyhow!("Policy not specified. Use --policy, FK_POLICY or ~/.fieldkit/config.json")
        })
    }
}

/// 컨텍스트 결정 (CLI 옵션 > 환경변수 > 설정 파일)
pub fn resolve_context(
    schema: Option<PathBuf>,
    policy: Option<PathBuf>,
    config: &FkConfig,
) -> anyhow::Result<EffectiveContext> {
    let schema = schema.or_else(|| config.schema_path()).ok_or_else(|| {
        anyhow::anyhow!("Schema not specified. Use --schema, FK_SCHEMA or ~/.fieldkit/config.json")
    })?;

    Ok(EffectiveContext {
        schema,
        policy: policy.or_else(|| config.policy_path()),
    })
}

pub fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
}
