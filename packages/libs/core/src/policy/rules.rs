//! Ability 정책 정의
//!
//! `abilities.yaml`의 구조를 정의합니다.
//!
//! ```yaml
//! roles:
//!   author:
//!     - can: create
//!       model: Article
//!       attributes: { author_id: 42 }
//!   authenticated:
//!     - can: [create, update]
//!       model: Article
//!       condition: "resource.author_id == actor.id"
//!   admin:
//!     - can: manage
//!       model: all
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::ActorContext;
use crate::error::{Error, Result};

/// 모든 action에 매칭되는 action 이름
pub const MANAGE: &str = "manage";

/// 모든 모델에 매칭되는 모델 이름
pub const ALL_MODELS: &str = "all";

/// 전체 ability 정책
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbilityPolicy {
    /// role 요구사항별 규칙 목록
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<CanRule>>,
}

impl AbilityPolicy {
    /// YAML 문자열 파싱
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let policy: AbilityPolicy = serde_yaml::from_str(yaml)?;
        Ok(policy)
    }

    /// 모든 CEL 조건을 미리 컴파일해 문법 오류 확인
    pub fn validate(&self) -> Result<()> {
        for (role, rules) in &self.roles {
            for rule in rules {
                if let Some(condition) = &rule.condition {
                    cel_interpreter::Program::compile(condition).map_err(|e| {
                        Error::PolicyParse {
                            message: format!("role '{}': invalid condition '{}': {}", role, condition, e),
                        }
                    })?;
                }
            }
        }
        Ok(())
    }

    /// actor에게 적용되는 규칙 (role 이름 순)
    pub fn rules_for<'a>(&'a self, actor: &'a ActorContext) -> impl Iterator<Item = &'a CanRule> {
        self.roles
            .iter()
            .filter(move |(role, _)| RoleRequirement::from_str(role).is_satisfied_by(actor))
            .flat_map(|(_, rules)| rules.iter())
    }
}

/// 하나의 "can" 규칙
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanRule {
    /// 허용 action (`manage` = 전체)
    pub can: ActionList,

    /// 대상 모델 (`all` = 전체)
    #[serde(default = "default_model")]
    pub model: String,

    /// 객체 속성 일치 조건 (정규화된 문자열 비교)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,

    /// CEL 조건식
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

fn default_model() -> String {
    ALL_MODELS.to_string()
}

impl CanRule {
    /// action과 모델이 이 규칙의 대상인지
    pub fn applies_to(&self, action: &str, model: &str) -> bool {
        self.can.matches(action) && (self.model == ALL_MODELS || self.model == model)
    }
}

/// action 목록 (단일 문자열 shorthand 허용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionList {
    One(String),
    Many(Vec<String>),
}

impl ActionList {
    /// action이 목록에 포함되는지 (`manage`는 모든 action과 매칭)
    pub fn matches(&self, action: &str) -> bool {
        let hit = |candidate: &String| candidate == action || candidate == MANAGE;
        match self {
            ActionList::One(candidate) => hit(candidate),
            ActionList::Many(candidates) => candidates.iter().any(hit),
        }
    }
}

/// Role 요구사항
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// 모든 actor (익명 포함)
    Public,

    /// ID가 있는 actor
    Authenticated,

    /// 특정 role 필요
    Role(String),
}

impl RoleRequirement {
    /// 문자열에서 파싱
    pub fn from_str(s: &str) -> Self {
        match s {
            "public" => RoleRequirement::Public,
            "authenticated" => RoleRequirement::Authenticated,
            role => RoleRequirement::Role(role.to_string()),
        }
    }

    /// actor가 요구사항을 만족하는지
    pub fn is_satisfied_by(&self, actor: &ActorContext) -> bool {
        match self {
            RoleRequirement::Public => true,
            RoleRequirement::Authenticated => actor.is_authenticated(),
            RoleRequirement::Role(role) => actor.has_role(role),
        }
    }
}
