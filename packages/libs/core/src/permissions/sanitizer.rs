//! Sanitizer
//!
//! 후보 변경 집합에서 actor가 실제로 설정할 수 있는 필드만 남깁니다.
//!
//! # 알고리즘
//!
//! 1. 후보가 비었거나 ability가 없으면 빈 결과 (oracle 호출 없음)
//! 2. 현재 레코드에 후보 값을 덮어쓴 가상 객체 생성
//! 3. 규칙 테이블의 모든 action에 대해 `can(action, 가상 객체)`를 정확히 한 번씩 확인
//! 4. 통과한 action의 필드 규칙을 새 `PermissionSet`에 병합
//! 5. 후보 값(가상 객체의 값이 아님)으로 `allows` 확인 후 필터링
//!
//! 가상 객체로 평가하기 때문에 "소유자 필드와 본문을 함께 변경"하는 요청은
//! 변경 후 상태가 action 조건을 만족할 때만 허용됩니다.

use std::fmt;

use super::ability::Ability;
use super::permission_set::PermissionSet;
use super::rules::RuleTable;
use crate::error::Result;
use crate::record::{ChangeSet, Record, Resource};

/// 실행 컨텍스트
///
/// 요청 처리 계층이 현재 주체를 표현하는 방법입니다.
#[derive(Clone, Copy)]
pub enum ExecutionContext<'a> {
    /// ability를 가진 actor
    Actor(&'a dyn Ability),

    /// ability 없음 (모든 변경 거부)
    Anonymous,

    /// 신뢰된 시스템 실행 (필터링 없음)
    System,
}

/// Sanitizer
///
/// `System`은 규칙을 평가하지 않는 별도 variant 입니다. 호출자는 `is_system()`으로
/// 규칙 평가 없이 이 경로를 구분할 수 있습니다.
#[derive(Clone, Copy)]
pub enum Sanitizer<'a> {
    /// ability 기반 필터링
    Ability(AbilitySanitizer<'a>),

    /// 무제한 (시스템 컨텍스트)
    System,
}

impl<'a> Sanitizer<'a> {
    /// 실행 컨텍스트에 맞는 sanitizer 선택
    pub fn for_context(context: ExecutionContext<'a>) -> Self {
        match context {
            ExecutionContext::Actor(ability) => Sanitizer::Ability(AbilitySanitizer::new(Some(ability))),
            ExecutionContext::Anonymous => Sanitizer::Ability(AbilitySanitizer::new(None)),
            ExecutionContext::System => Sanitizer::System,
        }
    }

    /// actor ability로 생성
    pub fn for_ability(ability: &'a dyn Ability) -> Self {
        Self::for_context(ExecutionContext::Actor(ability))
    }

    /// 시스템 sanitizer
    pub fn system() -> Self {
        Sanitizer::System
    }

    /// 시스템 variant 여부
    pub fn is_system(&self) -> bool {
        matches!(self, Sanitizer::System)
    }

    /// 허용된 변경만 반환
    ///
    /// 결과는 항상 `changes`의 부분집합이며 남은 키의 값은 동일합니다.
    pub fn sanitize<R: Record>(
        &self,
        record: &R,
        changes: &ChangeSet,
        rules: &RuleTable,
    ) -> Result<ChangeSet> {
        match self {
            Sanitizer::Ability(sanitizer) => sanitizer.sanitize(record, changes, rules),
            Sanitizer::System => {
                tracing::debug!(
                    model = record.model_name(),
                    fields = changes.len(),
                    "system sanitizer: changes pass unfiltered"
                );
                Ok(changes.clone())
            }
        }
    }
}

impl fmt::Debug for Sanitizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sanitizer::Ability(sanitizer) => f.debug_tuple("Ability").field(sanitizer).finish(),
            Sanitizer::System => f.write_str("System"),
        }
    }
}

/// ability 기반 sanitizer
#[derive(Clone, Copy)]
pub struct AbilitySanitizer<'a> {
    ability: Option<&'a dyn Ability>,
}

impl<'a> AbilitySanitizer<'a> {
    /// 새 sanitizer 생성 (ability가 없으면 모든 변경 거부)
    pub fn new(ability: Option<&'a dyn Ability>) -> Self {
        Self { ability }
    }

    /// 허용된 변경만 반환
    pub fn sanitize<R: Record>(
        &self,
        record: &R,
        changes: &ChangeSet,
        rules: &RuleTable,
    ) -> Result<ChangeSet> {
        if changes.is_empty() {
            return Ok(ChangeSet::new());
        }
        let Some(ability) = self.ability else {
            tracing::debug!(
                model = record.model_name(),
                fields = changes.len(),
                "no ability supplied: rejecting all changes"
            );
            return Ok(ChangeSet::new());
        };

        let permissions = {
            let hypothetical = record.overlay(changes)?;
            grants_for(ability, &hypothetical, rules)?
        };

        let allowed = changes.select(|field, value| permissions.allows(field, value));

        tracing::debug!(
            model = record.model_name(),
            candidates = changes.len(),
            allowed = allowed.len(),
            "sanitized change set"
        );
        Ok(allowed)
    }

    /// 후보 변경에 대한 집계 권한
    ///
    /// `sanitize`와 같은 가상 객체로 평가합니다. ability가 없거나 후보가 비었으면 빈 집합입니다.
    pub fn authorized_fields<R: Record>(
        &self,
        record: &R,
        changes: &ChangeSet,
        rules: &RuleTable,
    ) -> Result<PermissionSet> {
        match self.ability {
            Some(ability) if !changes.is_empty() => {
                let hypothetical = record.overlay(changes)?;
                grants_for(ability, &hypothetical, rules)
            }
            _ => Ok(PermissionSet::new()),
        }
    }
}

impl fmt::Debug for AbilitySanitizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilitySanitizer")
            .field("has_ability", &self.ability.is_some())
            .finish()
    }
}

/// 통과한 action들의 필드 규칙을 병합
///
/// 모든 action을 정확히 한 번씩 확인합니다. oracle 에러는 그대로 전파됩니다.
fn grants_for(
    ability: &dyn Ability,
    object: &dyn Resource,
    rules: &RuleTable,
) -> Result<PermissionSet> {
    let mut permissions = PermissionSet::new();

    for (action, field_rules) in rules.actions() {
        let granted = ability.can(action, object)?;
        tracing::trace!(model = object.model_name(), action, granted, "ability check");
        if granted {
            permissions.add(field_rules);
        }
    }

    Ok(permissions)
}


#[cfg(test)]
mod proptests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use serde_json::Value;

    use super::*;
    use crate::permissions::FieldRule;
    use crate::record::ModelRecord;
    use crate::schema::{FieldType, ModelSchema};

    fn schema() -> Arc<ModelSchema> {
        Arc::new(
            ModelSchema::builder("Doc")
                .field("a", FieldType::String)
                .field("b", FieldType::String)
                .field("c", FieldType::String)
                .ability("edit", [FieldRule::any("a"), FieldRule::values("b", ["x", "y"])])
                .ability("tag", [FieldRule::values("c", ["x"])])
                .build()
                .unwrap(),
        )
    }

    fn arb_changes() -> impl Strategy<Value = ChangeSet> {
        let field = prop::sample::select(vec!["a", "b", "c"]);
        let value = prop::sample::select(vec!["x", "y", "z"]);
        prop::collection::btree_map(field, value, 0..4).prop_map(|m| {
            m.into_iter()
                .map(|(k, v)| (k, Value::String(v.to_string())))
                .collect::<ChangeSet>()
        })
    }

    proptest! {
        #[test]
        fn sanitize_result_is_subset(candidate in arb_changes(), grant_edit in any::<bool>(), grant_tag in any::<bool>()) {
            let oracle = move |action: &str, _: &dyn Resource| -> Result<bool> {
                Ok((action == "edit" && grant_edit) || (action == "tag" && grant_tag))
            };
            let record = ModelRecord::new(schema());
            let result = Sanitizer::for_ability(&oracle)
                .sanitize(&record, &candidate, record.schema().rules())
                .unwrap();

            for (field, value) in result.iter() {
                prop_assert_eq!(candidate.get(field), Some(value));
            }
            prop_assert!(result.len() <= candidate.len());
        }
    }
}
