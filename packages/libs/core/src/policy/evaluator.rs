//! 정책 기반 ability 평가기
//!
//! `AbilityPolicy`와 actor를 묶어 `Ability` oracle로 사용합니다.

use std::collections::HashMap;
use std::sync::Arc;

use cel_interpreter::objects::{Key, Map as CelMap, Value as CelValue};
use cel_interpreter::{Context, Program};
use serde_json::Value;

use super::context::ActorContext;
use super::rules::{AbilityPolicy, CanRule};
use crate::error::{Error, Result};
use crate::permissions::{normalize_value, Ability};
use crate::record::Resource;

/// 정책 기반 ability
///
/// actor에게 적용되는 규칙 중 하나라도 매칭되면 허용합니다 (기본 거부).
///
/// 규칙 매칭 조건:
/// - role 요구사항 충족
/// - action 일치 (`manage`는 모든 action)
/// - 모델 일치 (`all`은 모든 모델)
/// - `attributes`의 모든 값이 객체 속성과 정규화 후 일치
/// - `condition`이 true로 평가
pub struct PolicyAbility<'a> {
    policy: &'a AbilityPolicy,
    actor: ActorContext,
}

impl<'a> PolicyAbility<'a> {
    /// 새 평가기 생성
    pub fn new(policy: &'a AbilityPolicy, actor: ActorContext) -> Self {
        Self { policy, actor }
    }

    /// 평가 대상 actor
    pub fn actor(&self) -> &ActorContext {
        &self.actor
    }

    fn rule_matches(&self, rule: &CanRule, object: &dyn Resource) -> Result<bool> {
        let attributes_match = rule.attributes.iter().all(|(name, expected)| {
            object.attribute(name).map(normalize_value).unwrap_or_default() == normalize_value(expected)
        });
        if !attributes_match {
            return Ok(false);
        }

        match &rule.condition {
            Some(condition) => eval_cel_bool(condition, &self.actor, object),
            None => Ok(true),
        }
    }
}

impl Ability for PolicyAbility<'_> {
    fn can(&self, action: &str, object: &dyn Resource) -> Result<bool> {
        let model = object.model_name();
        for rule in self.policy.rules_for(&self.actor) {
            if !rule.applies_to(action, model) {
                continue;
            }
            if self.rule_matches(rule, object)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

fn eval_cel_bool(condition: &str, actor: &ActorContext, object: &dyn Resource) -> Result<bool> {
    let mut cel_ctx = Context::default();
    for (name, value) in actor.to_cel_variables(object) {
        cel_ctx.add_variable_from_value(name, json_to_cel(value));
    }

    let program = Program::compile(condition).map_err(|e| Error::CelExpression {
        message: e.to_string(),
    })?;

    let result = program.execute(&cel_ctx).map_err(|e| Error::CelExpression {
        message: e.to_string(),
    })?;

    match result {
        CelValue::Bool(b) => Ok(b),
        _ => Err(Error::CelExpression {
            message: format!("condition '{}' did not evaluate to bool", condition),
        }),
    }
}

fn json_to_cel(value: Value) -> CelValue {
    match value {
        Value::Null => CelValue::Null,
        Value::Bool(b) => CelValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CelValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                CelValue::UInt(u)
            } else if let Some(f) = n.as_f64() {
                CelValue::Float(f)
            } else {
                CelValue::Null
            }
        }
        Value::String(s) => CelValue::String(s.into()),
        Value::Array(arr) => {
            let values = arr.into_iter().map(json_to_cel).collect::<Vec<_>>();
            CelValue::List(Arc::new(values))
        }
        Value::Object(map) => {
            let mut obj = HashMap::new();
            for (k, v) in map {
                obj.insert(Key::from(k), json_to_cel(v));
            }
            CelValue::Map(CelMap { map: Arc::new(obj) })
        }
    }
}
