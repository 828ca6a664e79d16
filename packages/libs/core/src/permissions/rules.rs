//! 규칙 테이블 정의
//!
//! 모델 타입이 선언하는 action → 필드 규칙 목록입니다.
//! 스키마 등록 시점에 한 번 만들어지고 이후에는 읽기 전용으로 사용됩니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::normalize_value;
use crate::error::{Error, Result};

/// 필드 규칙 (규칙 목록의 한 항목)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// 필드에 어떤 값이든 허용
    Any(String),

    /// 지정된 값만 허용 (정규화된 문자열)
    Values { field: String, values: Vec<String> },
}

impl FieldRule {
    /// 모든 값을 허용하는 규칙
    pub fn any(field: impl Into<String>) -> Self {
        FieldRule::Any(field.into())
    }

    /// 값이 제한된 규칙
    ///
    /// 값은 저장 전에 문자열로 정규화됩니다. (`1` → `"1"`)
    pub fn values<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        FieldRule::Values {
            field: field.into(),
            values: values
                .into_iter()
                .map(|v| normalize_value(&v.into()))
                .collect(),
        }
    }

    /// 규칙이 적용되는 필드 이름
    pub fn field(&self) -> &str {
        match self {
            FieldRule::Any(field) => field,
            FieldRule::Values { field, .. } => field,
        }
    }
}

impl From<&str> for FieldRule {
    fn from(field: &str) -> Self {
        FieldRule::any(field)
    }
}

impl From<String> for FieldRule {
    fn from(field: String) -> Self {
        FieldRule::Any(field)
    }
}

impl Serialize for FieldRule {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            FieldRule::Any(field) => serializer.serialize_str(field),
            FieldRule::Values { field, values } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(field, values)?;
                map.end()
            }
        }
    }
}

/// 하나의 action에 선언된 필드 규칙 목록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRules {
    pub action: String,
    pub rules: Vec<FieldRule>,
}

/// 규칙 테이블
///
/// 선언 순서를 유지하는 action → 필드 규칙 목록 매핑입니다.
/// 빌더로만 만들 수 있고, 만들어진 뒤에는 변경할 수 없습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    actions: Vec<ActionRules>,
}

impl RuleTable {
    /// 빌더 생성
    pub fn builder() -> RuleTableBuilder {
        RuleTableBuilder::default()
    }

    /// 선언된 action이 하나라도 있는지
    ///
    /// `false`이면 호출자는 legacy 필터로 fallback 해야 합니다.
    /// "규칙 없음"과 "모두 거부"를 구분하는 유일한 신호입니다.
    pub fn is_declared(&self) -> bool {
        !self.actions.is_empty()
    }

    /// 선언된 action 수
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// 선언 순서대로 (action, 규칙 목록) 순회
    pub fn actions(&self) -> impl Iterator<Item = (&str, &[FieldRule])> {
        self.actions
            .iter()
            .map(|entry| (entry.action.as_str(), entry.rules.as_slice()))
    }

    /// 특정 action의 규칙 목록
    pub fn get(&self, action: &str) -> Option<&[FieldRule]> {
        self.actions
            .iter()
            .find(|entry| entry.action == action)
            .map(|entry| entry.rules.as_slice())
    }
}

/// 규칙 테이블 빌더
///
/// 같은 action을 다시 등록하면 기존 목록 뒤에 이어 붙입니다.
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    actions: Vec<ActionRules>,
}

impl RuleTableBuilder {
    /// action 규칙 등록 (additive)
    pub fn register<I, R>(mut self, action: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<FieldRule>,
    {
        self.push(action.into(), rules.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn push(&mut self, action: String, rules: Vec<FieldRule>) {
        match self.actions.iter_mut().find(|entry| entry.action == action) {
            Some(entry) => entry.rules.extend(rules),
            None => self.actions.push(ActionRules { action, rules }),
        }
    }

    /// 테이블 확정
    pub fn build(self) -> RuleTable {
        RuleTable {
            actions: self.actions,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// YAML 표현
// ─────────────────────────────────────────────────────────────────────────────

/// YAML에 작성된 규칙 목록 (검증 전)
///
/// 다음 형태를 모두 받습니다.
///
/// ```yaml
/// create: [title, author_id]                    # 목록
/// review: [review, { status: [approved] }]      # 필드 + 값 제한 혼합
/// publish: { status: published }                # 단일 map shorthand
/// archive: archived_at                          # 단일 필드 shorthand
/// ```
#[derive(Debug, Clone)]
pub(crate) struct RawRuleList {
    entries: Vec<RawRuleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRuleEntry {
    Field(String),
    Scoped(BTreeMap<String, RawValues>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawValues {
    Many(Vec<Value>),
    One(Value),
}

impl<'de> Deserialize<'de> for RawRuleList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct RawRuleListVisitor;

        impl<'de> Visitor<'de> for RawRuleListVisitor {
            type Value = RawRuleList;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a sequence of field rules, a field name or a field → values map")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = seq.next_element::<RawRuleEntry>()? {
                    entries.push(entry);
                }
                Ok(RawRuleList { entries })
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
            where
                E: de::Error,
            {
                // Shorthand: 단일 필드
                Ok(RawRuleList {
                    entries: vec![RawRuleEntry::Field(value.to_string())],
                })
            }

            fn visit_map<M>(self, map: M) -> std::result::Result<Self::Value, M::Error>
            where
                M: de::MapAccess<'de>,
            {
                // Shorthand: 단일 map → 값 제한 규칙들
                let scoped = BTreeMap::<String, RawValues>::deserialize(
                    de::value::MapAccessDeserializer::new(map),
                )?;
                Ok(RawRuleList {
                    entries: vec![RawRuleEntry::Scoped(scoped)],
                })
            }
        }

        deserializer.deserialize_any(RawRuleListVisitor)
    }
}

impl RawRuleList {
    /// 검증 후 필드 규칙 목록으로 변환
    pub(crate) fn into_rules(self, action: &str) -> Result<Vec<FieldRule>> {
        let mut rules = Vec::new();

        for entry in self.entries {
            match entry {
                RawRuleEntry::Field(field) => rules.push(FieldRule::Any(field)),
                RawRuleEntry::Scoped(scoped) => {
                    if scoped.is_empty() {
                        return Err(Error::RuleTableParse {
                            message: format!("action '{}': empty field map in rule list", action),
                        });
                    }
                    for (field, values) in scoped {
                        let values = match values {
                            RawValues::Many(values) => values,
                            // `field: ~`는 빈 값 집합
                            RawValues::One(Value::Null) => Vec::new(),
                            RawValues::One(value) => vec![value],
                        };
                        if values.is_empty() {
                            return Err(Error::RuleTableParse {
                                message: format!(
                                    "action '{}': field '{}' declares an empty value set",
                                    action, field
                                ),
                            });
                        }
                        if let Some(bad) = values
                            .iter()
                            .find(|v| v.is_null() || v.is_array() || v.is_object())
                        {
                            return Err(Error::RuleTableParse {
                                message: format!(
                                    "action '{}': field '{}' value {} is not a non-null scalar",
                                    action, field, bad
                                ),
                            });
                        }
                        rules.push(FieldRule::values(field, values));
                    }
                }
            }
        }

        Ok(rules)
    }
}
