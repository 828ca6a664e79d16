//! 권한 집합
//!
//! 통과한 action들의 필드 규칙을 누적한 필드 → 허용 범위 매핑입니다.
//!
//! # 병합 규칙
//!
//! - 추가되지 않은 필드는 아무 값도 허용하지 않음 (default deny)
//! - `Grant::Any`는 이후 병합에 영향을 받지 않음 (단조 확장)
//! - `Grant::Values` 끼리는 합집합
//!
//! 따라서 병합 순서와 무관하게 같은 결과가 나옵니다.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use super::normalize::normalize_value;
use super::rules::FieldRule;

/// 필드 하나에 대한 허용 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// 모든 값 허용
    Any,

    /// 지정된 값만 허용
    Values(BTreeSet<String>),
}

impl Grant {
    /// 다른 grant를 병합 (넓히는 방향으로만)
    fn widen(&mut self, other: &Grant) {
        match other {
            Grant::Any => *self = Grant::Any,
            Grant::Values(theirs) => {
                // Any는 그대로 유지
                if let Grant::Values(mine) = self {
                    mine.extend(theirs.iter().cloned());
                }
            }
        }
    }

    /// 정규화된 값을 허용하는지
    fn permits(&self, normalized: &str) -> bool {
        match self {
            Grant::Any => true,
            Grant::Values(values) => values.contains(normalized),
        }
    }
}

impl Serialize for Grant {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Grant::Any => serializer.serialize_str("*"),
            Grant::Values(values) => values.serialize(serializer),
        }
    }
}

/// 권한 집합
///
/// sanitize 호출마다 새로 만들어지고 결정이 끝나면 버려집니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet {
    grants: BTreeMap<String, Grant>,
}

impl PermissionSet {
    /// 빈 권한 집합 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드 규칙 목록 병합
    pub fn add<'a, I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = &'a FieldRule>,
    {
        for rule in rules {
            match rule {
                FieldRule::Any(field) => self.grant(field, Grant::Any),
                FieldRule::Values { field, values } => {
                    self.grant(field, Grant::Values(values.iter().cloned().collect()))
                }
            }
        }
    }

    /// 다른 권한 집합 병합
    pub fn merge(&mut self, other: &PermissionSet) {
        for (field, grant) in &other.grants {
            self.grant(field, grant.clone());
        }
    }

    fn grant(&mut self, field: &str, grant: Grant) {
        match self.grants.get_mut(field) {
            Some(existing) => existing.widen(&grant),
            None => {
                self.grants.insert(field.to_string(), grant);
            }
        }
    }

    /// 필드에 해당 값을 설정할 수 있는지
    pub fn allows(&self, field: &str, value: &Value) -> bool {
        self.allows_normalized(field, &normalize_value(value))
    }

    /// 이미 정규화된 문자열 값으로 확인
    pub fn allows_normalized(&self, field: &str, value: &str) -> bool {
        self.grants
            .get(field)
            .map(|grant| grant.permits(value))
            .unwrap_or(false)
    }

    /// 필드의 grant 조회
    pub fn get(&self, field: &str) -> Option<&Grant> {
        self.grants.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// 필드 이름 순으로 순회
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Grant)> {
        self.grants.iter().map(|(field, grant)| (field.as_str(), grant))
    }
}

impl<'a> FromIterator<&'a FieldRule> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = &'a FieldRule>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        set.add(iter);
        set
    }
}
