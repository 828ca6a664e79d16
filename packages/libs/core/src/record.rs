//! 레코드 추상화
//!
//! 엔진이 레코드에 요구하는 최소한의 계약과, 스키마 기반 기본 구현을 제공합니다.
//!
//! - `Resource`: ability 검사 대상 (모델 이름 + 속성 읽기)
//! - `Record`: 가상 객체 생성과 필터링된 변경 적용
//! - `ModelRecord`: `ModelSchema`를 따르는 JSON 속성 레코드

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::ModelSchema;

/// 속성 맵 (필드 이름 → 값)
pub type Attributes = BTreeMap<String, Value>;

/// ability 검사 대상
pub trait Resource {
    /// 모델 타입 이름
    fn model_name(&self) -> &str;

    /// 현재 속성 전체
    fn attributes(&self) -> &Attributes;

    /// 단일 속성
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes().get(name)
    }
}

/// 엔진이 다루는 레코드
pub trait Record: Resource + Sized {
    /// 현재 값 위에 후보 변경을 덮어쓴 가상 객체 생성
    ///
    /// 원본은 변경하지 않습니다. 알 수 없는 속성이나 타입 변환 실패는 에러입니다.
    fn overlay(&self, changes: &ChangeSet) -> Result<Self>;

    /// 이미 필터링된 변경을 실제 레코드에 기록
    ///
    /// 권한 검사를 하지 않습니다. `pipeline::AssignmentPipeline`을 거친 결과만 전달해야 합니다.
    fn write_attributes(&mut self, changes: &ChangeSet) -> Result<()>;
}

/// 후보 변경 집합 (필드 이름 → 제안 값)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: BTreeMap<String, Value>,
}

impl ChangeSet {
    /// 빈 변경 집합
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON 객체에서 생성
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(Error::SchemaParse {
                message: format!("change set must be a JSON object, got {}", other),
            }),
        }
    }

    /// 변경 추가
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.changes.insert(field.into(), value.into());
    }

    /// builder 스타일 추가
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.changes.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// 필드 이름 순으로 순회
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.changes.iter().map(|(field, value)| (field.as_str(), value))
    }

    /// 필드 이름 목록
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(|k| k.as_str())
    }

    /// 조건을 만족하는 변경만 남긴 새 집합 (원본은 그대로)
    pub fn select<F>(&self, mut keep: F) -> ChangeSet
    where
        F: FnMut(&str, &Value) -> bool,
    {
        self.changes
            .iter()
            .filter(|(field, value)| keep(field.as_str(), value))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// `other`에 없는 필드 이름
    pub fn missing_from<'a>(&'a self, other: &'a ChangeSet) -> impl Iterator<Item = &'a str> {
        self.fields().filter(move |field| !other.contains(field))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ChangeSet {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self {
            changes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// 스키마 기반 레코드
///
/// 선언된 모든 필드를 항상 가지고 있으며 (미설정 = 초기값 또는 null),
/// 값은 필드 타입으로 변환되어 저장됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    schema: Arc<ModelSchema>,
    attributes: Attributes,
}

impl ModelRecord {
    /// 초기값으로 채워진 새 레코드
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        let attributes = schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.initial_value()))
            .collect();
        Self { schema, attributes }
    }

    /// 저장된 속성으로 레코드 복원 (권한 검사 없음)
    pub fn load(schema: Arc<ModelSchema>, stored: &ChangeSet) -> Result<Self> {
        let mut record = Self::new(schema);
        record.write_attributes(stored)?;
        Ok(record)
    }

    /// 스키마
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// 속성 값
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn coerce_into(&self, attributes: &mut Attributes, changes: &ChangeSet) -> Result<()> {
        for (name, value) in changes.iter() {
            let field = self.schema.field(name).ok_or_else(|| Error::UnknownAttribute {
                model: self.schema.name.clone(),
                attribute: name.to_string(),
            })?;
            attributes.insert(name.to_string(), field.field_type.coerce(name, value)?);
        }
        Ok(())
    }
}

impl Resource for ModelRecord {
    fn model_name(&self) -> &str {
        &self.schema.name
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Record for ModelRecord {
    fn overlay(&self, changes: &ChangeSet) -> Result<Self> {
        let mut attributes = self.attributes.clone();
        self.coerce_into(&mut attributes, changes)?;
        Ok(Self {
            schema: Arc::clone(&self.schema),
            attributes,
        })
    }

    fn write_attributes(&mut self, changes: &ChangeSet) -> Result<()> {
        // 변환이 모두 성공해야 반영
        let mut attributes = self.attributes.clone();
        self.coerce_into(&mut attributes, changes)?;
        self.attributes = attributes;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;
    use serde_json::json;

    fn article() -> Arc<ModelSchema> {
        Arc::new(
            ModelSchema::builder("Article")
                .field("title", FieldType::String)
                .field("author_id", FieldType::Int)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_new_record_materializes_all_fields() {
        let record = ModelRecord::new(article());
        assert_eq!(record.get("title"), Some(&Value::Null));
        assert_eq!(record.get("author_id"), Some(&Value::Null));
        assert_eq!(record.model_name(), "Article");
    }

    #[test]
    fn test_overlay_leaves_original_untouched() {
        let record = ModelRecord::load(article(), &ChangeSet::new().with("title", "Old")).unwrap();
        let changes = ChangeSet::new().with("author_id", "42");

        let hypothetical = record.overlay(&changes).unwrap();

        assert_eq!(hypothetical.get("author_id"), Some(&json!(42)));
        assert_eq!(hypothetical.get("title"), Some(&json!("Old")));
        assert_eq!(record.get("author_id"), Some(&Value::Null));
    }

    #[test]
    fn test_overlay_unknown_attribute() {
        let record = ModelRecord::new(article());
        let err = record
            .overlay(&ChangeSet::new().with("body", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));
    }

    #[test]
    fn test_write_is_all_or_nothing() {
        let mut record = ModelRecord::new(article());
        let changes = ChangeSet::new().with("title", "T").with("author_id", "abc");

        assert!(record.write_attributes(&changes).is_err());
        assert_eq!(record.get("title"), Some(&Value::Null));
    }

    #[test]
    fn test_change_set_from_json() {
        let changes = ChangeSet::from_json(json!({ "title": "T", "author_id": 42 })).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.get("author_id"), Some(&json!(42)));
        assert!(ChangeSet::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_change_set_select() {
        let changes = ChangeSet::new().with("a", 1).with("b", 2);
        let kept = changes.select(|field, _| field == "b");

        assert_eq!(kept, ChangeSet::new().with("b", 2));
        assert_eq!(changes.missing_from(&kept).collect::<Vec<_>>(), vec!["a"]);
    }
}
