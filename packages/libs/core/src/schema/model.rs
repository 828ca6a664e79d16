//! 모델 스키마
//!
//! 모델 타입의 필드 정의와 규칙 테이블을 소유하는 descriptor 입니다.
//! 등록이 끝나면 `Arc`로 고정되어 여러 sanitize 호출이 동시에 읽습니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::field::Field;
use super::types::FieldType;
use crate::error::{Error, Result};
use crate::permissions::{FieldRule, RuleTable, RuleTableBuilder};

/// 모델 스키마
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSchema {
    /// 모델 이름
    pub name: String,

    /// 필드 정의 (선언 순서)
    pub fields: Vec<Field>,

    /// legacy 화이트리스트 (규칙 테이블이 없을 때만 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessible: Option<Vec<String>>,

    /// action → 필드 규칙
    pub rules: RuleTable,
}

impl ModelSchema {
    /// 빌더 생성
    pub fn builder(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            accessible: None,
            rules: RuleTable::builder(),
        }
    }

    /// 필드 조회
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 필드 존재 여부
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// 모든 필드 이름
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// 규칙 테이블
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }
}

/// 모델 스키마 빌더
///
/// 규칙 등록은 additive 입니다. `build()` 이후에는 변경할 수 없습니다.
#[derive(Debug)]
pub struct ModelSchemaBuilder {
    name: String,
    fields: Vec<Field>,
    accessible: Option<Vec<String>>,
    rules: RuleTableBuilder,
}

impl ModelSchemaBuilder {
    /// 필드 추가
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(Field::new(name, field_type));
        self
    }

    /// 필드 정의 추가
    pub fn field_def(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// legacy 화이트리스트 지정
    pub fn accessible<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accessible = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// action 규칙 등록
    pub fn ability<I, R>(mut self, action: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<FieldRule>,
    {
        self.rules = self.rules.register(action, rules);
        self
    }

    pub(crate) fn ability_rules(mut self, action: String, rules: Vec<FieldRule>) -> Self {
        self.rules.push(action, rules);
        self
    }

    /// 검증 후 스키마 확정
    ///
    /// - 필드 이름 중복 금지
    /// - 규칙과 화이트리스트는 선언된 필드만 참조
    pub fn build(self) -> Result<ModelSchema> {
        let schema = ModelSchema {
            name: self.name,
            fields: self.fields,
            accessible: self.accessible,
            rules: self.rules.build(),
        };

        let mut seen = std::collections::HashSet::new();
        for field in &schema.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::SchemaValidation {
                    message: format!("model '{}' declares field '{}' twice", schema.name, field.name),
                });
            }
        }

        for (action, rules) in schema.rules.actions() {
            for rule in rules {
                if !schema.has_field(rule.field()) {
                    return Err(Error::SchemaValidation {
                        message: format!(
                            "model '{}' ability '{}' references undeclared field '{}'",
                            schema.name,
                            action,
                            rule.field()
                        ),
                    });
                }
            }
        }

        if let Some(accessible) = &schema.accessible {
            if let Some(missing) = accessible.iter().find(|f| !schema.has_field(f)) {
                return Err(Error::SchemaValidation {
                    message: format!(
                        "model '{}' accessible list references undeclared field '{}'",
                        schema.name, missing
                    ),
                });
            }
        }

        Ok(schema)
    }
}

/// 모델 스키마 레지스트리
///
/// 파싱이 끝나면 고정되며 이후 읽기 전용입니다.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: BTreeMap<String, Arc<ModelSchema>>,
}

impl SchemaRegistry {
    /// 빈 레지스트리
    pub fn new() -> Self {
        Self::default()
    }

    /// 모델 추가
    pub fn insert(&mut self, model: ModelSchema) -> Result<()> {
        if self.models.contains_key(&model.name) {
            return Err(Error::DuplicateModel { name: model.name });
        }
        self.models.insert(model.name.clone(), Arc::new(model));
        Ok(())
    }

    /// 모델 조회
    pub fn get(&self, name: &str) -> Option<Arc<ModelSchema>> {
        self.models.get(name).cloned()
    }

    /// 모델 조회 (없으면 에러)
    pub fn require(&self, name: &str) -> Result<Arc<ModelSchema>> {
        self.get(name).ok_or_else(|| Error::UnknownModel {
            name: name.to_string(),
        })
    }

    /// 모든 모델 (이름 순)
    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelSchema>> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_validates_rule_fields() {
        let err = ModelSchema::builder("Article")
            .field("title", FieldType::String)
            .ability("create", ["title", "author_id"])
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::SchemaValidation { .. }));
    }

    #[test]
    fn test_field_names_keep_declaration_order() {
        let schema = ModelSchema::builder("Article")
            .field("title", FieldType::String)
            .field("author_id", FieldType::Int)
            .build()
            .unwrap();

        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["title", "author_id"]);
    }

    #[test]
    fn test_builder_rejects_duplicate_field() {
        let err = ModelSchema::builder("Article")
            .field("title", FieldType::String)
            .field("title", FieldType::String)
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::SchemaValidation { .. }));
    }

    #[test]
    fn test_registry_rejects_duplicate_model() {
        let mut registry = SchemaRegistry::new();
        registry
            .insert(ModelSchema::builder("Tag").build().unwrap())
            .unwrap();
        let err = registry
            .insert(ModelSchema::builder("Tag").build().unwrap())
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateModel { .. }));
        assert!(matches!(registry.require("Post"), Err(Error::UnknownModel { .. })));
    }
}
