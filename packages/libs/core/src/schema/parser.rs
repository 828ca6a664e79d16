//! 스키마 YAML 파서
//!
//! `models.yaml` 형식의 문서를 파싱하여 `SchemaRegistry`로 변환합니다.
//!
//! ```yaml
//! models:
//!   Article:
//!     fields:
//!       title: string
//!       author_id: int
//!       status: { type: string, default: draft }
//!     accessible: [title]
//!     abilities:
//!       create: [title, author_id]
//!       review: [{ status: [approved, rejected] }]
//! ```

use serde::Deserialize;
use serde_json::Value;

use super::field::Field;
use super::model::{ModelSchema, SchemaRegistry};
use super::types::FieldType;
use crate::error::{Error, Result};
use crate::permissions::RawRuleList;

/// 스키마 파서
pub struct SchemaParser;

impl SchemaParser {
    /// 단일 YAML 문자열 파싱
    pub fn parse_yaml(yaml: &str) -> Result<SchemaRegistry> {
        Self::parse_multiple(&[yaml])
    }

    /// 여러 YAML 문서를 하나의 레지스트리로 파싱
    ///
    /// 모델 이름은 문서 전체에서 유일해야 합니다.
    pub fn parse_multiple(yamls: &[&str]) -> Result<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();

        for yaml in yamls {
            for model in Self::parse_models(yaml)? {
                registry.insert(model)?;
            }
        }

        tracing::debug!(models = registry.len(), "schema registry loaded");
        Ok(registry)
    }

    fn parse_models(yaml: &str) -> Result<Vec<ModelSchema>> {
        let raw: RawSchema = serde_yaml::from_str(yaml)?;

        let mut models = Vec::new();
        for (name, model) in raw.models {
            let name = mapping_key(&name, "model name")?;
            let model: RawModel = serde_yaml::from_value(model)?;
            models.push(Self::convert_model(name, model)?);
        }
        Ok(models)
    }

    fn convert_model(name: String, raw: RawModel) -> Result<ModelSchema> {
        let mut builder = ModelSchema::builder(name.clone());

        for (field_name, raw_field) in raw.fields {
            let field_name = mapping_key(&field_name, "field name")?;
            let raw_field: RawField = serde_yaml::from_value(raw_field)?;
            builder = builder.field_def(raw_field.into_field(field_name)?);
        }

        if let Some(accessible) = raw.accessible {
            builder = builder.accessible(accessible);
        }

        for (action, raw_rules) in raw.abilities {
            let action = mapping_key(&action, "action name")?;
            let rules: RawRuleList =
                serde_yaml::from_value(raw_rules).map_err(|e| Error::RuleTableParse {
                    message: format!("model '{}' action '{}': {}", name, action, e),
                })?;
            let rules = rules.into_rules(&action)?;
            builder = builder.ability_rules(action, rules);
        }

        builder.build()
    }
}

fn mapping_key(key: &serde_yaml::Value, what: &str) -> Result<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        other => Err(Error::SchemaParse {
            message: format!("{} must be a string, got {:?}", what, other),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw YAML 구조
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    models: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default)]
    fields: serde_yaml::Mapping,

    #[serde(default)]
    accessible: Option<Vec<String>>,

    /// 선언 순서 유지를 위해 Mapping 사용
    #[serde(default)]
    abilities: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawField {
    Simple(String),
    Full {
        #[serde(rename = "type")]
        field_type: String,
        #[serde(default)]
        default: Option<Value>,
    },
}

impl RawField {
    fn into_field(self, name: String) -> Result<Field> {
        let (type_name, default) = match self {
            RawField::Simple(type_name) => (type_name, None),
            RawField::Full {
                field_type,
                default,
            } => (field_type, default),
        };

        let field_type = FieldType::from_simple_str(&type_name).ok_or(Error::InvalidFieldType {
            type_name,
        })?;

        let field = Field::new(name, field_type);
        match default {
            Some(default) => {
                let default = field_type.coerce(&field.name, &default)?;
                Ok(field.with_default(default))
            }
            None => Ok(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::FieldRule;

    const ARTICLE: &str = r#"
models:
  Article:
    fields:
      title: string
      author_id: int
      review: string
      status: { type: string, default: draft }
      system_flags: int
    abilities:
      create: [title, author_id]
      review: [review, { status: [approved, rejected] }]
  Comment:
    fields:
      title: string
      system_flags: int
    accessible: [title]
"#;

    #[test]
    fn test_parse_models() {
        let registry = SchemaParser::parse_yaml(ARTICLE).unwrap();
        assert_eq!(registry.len(), 2);

        let article = registry.require("Article").unwrap();
        assert_eq!(article.fields.len(), 5);
        assert_eq!(article.field("status").unwrap().initial_value(), "draft");

        let actions: Vec<_> = article.rules().actions().map(|(a, _)| a).collect();
        assert_eq!(actions, vec!["create", "review"]);
        assert_eq!(
            article.rules().get("review").unwrap(),
            &[
                FieldRule::any("review"),
                FieldRule::values("status", ["approved", "rejected"])
            ]
        );

        let comment = registry.require("Comment").unwrap();
        assert!(!comment.rules().is_declared());
        assert_eq!(comment.accessible.as_deref(), Some(&["title".to_string()][..]));
    }

    #[test]
    fn test_unknown_field_type() {
        let yaml = r#"
models:
  Post:
    fields:
      title: varchar
"#;
        let err = SchemaParser::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldType { .. }));
    }

    #[test]
    fn test_ability_on_undeclared_field() {
        let yaml = r#"
models:
  Post:
    fields:
      title: string
    abilities:
      create: [title, body]
"#;
        let err = SchemaParser::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::SchemaValidation { .. }));
    }

    #[test]
    fn test_empty_value_set_rejected() {
        let yaml = r#"
models:
  Post:
    fields:
      status: string
    abilities:
      review: [{ status: [] }]
"#;
        let err = SchemaParser::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::RuleTableParse { .. }));
    }

    #[test]
    fn test_null_value_set_rejected() {
        let yaml = r#"
models:
  Post:
    fields:
      status: string
    abilities:
      review: [{ status: ~ }]
"#;
        let err = SchemaParser::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, Error::RuleTableParse { .. }));
    }

    #[test]
    fn test_duplicate_model_across_documents() {
        let yaml = r#"
models:
  Post:
    fields:
      title: string
"#;
        let err = SchemaParser::parse_multiple(&[yaml, yaml]).unwrap_err();
        assert!(matches!(err, Error::DuplicateModel { .. }));
    }
}
