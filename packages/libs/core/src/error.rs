//! 공통 에러 타입
//!
//! Fieldkit 전체에서 사용되는 에러 타입을 정의합니다.
//!
//! 권한 거부는 에러가 아닙니다. 거부는 항상 평가 결과(빈 변경 집합)로 표현되고,
//! 여기에 정의된 에러는 호출자에게 그대로 전파됩니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Fieldkit 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("schema parse error: {message}")]
    SchemaParse { message: String },

    #[error("schema validation error: {message}")]
    SchemaValidation { message: String },

    #[error("duplicate model name: {name}")]
    DuplicateModel { name: String },

    #[error("invalid field type: {type_name}")]
    InvalidFieldType { type_name: String },

    #[error("unknown model: {name}")]
    UnknownModel { name: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Rule Table / Policy Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("rule table parse error: {message}")]
    RuleTableParse { message: String },

    #[error("policy parse error: {message}")]
    PolicyParse { message: String },

    #[error("CEL expression error: {message}")]
    CelExpression { message: String },

    #[error("ability check failed for action '{action}': {message}")]
    Oracle { action: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Record Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("unknown attribute '{attribute}' for model '{model}'")]
    UnknownAttribute { model: String, attribute: String },

    #[error("cannot coerce {value} into {expected} for attribute '{attribute}'")]
    Coercion {
        attribute: String,
        expected: &'static str,
        value: String,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // IO/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 에러 코드 (CLI 출력용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::SchemaParse { .. } => "SCHEMA_PARSE_ERROR",
            Error::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
            Error::DuplicateModel { .. } => "DUPLICATE_MODEL",
            Error::InvalidFieldType { .. } => "INVALID_FIELD_TYPE",
            Error::UnknownModel { .. } => "UNKNOWN_MODEL",
            Error::RuleTableParse { .. } => "RULE_TABLE_PARSE_ERROR",
            Error::PolicyParse { .. } => "POLICY_PARSE_ERROR",
            Error::CelExpression { .. } => "CEL_EXPRESSION_ERROR",
            Error::Oracle { .. } => "ORACLE_FAILURE",
            Error::UnknownAttribute { .. } => "UNKNOWN_ATTRIBUTE",
            Error::Coercion { .. } => "COERCION_ERROR",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
