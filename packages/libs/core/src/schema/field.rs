//! 필드 정의
//!
//! 모델의 필드 메타데이터를 정의합니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::FieldType;

/// 필드 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// 필드 이름
    pub name: String,

    /// 필드 타입
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// 새 레코드의 초기값 (없으면 null)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Field {
    /// 새 필드 정의
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    /// 초기값 지정
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// 초기값 (null 포함)
    pub fn initial_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}
