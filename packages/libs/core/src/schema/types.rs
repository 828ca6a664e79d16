//! 논리적 필드 타입 정의
//!
//! 가상 객체(hypothetical object)를 만들 때 후보 값을 필드 타입에 맞게 변환합니다.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// 논리적 필드 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// 문자열
    String,

    /// 64비트 정수
    Int,

    /// 64비트 부동소수점
    Float,

    /// 불리언
    #[serde(alias = "bool")]
    Boolean,

    /// 임의의 JSON
    Json,
}

impl FieldType {
    /// 간단한 타입 문자열에서 파싱
    pub fn from_simple_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(FieldType::String),
            "int" | "integer" => Some(FieldType::Int),
            "float" => Some(FieldType::Float),
            "boolean" | "bool" => Some(FieldType::Boolean),
            "json" => Some(FieldType::Json),
            _ => None,
        }
    }

    /// 타입 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Json => "json",
        }
    }

    /// 값을 이 타입으로 변환
    ///
    /// `null`은 모든 타입에서 허용됩니다.
    pub fn coerce(&self, attribute: &str, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let coerced = match (self, value) {
            (FieldType::Json, v) => Some(v.clone()),

            (FieldType::String, Value::String(s)) => Some(Value::String(s.clone())),
            (FieldType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (FieldType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (FieldType::Int, Value::Number(n)) => n.as_i64().map(Value::from),
            (FieldType::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

            (FieldType::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (FieldType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),

            (FieldType::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (FieldType::Boolean, Value::String(s)) => match s.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (FieldType::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(1) => Some(Value::Bool(true)),
                Some(0) => Some(Value::Bool(false)),
                _ => None,
            },

            _ => None,
        };

        coerced.ok_or_else(|| Error::Coercion {
            attribute: attribute.to_string(),
            expected: self.as_str(),
            value: value.to_string(),
        })
    }
}
