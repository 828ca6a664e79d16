//! 값 정규화
//!
//! 규칙 테이블의 허용 값과 후보 값은 모두 문자열로 정규화한 뒤 비교합니다.

use serde_json::Value;

/// JSON 값을 비교용 문자열로 정규화
///
/// - 문자열: 그대로
/// - 숫자/불리언: `to_string()` 결과 (`42`, `1.5`, `true`)
/// - `null`: 빈 문자열
/// - 배열/객체: compact JSON
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
