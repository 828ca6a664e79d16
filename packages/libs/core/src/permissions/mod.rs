//! 필드 단위 권한 집계 및 sanitize
//!
//! # 개요
//!
//! 모델의 규칙 테이블(action → 허용 필드)과 actor의 ability oracle을 이용해
//! 후보 변경 중 actor가 설정할 수 있는 부분집합을 계산합니다.
//!
//! # 모듈 구조
//!
//! - `rules`: 규칙 테이블과 필드 규칙
//! - `permission_set`: 통과한 action들의 규칙을 병합한 권한 집합
//! - `ability`: ability oracle 계약
//! - `sanitizer`: sanitize 알고리즘과 시스템 variant
//! - `normalize`: 값 비교용 문자열 정규화

mod ability;
mod normalize;
mod permission_set;
mod rules;
mod sanitizer;

pub use ability::Ability;
pub use normalize::normalize_value;
pub use permission_set::{Grant, PermissionSet};
pub use rules::{ActionRules, FieldRule, RuleTable, RuleTableBuilder};
pub use sanitizer::{AbilitySanitizer, ExecutionContext, Sanitizer};

pub(crate) use rules::RawRuleList;
