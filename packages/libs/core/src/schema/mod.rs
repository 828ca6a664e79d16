//! 모델 스키마 descriptor 및 YAML 파싱
//!
//! # 개요
//!
//! 모델 타입은 필드 정의와 규칙 테이블(action → 허용 필드)을 함께 선언합니다.
//! 규칙 테이블은 스키마 descriptor가 소유하며 sanitize 호출에 명시적으로 전달됩니다.
//!
//! # 모듈 구조
//!
//! - `types`: 논리적 필드 타입과 값 변환
//! - `field`: 필드 정의
//! - `model`: 모델 스키마, 빌더, 레지스트리
//! - `parser`: YAML 파싱 로직

mod field;
mod model;
mod parser;
mod types;

pub use field::Field;
pub use model::{ModelSchema, ModelSchemaBuilder, SchemaRegistry};
pub use parser::SchemaParser;
pub use types::FieldType;
