//! fk-core: 필드 단위 권한 엔진
//!
//! 레코드 변경 요청에서 actor가 실제로 설정할 수 있는 필드만 남기는 핵심 로직을 제공합니다.
//! 권한은 필드 이름뿐 아니라 필드 값에도 걸 수 있고, action 검사는 변경이 적용된
//! 가상 객체에 대해 수행됩니다.
//!
//! # 모듈 구조
//!
//! - `schema`: 모델 스키마(YAML) 파싱과 필드 타입
//! - `permissions`: 규칙 테이블, 권한 집합, sanitizer
//! - `policy`: YAML/CEL 기반 ability oracle
//! - `record`: 레코드 계약과 변경 집합
//! - `pipeline`: 변경 적용 전 필터링 단계
//! - `error`: 공통 에러 타입

pub mod error;
pub mod permissions;
pub mod pipeline;
pub mod policy;
pub mod record;
pub mod schema;

pub use error::{Error, Result};
