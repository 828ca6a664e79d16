//! Ability oracle 계약
//!
//! "이 actor가 이 객체 상태에 대해 action을 수행할 수 있는가"를 답하는 외부 구성 요소입니다.
//! 엔진은 규칙 언어를 알지 못하며 `can` 결과만 사용합니다.

use crate::error::Result;
use crate::record::Resource;

/// Ability oracle
///
/// 구현체는 엔진에 대해 부수 효과가 없어야 합니다. 평가 중 발생한 에러는
/// 거부로 바꾸지 말고 그대로 반환해야 합니다. 엔진은 에러를 삼키지 않습니다.
pub trait Ability {
    /// `object` 상태에 대해 `action`을 수행할 수 있는지
    fn can(&self, action: &str, object: &dyn Resource) -> Result<bool>;
}

impl<F> Ability for F
where
    F: Fn(&str, &dyn Resource) -> Result<bool>,
{
    fn can(&self, action: &str, object: &dyn Resource) -> Result<bool> {
        self(action, object)
    }
}
