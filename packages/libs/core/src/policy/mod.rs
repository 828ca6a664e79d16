//! 정책 기반 ability oracle
//!
//! YAML로 선언한 role별 "can" 규칙을 `Ability`로 평가합니다.
//! 조건식은 CEL로 작성하며 `actor`와 `resource` 변수를 사용할 수 있습니다.

mod context;
mod evaluator;
mod rules;

pub use context::ActorContext;
pub use evaluator::PolicyAbility;
pub use rules::{AbilityPolicy, ActionList, CanRule, RoleRequirement, ALL_MODELS, MANAGE};
