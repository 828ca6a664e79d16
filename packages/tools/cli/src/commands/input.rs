//! 명령 입력 로드
//!
//! 레코드, 변경 집합, actor 인자를 엔진 타입으로 변환합니다.

use std::path::Path;
use std::sync::Arc;

use fk_core::policy::ActorContext;
use fk_core::record::{ChangeSet, ModelRecord};
use fk_core::schema::ModelSchema;
use serde_json::Value;

use crate::context::read_file;
use crate::ActorArgs;

/// JSON 객체 파일을 변경 집합으로 읽기
pub fn read_change_set(path: &Path) -> anyhow::Result<ChangeSet> {
    let value: Value = serde_json::from_str(&read_file(path)?)?;
    Ok(ChangeSet::from_json(value)?)
}

/// 현재 레코드 로드 (파일이 없으면 새 레코드)
pub fn load_record(schema: Arc<ModelSchema>, path: Option<&Path>) -> anyhow::Result<ModelRecord> {
    match path {
        Some(path) => Ok(ModelRecord::load(schema, &read_change_set(path)?)?),
        None => Ok(ModelRecord::new(schema)),
    }
}

/// actor 인자 → `ActorContext`
pub fn build_actor(args: &ActorArgs) -> anyhow::Result<ActorContext> {
    let mut actor = ActorContext::anonymous();
    actor.id = args.actor_id.as_deref().map(parse_scalar);
    actor.roles = args.roles.clone();

    for pair in &args.attributes {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --attr '{}'. Expected key=value", pair))?;
        actor = actor.with_attribute(name, parse_scalar(value));
    }

    Ok(actor)
}

/// JSON으로 파싱되면 그 값, 아니면 문자열
fn parse_scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar("42"), json!(42));
        assert_eq!(parse_scalar("true"), json!(true));
        assert_eq!(parse_scalar("user_123"), json!("user_123"));
        assert_eq!(parse_scalar("\"42\""), json!("42"));
    }

    #[test]
    fn test_build_actor() {
        let args = ActorArgs {
            actor_id: Some("42".to_string()),
            roles: vec!["author".to_string()],
            attributes: vec!["team=red".to_string()],
        };

        let actor = build_actor(&args).unwrap();
        assert_eq!(actor.id, Some(json!(42)));
        assert!(actor.has_role("author"));
        assert_eq!(actor.attributes.get("team"), Some(&json!("red")));
    }

    #[test]
    fn test_build_actor_rejects_bad_attr() {
        let args = ActorArgs {
            actor_id: None,
            roles: vec![],
            attributes: vec!["team".to_string()],
        };

        assert!(build_actor(&args).is_err());
    }
}
