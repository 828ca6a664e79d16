//! Actor 컨텍스트
//!
//! ability 평가에 필요한 actor 정보와 CEL 변수 변환을 제공합니다.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Resource;

/// Actor 컨텍스트
///
/// # CEL에서 사용 가능한 변수
///
/// - `actor.id`: actor ID (없으면 null)
/// - `actor.roles`: role 목록
/// - `actor.<name>`: 추가 속성
/// - `resource.<field>`: 평가 대상 객체의 속성 (가상 객체 포함)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorContext {
    /// actor ID
    #[serde(default)]
    pub id: Option<Value>,

    /// role 목록
    #[serde(default)]
    pub roles: Vec<String>,

    /// 추가 속성
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl ActorContext {
    /// 새 actor
    pub fn new(id: impl Into<Value>, roles: Vec<String>) -> Self {
        Self {
            id: Some(id.into()),
            roles,
            attributes: HashMap::new(),
        }
    }

    /// 익명 actor
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// role 추가
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// 속성 추가
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// 특정 role을 가지고 있는지 확인
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 식별된 actor인지 확인
    pub fn is_authenticated(&self) -> bool {
        matches!(&self.id, Some(id) if !id.is_null())
    }

    /// CEL 평가를 위한 Map으로 변환
    pub fn to_cel_variables(&self, resource: &dyn Resource) -> HashMap<String, Value> {
        let mut vars = HashMap::new();

        // actor
        let mut actor_obj = serde_json::Map::new();
        for (name, value) in &self.attributes {
            actor_obj.insert(name.clone(), value.clone());
        }
        actor_obj.insert("id".to_string(), self.id.clone().unwrap_or(Value::Null));
        actor_obj.insert(
            "roles".to_string(),
            Value::Array(self.roles.iter().map(|r| Value::String(r.clone())).collect()),
        );
        vars.insert("actor".to_string(), Value::Object(actor_obj));

        // resource
        let resource_obj = resource
            .attributes()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<serde_json::Map<_, _>>();
        vars.insert("resource".to_string(), Value::Object(resource_obj));

        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Attributes;
    use serde_json::json;

    struct Fixture(Attributes);

    impl Resource for Fixture {
        fn model_name(&self) -> &str {
            "Fixture"
        }

        fn attributes(&self) -> &Attributes {
            &self.0
        }
    }

    #[test]
    fn test_has_role() {
        let actor = ActorContext::new("user_123", vec!["admin".to_string()]).with_role("writer");

        assert!(actor.has_role("admin"));
        assert!(actor.has_role("writer"));
        assert!(!actor.has_role("reader"));
    }

    #[test]
    fn test_is_authenticated() {
        assert!(ActorContext::new(42, vec![]).is_authenticated());
        assert!(!ActorContext::anonymous().is_authenticated());
        assert!(!ActorContext::new(Value::Null, vec![]).is_authenticated());
    }

    #[test]
    fn test_to_cel_variables() {
        let actor = ActorContext::new(42, vec!["author".to_string()]).with_attribute("team", "red");
        let resource = Fixture(Attributes::from([("author_id".to_string(), json!(42))]));

        let vars = actor.to_cel_variables(&resource);

        let actor_var = vars.get("actor").unwrap();
        assert_eq!(actor_var.get("id").unwrap(), &json!(42));
        assert_eq!(actor_var.get("team").unwrap(), "red");
        assert_eq!(actor_var.get("roles").unwrap(), &json!(["author"]));
        assert_eq!(vars.get("resource").unwrap(), &json!({ "author_id": 42 }));
    }
}
