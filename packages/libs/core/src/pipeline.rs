//! 변경 적용 파이프라인
//!
//! 레코드에 변경을 기록하기 전에 거치는 단계입니다.
//!
//! 1. 시스템 sanitizer → 필터링 없이 통과 (`FilterPath::System`)
//! 2. 모델에 규칙 테이블이 선언됨 → 활성 sanitizer로 필터링, 없으면 전부 거부 (`FilterPath::Rules`)
//! 3. 그 외 → 기존 화이트리스트 필터 (`FilterPath::Fallback`)
//!
//! sanitizer는 레코드에 저장되지 않고 호출 단위로만 전달됩니다.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::permissions::{Ability, RuleTable, Sanitizer};
use crate::record::{ChangeSet, ModelRecord, Record};
use crate::schema::ModelSchema;

/// 필터링 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPath {
    System,
    Rules,
    Fallback,
}

impl FilterPath {
    /// 문자열 표현
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPath::System => "system",
            FilterPath::Rules => "rules",
            FilterPath::Fallback => "fallback",
        }
    }
}

/// 파이프라인 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    /// 레코드에 기록될 변경
    pub applied: ChangeSet,

    /// 걸러진 필드 이름
    pub rejected: Vec<String>,

    /// 선택된 경로
    pub path: FilterPath,
}

/// 규칙 테이블이 없는 모델에 쓰이는 기존 필터
pub trait LegacyFilter {
    fn filter(&self, changes: &ChangeSet) -> ChangeSet;
}

/// `accessible` 화이트리스트 필터
///
/// 화이트리스트가 없으면 모든 변경을 통과시킵니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessibleFilter<'a> {
    accessible: Option<&'a [String]>,
}

impl<'a> AccessibleFilter<'a> {
    pub fn new(accessible: Option<&'a [String]>) -> Self {
        Self { accessible }
    }

    /// 모델 스키마의 화이트리스트 사용
    pub fn for_schema(schema: &'a ModelSchema) -> Self {
        Self::new(schema.accessible.as_deref())
    }
}

impl LegacyFilter for AccessibleFilter<'_> {
    fn filter(&self, changes: &ChangeSet) -> ChangeSet {
        match self.accessible {
            Some(accessible) => changes.select(|field, _| accessible.iter().any(|a| a == field)),
            None => changes.clone(),
        }
    }
}

/// 변경 적용 파이프라인
pub struct AssignmentPipeline<'a> {
    rules: &'a RuleTable,
    fallback: &'a dyn LegacyFilter,
}

impl<'a> AssignmentPipeline<'a> {
    pub fn new(rules: &'a RuleTable, fallback: &'a dyn LegacyFilter) -> Self {
        Self { rules, fallback }
    }

    /// 적용할 변경 계산 (레코드는 변경하지 않음)
    pub fn prepare<R: Record>(
        &self,
        record: &R,
        sanitizer: Option<&Sanitizer<'_>>,
        changes: &ChangeSet,
    ) -> Result<Assignment> {
        let (applied, path) = match sanitizer {
            Some(sanitizer) if sanitizer.is_system() => (changes.clone(), FilterPath::System),
            _ if self.rules.is_declared() => {
                let applied = match sanitizer {
                    Some(sanitizer) => sanitizer.sanitize(record, changes, self.rules)?,
                    None => ChangeSet::new(),
                };
                (applied, FilterPath::Rules)
            }
            _ => (self.fallback.filter(changes), FilterPath::Fallback),
        };

        let rejected: Vec<String> = changes.missing_from(&applied).map(String::from).collect();
        tracing::debug!(
            model = record.model_name(),
            path = path.as_str(),
            applied = applied.len(),
            rejected = ?rejected,
            "assignment filtered"
        );

        Ok(Assignment {
            applied,
            rejected,
            path,
        })
    }

    /// 변경 계산 후 허용된 부분만 레코드에 기록
    pub fn apply<R: Record>(
        &self,
        record: &mut R,
        sanitizer: Option<&Sanitizer<'_>>,
        changes: &ChangeSet,
    ) -> Result<Assignment> {
        let assignment = self.prepare(record, sanitizer, changes)?;
        record.write_attributes(&assignment.applied)?;
        Ok(assignment)
    }
}

/// 파이프라인을 통해 변경을 받을 수 있는 레코드
pub trait Assignable: Record {
    /// 주어진 sanitizer로 파이프라인 실행 후 기록
    fn assign_with(
        &mut self,
        sanitizer: Option<&Sanitizer<'_>>,
        changes: &ChangeSet,
    ) -> Result<Assignment>;
}

impl Assignable for ModelRecord {
    fn assign_with(
        &mut self,
        sanitizer: Option<&Sanitizer<'_>>,
        changes: &ChangeSet,
    ) -> Result<Assignment> {
        let schema = Arc::clone(self.schema());
        let fallback = AccessibleFilter::for_schema(&schema);
        AssignmentPipeline::new(&schema.rules, &fallback).apply(self, sanitizer, changes)
    }
}

impl ModelRecord {
    /// 파이프라인을 거쳐 새 레코드 생성
    pub fn build(
        schema: Arc<ModelSchema>,
        sanitizer: Option<&Sanitizer<'_>>,
        changes: &ChangeSet,
    ) -> Result<Self> {
        let mut record = ModelRecord::new(schema);
        record.assign_with(sanitizer, changes)?;
        Ok(record)
    }

    /// sanitizer 없이 변경 적용
    ///
    /// 규칙 테이블이 선언된 모델은 모든 변경이 거부됩니다.
    pub fn assign_attributes(&mut self, changes: &ChangeSet) -> Result<Assignment> {
        self.assign_with(None, changes)
    }
}

/// sanitizer가 한 번의 호출 동안만 적용된 레코드
pub struct Guarded<'r, 's, R: Assignable> {
    record: &'r mut R,
    sanitizer: Sanitizer<'s>,
}

impl<'r, 's, R: Assignable> Guarded<'r, 's, R> {
    pub fn new(record: &'r mut R, sanitizer: Sanitizer<'s>) -> Self {
        Self { record, sanitizer }
    }

    /// sanitizer를 적용해 변경 기록
    pub fn assign(&mut self, changes: &ChangeSet) -> Result<Assignment> {
        self.record.assign_with(Some(&self.sanitizer), changes)
    }

    pub fn sanitizer(&self) -> &Sanitizer<'s> {
        &self.sanitizer
    }
}

/// `Guarded` 생성 헬퍼
pub trait GuardExt: Assignable + Sized {
    /// actor ability로 보호
    fn as_actor<'s>(&mut self, ability: &'s dyn Ability) -> Guarded<'_, 's, Self> {
        Guarded::new(self, Sanitizer::for_ability(ability))
    }

    /// 시스템 컨텍스트로 보호 (필터링 없음)
    fn as_system(&mut self) -> Guarded<'_, 'static, Self> {
        Guarded::new(self, Sanitizer::system())
    }
}

impl<R: Assignable> GuardExt for R {}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::error::Error;
    use crate::record::Resource;
    use crate::schema::{FieldType, SchemaParser, SchemaRegistry};

    const SCHEMA: &str = r#"
models:
  Article:
    fields:
      title: string
      author_id: int
      system_flags: int
    accessible: [title]
    abilities:
      create: [title, author_id]
  Comment:
    fields:
      title: string
      body: string
    accessible: [title]
  Note:
    fields:
      body: string
"#;

    fn registry() -> SchemaRegistry {
        SchemaParser::parse_yaml(SCHEMA).unwrap()
    }

    fn changes(value: Value) -> ChangeSet {
        ChangeSet::from_json(value).unwrap()
    }

    fn author(action: &str, object: &dyn Resource) -> Result<bool> {
        Ok(action == "create" && object.attribute("author_id") == Some(&json!(42)))
    }

    #[test]
    fn test_rules_path() {
        let registry = registry();
        let mut article = ModelRecord::new(registry.require("Article").unwrap());

        let assignment = article
            .as_actor(&author)
            .assign(&changes(json!({ "title": "Hi", "author_id": 42, "system_flags": 1 })))
            .unwrap();

        assert_eq!(assignment.path, FilterPath::Rules);
        assert_eq!(assignment.applied, changes(json!({ "title": "Hi", "author_id": 42 })));
        assert_eq!(assignment.rejected, vec!["system_flags".to_string()]);
        assert_eq!(article.get("title"), Some(&json!("Hi")));
        assert_eq!(article.get("system_flags"), Some(&Value::Null));
    }

    #[test]
    fn test_rules_path_ignores_accessible() {
        let registry = registry();
        let mut article = ModelRecord::new(registry.require("Article").unwrap());

        // title은 accessible이지만 규칙 테이블이 우선
        let assignment = article.assign_attributes(&changes(json!({ "title": "Hi" }))).unwrap();

        assert_eq!(assignment.path, FilterPath::Rules);
        assert!(assignment.applied.is_empty());
        assert_eq!(article.get("title"), Some(&Value::Null));
    }

    #[test]
    fn test_fallback_path() {
        let registry = registry();
        let mut comment = ModelRecord::new(registry.require("Comment").unwrap());

        let assignment = comment
            .as_actor(&author)
            .assign(&changes(json!({ "title": "Hi", "body": "text" })))
            .unwrap();

        assert_eq!(assignment.path, FilterPath::Fallback);
        assert_eq!(assignment.applied, changes(json!({ "title": "Hi" })));
        assert_eq!(assignment.rejected, vec!["body".to_string()]);
    }

    #[test]
    fn test_fallback_without_whitelist_keeps_everything() {
        let registry = registry();
        let mut note = ModelRecord::new(registry.require("Note").unwrap());

        let assignment = note.assign_attributes(&changes(json!({ "body": "text" }))).unwrap();

        assert_eq!(assignment.path, FilterPath::Fallback);
        assert_eq!(note.get("body"), Some(&json!("text")));
    }

    #[test]
    fn test_path_logged_without_rejections() {
        use std::io::Write;
        use std::sync::Mutex;

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let registry = registry();
        let mut note = ModelRecord::new(registry.require("Note").unwrap());
        let assignment = tracing::subscriber::with_default(subscriber, || {
            note.assign_attributes(&changes(json!({ "body": "text" }))).unwrap()
        });

        assert!(assignment.rejected.is_empty());
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("assignment filtered"));
        assert!(logs.contains("fallback"));
    }

    #[test]
    fn test_system_path_ignores_rules_and_whitelist() {
        let registry = registry();
        let mut article = ModelRecord::new(registry.require("Article").unwrap());

        let assignment = article
            .as_system()
            .assign(&changes(json!({ "system_flags": 3 })))
            .unwrap();

        assert_eq!(assignment.path, FilterPath::System);
        assert!(assignment.rejected.is_empty());
        assert_eq!(article.get("system_flags"), Some(&json!(3)));

        let mut comment = ModelRecord::new(registry.require("Comment").unwrap());
        comment.as_system().assign(&changes(json!({ "body": "text" }))).unwrap();
        assert_eq!(comment.get("body"), Some(&json!("text")));
    }

    #[test]
    fn test_guarded_assignment_does_not_leak_sanitizer() {
        let registry = registry();
        let mut article = ModelRecord::new(registry.require("Article").unwrap());

        article
            .as_system()
            .assign(&changes(json!({ "title": "First" })))
            .unwrap();
        assert_eq!(article.get("title"), Some(&json!("First")));

        // 이후 보호되지 않은 할당은 sanitizer 없이 실행
        let assignment = article.assign_attributes(&changes(json!({ "title": "Second" }))).unwrap();
        assert!(assignment.applied.is_empty());
        assert_eq!(article.get("title"), Some(&json!("First")));
    }

    #[test]
    fn test_build() {
        let registry = registry();
        let schema = registry.require("Article").unwrap();
        let sanitizer = Sanitizer::for_ability(&author);

        let article = ModelRecord::build(
            Arc::clone(&schema),
            Some(&sanitizer),
            &changes(json!({ "title": "Hi", "author_id": "42" })),
        )
        .unwrap();
        assert_eq!(article.get("author_id"), Some(&json!(42)));

        let rejected = ModelRecord::build(schema, Some(&sanitizer), &changes(json!({ "author_id": 7 }))).unwrap();
        assert_eq!(rejected.get("author_id"), Some(&Value::Null));
    }

    #[test]
    fn test_prepare_leaves_record_untouched() {
        let schema = Arc::new(
            ModelSchema::builder("Post")
                .field("title", FieldType::String)
                .ability("create", ["title"])
                .build()
                .unwrap(),
        );
        let record = ModelRecord::new(Arc::clone(&schema));
        let fallback = AccessibleFilter::for_schema(&schema);
        let pipeline = AssignmentPipeline::new(&schema.rules, &fallback);
        let sanitizer = Sanitizer::for_ability(&author);

        let assignment = pipeline
            .prepare(&record, Some(&sanitizer), &changes(json!({ "title": "x" })))
            .unwrap();

        assert!(assignment.applied.is_empty());
        assert_eq!(record.get("title"), Some(&Value::Null));
    }

    #[test]
    fn test_coercion_error_propagates() {
        let registry = registry();
        let mut article = ModelRecord::new(registry.require("Article").unwrap());

        let result = article
            .as_actor(&author)
            .assign(&changes(json!({ "author_id": "forty-two" })));
        assert!(matches!(result, Err(Error::Coercion { .. })));
    }
}
