//! `fk check`

use fk_core::permissions::FieldRule;
use fk_core::pipeline::FilterPath;
use fk_core::schema::ModelSchema;

use crate::context::EffectiveContext;
use crate::OutputFormat;

pub fn run(ctx: &EffectiveContext, format: OutputFormat) -> anyhow::Result<()> {
    let registry = ctx.load_registry()?;
    let policy = ctx.load_policy()?;

    match format {
        OutputFormat::Json => {
            let models = registry
                .models()
                .map(|model| {
                    serde_json::json!({
                        "model": model.name,
                        "fields": model.field_names().collect::<Vec<_>>(),
                        "path": path_for(model),
                        "rules": model.rules,
                        "accessible": model.accessible,
                    })
                })
                .collect::<Vec<_>>();
            let out = serde_json::json!({
                "models": models,
                "policy_roles": policy.as_ref().map(|p| p.roles.keys().collect::<Vec<_>>()),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("Schema: {} ({} models)", ctx.schema.display(), registry.len());
            for model in registry.models() {
                println!("- {} [{}]", model.name, path_for(model).as_str());
                println!("  fields: {}", model.field_names().collect::<Vec<_>>().join(", "));
                for (action, rules) in model.rules.actions() {
                    let fields = rules.iter().map(describe_rule).collect::<Vec<_>>();
                    println!("  - {}: {}", action, fields.join(", "));
                }
                if !model.rules.is_declared() {
                    if let Some(accessible) = &model.accessible {
                        println!("  - accessible: {}", accessible.join(", "));
                    }
                }
            }
            match (&ctx.policy, &policy) {
                (Some(path), Some(policy)) => {
                    println!("Policy: {} ({} roles)", path.display(), policy.roles.len())
                }
                _ => println!("Policy: not configured"),
            }
        }
    }

    Ok(())
}

/// 기본 파이프라인이 선택할 경로 (시스템 실행 제외)
fn path_for(model: &ModelSchema) -> FilterPath {
    if model.rules.is_declared() {
        FilterPath::Rules
    } else {
        FilterPath::Fallback
    }
}

pub(crate) fn describe_rule(rule: &FieldRule) -> String {
    match rule {
        FieldRule::Any(field) => field.clone(),
        FieldRule::Values { field, values } => format!("{} in [{}]", field, values.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_rule() {
        assert_eq!(describe_rule(&FieldRule::any("title")), "title");
        assert_eq!(
            describe_rule(&FieldRule::values("status", ["approved", "rejected"])),
            "status in [approved, rejected]"
        );
    }
}
