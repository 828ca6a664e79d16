//! `fk sanitize`

use fk_core::permissions::{Ability, ExecutionContext, Sanitizer};
use fk_core::pipeline::{AccessibleFilter, Assignment, AssignmentPipeline};
use fk_core::policy::PolicyAbility;

use super::input;
use crate::context::EffectiveContext;
use crate::{ActorArgs, OutputFormat, TargetArgs};

pub fn run(
    ctx: &EffectiveContext,
    target: &TargetArgs,
    actor: &ActorArgs,
    system: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let registry = ctx.load_registry()?;
    let schema = registry.require(&target.model)?;
    let record = input::load_record(schema.clone(), target.record.as_deref())?;
    let changes = input::read_change_set(&target.changes)?;

    let fallback = AccessibleFilter::for_schema(&schema);
    let pipeline = AssignmentPipeline::new(&schema.rules, &fallback);

    // 시스템 실행이 아니면 정책이 있을 때만 ability 구성
    let policy = if system { None } else { ctx.load_policy()? };
    let ability = match &policy {
        Some(policy) => Some(PolicyAbility::new(policy, input::build_actor(actor)?)),
        None => None,
    };
    let sanitizer = select_sanitizer(system, ability.as_ref().map(|a| a as &dyn Ability));

    let assignment = pipeline.prepare(&record, Some(&sanitizer), &changes)?;

    tracing::info!(
        model = %schema.name,
        path = assignment.path.as_str(),
        applied = assignment.applied.len(),
        rejected = assignment.rejected.len(),
        "change set sanitized"
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&assignment)?),
        OutputFormat::Text => print_text(&schema.name, &assignment),
    }

    Ok(())
}

/// 실행 컨텍스트 선택 (정책이 없으면 ability 없이 실행)
fn select_sanitizer<'a>(system: bool, ability: Option<&'a dyn Ability>) -> Sanitizer<'a> {
    let context = match (system, ability) {
        (true, _) => ExecutionContext::System,
        (false, Some(ability)) => ExecutionContext::Actor(ability),
        (false, None) => {
            tracing::info!("no policy configured: sanitizing without an ability");
            ExecutionContext::Anonymous
        }
    };
    Sanitizer::for_context(context)
}

fn print_text(model: &str, assignment: &Assignment) {
    println!("Model: {} (path: {})", model, assignment.path.as_str());

    println!("Allowed:");
    if assignment.applied.is_empty() {
        println!("  (none)");
    }
    for (field, value) in assignment.applied.iter() {
        println!("  {} = {}", field, value);
    }

    println!("Rejected:");
    if assignment.rejected.is_empty() {
        println!("  (none)");
    }
    for field in &assignment.rejected {
        println!("  {}", field);
    }
}
