//! `fk grants`

use fk_core::permissions::{AbilitySanitizer, Grant};
use fk_core::policy::PolicyAbility;

use super::input;
use crate::context::EffectiveContext;
use crate::{ActorArgs, OutputFormat, TargetArgs};

pub fn run(
    ctx: &EffectiveContext,
    target: &TargetArgs,
    actor: &ActorArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let registry = ctx.load_registry()?;
    let schema = registry.require(&target.model)?;
    let record = input::load_record(schema.clone(), target.record.as_deref())?;
    let changes = input::read_change_set(&target.changes)?;

    let policy = ctx.require_policy()?;
    let ability = PolicyAbility::new(&policy, input::build_actor(actor)?);
    let permissions =
        AbilitySanitizer::new(Some(&ability)).authorized_fields(&record, &changes, &schema.rules)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&permissions)?),
        OutputFormat::Text => {
            if !schema.rules.is_declared() {
                println!("{} declares no rule table; assignments use the fallback path", schema.name);
            }
            if permissions.is_empty() {
                println!("No fields granted");
            }
            for (field, grant) in permissions.iter() {
                println!("{}: {}", field, describe_grant(grant));
            }
        }
    }

    Ok(())
}

fn describe_grant(grant: &Grant) -> String {
    match grant {
        Grant::Any => "*".to_string(),
        Grant::Values(values) => values.iter().cloned().collect::<Vec<_>>().join(", "),
    }
}
