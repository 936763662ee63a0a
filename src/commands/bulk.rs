use super::{open_engine, parse_assignment, parse_object_reference};
use crate::{
    libs::{bulk::CustomAttributeChanges, messages::Message},
    msg_error_anyhow, msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct BulkArgs {
    /// Task ids to update, repeatable
    #[arg(long = "id", conflicts_with = "reference")]
    ids: Vec<String>,
    /// Update every task with this primary object reference (COMPANY/SYSTEM/INSTANCE/TYPE/VALUE)
    #[arg(short = 'r', long)]
    reference: Option<String>,
    /// Custom attribute as KEY=VALUE, repeatable
    #[arg(short, long = "set")]
    set: Vec<String>,
    /// Custom attribute key to clear, repeatable
    #[arg(short, long = "clear")]
    clear: Vec<String>,
}

pub fn cmd(args: BulkArgs) -> Result<()> {
    let mut changes = CustomAttributeChanges::new();
    for raw in &args.set {
        let (key, value) = parse_assignment(raw)?;
        changes.insert(key, Some(value));
    }
    for key in &args.clear {
        changes.insert(key.clone(), None);
    }
    if changes.is_empty() {
        msg_info!(Message::NoChangesRequested);
        return Ok(());
    }

    let engine = open_engine()?;
    let coordinator = engine.bulk_updates();
    let (requested, updated) = match args.reference {
        Some(raw) => {
            let reference = parse_object_reference(&raw)?;
            let updated = coordinator.update_tasks_by_object_reference(&reference, &changes)?;
            (None, updated)
        }
        None if !args.ids.is_empty() => (Some(args.ids.clone()), coordinator.update_tasks_by_id(&args.ids, &changes)?),
        None => return Err(msg_error_anyhow!(Message::MissingSelection("--id or --reference".to_string()))),
    };

    if let Some(requested) = &requested {
        let skipped: Vec<String> = requested.iter().filter(|id| !updated.contains(id)).cloned().collect();
        if !skipped.is_empty() {
            msg_warning!(Message::BulkUpdateSkipped(skipped));
        }
    } else if updated.is_empty() {
        msg_info!(Message::BulkUpdateNoCandidates);
        return Ok(());
    }

    msg_success!(Message::BulkUpdateFinished {
        requested: requested.map(|ids| ids.len()).unwrap_or(updated.len()),
        updated: updated.len(),
    });
    Ok(())
}
