use super::{open_engine, parse_assignment, parse_object_reference};
use crate::{
    libs::{
        messages::Message,
        task::{NewTask, WorkbasketLocator},
        view::View,
    },
    msg_error_anyhow, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// Show one task
    Show { id: String },
    /// Create a task in a workbasket
    Create {
        /// Destination workbasket id
        #[arg(long, conflicts_with_all = ["key", "domain"])]
        workbasket: Option<String>,
        /// Destination workbasket key, together with --domain
        #[arg(long, requires = "domain")]
        key: Option<String>,
        #[arg(long, requires = "key")]
        domain: Option<String>,
        /// Classification key, resolved in the workbasket's domain
        #[arg(short, long)]
        classification: String,
        /// Primary object reference as COMPANY/SYSTEM/INSTANCE/TYPE/VALUE
        #[arg(short = 'r', long = "reference")]
        reference: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Custom attribute as KEY=VALUE, repeatable
        #[arg(short, long = "attr")]
        attributes: Vec<String>,
        /// Use this id instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },
    /// Change fields of a task
    Update {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// New classification key
        #[arg(short, long)]
        classification: Option<String>,
        /// Custom attribute as KEY=VALUE, an empty value clears it; repeatable
        #[arg(short, long = "attr")]
        attributes: Vec<String>,
    },
    /// Mark a task as read, or unread with --unread
    Read {
        id: String,
        #[arg(long)]
        unread: bool,
    },
    /// Claim a ready task for yourself
    Claim { id: String },
    /// Complete a task you have claimed
    Complete { id: String },
}

pub fn cmd(args: TaskArgs) -> Result<()> {
    match args.command {
        TaskCommand::Show { id } => handle_show(&id),
        TaskCommand::Create {
            workbasket,
            key,
            domain,
            classification,
            reference,
            name,
            description,
            attributes,
            id,
        } => {
            let locator = match (workbasket, key, domain) {
                (Some(id), _, _) => WorkbasketLocator::Id(id),
                (None, Some(key), Some(domain)) => WorkbasketLocator::KeyDomain { key, domain },
                _ => return Err(msg_error_anyhow!(Message::MissingSelection("--workbasket or --key/--domain".to_string()))),
            };
            let mut new_task = NewTask::new(locator, &classification).with_primary_obj_ref(parse_object_reference(&reference)?);
            new_task.id = id;
            new_task.name = name;
            new_task.description = description;
            for raw in &attributes {
                let (key, value) = parse_assignment(raw)?;
                new_task.custom_attributes.insert(key, value);
            }
            handle_create(new_task)
        }
        TaskCommand::Update {
            id,
            name,
            description,
            classification,
            attributes,
        } => handle_update(&id, name, description, classification, &attributes),
        TaskCommand::Read { id, unread } => {
            let task = open_engine()?.task_service().set_task_read(&id, !unread)?;
            msg_success!(Message::TaskReadFlagSet(task.id, task.is_read));
            Ok(())
        }
        TaskCommand::Claim { id } => {
            let task = open_engine()?.task_service().claim(&id)?;
            msg_success!(Message::TaskClaimed(task.id));
            Ok(())
        }
        TaskCommand::Complete { id } => {
            let task = open_engine()?.task_service().complete(&id)?;
            msg_success!(Message::TaskCompleted(task.id));
            Ok(())
        }
    }
}

fn handle_show(id: &str) -> Result<()> {
    let task = open_engine()?.task_service().get_task(id)?;
    msg_print!(Message::TaskDetailsHeader(task.id.clone()), true);
    View::task(&task);
    Ok(())
}

fn handle_create(new_task: NewTask) -> Result<()> {
    let task = open_engine()?.task_service().create_task(new_task)?;
    msg_success!(Message::TaskCreated(task.id.clone()));
    View::task(&task);
    Ok(())
}

fn handle_update(
    id: &str,
    name: Option<String>,
    description: Option<String>,
    classification: Option<String>,
    attributes: &[String],
) -> Result<()> {
    if name.is_none() && description.is_none() && classification.is_none() && attributes.is_empty() {
        msg_info!(Message::NoChangesRequested);
        return Ok(());
    }

    let engine = open_engine()?;
    let service = engine.task_service();
    let mut task = service.get_task(id)?;
    if name.is_some() {
        task.name = name;
    }
    if description.is_some() {
        task.description = description;
    }
    if let Some(classification) = classification {
        task.classification_key = classification;
    }
    for raw in attributes {
        let (key, value) = parse_assignment(raw)?;
        task.set_custom_attribute(&key, Some(&value))?;
    }

    let task = service.update_task(task)?;
    msg_success!(Message::TaskUpdated(task.id));
    Ok(())
}
