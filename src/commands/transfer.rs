use super::open_engine;
use crate::{
    libs::{messages::Message, task::WorkbasketLocator},
    msg_error_anyhow, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct TransferArgs {
    /// Task to move
    task_id: String,
    /// Destination workbasket id
    #[arg(long, conflicts_with_all = ["key", "domain"])]
    workbasket: Option<String>,
    /// Destination workbasket key, together with --domain
    #[arg(long, requires = "domain")]
    key: Option<String>,
    #[arg(long, requires = "key")]
    domain: Option<String>,
}

pub fn cmd(args: TransferArgs) -> Result<()> {
    let destination = match (args.workbasket, args.key, args.domain) {
        (Some(id), _, _) => WorkbasketLocator::Id(id),
        (None, Some(key), Some(domain)) => WorkbasketLocator::KeyDomain { key, domain },
        _ => return Err(msg_error_anyhow!(Message::MissingSelection("--workbasket or --key/--domain".to_string()))),
    };

    let task = open_engine()?.transferrer().transfer_to(&args.task_id, &destination)?;
    msg_success!(Message::TaskTransferred {
        task_id: task.id,
        workbasket: task.workbasket.key,
    });
    Ok(())
}
