use super::open_engine;
use crate::{
    libs::{messages::Message, task::TaskState, view::View},
    msg_info, msg_print,
};
use anyhow::Result;
use clap::Args;
use std::str::FromStr;

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Only count tasks in this domain, repeatable
    #[arg(short, long = "domain")]
    domains: Vec<String>,
    /// Only count tasks in this state (READY, CLAIMED, COMPLETED), repeatable
    #[arg(short, long = "state")]
    states: Vec<String>,
}

pub fn cmd(args: ReportArgs) -> Result<()> {
    let states = args.states.iter().map(|s| TaskState::from_str(s)).collect::<Result<Vec<_>, _>>()?;
    let domains = (!args.domains.is_empty()).then_some(args.domains.as_slice());
    let states = (!states.is_empty()).then_some(states.as_slice());

    let report = open_engine()?.monitor().task_status_report(domains, states)?;
    if report.row_count() == 0 {
        msg_info!(Message::StatusReportEmpty);
        return Ok(());
    }

    msg_print!(Message::StatusReportHeader, true);
    View::status_report(&report);
    Ok(())
}
