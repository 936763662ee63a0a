//! Command-line interface for basket.
//!
//! Each subcommand lives in its own module with an `XArgs` struct parsed by
//! clap and a `cmd` entry point. Commands that touch tasks open the database,
//! read the configuration and build a [`TaskEngine`] acting for the caller
//! named by `BASKET_USER` / `BASKET_GROUPS`.

pub mod bulk;
pub mod import;
pub mod init;
pub mod report;
pub mod task;
pub mod transfer;

use crate::db::{db::Db, sqlite_engine};
use crate::libs::access::EnvAccessContext;
use crate::libs::config::Config;
use crate::libs::engine::TaskEngine;
use crate::libs::messages::Message;
use crate::libs::task::ObjectReference;
use crate::msg_error_anyhow;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Show, create and change tasks")]
    Task(task::TaskArgs),
    #[command(about = "Move a task to another workbasket")]
    Transfer(transfer::TransferArgs),
    #[command(about = "Set custom attributes on many tasks at once")]
    Bulk(bulk::BulkArgs),
    #[command(about = "Task counts per domain and state")]
    Report(report::ReportArgs),
    #[command(about = "Import workbaskets, classifications and access lists")]
    Import(import::ImportArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Task(args) => task::cmd(args),
            Commands::Transfer(args) => transfer::cmd(args),
            Commands::Bulk(args) => bulk::cmd(args),
            Commands::Report(args) => report::cmd(args),
            Commands::Import(args) => import::cmd(args),
        }
    }
}

/// Engine over the application database acting for the environment's caller.
pub(crate) fn open_engine() -> Result<TaskEngine> {
    let db = Db::new()?;
    let config = Config::read()?;
    Ok(sqlite_engine(&db, &config, Arc::new(EnvAccessContext)))
}

/// Parses `COMPANY/SYSTEM/INSTANCE/TYPE/VALUE`.
pub(crate) fn parse_object_reference(raw: &str) -> Result<ObjectReference> {
    let parts: Vec<&str> = raw.split('/').map(str::trim).collect();
    match parts.as_slice() {
        [company, system, instance, kind, value] if parts.iter().all(|p| !p.is_empty()) => {
            Ok(ObjectReference::new(company, system, instance, kind, value))
        }
        _ => Err(msg_error_anyhow!(Message::InvalidObjectReference(raw.to_string()))),
    }
}

/// Parses `KEY=VALUE`; the value may be empty.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(msg_error_anyhow!(Message::InvalidAttributeAssignment(raw.to_string()))),
    }
}
