//! Core library modules for the basket engine.
//!
//! The task core ([`task`], [`lifecycle`], [`transfer`], [`bulk`], [`report`])
//! only depends on the ports declared in [`store`], [`access`], [`auth`] and
//! [`history`]. Infrastructure shared with the binary (configuration, data
//! directory, console messages and tables) lives alongside.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use basket::db::{db::Db, sqlite_engine};
//! use basket::libs::access::{CallerIdentity, StaticAccessContext};
//! use basket::libs::config::Config;
//! use basket::libs::task::{NewTask, ObjectReference, WorkbasketLocator};
//! use std::sync::Arc;
//!
//! let db = Db::new()?;
//! let caller = CallerIdentity::new("user-1-1", &["group-1"]);
//! let engine = sqlite_engine(&db, &Config::read()?, Arc::new(StaticAccessContext::new(caller)));
//!
//! let new_task = NewTask::new(WorkbasketLocator::Id("WBI:1".into()), "L10000")
//!     .with_primary_obj_ref(ObjectReference::new("MyCompany1", "MySystem1", "MyInstance1", "MyType1", "00000001"));
//! let task = engine.task_service().create_task(new_task)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod access;
pub mod auth;
pub mod bulk;
pub mod concurrency;
pub mod config;
pub mod data_storage;
pub mod engine;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod messages;
pub mod report;
pub mod store;
pub mod task;
pub mod transfer;
pub mod unit_of_work;
pub mod view;
