//! # Basket - workbasket task lifecycle engine
//!
//! A library and command-line tool for human work items ("tasks") kept in
//! workbaskets, with permission checks, optimistic concurrency and history.
//!
//! ## Features
//!
//! - **Task Lifecycle**: Create, read, update, claim and complete tasks
//! - **Transfers**: Move tasks between workbaskets with APPEND/TRANSFER checks
//! - **Bulk Updates**: Best-effort custom attribute changes by id or object reference
//! - **Monitoring**: Task counts per domain and state
//! - **Persistence**: SQLite with versioned migrations
//!
//! ## Usage
//!
//! ```rust,no_run
//! use basket::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
