//! Configuration management for the basket engine.
//!
//! Settings live in `config.json` inside the platform data directory resolved
//! by [`DataStorage`]. A missing file means "use the defaults", so the engine
//! runs without any setup; `basket init` walks through the settings
//! interactively and writes the file.
//!
//! ## Configuration Structure
//!
//! - **Roles**: which user or group ids hold each engine-wide role
//! - **Policy**: switches for lifecycle rules (completed-task lock)
//! - **History**: whether and where history events are written
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use basket::libs::config::Config;
//!
//! let mut config = Config::read()?;
//! config.roles.admin.push("teamlead_1".to_string());
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::access::CallerIdentity;
use super::auth::Role;
use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

/// Configuration file name used for storing application settings.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Access ids (users or groups) holding each engine-wide role.
///
/// Ids are compared lower-cased against the caller's user id and groups.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct RolesConfig {
    pub user: Vec<String>,
    pub business_admin: Vec<String>,
    pub admin: Vec<String>,
    pub monitor: Vec<String>,
}

impl RolesConfig {
    pub fn members(&self, role: Role) -> &[String] {
        match role {
            Role::User => &self.user,
            Role::BusinessAdmin => &self.business_admin,
            Role::Admin => &self.admin,
            Role::Monitor => &self.monitor,
        }
    }

    /// True when any of the caller's access ids is listed for any of `roles`.
    pub fn grants(&self, caller: &CallerIdentity, roles: &[Role]) -> bool {
        roles.iter().any(|role| {
            self.members(*role)
                .iter()
                .any(|member| caller.access_ids().any(|id| id == member.trim().to_lowercase()))
        })
    }
}

/// Lifecycle rules that deployments may relax.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// General updates of COMPLETED tasks fail with an invalid-state error.
    pub lock_completed_tasks: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig { lock_completed_tasks: true }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistorySinkKind {
    /// The `history_events` table.
    Database,
    /// Structured tracing records.
    Log,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub sink: HistorySinkKind,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            enabled: true,
            sink: HistorySinkKind::Database,
        }
    }
}

/// Root configuration object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub roles: RolesConfig,
    pub policy: PolicyConfig,
    pub history: HistoryConfig,
}

impl Config {
    /// Loads `config.json`, or the defaults when the file does not exist.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive setup wizard seeded with the current values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();
        let theme = ColorfulTheme::default();

        msg_print!(Message::ConfigModuleRoles);
        for role in [Role::Admin, Role::BusinessAdmin, Role::Monitor, Role::User] {
            let current = config.roles.members(role).join(",");
            let answer: String = Input::with_theme(&theme)
                .with_prompt(Message::PromptRoleMembers(role.to_string()).to_string())
                .default(current)
                .allow_empty(true)
                .interact_text()?;
            let members: Vec<String> = answer.split(',').map(|m| m.trim().to_lowercase()).filter(|m| !m.is_empty()).collect();
            match role {
                Role::Admin => config.roles.admin = members,
                Role::BusinessAdmin => config.roles.business_admin = members,
                Role::Monitor => config.roles.monitor = members,
                Role::User => config.roles.user = members,
            }
        }

        msg_print!(Message::ConfigModulePolicy);
        config.policy.lock_completed_tasks = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptLockCompletedTasks.to_string())
            .default(config.policy.lock_completed_tasks)
            .interact()?;

        msg_print!(Message::ConfigModuleHistory);
        config.history.enabled = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptHistoryEnabled.to_string())
            .default(config.history.enabled)
            .interact()?;
        if config.history.enabled {
            let sinks = [HistorySinkKind::Database, HistorySinkKind::Log];
            let default = sinks.iter().position(|s| *s == config.history.sink).unwrap_or(0);
            let selected = Select::with_theme(&theme)
                .with_prompt(Message::PromptHistorySink.to_string())
                .items(&["database", "log"])
                .default(default)
                .interact()?;
            config.history.sink = sinks[selected];
        }

        Ok(config)
    }
}
