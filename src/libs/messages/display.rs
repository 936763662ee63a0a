//! Display implementation for application messages.
//!
//! All message text is defined here, in one place, so commands and library
//! code only ever refer to [`Message`] variants.

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            // === TASK MESSAGES ===
            Message::TaskCreated(id) => format!("Task '{}' created", id),
            Message::TaskUpdated(id) => format!("Task '{}' updated", id),
            Message::TaskReadFlagSet(id, true) => format!("Task '{}' marked as read", id),
            Message::TaskReadFlagSet(id, false) => format!("Task '{}' marked as unread", id),
            Message::TaskClaimed(id) => format!("Task '{}' claimed", id),
            Message::TaskCompleted(id) => format!("Task '{}' completed", id),
            Message::TaskTransferred { task_id, workbasket } => format!("Task '{}' transferred to workbasket '{}'", task_id, workbasket),
            Message::TaskDetailsHeader(id) => format!("Task {}", id),
            Message::NoChangesRequested => "Nothing to change, no field was given".to_string(),

            // === BULK UPDATE MESSAGES ===
            Message::BulkUpdateFinished { requested, updated } => format!("Updated {} of {} tasks", updated, requested),
            Message::BulkUpdateSkipped(ids) => format!("Skipped tasks: {}", ids.join(", ")),
            Message::BulkUpdateNoCandidates => "No tasks matched the selection".to_string(),

            // === REPORT MESSAGES ===
            Message::StatusReportHeader => "Task status report".to_string(),
            Message::StatusReportEmpty => "No tasks to report".to_string(),

            // === OPERATION FAILURES ===
            Message::OperationFailed { kind, reason } => format!("Operation failed ({}): {}", kind, reason),
            Message::NoIdentity(var) => format!("No caller identity, set {} (and optionally BASKET_GROUPS)", var),

            // === ARGUMENT MESSAGES ===
            Message::InvalidAttributeAssignment(raw) => format!("Invalid attribute assignment '{}', expected KEY=VALUE", raw),
            Message::InvalidObjectReference(raw) => {
                format!("Invalid object reference '{}', expected COMPANY/SYSTEM/INSTANCE/TYPE/VALUE", raw)
            }
            Message::MissingSelection(what) => format!("Nothing selected, provide {}", what),

            // === MASTER DATA MESSAGES ===
            Message::MasterDataImported {
                workbaskets,
                classifications,
                access_items,
            } => format!(
                "Imported {} workbaskets, {} classifications and {} access items",
                workbaskets, classifications, access_items
            ),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleRoles => "Roles".to_string(),
            Message::ConfigModulePolicy => "Policy".to_string(),
            Message::ConfigModuleHistory => "History".to_string(),

            // === DATABASE MESSAGES ===
            Message::MigrationApplied(version, name) => format!("Applied migration v{}: {}", version, name),
            Message::MigrationFailed(version, name) => format!("Migration v{} ({}) failed", version, name),
            Message::DatabaseUpToDate(version) => format!("Database schema is up to date (v{})", version),

            // === PROMPTS ===
            Message::PromptRoleMembers(role) => format!("Access ids with role {} (comma separated)", role),
            Message::PromptLockCompletedTasks => "Reject updates of completed tasks?".to_string(),
            Message::PromptHistoryEnabled => "Record history events?".to_string(),
            Message::PromptHistorySink => "Where should history events go?".to_string(),
        };
        write!(f, "{}", s)
    }
}
