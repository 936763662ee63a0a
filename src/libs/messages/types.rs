/// Every user-visible text the application prints.
#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskCreated(String),
    TaskUpdated(String),
    TaskReadFlagSet(String, bool),
    TaskClaimed(String),
    TaskCompleted(String),
    TaskTransferred { task_id: String, workbasket: String },
    TaskDetailsHeader(String),
    NoChangesRequested,

    // === BULK UPDATE MESSAGES ===
    BulkUpdateFinished { requested: usize, updated: usize },
    BulkUpdateSkipped(Vec<String>),
    BulkUpdateNoCandidates,

    // === REPORT MESSAGES ===
    StatusReportHeader,
    StatusReportEmpty,

    // === OPERATION FAILURES ===
    OperationFailed { kind: String, reason: String },
    NoIdentity(String),

    // === ARGUMENT MESSAGES ===
    InvalidAttributeAssignment(String),
    InvalidObjectReference(String),
    MissingSelection(String),

    // === MASTER DATA MESSAGES ===
    MasterDataImported {
        workbaskets: usize,
        classifications: usize,
        access_items: usize,
    },

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleRoles,
    ConfigModulePolicy,
    ConfigModuleHistory,

    // === DATABASE MESSAGES ===
    MigrationApplied(u32, String),
    MigrationFailed(u32, String),
    DatabaseUpToDate(u32),

    // === PROMPTS ===
    PromptRoleMembers(String),
    PromptLockCompletedTasks,
    PromptHistoryEnabled,
    PromptHistorySink,
}
