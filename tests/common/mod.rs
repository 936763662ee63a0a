//! Shared fixture: a database in a temp directory seeded with master data.
//!
//! | workbasket | key        | domain   | user-1-1                  | group-1 |
//! |------------|------------|----------|---------------------------|---------|
//! | WBI:1      | USER-1-1   | DOMAIN_A | READ APPEND TRANSFER      |         |
//! | WBI:2      | USER-1-2   | DOMAIN_A | READ APPEND TRANSFER      |         |
//! | WBI:3      | USER-B-1   | DOMAIN_B | READ APPEND               |         |
//! | WBI:4      | GPK_KSC    | DOMAIN_A |                           | READ    |
//! | WBI:5      | TEAMLEAD-1 | DOMAIN_A |                           |         |

#![allow(dead_code)]

use basket::db::access::AccessItem;
use basket::db::db::Db;
use basket::db::history::SqliteHistory;
use basket::db::master_data::MasterData;
use basket::db::sqlite_engine;
use basket::libs::access::{CallerIdentity, StaticAccessContext};
use basket::libs::auth::WorkbasketPermission::{Append, Read, Transfer};
use basket::libs::config::{Config, RolesConfig};
use basket::libs::engine::TaskEngine;
use basket::libs::task::{ClassificationSummary, NewTask, ObjectReference, Task, WorkbasketLocator, WorkbasketSummary};
use std::sync::Arc;
use tempfile::TempDir;
use test_context::TestContext;

pub const USER: &str = "user-1-1";
pub const GROUP: &str = "group-1";
pub const ADMIN: &str = "admin";
pub const MONITOR: &str = "monitor";

pub struct BasketContext {
    pub db: Db,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestContext for BasketContext {
    fn setup() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = Db::open(temp_dir.path().join("basket.db")).unwrap();
        seed().import(&db).unwrap();

        let config = Config {
            roles: RolesConfig {
                admin: vec![ADMIN.to_string()],
                monitor: vec![MONITOR.to_string()],
                ..RolesConfig::default()
            },
            ..Config::default()
        };

        BasketContext {
            db,
            config,
            _temp_dir: temp_dir,
        }
    }
}

impl BasketContext {
    pub fn engine_for(&self, user: &str, groups: &[&str]) -> TaskEngine {
        let caller = CallerIdentity::new(user, groups);
        sqlite_engine(&self.db, &self.config, Arc::new(StaticAccessContext::new(caller)))
    }

    pub fn user(&self) -> TaskEngine {
        self.engine_for(USER, &[GROUP])
    }

    pub fn admin(&self) -> TaskEngine {
        self.engine_for(ADMIN, &[])
    }

    pub fn monitor(&self) -> TaskEngine {
        self.engine_for(MONITOR, &[])
    }

    pub fn history(&self) -> SqliteHistory {
        SqliteHistory::new(self.db.clone())
    }

    /// Creates a task as admin so any workbasket can be used.
    pub fn seed_task(&self, workbasket_id: &str, reference_value: &str) -> Task {
        self.admin()
            .task_service()
            .create_task(new_task(workbasket_id, "L10000", reference_value))
            .unwrap()
    }
}

pub fn reference(value: &str) -> ObjectReference {
    ObjectReference::new("MyCompany1", "MySystem1", "MyInstance1", "MyType1", value)
}

pub fn new_task(workbasket_id: &str, classification_key: &str, reference_value: &str) -> NewTask {
    NewTask::new(WorkbasketLocator::Id(workbasket_id.to_string()), classification_key).with_primary_obj_ref(reference(reference_value))
}

fn workbasket(id: &str, key: &str, domain: &str) -> WorkbasketSummary {
    WorkbasketSummary {
        id: id.to_string(),
        key: key.to_string(),
        domain: domain.to_string(),
        name: Some(format!("{} basket", key)),
        owner: None,
    }
}

fn classification(id: &str, key: &str, domain: &str, priority: i32) -> ClassificationSummary {
    ClassificationSummary {
        id: id.to_string(),
        key: key.to_string(),
        domain: domain.to_string(),
        category: Some("EXTERNAL".to_string()),
        classification_type: Some("TASK".to_string()),
        name: Some(format!("{} classification", key)),
        priority,
        service_level: Some("P1D".to_string()),
        ..ClassificationSummary::default()
    }
}

fn seed() -> MasterData {
    MasterData {
        workbaskets: vec![
            workbasket("WBI:1", "USER-1-1", "DOMAIN_A"),
            workbasket("WBI:2", "USER-1-2", "DOMAIN_A"),
            workbasket("WBI:3", "USER-B-1", "DOMAIN_B"),
            workbasket("WBI:4", "GPK_KSC", "DOMAIN_A"),
            workbasket("WBI:5", "TEAMLEAD-1", "DOMAIN_A"),
        ],
        classifications: vec![
            classification("CLI:1", "L10000", "DOMAIN_A", 1),
            classification("CLI:2", "L10000", "DOMAIN_B", 2),
            classification("CLI:3", "T2100", "DOMAIN_A", 10),
            classification("CLI:4", "L1050", "DOMAIN_A", 5),
        ],
        access: vec![
            AccessItem::new("WBI:1", USER, &[Read, Append, Transfer]),
            AccessItem::new("WBI:2", USER, &[Read, Append, Transfer]),
            AccessItem::new("WBI:3", USER, &[Read, Append]),
            AccessItem::new("WBI:4", GROUP, &[Read]),
        ],
    }
}
