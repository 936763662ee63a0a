//! Task status report: task counts pivoted by domain and state.
//!
//! Only callers in the MONITOR or ADMIN role may build it. The report has
//! one row per domain, one cell per requested state (all states when the
//! state filter is absent) and a sum row. An empty state list selects no
//! columns but filters nothing. Row totals count every item the store
//! returned, including states that have no column.

use super::auth::Role;
use super::engine::TaskEngine;
use super::error::TaskResult;
use super::store::TaskQueryItem;
use super::task::TaskState;
use std::collections::BTreeMap;

/// One report line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportRow {
    pub cells: Vec<u64>,
    pub total: u64,
}

impl ReportRow {
    fn new(columns: usize) -> Self {
        Self {
            cells: vec![0; columns],
            total: 0,
        }
    }

    fn add(&mut self, column: Option<usize>, count: u64) {
        if let Some(column) = column {
            self.cells[column] += count;
        }
        self.total += count;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusReport {
    pub columns: Vec<TaskState>,
    pub rows: BTreeMap<String, ReportRow>,
    pub sum: ReportRow,
}

impl TaskStatusReport {
    /// Pivots raw counts into rows keyed by domain.
    pub fn build(columns: Vec<TaskState>, items: &[TaskQueryItem]) -> Self {
        let mut rows: BTreeMap<String, ReportRow> = BTreeMap::new();
        let mut sum = ReportRow::new(columns.len());

        for item in items {
            let column = columns.iter().position(|state| *state == item.state);
            rows.entry(item.domain.clone())
                .or_insert_with(|| ReportRow::new(columns.len()))
                .add(column, item.count);
            sum.add(column, item.count);
        }

        Self { columns, rows, sum }
    }

    pub fn row(&self, domain: &str) -> Option<&ReportRow> {
        self.rows.get(domain)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub struct TaskMonitor<'e> {
    engine: &'e TaskEngine,
}

impl<'e> TaskMonitor<'e> {
    pub fn new(engine: &'e TaskEngine) -> Self {
        Self { engine }
    }

    /// Builds the report, optionally restricted to `domains` and `states`.
    pub fn task_status_report(&self, domains: Option<&[String]>, states: Option<&[TaskState]>) -> TaskResult<TaskStatusReport> {
        let caller = self.engine.caller()?;
        self.engine.gate().check_role(&caller, &[Role::Monitor, Role::Admin])?;

        let items = self.engine.unit_of_work().read(|tx| tx.count_by_state(domains, states))?;
        let columns = states
            .map(<[TaskState]>::to_vec)
            .unwrap_or_else(|| TaskState::ALL.to_vec());
        Ok(TaskStatusReport::build(columns, &items))
    }
}
