use super::report::TaskStatusReport;
use super::task::Task;
use prettytable::{row, Table};

pub struct View {}

impl View {
    /// Prints one task as a two-column field table.
    pub fn task(task: &Task) {
        let mut table = Table::new();
        let opt = |value: &Option<String>| value.clone().unwrap_or_default();
        let time = |value: &Option<chrono::DateTime<chrono::Utc>>| value.map(|t| t.to_rfc3339()).unwrap_or_default();

        table.add_row(row!["ID", task.id]);
        table.add_row(row!["NAME", opt(&task.name)]);
        table.add_row(row!["DESCRIPTION", opt(&task.description)]);
        table.add_row(row!["STATE", task.state]);
        table.add_row(row!["OWNER", opt(&task.owner)]);
        table.add_row(row!["READ", task.is_read]);
        table.add_row(row!["TRANSFERRED", task.is_transferred]);
        table.add_row(row!["PRIORITY", task.priority]);
        table.add_row(row!["WORKBASKET", format!("{} ({})", task.workbasket.key, task.workbasket.id)]);
        table.add_row(row!["DOMAIN", task.domain]);
        table.add_row(row!["CLASSIFICATION", task.classification_key]);
        table.add_row(row![
            "OBJECT REFERENCE",
            task.primary_obj_ref.as_ref().map(ToString::to_string).unwrap_or_default()
        ]);
        table.add_row(row!["BUSINESS PROCESS", opt(&task.business_process_id)]);
        table.add_row(row!["CREATED", task.created.to_rfc3339()]);
        table.add_row(row!["MODIFIED", task.modified.to_rfc3339()]);
        table.add_row(row!["CLAIMED", time(&task.claimed)]);
        table.add_row(row!["COMPLETED", time(&task.completed)]);
        for (key, value) in &task.custom_attributes {
            table.add_row(row![format!("CUSTOM {}", key), value]);
        }
        table.printstd();
    }

    /// Prints the report with one column per state, a total column and a sum row.
    pub fn status_report(report: &TaskStatusReport) {
        let mut table = Table::new();

        let mut header = vec!["DOMAIN".to_string()];
        header.extend(report.columns.iter().map(ToString::to_string));
        header.push("TOTAL".to_string());
        table.add_row(header.into_iter().collect());

        for (domain, line) in &report.rows {
            let mut cells = vec![domain.clone()];
            cells.extend(line.cells.iter().map(ToString::to_string));
            cells.push(line.total.to_string());
            table.add_row(cells.into_iter().collect());
        }

        let mut sum = vec!["SUM".to_string()];
        sum.extend(report.sum.cells.iter().map(ToString::to_string));
        sum.push(report.sum.total.to_string());
        table.add_row(sum.into_iter().collect());

        table.printstd();
    }
}
