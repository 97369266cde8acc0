use atty::Stream;
use color_eyre::Result;
use serde_json::Value;
use workfocus_core::{CommandGroup, CommandInfo, CommandStatus, ExecutionOutcome, ReportEntry};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

/// Exit code for an outcome: the install report's code when one was recorded.
pub fn exit_code(outcome: &ExecutionOutcome) -> i32 {
    match outcome.status {
        CommandStatus::Ok => outcome.reported_exit_code().unwrap_or(0),
        CommandStatus::UserError => 1,
        CommandStatus::Failure => outcome.reported_exit_code().unwrap_or(2),
    }
}

pub fn emit_output(
    opts: &OutputOptions,
    info: CommandInfo,
    outcome: &ExecutionOutcome,
) -> Result<i32> {
    let code = exit_code(outcome);
    let style = Style::new(opts.no_color, atty::is(Stream::Stdout));

    if opts.json {
        let payload = workfocus_core::to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }
    if opts.quiet {
        return Ok(code);
    }

    let message = workfocus_core::format_status_message(info, &outcome.message);
    println!("{}", style.status(&outcome.status, &message));
    for entry in report_entries(&outcome.details) {
        println!("{}", style.report_entry(entry.level, &entry.message));
    }
    if let Some(table) = render_workspace_table(&style, info, &outcome.details) {
        println!("{table}");
    }
    if let Some(hint) = hint_from_details(&outcome.details) {
        let hint_line = format!("Hint: {hint}");
        println!("{}", style.info(&hint_line));
    }

    Ok(code)
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn report_entries(details: &Value) -> Vec<ReportEntry> {
    details
        .get("report")
        .and_then(|report| report.get("entries"))
        .cloned()
        .and_then(|entries| serde_json::from_value(entries).ok())
        .unwrap_or_default()
}

fn render_workspace_table(style: &Style, info: CommandInfo, details: &Value) -> Option<String> {
    if info.group != CommandGroup::List {
        return None;
    }
    let workspaces = details.get("workspaces")?.as_array()?;
    let rows = workspaces
        .iter()
        .filter_map(|workspace| {
            let marker = if workspace.get("root")?.as_bool()? {
                " (root)"
            } else {
                ""
            };
            Some((
                format!("{}{marker}", workspace.get("name")?.as_str()?),
                workspace.get("path")?.as_str()?.to_string(),
                workspace.get("locator_hash")?.as_str()?.to_string(),
            ))
        })
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return None;
    }

    let name_width = rows
        .iter()
        .map(|row| row.0.len())
        .max()
        .unwrap_or(0)
        .max("Workspace".len());
    let path_width = rows
        .iter()
        .map(|row| row.1.len())
        .max()
        .unwrap_or(0)
        .max("Path".len());
    let mut lines = vec![style.table_header(&format!(
        "{:<name_width$}  {:<path_width$}  Locator",
        "Workspace", "Path"
    ))];
    for (name, path, locator) in rows {
        lines.push(format!("{name:<name_width$}  {path:<path_width$}  {locator}"));
    }
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exit_code_prefers_reported_code() {
        let failed = ExecutionOutcome::failure("install failed", json!({ "exit_code": 1 }));
        assert_eq!(exit_code(&failed), 1);
        let internal = ExecutionOutcome::failure("boom", json!({}));
        assert_eq!(exit_code(&internal), 2);
        let user = ExecutionOutcome::user_error("bad input", json!({ "exit_code": 7 }));
        assert_eq!(exit_code(&user), 1);
        let ok = ExecutionOutcome::success("done", json!({ "exit_code": 0 }));
        assert_eq!(exit_code(&ok), 0);
    }

    #[test]
    fn workspace_table_marks_the_root() {
        let style = Style::new(true, false);
        let info = CommandInfo::new(CommandGroup::List, "list");
        let details = json!({
            "workspaces": [
                { "name": "monorepo", "path": ".", "locator_hash": "aaaa", "root": true },
                { "name": "@acme/app-a", "path": "packages/app-a", "locator_hash": "bbbb", "root": false }
            ]
        });
        let table = render_workspace_table(&style, info, &details).expect("table");
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Workspace"));
        assert!(lines[1].starts_with("monorepo (root)"));
        assert!(lines[2].ends_with("bbbb"));
    }

    #[test]
    fn report_entries_are_read_back_from_details() {
        let details = json!({
            "report": { "entries": [{ "level": "warning", "message": "peer missing" }] }
        });
        let entries = report_entries(&details);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "peer missing");
    }
}
