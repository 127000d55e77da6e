use serde::Serialize;

use crate::controller::{EMPTY_MESSAGE, Notice, NoticeLevel};
use crate::model::TaskRecord;
use crate::table::{Column, RowSurface};
use crate::tree::TaskTree;
use crate::util::unicode;

/// Columns printed by `tasktree list`
const LIST_COLUMNS: [Column; 6] = [
    Column::Status,
    Column::Priority,
    Column::PlannedStart,
    Column::PlannedEnd,
    Column::PlannedHours,
    Column::Cost,
];

const SUBJECT_W: usize = 32;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    pub wbs: &'a str,
    pub depth: usize,
    #[serde(flatten)]
    pub record: &'a TaskRecord,
}

#[derive(Serialize)]
pub struct ListingJson<'a> {
    pub scope: &'a str,
    pub name: &'a str,
    pub tasks: Vec<TaskJson<'a>>,
}

/// Tasks in tree order with their WBS numbers
pub fn listing_json<'a>(scope: &'a str, name: &'a str, tree: &'a TaskTree) -> ListingJson<'a> {
    let tasks = tree
        .preorder()
        .into_iter()
        .map(|idx| {
            let node = tree.node(idx);
            TaskJson {
                wbs: &node.wbs,
                depth: node.depth,
                record: &node.record,
            }
        })
        .collect();
    ListingJson { scope, name, tasks }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

fn pad(text: &str, width: usize) -> String {
    let text = unicode::truncate_to_width(text, width);
    let w = unicode::display_width(&text);
    format!("{}{}", text, " ".repeat(width.saturating_sub(w)))
}

/// One line per task, indented by depth, with a header line
pub fn format_listing(name: &str, scope: &str, surface: &RowSurface) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", name, scope)];
    if surface.is_empty() {
        lines.push(format!("  {}", EMPTY_MESSAGE));
        return lines;
    }

    let mut header = format!("  {} {} {}", pad("WBS", 8), pad("ID", 10), pad("Task", SUBJECT_W));
    for col in LIST_COLUMNS {
        header.push(' ');
        header.push_str(&pad(col.header(), col.width()));
    }
    lines.push(header.trim_end().to_string());

    for row in surface.rows() {
        let subject = format!("{}{}", " ".repeat(row.indent), row.text(Column::Subject));
        let mut line = format!(
            "  {} {} {}",
            pad(row.text(Column::Wbs), 8),
            pad(&row.task_id, 10),
            pad(&subject, SUBJECT_W)
        );
        for col in LIST_COLUMNS {
            line.push(' ');
            line.push_str(&pad(row.text(col), col.width()));
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// A controller notice as a CLI message
pub fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Warning => format!("warning: {}", notice.text),
        NoticeLevel::Error => format!("error: {}", notice.text),
        NoticeLevel::Info | NoticeLevel::Success => notice.text.clone(),
    }
}
