use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::controller::TaskTreeController;
use crate::model::{TaskMeta, TaskRecord};
use crate::service::TaskListing;
use crate::sync::{RemoteOp, Reply};
use crate::table::DisplayFormat;
use crate::tui::app::App;
use crate::tui::theme::Theme;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App whose initial listing has been answered with `records`
pub fn app_with_tasks(records: Vec<TaskRecord>) -> App {
    let mut controller = TaskTreeController::mount("P", DisplayFormat::default());
    for req in controller.take_requests() {
        if let RemoteOp::List { .. } = req.op {
            controller.complete(
                req.ticket,
                Ok(Reply::Listing(TaskListing {
                    tasks: records.clone(),
                    meta: TaskMeta::default(),
                })),
            );
        }
    }
    App::new(controller, Theme::default(), "Pilot".into())
}

/// An App still waiting for its first listing
pub fn loading_app() -> App {
    let controller = TaskTreeController::mount("P", DisplayFormat::default());
    App::new(controller, Theme::default(), "Pilot".into())
}

/// Foundations with two children and a grandchild
pub fn site_tasks() -> Vec<TaskRecord> {
    vec![
        TaskRecord::new("A", "Foundations"),
        TaskRecord::new("B", "Excavation").with_parent("A"),
        TaskRecord::new("C", "Footings").with_parent("A"),
        TaskRecord::new("D", "Survey").with_parent("B"),
    ]
}
