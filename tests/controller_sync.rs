use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tasktree::controller::{LoadState, NoticeLevel, TaskTreeController, ToolbarAction};
use tasktree::model::{TaskField, TaskRecord};
use tasktree::ops::{DEFAULT_BLUR_GRACE, EditControl};
use tasktree::sync::{self, Reply};
use tasktree::table::{CellState, Column, DisplayFormat, SAVING_PLACEHOLDER, SelectAll};

mod common;
use common::{MockService, abcd, is_list, mounted, run};

fn last_notice(controller: &TaskTreeController) -> (NoticeLevel, String) {
    let n = controller.last_notice().expect("a notice");
    (n.level, n.text.clone())
}

#[tokio::test]
async fn mount_lists_once_and_builds_rows() {
    let service = MockService::with_tasks(abcd());
    let controller = mounted(&service).await;
    assert_eq!(service.calls(), vec!["list:P"]);
    assert_eq!(controller.load_state(), &LoadState::Ready);
    assert_eq!(controller.surface().visible_ids(), vec!["A", "B", "D", "C"]);
    assert_eq!(controller.surface().cell_text("D", Column::Wbs), Some("1.1.1"));
}

#[tokio::test]
async fn failed_first_load_shows_message_not_rows() {
    let service = MockService::with_tasks(abcd());
    service.fail_on("list");
    let controller = mounted(&service).await;
    assert!(matches!(controller.load_state(), LoadState::Failed(_)));
    assert!(controller.surface().is_empty());
    assert_eq!(controller.empty_message(), Some("Unable to load tasks"));
    assert_eq!(last_notice(&controller).0, NoticeLevel::Error);
}

#[tokio::test]
async fn selection_follows_checkboxes() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;

    controller.set_row_checked("B", true);
    controller.set_row_checked("D", true);
    controller.set_row_checked("B", false);
    assert_eq!(controller.selection().ids(), vec!["D"]);
    assert_eq!(controller.surface().checked_ids(), vec!["D"]);
    assert_eq!(controller.surface().select_all(), SelectAll::Indeterminate);

    controller.set_select_all(true);
    assert_eq!(controller.selection().len(), 4);
    assert_eq!(controller.surface().select_all(), SelectAll::Checked);

    controller.set_row_checked("A", false);
    assert_eq!(controller.surface().select_all(), SelectAll::Indeterminate);

    controller.set_select_all(false);
    assert!(controller.selection().is_empty());
    assert_eq!(controller.surface().select_all(), SelectAll::Unchecked);
}

#[tokio::test]
async fn same_status_then_blur_restores_text_without_update() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();

    let t0 = Instant::now();
    controller.begin_edit("B", Column::Status, t0);
    assert_eq!(controller.surface().row("B").unwrap().cell(Column::Status).unwrap().state, CellState::Editing);
    controller.choose_option(0);
    controller.blur(t0);
    controller.tick(t0 + DEFAULT_BLUR_GRACE + Duration::from_millis(1));
    sync::drain(&mut controller, &service).await;

    assert_eq!(controller.surface().cell_text("B", Column::Status), Some("Open"));
    assert!(controller.editing().is_none());
    assert_eq!(service.count("update"), 0);
}

#[tokio::test]
async fn typed_edit_commits_once_then_reloads() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();

    let now = Instant::now();
    controller.begin_edit("C", Column::PlannedHours, now);
    if let Some(EditControl::Text(input)) = controller.edit_control_mut() {
        input.clear();
        for c in "12.5".chars() {
            input.insert(c);
        }
    }
    controller.commit_edit();
    assert_eq!(controller.surface().cell_text("C", Column::PlannedHours), Some(SAVING_PLACEHOLDER));
    // a second commit on the settled session is ignored
    controller.commit_edit();

    sync::drain(&mut controller, &service).await;
    assert_eq!(service.calls(), vec!["update:C", "list:P"]);
    assert_eq!(controller.surface().cell_text("C", Column::PlannedHours), Some("12.50"));
    assert_eq!(last_notice(&controller), (NoticeLevel::Success, "Task updated".into()));
}

#[tokio::test]
async fn failed_inline_update_restores_original_display() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.fail_on("update");

    controller.begin_edit("A", Column::Priority, Instant::now());
    controller.choose_option(3);
    sync::drain(&mut controller, &service).await;

    assert_eq!(controller.surface().cell_text("A", Column::Priority), Some("Medium"));
    let (level, text) = last_notice(&controller);
    assert_eq!(level, NoticeLevel::Error);
    assert!(text.starts_with("Failed to update task"));
    assert_eq!(service.count("list"), 1);
}

#[tokio::test]
async fn delete_refused_when_reload_cleared_selection() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;

    controller.set_row_checked("C", true);
    controller.refresh();
    sync::drain(&mut controller, &service).await;
    assert!(controller.selection().is_empty());

    controller.invoke(ToolbarAction::DeleteSelected);
    assert!(controller.confirmation().is_none());
    assert_eq!(
        last_notice(&controller),
        (NoticeLevel::Warning, "Please select at least one task to delete.".into())
    );
    sync::drain(&mut controller, &service).await;
    assert_eq!(service.count("delete"), 0);
}

#[tokio::test]
async fn confirmed_delete_cascades_and_reloads() {
    let mut tasks = abcd();
    tasks.push(TaskRecord {
        depends_on: vec!["D".into()],
        ..TaskRecord::new("E", "Backfill")
    });
    tasks.push(TaskRecord::new("F", "Landscaping"));
    let service = MockService::with_tasks(tasks);
    let mut controller = mounted(&service).await;
    service.clear_calls();

    controller.set_row_checked("B", true);
    assert!(controller.request_delete_selected());
    let message = controller.confirmation().unwrap().message();
    assert!(message.contains("1 selected task(s)"));

    // nothing is sent before the yes
    assert!(controller.take_requests().is_empty());
    controller.confirm();
    sync::drain(&mut controller, &service).await;

    assert_eq!(service.calls(), vec!["delete:B", "list:P"]);
    assert_eq!(controller.surface().visible_ids(), vec!["A", "C", "F"]);
    assert_eq!(
        last_notice(&controller).1,
        "3 task(s) deleted successfully (including connected tasks)"
    );
}

#[tokio::test]
async fn cancelled_confirmation_sends_nothing() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();
    assert!(controller.request_delete_task("A"));
    controller.cancel_confirmation();
    sync::drain(&mut controller, &service).await;
    assert!(service.calls().is_empty());
    assert_eq!(controller.surface().len(), 4);
}

#[tokio::test]
async fn failed_delete_leaves_rows_alone() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.fail_on("delete");
    controller.request_delete_task("B");
    controller.confirm();
    sync::drain(&mut controller, &service).await;
    assert_eq!(controller.surface().len(), 4);
    assert_eq!(service.count("list"), 1);
    assert!(last_notice(&controller).1.starts_with("Failed to delete tasks"));
}

#[tokio::test]
async fn create_requires_subject_before_sending() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();

    controller.open_create_dialog(Some("C"));
    assert!(controller.submit_dialog().is_none());
    assert_eq!(controller.dialog().unwrap().error.as_deref(), Some("Subject is required"));
    assert!(service.calls().is_empty());

    for c in "Rebar".chars() {
        controller.dialog_mut().unwrap().insert(c);
    }
    assert!(controller.submit_dialog().is_some());
    sync::drain(&mut controller, &service).await;

    assert!(controller.dialog().is_none());
    assert_eq!(service.calls(), vec!["create:", "list:P"]);
    let created = service.tasks().pop().unwrap();
    assert_eq!(created.subject, "Rebar");
    assert_eq!(created.parent.as_deref(), Some("C"));
    assert_eq!(controller.surface().cell_text(&created.id, Column::Wbs), Some("1.2.1"));
}

#[tokio::test]
async fn failed_create_keeps_dialog_open() {
    let service = MockService::with_tasks(vec![]);
    let mut controller = mounted(&service).await;
    service.fail_on("create");
    controller.open_create_dialog(None);
    for c in "Survey".chars() {
        controller.dialog_mut().unwrap().insert(c);
    }
    controller.submit_dialog();
    sync::drain(&mut controller, &service).await;

    let dialog = controller.dialog().expect("dialog stays open");
    assert_eq!(dialog.error.as_deref(), Some("create unavailable"));
    assert!(!controller.dialog_busy());
    assert!(controller.surface().is_empty());
}

#[tokio::test]
async fn edit_dialog_updates_whole_form() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();

    assert!(controller.open_edit_dialog("D"));
    let form = controller.dialog_mut().unwrap();
    form.focus = form.fields.iter().position(|f| f.field == TaskField::Status).unwrap();
    form.cycle(true);
    controller.submit_dialog();
    sync::drain(&mut controller, &service).await;

    assert_eq!(service.calls(), vec!["update:D", "list:P"]);
    assert_eq!(controller.record("D").unwrap().status, "Working");
    assert!(controller.dialog().is_none());
}

#[tokio::test]
async fn recalculate_is_a_trigger_followed_by_reload() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();

    controller.invoke(ToolbarAction::Recalculate);
    sync::drain(&mut controller, &service).await;
    assert_eq!(service.calls(), vec!["recalc:P", "list:P"]);
    assert_eq!(last_notice(&controller).1, "Updated 2 parent tasks");
}

#[tokio::test]
async fn older_listing_never_overwrites_newer_one() {
    let service = MockService::with_tasks(abcd());
    let mut controller = TaskTreeController::mount("P", DisplayFormat::default());
    let first = controller.take_requests().pop().unwrap();
    let first_reply = run(&service, &first).await;

    // the data changes and a second reload goes out before the first lands
    service.clear_calls();
    controller.refresh();
    let second = controller.take_requests().pop().unwrap();
    assert!(is_list(&second));
    let mut newer = abcd();
    newer.truncate(1);
    let second_reply = Ok(Reply::Listing(tasktree::service::TaskListing {
        tasks: newer,
        meta: Default::default(),
    }));

    controller.complete(second.ticket, second_reply);
    controller.complete(first.ticket, first_reply);
    assert_eq!(controller.surface().visible_ids(), vec!["A"]);
    assert!(controller.is_idle());
}

#[tokio::test]
async fn toggle_is_local_only() {
    let service = MockService::with_tasks(abcd());
    let mut controller = mounted(&service).await;
    service.clear_calls();
    controller.toggle("A");
    controller.expand_all();
    controller.collapse_all();
    sync::drain(&mut controller, &service).await;
    assert!(service.calls().is_empty());
    assert_eq!(controller.surface().visible_ids(), vec!["A"]);
}
