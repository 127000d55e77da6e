//! Remote requests and their completions.
//!
//! The controller never awaits the service itself. Each remote call is
//! queued as a [`Request`] carrying a [`Ticket`]; whoever drives the
//! controller executes it and hands the result back through
//! `TaskTreeController::complete`.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::controller::TaskTreeController;
use crate::model::{TaskFields, TaskRecord};
use crate::ops::CellKey;
use crate::service::{DeleteOutcome, RecalcOutcome, ServiceError, TaskListing, TaskService};

/// Monotonically increasing request id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an update came from; decides how its completion is shown
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOrigin {
    /// Inline cell commit; restore `original_display` on failure
    Cell {
        key: CellKey,
        original_display: String,
    },
    /// Full-form submit from the edit dialog
    Dialog,
}

/// Which control asked for a delete; picks the success wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOrigin {
    /// Bulk delete of the checked rows
    Selection,
    /// One row's delete action
    Row,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOp {
    List {
        scope: String,
    },
    Create {
        scope: String,
        fields: TaskFields,
    },
    Update {
        task_id: String,
        fields: TaskFields,
        origin: UpdateOrigin,
    },
    Delete {
        ids: Vec<String>,
        force: bool,
        delete_connected: bool,
        origin: DeleteOrigin,
    },
    Recalculate {
        scope: String,
    },
}

impl RemoteOp {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteOp::List { .. } => "list",
            RemoteOp::Create { .. } => "create",
            RemoteOp::Update { .. } => "update",
            RemoteOp::Delete { .. } => "delete",
            RemoteOp::Recalculate { .. } => "recalculate",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub ticket: Ticket,
    pub op: RemoteOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Listing(TaskListing),
    Created(TaskRecord),
    Updated,
    Deleted(DeleteOutcome),
    Recalculated(RecalcOutcome),
}

/// Ticket bookkeeping: the outbox of unsent requests, requests in flight,
/// and the newest reload issued.
#[derive(Debug, Default)]
pub struct SyncLayer {
    last: u64,
    latest_reload: Option<Ticket>,
    outbox: Vec<Request>,
    in_flight: HashMap<Ticket, RemoteOp>,
}

impl SyncLayer {
    pub fn issue(&mut self, op: RemoteOp) -> Ticket {
        self.last += 1;
        let ticket = Ticket(self.last);
        if matches!(op, RemoteOp::List { .. }) {
            self.latest_reload = Some(ticket);
        }
        debug!(%ticket, op = op.name(), "request queued");
        self.in_flight.insert(ticket, op.clone());
        self.outbox.push(Request { ticket, op });
        ticket
    }

    /// Hand queued requests to the executor
    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outbox)
    }

    /// Stop tracking `ticket`; returns its operation if it was in flight
    pub fn settle(&mut self, ticket: Ticket) -> Option<RemoteOp> {
        self.in_flight.remove(&ticket)
    }

    /// A listing older than the newest reload must not replace newer state
    pub fn is_stale_listing(&self, ticket: Ticket) -> bool {
        self.latest_reload.is_some_and(|latest| ticket < latest)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.outbox.is_empty()
    }
}

/// Perform one operation against the service
pub async fn execute(service: &dyn TaskService, op: &RemoteOp) -> Result<Reply, ServiceError> {
    match op {
        RemoteOp::List { scope } => service.list_tasks(scope).await.map(Reply::Listing),
        RemoteOp::Create { scope, fields } => {
            service.create_task(scope, fields).await.map(Reply::Created)
        }
        RemoteOp::Update {
            task_id, fields, ..
        } => service
            .update_task(task_id, fields)
            .await
            .map(|()| Reply::Updated),
        RemoteOp::Delete {
            ids,
            force,
            delete_connected,
            ..
        } => service
            .delete_tasks(ids, *force, *delete_connected)
            .await
            .map(Reply::Deleted),
        RemoteOp::Recalculate { scope } => service
            .recalculate_parents(scope)
            .await
            .map(Reply::Recalculated),
    }
}

/// Execute queued requests one at a time, feeding each completion back,
/// until the controller has nothing left to send. Returns how many requests
/// ran.
pub async fn drain(controller: &mut TaskTreeController, service: &dyn TaskService) -> usize {
    let mut ran = 0;
    loop {
        let requests = controller.take_requests();
        if requests.is_empty() {
            return ran;
        }
        for req in requests {
            let result = execute(service, &req.op).await;
            controller.complete(req.ticket, result);
            ran += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_increase_and_track_latest_reload() {
        let mut sync = SyncLayer::default();
        let a = sync.issue(RemoteOp::List { scope: "P".into() });
        let b = sync.issue(RemoteOp::Recalculate { scope: "P".into() });
        let c = sync.issue(RemoteOp::List { scope: "P".into() });
        assert!(a < b && b < c);
        assert!(sync.is_stale_listing(a));
        assert!(!sync.is_stale_listing(c));
        assert_eq!(sync.in_flight(), 3);
    }

    #[test]
    fn take_requests_empties_outbox_but_keeps_in_flight() {
        let mut sync = SyncLayer::default();
        let t = sync.issue(RemoteOp::List { scope: "P".into() });
        assert_eq!(sync.take_requests().len(), 1);
        assert!(sync.take_requests().is_empty());
        assert!(!sync.is_idle());
        assert!(matches!(sync.settle(t), Some(RemoteOp::List { .. })));
        assert!(sync.settle(t).is_none());
        assert!(sync.is_idle());
    }
}
