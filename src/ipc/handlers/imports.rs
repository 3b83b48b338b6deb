use serde_json::json;

use crate::import::report::ImportReport;
use crate::import::schema::EntityKind;
use crate::import::session::BeginOutcome;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;

fn report_json(report: &ImportReport) -> serde_json::Value {
    serde_json::to_value(report).unwrap_or_else(|_| json!({}))
}

fn handle_import_begin(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if state.session.has_pending() {
        return err(
            &req.id,
            "import_pending",
            "an import is awaiting confirmation; confirm or cancel it first",
            None,
        );
    }

    let Some(file_name) = req.params.get("fileName").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.fileName", None);
    };
    let Some(content) = req.params.get("content").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.content", None);
    };
    let Some(entity) = req.params.get("entity").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.entity", None);
    };
    let Some(kind) = EntityKind::parse(entity) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown entity: {}", entity),
            None,
        );
    };

    let mut store = SqliteStore::new(conn);
    let outcome = match state.session.begin(&mut store, kind, file_name, content) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "import_failed", e.to_string(), None),
    };

    match outcome {
        BeginOutcome::Rejected(rejection) => {
            err(&req.id, rejection.code(), rejection.to_string(), None)
        }
        BeginOutcome::ValidationAborted { messages, overflow } => err(
            &req.id,
            "validation_failed",
            "upload aborted: file contains invalid rows",
            Some(json!({
                "messages": messages,
                "overflowCount": overflow,
            })),
        ),
        BeginOutcome::NeedsConfirmation { total, valid } => ok(
            &req.id,
            json!({
                "needsConfirmation": true,
                "totalRecords": total,
                "validRecords": valid,
            }),
        ),
        BeginOutcome::Completed(report) => ok(&req.id, json!({ "report": report_json(&report) })),
    }
}

fn handle_import_confirm(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut store = SqliteStore::new(conn);
    match state.session.confirm(&mut store) {
        Ok(Some(report)) => ok(&req.id, json!({ "report": report_json(&report) })),
        Ok(None) => err(
            &req.id,
            "no_pending_import",
            "there is no import awaiting confirmation",
            None,
        ),
        Err(e) => err(&req.id, "import_failed", e.to_string(), None),
    }
}

fn handle_import_cancel(state: &mut AppState, req: &Request) -> serde_json::Value {
    let canceled = state.session.cancel();
    ok(&req.id, json!({ "canceled": canceled }))
}

/// Serializes the last report's failed records for the
/// "download failed records" action.
fn handle_import_report_failed(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(report) = state.session.last_report() else {
        return err(&req.id, "no_report", "no import has completed yet", None);
    };
    let records: Vec<serde_json::Value> = report
        .failed_records
        .iter()
        .map(|r| {
            json!({
                "index": r.index,
                "error": r.error,
                "record": r.record,
            })
        })
        .collect();
    ok(&req.id, json!({ "records": records }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.begin" => Some(handle_import_begin(state, req)),
        "import.confirm" => Some(handle_import_confirm(state, req)),
        "import.cancel" => Some(handle_import_cancel(state, req)),
        "import.report.failed" => Some(handle_import_report_failed(state, req)),
        _ => None,
    }
}
