use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_incidents_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT id, child_id, date, type, description, severity, reported_by, status, tags
         FROM incident_reports ORDER BY date, id",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let base = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            json!({
                "id": row.get::<_, String>(0)?,
                "childId": row.get::<_, Option<String>>(1)?,
                "date": row.get::<_, String>(2)?,
                "type": row.get::<_, String>(3)?,
                "description": row.get::<_, String>(4)?,
                "severity": row.get::<_, Option<String>>(5)?,
                "reportedBy": row.get::<_, Option<String>>(6)?,
                "status": row.get::<_, Option<String>>(7)?,
                "tags": row.get::<_, Option<String>>(8)?,
            }),
        ))
    });
    let base = match base.and_then(|it| it.collect::<Result<Vec<_>, _>>()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let mut link_stmt = match conn
        .prepare("SELECT camper_id FROM incident_campers WHERE incident_id = ? ORDER BY camper_id")
    {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let mut incidents: Vec<serde_json::Value> = Vec::with_capacity(base.len());
    for (incident_id, mut value) in base {
        let campers = link_stmt
            .query_map([&incident_id], |row| row.get::<_, String>(0))
            .and_then(|it| it.collect::<Result<Vec<_>, _>>());
        match campers {
            Ok(ids) => {
                value["camperIds"] = json!(ids);
                incidents.push(value);
            }
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    }

    ok(&req.id, json!({ "incidents": incidents }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "incidents.list" => Some(handle_incidents_list(state, req)),
        _ => None,
    }
}
