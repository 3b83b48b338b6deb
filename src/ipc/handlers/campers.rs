use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_campers_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let mut stmt = match conn.prepare(
        "SELECT id, person_id, name, age, grade, guardian_email, guardian_phone,
                allergies, medical_notes
         FROM campers ORDER BY name",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let rows = stmt.query_map([], |row| {
        Ok(json!({
            "id": row.get::<_, String>(0)?,
            "personId": row.get::<_, Option<String>>(1)?,
            "name": row.get::<_, String>(2)?,
            "age": row.get::<_, Option<i64>>(3)?,
            "grade": row.get::<_, Option<String>>(4)?,
            "guardianEmail": row.get::<_, Option<String>>(5)?,
            "guardianPhone": row.get::<_, Option<String>>(6)?,
            "allergies": row.get::<_, Option<String>>(7)?,
            "medicalNotes": row.get::<_, Option<String>>(8)?,
        }))
    });

    match rows.and_then(|it| it.collect::<Result<Vec<_>, _>>()) {
        Ok(campers) => ok(&req.id, json!({ "campers": campers })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_campers_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(camper_id) = req.params.get("camperId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.camperId", None);
    };

    let cleanup = conn
        .execute(
            "DELETE FROM incident_campers WHERE camper_id = ?",
            [camper_id],
        )
        .and_then(|_| conn.execute("DELETE FROM campers WHERE id = ?", [camper_id]));
    match cleanup {
        Ok(n) => ok(&req.id, json!({ "deleted": n > 0 })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "campers.list" => Some(handle_campers_list(state, req)),
        "campers.delete" => Some(handle_campers_delete(state, req)),
        _ => None,
    }
}
