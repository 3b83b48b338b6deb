mod test_support;

use serde_json::json;
use test_support::{request, request_ok, spawn_sidecar};

#[test]
fn health_reports_version_and_import_state() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let result = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(result.get("version").and_then(|v| v.as_str()).is_some());
    assert_eq!(
        result.get("importState").and_then(|v| v.as_str()),
        Some("idle")
    );
    assert!(result
        .get("workspacePath")
        .map(|v| v.is_null())
        .unwrap_or(false));
}

#[test]
fn unknown_method_is_not_implemented() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let value = request(&mut stdin, &mut reader, "1", "no.such.method", json!({}));
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        value.pointer("/error/code").and_then(|v| v.as_str()),
        Some("not_implemented")
    );
}

#[test]
fn import_requires_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let value = request(
        &mut stdin,
        &mut reader,
        "1",
        "import.begin",
        json!({ "fileName": "roster.csv", "content": "name\nAda", "entity": "campers" }),
    );
    assert_eq!(
        value.pointer("/error/code").and_then(|v| v.as_str()),
        Some("no_workspace")
    );
}
