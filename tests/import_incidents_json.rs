mod test_support;

use serde_json::json;
use test_support::{request_ok, select_workspace, spawn_sidecar};

#[test]
fn incident_import_links_resolved_campers_and_reports_the_unmapped() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _workspace = select_workspace(&mut stdin, &mut reader, "campd-incidents");

    // Seed two campers carrying legacy external ids.
    let campers = json!([
        {"name": "Ada Lovelace", "person_id": "legacy-1"},
        {"name": "Bob Byrne", "person_id": "legacy-2"}
    ])
    .to_string();
    let seeded = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "import.begin",
        json!({ "fileName": "campers.json", "content": campers, "entity": "campers" }),
    );
    assert_eq!(seeded.pointer("/report/committed"), Some(&json!(2)));

    // One incident references a known and an unknown legacy camper; the
    // other has a timestamp-object date and no reporter structure.
    let incidents = json!([
        {
            "camper_ids": ["legacy-1", "legacy-gone"],
            "date": "2024-06-07T14:00:00Z",
            "type": "injury",
            "severity": "low",
            "description": "scraped knee at the climbing wall",
            "reported_by": {"id": "u-12", "name": "Jane Counselor"}
        },
        {
            "camper_ids": ["legacy-2"],
            "date": {"seconds": 1717768800},
            "description": "lost a water bottle"
        }
    ])
    .to_string();
    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "import.begin",
        json!({ "fileName": "incidents.json", "content": incidents, "entity": "incident_reports" }),
    );
    assert_eq!(imported.pointer("/report/committed"), Some(&json!(2)));
    assert_eq!(imported.pointer("/report/unmappedCampers"), Some(&json!(1)));

    let listed = request_ok(&mut stdin, &mut reader, "3", "incidents.list", json!({}));
    let incidents = listed["incidents"].as_array().expect("incidents array");
    assert_eq!(incidents.len(), 2);

    // Both date shapes normalized to the same day.
    for incident in incidents {
        assert_eq!(
            incident.get("date").and_then(|v| v.as_str()),
            Some("2024-06-07")
        );
        let linked = incident["camperIds"].as_array().expect("camperIds");
        assert_eq!(linked.len(), 1);
    }

    let by_description = |needle: &str| {
        incidents
            .iter()
            .find(|i| {
                i.get("description")
                    .and_then(|v| v.as_str())
                    .is_some_and(|d| d.contains(needle))
            })
            .expect("incident by description")
    };

    // Defaults filled where the record was silent.
    let bottle = by_description("water bottle");
    assert_eq!(bottle.get("type").and_then(|v| v.as_str()), Some("other"));
    assert_eq!(
        bottle.get("severity").and_then(|v| v.as_str()),
        Some("medium")
    );
    assert_eq!(bottle.get("status").and_then(|v| v.as_str()), Some("open"));

    let knee = by_description("scraped knee");
    assert_eq!(
        knee.get("reportedBy").and_then(|v| v.as_str()),
        Some("Jane Counselor")
    );
}

#[test]
fn deleting_a_camper_cleans_up_incident_links() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _workspace = select_workspace(&mut stdin, &mut reader, "campd-camper-delete");

    let campers = json!([{"name": "Ada Lovelace", "person_id": "legacy-1"}]).to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "import.begin",
        json!({ "fileName": "campers.json", "content": campers, "entity": "campers" }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "campers.list", json!({}));
    let camper_id = listed["campers"][0]["id"].as_str().expect("id").to_string();

    let incidents = json!([{
        "camper_ids": ["legacy-1"],
        "date": "2024-06-07",
        "type": "injury",
        "description": "scraped knee"
    }])
    .to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "import.begin",
        json!({ "fileName": "incidents.json", "content": incidents, "entity": "incident_reports" }),
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "campers.delete",
        json!({ "camperId": camper_id }),
    );
    assert_eq!(deleted.get("deleted"), Some(&json!(true)));

    let listed = request_ok(&mut stdin, &mut reader, "5", "incidents.list", json!({}));
    let incidents = listed["incidents"].as_array().expect("incidents");
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0]["camperIds"].as_array().expect("links").len(), 0);
}
