//! Batched persistence of validated rows.

use tracing::{info, warn};

use super::map::{collect_legacy_camper_ids, FkMap};
use super::parse::RawRecord;
use super::report::{FailedRecord, ImportReport};
use super::schema::EntityKind;
use super::validate::ValidatedRow;
use crate::store::ImportStore;

/// Rows per bulk insert.
pub const BATCH_SIZE: usize = 100;
/// Ids per lookup query, kept under the backend's query-size comfort zone.
pub const LOOKUP_CHUNK: usize = 500;

/// Build the legacy-camper-id resolution map for an incident import.
pub fn resolve_camper_fk(
    store: &mut dyn ImportStore,
    records: &[RawRecord],
) -> anyhow::Result<FkMap> {
    let legacy_ids = collect_legacy_camper_ids(records);
    let mut fk = FkMap::new();
    for chunk in legacy_ids.chunks(LOOKUP_CHUNK) {
        fk.extend(store.resolve_person_ids(chunk)?);
    }
    Ok(fk)
}

/// Drop rows whose external id already exists in storage. Returns the
/// surviving rows and the suppressed count.
///
/// Check-then-insert: two concurrent imports of the same file can both pass
/// this check and create real duplicates. Accepted for the bounded,
/// single-operator use this tool sees.
pub fn suppress_duplicates(
    store: &mut dyn ImportStore,
    rows: Vec<ValidatedRow>,
) -> anyhow::Result<(Vec<ValidatedRow>, usize)> {
    let incoming: Vec<String> = rows
        .iter()
        .filter_map(|r| r.text("person_id").map(str::to_string))
        .collect();

    let mut existing = std::collections::HashSet::new();
    for chunk in incoming.chunks(LOOKUP_CHUNK) {
        existing.extend(store.existing_person_ids(chunk)?);
    }

    let before = rows.len();
    let kept: Vec<ValidatedRow> = rows
        .into_iter()
        .filter(|r| match r.text("person_id") {
            Some(pid) => !existing.contains(pid),
            None => true,
        })
        .collect();
    let skipped = before - kept.len();
    if skipped > 0 {
        info!(skipped, "duplicate campers suppressed by external id");
    }
    Ok((kept, skipped))
}

/// Commit rows in sequential batches. A failed batch is recorded with its
/// original rows and the backend message; later batches still run. Incident
/// batches get a second junction insert per parent; junction failures do
/// not roll the parent back but surface as report warnings.
pub fn commit_rows(
    store: &mut dyn ImportStore,
    kind: EntityKind,
    rows: &[ValidatedRow],
    report: &mut ImportReport,
) {
    for (batch_no, batch) in rows.chunks(BATCH_SIZE).enumerate() {
        match store.insert_rows(kind, batch) {
            Ok(ids) => {
                report.committed += batch.len();
                if kind.links_campers() {
                    link_batch(store, &ids, batch, report);
                }
            }
            Err(e) => {
                warn!(
                    batch = batch_no + 1,
                    rows = batch.len(),
                    error = %e,
                    "batch insert failed"
                );
                let message = trimmed_message(&e);
                for row in batch {
                    report.failed_records.push(FailedRecord {
                        index: row.index,
                        error: message.clone(),
                        record: row.original.clone(),
                    });
                }
            }
        }
    }
}

fn link_batch(
    store: &mut dyn ImportStore,
    ids: &[String],
    batch: &[ValidatedRow],
    report: &mut ImportReport,
) {
    for (id, row) in ids.iter().zip(batch) {
        let campers = row.list("child_ids");
        if campers.is_empty() {
            continue;
        }
        if let Err(e) = store.link_incident_campers(id, campers) {
            warn!(incident = %id, error = %e, "camper links not created");
            report.junction_warnings.push(format!(
                "incident from row {} was created but its camper links were not: {}",
                row.index,
                trimmed_message(&e)
            ));
        }
    }
}

/// Backend messages are logged in full; the user sees a bounded version.
fn trimmed_message(e: &anyhow::Error) -> String {
    let s = e.to_string();
    if s.chars().count() <= 200 {
        s
    } else {
        let cut: String = s.chars().take(200).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::testing::{camper_row, incident_row, MemStore};

    #[test]
    fn batches_fail_independently() {
        // 250 rows: batches of 100/100/50, storage rejects batch 2 only.
        let rows: Vec<_> = (0..250)
            .map(|i| camper_row(i + 1, &format!("Camper {}", i), &format!("ext-{}", i)))
            .collect();
        let mut store = MemStore::default();
        store.fail_on_calls.insert(2);

        let mut report = ImportReport::default();
        commit_rows(&mut store, EntityKind::Camper, &rows, &mut report);

        assert_eq!(report.committed, 150);
        assert_eq!(report.failed_records.len(), 100);
        assert_eq!(store.inserted_count("campers"), 150);
        // Failed rows keep their originals and the batch message.
        assert_eq!(report.failed_records[0].index, 101);
        assert!(report.failed_records[0].error.contains("batch rejected"));
    }

    #[test]
    fn duplicate_import_is_idempotent() {
        let rows: Vec<_> = (0..7)
            .map(|i| camper_row(i + 1, &format!("Camper {}", i), &format!("ext-{}", i)))
            .collect();
        let mut store = MemStore::default();

        let (kept, skipped) = suppress_duplicates(&mut store, rows.clone()).expect("first pass");
        assert_eq!((kept.len(), skipped), (7, 0));
        let mut report = ImportReport::default();
        commit_rows(&mut store, EntityKind::Camper, &kept, &mut report);
        assert_eq!(report.committed, 7);

        let (kept, skipped) = suppress_duplicates(&mut store, rows).expect("second pass");
        assert_eq!((kept.len(), skipped), (0, 7));
    }

    #[test]
    fn duplicate_lookup_uses_sub_batches() {
        let rows: Vec<_> = (0..1200)
            .map(|i| camper_row(i + 1, "x", &format!("ext-{}", i)))
            .collect();
        let mut store = MemStore::default();
        let _ = suppress_duplicates(&mut store, rows).expect("suppress");
        assert_eq!(store.lookup_chunk_sizes, vec![500, 500, 200]);
    }

    #[test]
    fn incident_batches_link_campers() {
        let camper = "11111111-1111-4111-8111-111111111111";
        let rows = vec![incident_row(1, &[camper]), incident_row(2, &[])];
        let mut store = MemStore::default();
        let mut report = ImportReport::default();
        commit_rows(&mut store, EntityKind::IncidentReport, &rows, &mut report);

        assert_eq!(report.committed, 2);
        assert_eq!(store.links.len(), 1);
        assert_eq!(store.links[0].1, camper);
    }

    #[test]
    fn junction_failure_is_a_warning_not_a_rollback() {
        let camper = "11111111-1111-4111-8111-111111111111";
        let rows = vec![incident_row(1, &[camper])];
        let mut store = MemStore::default();
        store.fail_links = true;

        let mut report = ImportReport::default();
        commit_rows(&mut store, EntityKind::IncidentReport, &rows, &mut report);

        // Parent committed, association visible as a warning.
        assert_eq!(report.committed, 1);
        assert_eq!(report.failed_records.len(), 0);
        assert_eq!(report.junction_warnings.len(), 1);
        assert!(report.junction_warnings[0].contains("row 1"));
    }
}
