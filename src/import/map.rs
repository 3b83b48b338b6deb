//! Row mapping: heterogeneous source keys onto canonical schema fields.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::parse::RawRecord;
use super::schema::{EntityKind, EntitySchema};

/// Legacy camper id -> internal camper id, built once per incident import.
pub type FkMap = HashMap<String, String>;

/// A record after mapping: canonical keys only, original kept for the
/// failed-records download.
#[derive(Debug, Clone)]
pub struct MappedRecord {
    pub index: usize,
    pub fields: Map<String, Value>,
    pub original: Value,
}

#[derive(Debug, Default)]
pub struct MapStats {
    /// Legacy camper ids that did not resolve to an internal camper.
    pub unmapped_campers: usize,
}

const FIRST_NAME_KEYS: &[&str] = &["first", "first_name", "First Name", "firstName"];
const LAST_NAME_KEYS: &[&str] = &["last", "last_name", "Last Name", "lastName"];
const LEGACY_CAMPER_KEYS: &[&str] = &["camper_ids", "camperIds", "campers", "child_ids"];

pub fn map_rows(
    schema: &EntitySchema,
    records: &[RawRecord],
    fk: Option<&FkMap>,
) -> (Vec<MappedRecord>, MapStats) {
    let mut stats = MapStats::default();

    // A file that splits names into first/last columns is transformed
    // wholesale: one row with both populated switches the whole batch.
    let synthesize_names = schema.kind == EntityKind::Camper
        && records.iter().any(|r| {
            first_nonempty(&r.fields, FIRST_NAME_KEYS).is_some()
                && first_nonempty(&r.fields, LAST_NAME_KEYS).is_some()
        });

    let mut out: Vec<MappedRecord> = Vec::with_capacity(records.len());
    for record in records {
        let mut source = record.fields.clone();
        if schema.kind == EntityKind::IncidentReport {
            if let Some(fk) = fk {
                transform_incident(&mut source, fk, &mut stats);
            }
        }

        let mut fields = Map::new();
        for spec in schema.fields {
            let picked = spec
                .synonyms
                .iter()
                .find_map(|key| present_value(&source, key));
            match picked {
                Some(v) => {
                    fields.insert(spec.name.to_string(), v);
                }
                None => {
                    if let Some(default) = spec.default {
                        fields.insert(spec.name.to_string(), Value::String(default.to_string()));
                    }
                }
            }
        }

        if synthesize_names && !fields.contains_key("name") {
            let first = first_nonempty(&source, FIRST_NAME_KEYS).unwrap_or_default();
            let last = first_nonempty(&source, LAST_NAME_KEYS).unwrap_or_default();
            let full = format!("{} {}", first, last).trim().to_string();
            if !full.is_empty() {
                fields.insert("name".to_string(), Value::String(full));
            }
        }

        out.push(MappedRecord {
            index: record.index,
            fields,
            original: Value::Object(record.fields.clone()),
        });
    }
    (out, stats)
}

/// Legacy incident records arrive with camper arrays keyed by an external
/// id, a nested reporter object, and one of two date shapes. Normalize all
/// of that onto the canonical incident fields before generic mapping runs.
fn transform_incident(source: &mut Map<String, Value>, fk: &FkMap, stats: &mut MapStats) {
    let legacy_ids = LEGACY_CAMPER_KEYS
        .iter()
        .find_map(|k| source.get(*k).and_then(Value::as_array).cloned())
        .unwrap_or_default();
    if !legacy_ids.is_empty() {
        let mut resolved: Vec<Value> = Vec::new();
        for id in &legacy_ids {
            let Some(key) = scalar_string(id) else {
                stats.unmapped_campers += 1;
                continue;
            };
            match fk.get(&key) {
                Some(internal) => resolved.push(Value::String(internal.clone())),
                None => stats.unmapped_campers += 1,
            }
        }
        if let Some(Value::String(first)) = resolved.first().cloned() {
            source.insert("child_id".to_string(), Value::String(first));
        } else {
            source.remove("child_id");
        }
        source.insert("child_ids".to_string(), Value::Array(resolved));
    }

    // There is no structured reporter-to-staff link on this path; keep the
    // identity as free text.
    if let Some(reporter) = source.get("reported_by").or_else(|| source.get("reporter")) {
        if let Some(name) = reporter_text(reporter) {
            source.insert("reported_by".to_string(), Value::String(name));
        }
    }

    if let Some(date) = source.get("date") {
        if let Some(normalized) = normalize_date(date) {
            source.insert("date".to_string(), Value::String(normalized));
        }
    }

    if present_value(source, "type").is_none() {
        source.insert("type".to_string(), Value::String("other".to_string()));
    }
}

/// Accepts either a plain date/datetime string or a nested
/// `{"seconds": ...}` timestamp object; yields `YYYY-MM-DD`.
pub fn normalize_date(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.date_naive().format("%Y-%m-%d").to_string());
            }
            if s.len() >= 10 {
                if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
                    return Some(d.format("%Y-%m-%d").to_string());
                }
            }
            None
        }
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)?;
            let dt = DateTime::from_timestamp(seconds, 0)?;
            Some(dt.date_naive().format("%Y-%m-%d").to_string())
        }
        _ => None,
    }
}

/// Collect the distinct legacy camper ids referenced by a batch of raw
/// incident records, for the FK-resolution pre-pass.
pub fn collect_legacy_camper_ids(records: &[RawRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        let Some(ids) = LEGACY_CAMPER_KEYS
            .iter()
            .find_map(|k| record.fields.get(*k).and_then(Value::as_array))
        else {
            continue;
        };
        for id in ids {
            if let Some(s) = scalar_string(id) {
                if !seen.contains(&s) {
                    seen.push(s);
                }
            }
        }
    }
    seen
}

fn reporter_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => ["name", "email", "id"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn present_value(fields: &Map<String, Value>, key: &str) -> Option<Value> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v.clone()),
    }
}

fn first_nonempty(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| present_value(fields, k))
        .and_then(|v| scalar_string(&v))
}
