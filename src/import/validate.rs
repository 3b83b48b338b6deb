//! Per-row schema validation.
//!
//! Validation never short-circuits inside a row: every violated constraint
//! contributes its own error, so one bad row can report several problems at
//! once.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use super::map::MappedRecord;
use super::parse::ImportChannel;
use super::report::ValidationError;
use super::schema::{EntityKind, EntitySchema, FieldType};

/// The two upload paths intentionally diverge: CSV treats any invalid row
/// as fatal to the whole file, JSON commits the valid rows and reports the
/// rest. Unifying them is a product decision, not a bug fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    FailFast,
    BestEffort,
}

pub fn policy_for(channel: ImportChannel) -> FailurePolicy {
    match channel {
        ImportChannel::Csv => FailurePolicy::FailFast,
        ImportChannel::Json => FailurePolicy::BestEffort,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    List(Vec<String>),
    Null,
}

/// A row that passed its schema: typed, defaulted, and eligible for insert.
#[derive(Debug, Clone)]
pub struct ValidatedRow {
    pub index: usize,
    pub values: BTreeMap<String, FieldValue>,
    pub original: Value,
}

impl ValidatedRow {
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(FieldValue::List(v)) => v.as_slice(),
            _ => &[],
        }
    }
}

/// A row that failed, with everything the report needs.
#[derive(Debug, Clone)]
pub struct RowFailure {
    pub index: usize,
    pub original: Value,
    pub errors: Vec<ValidationError>,
}

impl RowFailure {
    pub fn joined_message(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub fn validate_rows(
    schema: &EntitySchema,
    rows: Vec<MappedRecord>,
) -> (Vec<ValidatedRow>, Vec<RowFailure>) {
    let mut valid: Vec<ValidatedRow> = Vec::with_capacity(rows.len());
    let mut failed: Vec<RowFailure> = Vec::new();

    for row in rows {
        let mut errors: Vec<ValidationError> = Vec::new();
        let mut values: BTreeMap<String, FieldValue> = BTreeMap::new();

        for spec in schema.fields {
            let raw = row.fields.get(spec.name).filter(|v| is_present(v));
            let Some(raw) = raw else {
                if spec.required && !requiredness_waived(schema.kind, spec.name, &row) {
                    errors.push(error(row.index, spec.name, "required field is missing"));
                }
                values.insert(spec.name.to_string(), FieldValue::Null);
                continue;
            };

            match check_field(&spec.ty, raw) {
                Ok(v) => {
                    values.insert(spec.name.to_string(), v);
                }
                Err(message) => {
                    errors.push(error(row.index, spec.name, &message));
                    values.insert(spec.name.to_string(), FieldValue::Null);
                }
            }
        }

        if errors.is_empty() {
            valid.push(ValidatedRow {
                index: row.index,
                values,
                original: row.original,
            });
        } else {
            failed.push(RowFailure {
                index: row.index,
                original: row.original,
                errors,
            });
        }
    }

    (valid, failed)
}

/// Migration-path incident records link campers through `child_ids`; the
/// single `child_id` column may legitimately stay empty there when none of
/// the external ids resolved.
fn requiredness_waived(kind: EntityKind, field: &str, row: &MappedRecord) -> bool {
    kind == EntityKind::IncidentReport && field == "child_id" && row.fields.contains_key("child_ids")
}

fn check_field(ty: &FieldType, raw: &Value) -> Result<FieldValue, String> {
    match ty {
        FieldType::Text { max } => {
            let s = scalar_text(raw).ok_or("must be a text value")?;
            if s.chars().count() > *max {
                return Err(format!("exceeds maximum length of {} characters", max));
            }
            Ok(FieldValue::Text(s))
        }
        FieldType::Uuid => {
            let s = scalar_text(raw).ok_or("must be a text value")?;
            if Uuid::parse_str(&s).is_err() {
                return Err("must be a valid UUID".to_string());
            }
            Ok(FieldValue::Text(s))
        }
        FieldType::Date => {
            let s = scalar_text(raw).ok_or("must be a text value")?;
            if chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").is_err() {
                return Err("must be a date in YYYY-MM-DD format".to_string());
            }
            Ok(FieldValue::Text(s))
        }
        FieldType::Int { min, max } => {
            let n = match raw {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            let Some(n) = n else {
                return Err("must be a whole number".to_string());
            };
            if n < *min || n > *max {
                return Err(format!("must be between {} and {}", min, max));
            }
            Ok(FieldValue::Int(n))
        }
        FieldType::Enum { allowed } => {
            let s = scalar_text(raw).ok_or("must be a text value")?;
            if !allowed.contains(&s.as_str()) {
                return Err(format!("must be one of: {}", allowed.join(", ")));
            }
            Ok(FieldValue::Text(s))
        }
        FieldType::Email => {
            let s = scalar_text(raw).ok_or("must be a text value")?;
            if !email_regex().is_match(&s) {
                return Err("must be a valid email address".to_string());
            }
            Ok(FieldValue::Text(s))
        }
        FieldType::UuidList => {
            let Value::Array(items) = raw else {
                return Err("must be a list of ids".to_string());
            };
            let mut out: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let s = scalar_text(item).ok_or("must be a list of ids")?;
                if Uuid::parse_str(&s).is_err() {
                    return Err("must contain only valid UUIDs".to_string());
                }
                out.push(s);
            }
            Ok(FieldValue::List(out))
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn error(row_index: usize, field: &str, message: &str) -> ValidationError {
    ValidationError {
        row_index,
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::map::map_rows;
    use crate::import::parse::RawRecord;
    use crate::import::schema::EntityKind;
    use serde_json::json;

    fn mapped(kind: EntityKind, index: usize, value: Value) -> Vec<MappedRecord> {
        let Value::Object(fields) = value else {
            panic!("record must be an object")
        };
        let (rows, _) = map_rows(kind.schema(), &[RawRecord { index, fields }], None);
        rows
    }

    #[test]
    fn one_error_per_violated_constraint() {
        // Missing name, missing person_id, bad age, bad email: 4 errors.
        let rows = mapped(
            EntityKind::Camper,
            2,
            json!({"age": "99", "guardian_email": "not-an-email"}),
        );
        let (valid, failed) = validate_rows(EntityKind::Camper.schema(), rows);
        assert!(valid.is_empty());
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].errors.len(), 4);
        assert!(failed[0].errors.iter().all(|e| e.row_index == 2));
    }

    #[test]
    fn valid_camper_passes_with_typed_values() {
        let rows = mapped(
            EntityKind::Camper,
            1,
            json!({"name": "  Ada Lovelace  ", "person_id": "ext-1", "age": 9}),
        );
        let (valid, failed) = validate_rows(EntityKind::Camper.schema(), rows);
        assert!(failed.is_empty());
        assert_eq!(valid[0].text("name"), Some("Ada Lovelace"));
        assert_eq!(valid[0].values.get("age"), Some(&FieldValue::Int(9)));
    }

    #[test]
    fn uuid_fields_rejected_not_coerced() {
        let rows = mapped(
            EntityKind::Award,
            3,
            json!({"title": "Best Swimmer", "child_id": "not-a-uuid", "date": "2024-07-01"}),
        );
        let (_, failed) = validate_rows(EntityKind::Award.schema(), rows);
        assert_eq!(failed[0].errors.len(), 1);
        assert_eq!(failed[0].errors[0].message, "must be a valid UUID");
    }

    #[test]
    fn enum_fields_require_exact_membership() {
        let rows = mapped(
            EntityKind::MenuItem,
            2,
            json!({"date": "2024-07-01", "meal_type": "brunch", "items": "pancakes"}),
        );
        let (_, failed) = validate_rows(EntityKind::MenuItem.schema(), rows);
        assert_eq!(failed[0].errors.len(), 1);
        assert!(failed[0].errors[0].message.starts_with("must be one of:"));
    }

    #[test]
    fn max_length_named_in_message() {
        let long = "x".repeat(51);
        let rows = mapped(
            EntityKind::Camper,
            2,
            json!({"name": "Bob", "person_id": "p-1", "grade": long}),
        );
        let (_, failed) = validate_rows(EntityKind::Camper.schema(), rows);
        assert_eq!(
            failed[0].errors[0].message,
            "exceeds maximum length of 50 characters"
        );
    }

    #[test]
    fn dates_must_be_iso() {
        let rows = mapped(
            EntityKind::CalendarEvent,
            2,
            json!({"event_date": "07/01/2024", "title": "Campfire", "type": "social"}),
        );
        let (_, failed) = validate_rows(EntityKind::CalendarEvent.schema(), rows);
        assert_eq!(
            failed[0].errors[0].message,
            "must be a date in YYYY-MM-DD format"
        );
    }

    #[test]
    fn incident_child_id_waived_when_links_present() {
        // Migration shape: empty association, no single child_id.
        let rows = mapped(
            EntityKind::IncidentReport,
            1,
            json!({
                "date": "2024-06-07",
                "type": "injury",
                "description": "scraped knee",
                "child_ids": []
            }),
        );
        let (valid, failed) = validate_rows(EntityKind::IncidentReport.schema(), rows);
        assert!(failed.is_empty(), "{:?}", failed);
        assert!(valid[0].list("child_ids").is_empty());
    }

    #[test]
    fn incident_child_id_still_required_without_links() {
        let rows = mapped(
            EntityKind::IncidentReport,
            2,
            json!({"date": "2024-06-07", "type": "injury", "description": "scraped knee"}),
        );
        let (_, failed) = validate_rows(EntityKind::IncidentReport.schema(), rows);
        assert_eq!(failed[0].errors[0].field, "child_id");
    }

    #[test]
    fn channel_policies_are_fixed() {
        assert_eq!(policy_for(ImportChannel::Csv), FailurePolicy::FailFast);
        assert_eq!(policy_for(ImportChannel::Json), FailurePolicy::BestEffort);
    }
}
