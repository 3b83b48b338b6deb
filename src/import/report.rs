//! The terminal artifact of one import invocation.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// 1-based, matching the source file's numbering (CSV includes the
    /// header line offset).
    pub row_index: usize,
    pub field: String,
    pub message: String,
}

/// One row that did not make it into storage, kept with its original record
/// so the UI can offer a "download failed records" export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRecord {
    pub index: usize,
    pub error: String,
    pub record: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total: usize,
    pub committed: usize,
    pub duplicates_skipped: usize,
    pub unmapped_campers: usize,
    pub validation_errors: Vec<ValidationError>,
    pub failed_records: Vec<FailedRecord>,
    pub junction_warnings: Vec<String>,
}

impl ImportReport {
    /// First `limit` error messages plus the count of those not shown.
    pub fn error_summary(&self, limit: usize) -> (Vec<String>, usize) {
        let messages: Vec<String> = self
            .validation_errors
            .iter()
            .take(limit)
            .map(|e| format!("row {}: {}: {}", e.row_index, e.field, e.message))
            .collect();
        let overflow = self.validation_errors.len().saturating_sub(limit);
        (messages, overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_summary_caps_and_counts_overflow() {
        let mut report = ImportReport::default();
        for i in 0..8 {
            report.validation_errors.push(ValidationError {
                row_index: i + 2,
                field: "name".to_string(),
                message: "required field is missing".to_string(),
            });
        }
        let (messages, overflow) = report.error_summary(5);
        assert_eq!(messages.len(), 5);
        assert_eq!(overflow, 3);
        assert!(messages[0].starts_with("row 2: name:"));
    }
}
