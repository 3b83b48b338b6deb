//! Per-upload orchestration and the upload state machine.

use super::commit::{commit_rows, resolve_camper_fk, suppress_duplicates};
use super::map::map_rows;
use super::parse::{channel_for, parse, ImportChannel, RejectError};
use super::report::{FailedRecord, ImportReport};
use super::schema::EntityKind;
use super::validate::{policy_for, validate_rows, FailurePolicy, ValidatedRow};
use crate::store::ImportStore;

/// JSON uploads above this size require an explicit confirmation before the
/// duplicate-check/commit sequence runs.
pub const CONFIRM_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    FileSelected,
    ConfirmationPending,
    Parsing,
    Validating,
    Aborted,
    Committing,
    Reporting,
}

impl UploadState {
    pub fn name(self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::FileSelected => "file_selected",
            UploadState::ConfirmationPending => "confirmation_pending",
            UploadState::Parsing => "parsing",
            UploadState::Validating => "validating",
            UploadState::Aborted => "aborted",
            UploadState::Committing => "committing",
            UploadState::Reporting => "reporting",
        }
    }
}

/// A validated upload parked behind the large-JSON confirmation gate.
struct PendingImport {
    kind: EntityKind,
    rows: Vec<ValidatedRow>,
    report: ImportReport,
}

#[derive(Debug)]
pub enum BeginOutcome {
    /// Guardrail or format rejection; nothing was processed.
    Rejected(RejectError),
    /// CSV fail-fast: at least one row was invalid, nothing committed.
    ValidationAborted { messages: Vec<String>, overflow: usize },
    /// Large JSON upload parked; confirm or cancel to resolve.
    NeedsConfirmation { total: usize, valid: usize },
    Completed(ImportReport),
}

pub struct ImportSession {
    state: UploadState,
    pending: Option<PendingImport>,
    last_report: Option<ImportReport>,
}

impl ImportSession {
    pub fn new() -> Self {
        ImportSession {
            state: UploadState::Idle,
            pending: None,
            last_report: None,
        }
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_report(&self) -> Option<&ImportReport> {
        self.last_report.as_ref()
    }

    pub fn begin(
        &mut self,
        store: &mut dyn ImportStore,
        kind: EntityKind,
        file_name: &str,
        content: &str,
    ) -> anyhow::Result<BeginOutcome> {
        if self.pending.is_some() {
            anyhow::bail!("an import is already awaiting confirmation");
        }
        self.state = UploadState::FileSelected;

        // The extension gate is part of parsing; rejections abort from
        // there, never straight from file selection.
        self.state = UploadState::Parsing;
        let channel = match channel_for(file_name) {
            Ok(c) => c,
            Err(e) => {
                self.state = UploadState::Aborted;
                return Ok(BeginOutcome::Rejected(e));
            }
        };

        let records = match parse(channel, content) {
            Ok(r) => r,
            Err(e) => {
                self.state = UploadState::Aborted;
                return Ok(BeginOutcome::Rejected(e));
            }
        };

        // Incident migrations resolve external camper ids before mapping.
        let fk = if kind.links_campers() && channel == ImportChannel::Json {
            Some(resolve_camper_fk(store, &records)?)
        } else {
            None
        };
        let (mapped, stats) = map_rows(kind.schema(), &records, fk.as_ref());

        self.state = UploadState::Validating;
        let (valid, failures) = validate_rows(kind.schema(), mapped);

        let mut report = ImportReport {
            total: records.len(),
            unmapped_campers: stats.unmapped_campers,
            ..ImportReport::default()
        };
        for failure in &failures {
            report.validation_errors.extend(failure.errors.iter().cloned());
        }

        match policy_for(channel) {
            FailurePolicy::FailFast if !failures.is_empty() => {
                self.state = UploadState::Aborted;
                let (messages, overflow) = report.error_summary(5);
                self.last_report = Some(report);
                return Ok(BeginOutcome::ValidationAborted { messages, overflow });
            }
            FailurePolicy::BestEffort => {
                for failure in &failures {
                    report.failed_records.push(FailedRecord {
                        index: failure.index,
                        error: failure.joined_message(),
                        record: failure.original.clone(),
                    });
                }
            }
            FailurePolicy::FailFast => {}
        }

        if channel == ImportChannel::Json && records.len() > CONFIRM_THRESHOLD {
            self.state = UploadState::ConfirmationPending;
            let total = records.len();
            let valid_count = valid.len();
            self.pending = Some(PendingImport {
                kind,
                rows: valid,
                report,
            });
            return Ok(BeginOutcome::NeedsConfirmation {
                total,
                valid: valid_count,
            });
        }

        let report = self.run_commit(store, kind, channel, valid, report)?;
        Ok(BeginOutcome::Completed(report))
    }

    pub fn confirm(&mut self, store: &mut dyn ImportStore) -> anyhow::Result<Option<ImportReport>> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        let report = self.run_commit(
            store,
            pending.kind,
            ImportChannel::Json,
            pending.rows,
            pending.report,
        )?;
        Ok(Some(report))
    }

    /// Drops a parked upload with no side effects.
    pub fn cancel(&mut self) -> bool {
        let had_pending = self.pending.take().is_some();
        self.state = UploadState::Idle;
        had_pending
    }

    fn run_commit(
        &mut self,
        store: &mut dyn ImportStore,
        kind: EntityKind,
        channel: ImportChannel,
        rows: Vec<ValidatedRow>,
        mut report: ImportReport,
    ) -> anyhow::Result<ImportReport> {
        self.state = UploadState::Committing;
        let rows = if kind.dedupes_on_person_id() && channel == ImportChannel::Json {
            let (kept, skipped) = suppress_duplicates(store, rows)?;
            report.duplicates_skipped = skipped;
            kept
        } else {
            rows
        };
        commit_rows(store, kind, &rows, &mut report);
        self.state = UploadState::Reporting;
        self.last_report = Some(report.clone());
        Ok(report)
    }
}
