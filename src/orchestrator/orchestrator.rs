use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dom::page::Page;
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome};
use crate::orchestrator::registry::Registry;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

/// Shared stop switch, checked between records.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    #[serde(rename = "type")]
    pub category: FieldCategory,
    pub question: String,
    pub outcome: FillOutcome,
}

/// Tally of one fill pass. A pass never fails as a whole; each record is
/// counted on its own.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillSummary {
    pub filled: usize,
    pub failed: usize,
    pub skipped_no_filler: usize,
    pub outcomes: Vec<FieldOutcome>,
}

impl FillSummary {
    pub fn error_count(&self) -> usize {
        self.failed + self.skipped_no_filler
    }

    pub fn all_filled(&self) -> bool {
        self.error_count() == 0
    }

    fn push(&mut self, record: &FieldRecord, outcome: FillOutcome) {
        match &outcome.failure {
            None => self.filled += 1,
            Some(FillFailure::Unsupported) => self.skipped_no_filler += 1,
            Some(_) => self.failed += 1,
        }
        self.outcomes.push(FieldOutcome {
            category: record.category,
            question: record.question.clone(),
            outcome,
        });
    }
}

/// Runs detection and fill passes over one page with a borrowed registry.
pub struct Orchestrator<'a> {
    registry: &'a Registry,
    tracer: Option<&'a TraceLogger>,
    cancel: CancelFlag,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Orchestrator {
            registry,
            tracer: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_tracer(mut self, tracer: &'a TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    // ========================================================================
    // Detection
    // ========================================================================

    /// Runs every detector and merges the results into one list with unique
    /// questions. When two detectors claim a question, the more specific
    /// category keeps the slot of the first claim.
    ///
    /// A detector that errors is skipped. The error is returned only when
    /// no detector could run at all.
    pub fn detect_all(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut merged: Vec<FieldRecord> = Vec::new();
        let mut by_question: HashMap<String, usize> = HashMap::new();
        let mut first_error = None;
        let mut ran = 0;

        for detector in self.registry.detectors() {
            let records = match detector.detect(page) {
                Ok(records) => records,
                Err(e) => {
                    warn!(target: "orchestrator", category = %detector.category(), error = %e, "detector failed");
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            ran += 1;

            for record in records {
                if let Err(problem) = record.validate() {
                    debug!(target: "orchestrator", question = %record.question, %problem, "dropping record");
                    continue;
                }
                match by_question.get(&record.question) {
                    None => {
                        by_question.insert(record.question.clone(), merged.len());
                        merged.push(record);
                    }
                    Some(&index) => {
                        let existing = merged[index].category;
                        let replace = record.category.specificity() > existing.specificity();
                        let (kept, dropped) = if replace {
                            (record.category, existing)
                        } else {
                            (existing, record.category)
                        };
                        debug!(
                            target: "orchestrator",
                            question = %record.question,
                            %kept,
                            %dropped,
                            "two detectors claimed one question"
                        );
                        if replace {
                            merged[index] = record;
                        }
                    }
                }
            }
        }

        if ran == 0 {
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        info!(target: "orchestrator", count = merged.len(), "detected fields");
        Ok(merged)
    }

    // ========================================================================
    // Filling
    // ========================================================================

    /// Fills `records` one at a time in order. Nothing a single record does
    /// stops the pass, including a page error; only the cancel flag does.
    pub fn fill_all(&self, page: &mut dyn Page, records: &[FieldRecord]) -> FillSummary {
        info!(target: "orchestrator", count = records.len(), "filling fields");
        let mut summary = FillSummary::default();

        for (step, record) in records.iter().enumerate() {
            let outcome = if self.cancel.is_cancelled() {
                FillOutcome::failed(FillFailure::Cancelled)
            } else {
                self.fill_one(page, record)
            };

            if let Some(tracer) = self.tracer {
                tracer.log(&TraceEvent::now(step, record).with_outcome(&outcome));
            }
            summary.push(record, outcome);
        }

        info!(
            target: "orchestrator",
            filled = summary.filled,
            failed = summary.failed,
            skipped = summary.skipped_no_filler,
            "fill pass complete"
        );
        summary
    }

    fn fill_one(&self, page: &mut dyn Page, record: &FieldRecord) -> FillOutcome {
        let Some(filler) = self.registry.filler_for(record.category) else {
            warn!(target: "orchestrator", category = %record.category, "no filler registered");
            return FillOutcome::failed(FillFailure::Unsupported);
        };

        match filler.fill(page, record) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(target: "orchestrator", question = %record.question, error = %e, "page error while filling");
                FillOutcome::failed(FillFailure::PageError {
                    message: e.to_string(),
                })
            }
        }
    }
}
