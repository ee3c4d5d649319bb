use serde::Serialize;

use crate::field::field_model::FieldRecord;
use crate::fill::{DropdownStage, FillOutcome};

/// One JSONL line per record a fill pass touched.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp: String,
    pub step: usize,

    pub fingerprint: String,
    pub category: String,
    pub question: String,

    pub outcome: String,
    pub changes: usize,

    pub reason: Option<String>,
    pub stage: Option<DropdownStage>,
}

impl TraceEvent {
    pub fn now(step: usize, record: &FieldRecord) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            step,
            fingerprint: record.fingerprint(),
            category: record.category.to_string(),
            question: record.question.clone(),
            outcome: "pending".to_string(),
            changes: 0,
            reason: None,
            stage: None,
        }
    }

    pub fn with_outcome(mut self, outcome: &FillOutcome) -> Self {
        self.outcome = if outcome.is_success() { "filled" } else { "failed" }.to_string();
        self.changes = outcome.changes;
        self.reason = outcome.failure.as_ref().map(|f| f.to_string());
        self.stage = outcome.stage;
        self
    }
}
