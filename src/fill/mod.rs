pub mod checkbox;
pub mod date;
pub mod dropdown;
pub mod radio;
pub mod text;
pub mod time;
pub mod timing;

use serde::Serialize;
use tracing::{info, warn};

use crate::dom::page::Page;
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};

pub use checkbox::CheckboxFiller;
pub use date::DateFiller;
pub use dropdown::{DropdownFiller, DropdownStage};
pub use radio::RadioFiller;
pub use text::TextFiller;
pub use time::TimeFiller;
pub use timing::Timing;

/// Re-locates the control behind a record and drives it to the record's
/// value. Per-field problems come back as a failed `FillOutcome`; an `Err`
/// means the page itself stopped answering.
pub trait Filler {
    fn category(&self) -> FieldCategory;

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError>;
}

/// Why a record could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillFailure {
    EmptyValue,
    InvalidValue { reason: String },
    NotFound,
    /// A bounded poll ran out of attempts.
    Timeout { waiting_for: String },
    NoMatchingOption { requested: String, available: Vec<String> },
    Mismatch { expected: String, actual: String },
    Cancelled,
    /// No filler is registered for the category.
    Unsupported,
    /// The page raised an error while this record was being filled.
    PageError { message: String },
}

impl std::fmt::Display for FillFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillFailure::EmptyValue => write!(f, "no value to fill"),
            FillFailure::InvalidValue { reason } => write!(f, "invalid value: {}", reason),
            FillFailure::NotFound => write!(f, "control not found"),
            FillFailure::Timeout { waiting_for } => write!(f, "timed out waiting for {}", waiting_for),
            FillFailure::NoMatchingOption { requested, available } => write!(
                f,
                "option \"{}\" not found (available: {})",
                requested,
                available.join(", ")
            ),
            FillFailure::Mismatch { expected, actual } => {
                write!(f, "read back \"{}\", expected \"{}\"", actual, expected)
            }
            FillFailure::Cancelled => write!(f, "cancelled"),
            FillFailure::Unsupported => write!(f, "no filler for this field type"),
            FillFailure::PageError { message } => write!(f, "page error: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FillFailure>,
    /// Controls actually changed: clicks, toggles, or writes. Zero when the
    /// page already showed the requested value.
    pub changes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<DropdownStage>,
}

impl FillOutcome {
    pub fn filled(changes: usize) -> Self {
        FillOutcome {
            failure: None,
            changes,
            stage: None,
        }
    }

    pub fn failed(failure: FillFailure) -> Self {
        FillOutcome {
            failure: Some(failure),
            changes: 0,
            stage: None,
        }
    }

    pub fn at_stage(mut self, stage: DropdownStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_changes(mut self, changes: usize) -> Self {
        self.changes = changes;
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub(crate) fn log_fill_result(record: &FieldRecord, outcome: &FillOutcome) {
    match &outcome.failure {
        None => info!(
            target: "filler",
            category = %record.category,
            question = %record.question,
            changes = outcome.changes,
            "filled"
        ),
        Some(failure) => warn!(
            target: "filler",
            category = %record.category,
            question = %record.question,
            reason = %failure,
            "fill failed"
        ),
    }
}
