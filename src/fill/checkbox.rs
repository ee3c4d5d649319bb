use tracing::{debug, warn};

use crate::detect::checkbox::{checkbox_scopes, option_checkboxes};
use crate::detect::{checkbox_label, is_checked};
use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, locate_by_question_or_position};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome, Filler, Timing, log_fill_result};

/// Multi-select groups. Requested labels are checked, everything else is
/// left as it is.
pub struct CheckboxFiller {
    timing: Timing,
}

/// What happened to one requested label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    AlreadyChecked,
    Checked,
    Refused,
}

impl CheckboxFiller {
    pub fn new(timing: Timing) -> Self {
        CheckboxFiller { timing }
    }

    fn locate(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<Option<NodeId>, PageError> {
        let mut scopes = Vec::new();
        for scope in checkbox_scopes(page)? {
            if !is_grid_variant(page, scope)? {
                scopes.push(scope);
            }
        }
        locate_by_question_or_position(page, &scopes, &record.question, record.hints.container_index)
    }

    fn check(&self, page: &mut dyn Page, checkbox: NodeId) -> Result<Toggle, PageError> {
        if is_checked(page, checkbox)? {
            return Ok(Toggle::AlreadyChecked);
        }

        page.scroll_into_view(checkbox)?;
        page.click(checkbox)?;
        page.pause(self.timing.medium_ms)?;
        if is_checked(page, checkbox)? {
            return Ok(Toggle::Checked);
        }

        // Some layouts only react to the surrounding label.
        if let Some(label) = page.closest(checkbox, "label")? {
            page.click(label)?;
            page.pause(self.timing.medium_ms)?;
            if is_checked(page, checkbox)? {
                return Ok(Toggle::Checked);
            }
        }
        Ok(Toggle::Refused)
    }
}

impl Filler for CheckboxFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Checkbox
    }

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let requested: Vec<String> = record
            .value
            .as_list()
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();

        let outcome = if requested.is_empty() {
            FillOutcome::failed(FillFailure::EmptyValue)
        } else {
            match self.locate(page, record)? {
                None => FillOutcome::failed(FillFailure::NotFound),
                Some(scope) => self.apply(page, scope, &requested)?,
            }
        };
        log_fill_result(record, &outcome);
        Ok(outcome)
    }
}

impl CheckboxFiller {
    fn apply(&self, page: &mut dyn Page, scope: NodeId, requested: &[String]) -> Result<FillOutcome, PageError> {
        let mut labelled = Vec::new();
        for checkbox in option_checkboxes(page, scope)? {
            labelled.push((checkbox_label(page, checkbox)?, checkbox));
        }

        let mut satisfied = 0;
        let mut toggles = 0;
        let mut missing = Vec::new();
        let mut refused = Vec::new();

        for label in requested {
            let Some((_, checkbox)) = labelled.iter().find(|(l, _)| l == label) else {
                warn!(target: "filler", option = %label, "checkbox option not found");
                missing.push(label.clone());
                continue;
            };
            match self.check(page, *checkbox)? {
                Toggle::AlreadyChecked => satisfied += 1,
                Toggle::Checked => {
                    satisfied += 1;
                    toggles += 1;
                }
                Toggle::Refused => refused.push(label.clone()),
            }
        }
        debug!(target: "filler", satisfied, toggles, missing = missing.len(), "checkbox pass done");

        if satisfied > 0 {
            return Ok(FillOutcome::filled(toggles));
        }
        if let Some(label) = refused.into_iter().next() {
            return Ok(FillOutcome::failed(FillFailure::Mismatch {
                expected: label,
                actual: "unchecked".to_string(),
            }));
        }
        Ok(FillOutcome::failed(FillFailure::NoMatchingOption {
            requested: missing.join(", "),
            available: labelled.into_iter().map(|(l, _)| l).collect(),
        }))
    }
}
