use crate::dom::document::NodeId;
use crate::dom::events::set_input_value;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_visible, locate_by_question_or_position};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome, Filler, Timing, log_fill_result};

/// Short answers and paragraphs. A control that was found counts as filled:
/// the page may reformat what it displays.
pub struct TextFiller {
    category: FieldCategory,
    selector: &'static str,
    timing: Timing,
}

impl TextFiller {
    pub fn short_text(timing: Timing) -> Self {
        TextFiller {
            category: FieldCategory::Text,
            selector: markup::TEXT_INPUT,
            timing,
        }
    }

    pub fn paragraph(timing: Timing) -> Self {
        TextFiller {
            category: FieldCategory::Textarea,
            selector: markup::TEXTAREA,
            timing,
        }
    }

    fn candidates(&self, page: &mut dyn Page) -> Result<Vec<NodeId>, PageError> {
        let mut candidates = Vec::new();
        for control in page.query_all(None, self.selector)? {
            if page.closest(control, markup::TIME_CONTROLLER)?.is_some()
                || page.closest(control, markup::DATE_CONTROLLER)?.is_some()
            {
                continue;
            }
            if is_visible(page, control)? {
                candidates.push(control);
            }
        }
        Ok(candidates)
    }

    fn locate(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<Option<NodeId>, PageError> {
        let candidates = self.candidates(page)?;

        let hints = [
            ("aria-labelledby", record.hints.label_ref.as_deref()),
            ("data-params", record.hints.data_params.as_deref()),
        ];
        for (attr, hint) in hints {
            let Some(hint) = hint else { continue };
            for candidate in &candidates {
                if page.attr(*candidate, attr)?.as_deref() == Some(hint) {
                    return Ok(Some(*candidate));
                }
            }
        }

        locate_by_question_or_position(page, &candidates, &record.question, record.hints.container_index)
    }
}

impl Filler for TextFiller {
    fn category(&self) -> FieldCategory {
        self.category
    }

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let value = record.value.as_single();
        let outcome = if value.trim().is_empty() {
            FillOutcome::failed(FillFailure::EmptyValue)
        } else {
            match self.locate(page, record)? {
                None => FillOutcome::failed(FillFailure::NotFound),
                Some(control) => {
                    page.scroll_into_view(control)?;
                    set_input_value(page, control, value, &self.timing)?;
                    FillOutcome::filled(1)
                }
            }
        };
        log_fill_result(record, &outcome);
        Ok(outcome)
    }
}
