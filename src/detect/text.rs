use tracing::debug;

use crate::detect::{Detector, identify, log_detection};
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, is_visible};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord, FieldValue, LocatorHints};

/// Labeled single-line inputs (`Text`) or multi-line textareas (`Textarea`).
pub struct TextDetector {
    category: FieldCategory,
    selector: &'static str,
}

impl TextDetector {
    pub fn short_text() -> Self {
        TextDetector {
            category: FieldCategory::Text,
            selector: markup::TEXT_INPUT,
        }
    }

    pub fn paragraph() -> Self {
        TextDetector {
            category: FieldCategory::Textarea,
            selector: markup::TEXTAREA,
        }
    }
}

impl Detector for TextDetector {
    fn category(&self) -> FieldCategory {
        self.category
    }

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut fields = Vec::new();

        for (ordinal, control) in page.query_all(None, self.selector)?.into_iter().enumerate() {
            // Hour/minute boxes of a time question are also labeled text inputs.
            if page.closest(control, markup::TIME_CONTROLLER)?.is_some()
                || page.closest(control, markup::DATE_CONTROLLER)?.is_some()
            {
                continue;
            }
            if is_grid_variant(page, control)? {
                debug!(target: "detector", ordinal, "skipping text input inside a grid");
                continue;
            }
            // Hidden duplicates of the mobile/desktop layout.
            if !is_visible(page, control)? {
                continue;
            }

            let (question, container_index) = identify(page, control, self.category, ordinal)?;
            let mut record = FieldRecord::new(self.category, question)
                .with_value(FieldValue::Single(page.value(control)?));
            record.hints = LocatorHints {
                label_ref: page.attr(control, "aria-labelledby")?,
                data_params: page.attr(control, "data-params")?,
                container_index,
                element_id: page.attr(control, "id")?,
                aria_label: page.attr(control, "aria-label")?,
            };
            fields.push(record);
        }

        log_detection(self.category, fields.len());
        Ok(fields)
    }
}
