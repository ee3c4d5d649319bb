use tracing::{debug, warn};

use crate::detect::{Detector, identify_composite, log_detection};
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::is_grid_variant;
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord, FieldValue};

/// Date composites wrapping a native `input[type=date]`.
pub struct DateDetector;

impl Detector for DateDetector {
    fn category(&self) -> FieldCategory {
        FieldCategory::Date
    }

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut fields = Vec::new();

        for (ordinal, controller) in page.query_all(None, markup::DATE_CONTROLLER)?.into_iter().enumerate() {
            if is_grid_variant(page, controller)? {
                debug!(target: "detector", ordinal, "skipping date inside a grid");
                continue;
            }
            let Some(input) = page.query(Some(controller), markup::DATE_INPUT)? else {
                warn!(target: "detector", ordinal, "date controller has no date input, skipping");
                continue;
            };

            let (question, container_index) =
                identify_composite(page, controller, markup::DATE_LABELLED, FieldCategory::Date, ordinal)?;

            let mut record = FieldRecord::new(FieldCategory::Date, question)
                .with_value(FieldValue::Single(page.value(input)?));
            record.traits.includes_year =
                Some(page.attr(controller, "data-includesyear")?.as_deref() == Some("true"));
            record.traits.supports_date =
                Some(page.attr(controller, "data-supportsdate")?.as_deref() == Some("true"));
            record.traits.max_date = page.attr(input, "max")?.filter(|max| !max.is_empty());
            record.hints.container_index = container_index;
            record.hints.element_id = page.attr(input, "id")?;
            fields.push(record);
        }

        log_detection(FieldCategory::Date, fields.len());
        Ok(fields)
    }
}
