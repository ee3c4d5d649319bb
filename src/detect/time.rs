use tracing::{debug, warn};

use crate::detect::{Detector, identify_composite, log_detection};
use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::is_grid_variant;
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord, FieldValue};

/// Time composites made of an hour box and a minute box.
pub struct TimeDetector;

/// Hour box: by its label in either language, then by its slot marker, then
/// the first text input.
pub fn find_hour_input(page: &mut dyn Page, controller: NodeId) -> Result<Option<NodeId>, PageError> {
    find_part(page, controller, markup::TIME_HOUR_INPUT, markup::TIME_HOUR_SLOT, 0)
}

/// Minute box: same order as the hour box, second text input last.
pub fn find_minute_input(page: &mut dyn Page, controller: NodeId) -> Result<Option<NodeId>, PageError> {
    find_part(page, controller, markup::TIME_MINUTE_INPUT, markup::TIME_MINUTE_SLOT, 1)
}

fn find_part(
    page: &mut dyn Page,
    controller: NodeId,
    labelled: &str,
    slot: &str,
    position: usize,
) -> Result<Option<NodeId>, PageError> {
    if let Some(input) = page.query(Some(controller), labelled)? {
        return Ok(Some(input));
    }
    if let Some(slot) = page.query(Some(controller), slot)? {
        if let Some(input) = page.query(Some(slot), "input")? {
            return Ok(Some(input));
        }
    }
    Ok(page
        .query_all(Some(controller), markup::TIME_TEXT_INPUT)?
        .get(position)
        .copied())
}

impl Detector for TimeDetector {
    fn category(&self) -> FieldCategory {
        FieldCategory::Time
    }

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut fields = Vec::new();

        for (ordinal, controller) in page.query_all(None, markup::TIME_CONTROLLER)?.into_iter().enumerate() {
            if is_grid_variant(page, controller)? {
                debug!(target: "detector", ordinal, "skipping time inside a grid");
                continue;
            }
            let hour = find_hour_input(page, controller)?;
            let minute = find_minute_input(page, controller)?;
            let (Some(hour), Some(minute)) = (hour, minute) else {
                warn!(target: "detector", ordinal, "time controller missing hour or minute input, skipping");
                continue;
            };
            if hour == minute {
                warn!(target: "detector", ordinal, "time controller has a single input, skipping");
                continue;
            }

            let (question, container_index) =
                identify_composite(page, controller, markup::TIME_LABELLED, FieldCategory::Time, ordinal)?;

            let hour_value = page.value(hour)?;
            let minute_value = page.value(minute)?;
            let value = if hour_value.is_empty() && minute_value.is_empty() {
                String::new()
            } else {
                format!("{:0>2}:{:0>2}", hour_value, minute_value)
            };

            let mut record = FieldRecord::new(FieldCategory::Time, question)
                .with_value(FieldValue::Single(value));
            record.traits.hour_label = page.attr(hour, "aria-label")?;
            record.traits.minute_label = page.attr(minute, "aria-label")?;
            record.hints.container_index = container_index;
            fields.push(record);
        }

        log_detection(FieldCategory::Time, fields.len());
        Ok(fields)
    }
}
