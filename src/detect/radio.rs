use tracing::debug;

use crate::detect::{Detector, identify, is_checked, is_disabled, is_other_option, log_detection, radio_label};
use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, push_unique};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord, FieldValue};

/// Single-choice groups, including star-rating widgets.
pub struct RadioDetector;

/// Radios of a group that count as options: enabled and not "Other".
pub(crate) fn option_radios(page: &mut dyn Page, group: NodeId) -> Result<Vec<NodeId>, PageError> {
    let mut radios = Vec::new();
    for radio in page.query_all(Some(group), markup::RADIO)? {
        if is_disabled(page, radio)? || is_other_option(page, radio)? {
            continue;
        }
        radios.push(radio);
    }
    Ok(radios)
}

/// Current answer of a group. Ratings answer with the number of active
/// stars, everything else with the checked option's label.
pub(crate) fn current_answer(
    page: &mut dyn Page,
    group: NodeId,
    rating: bool,
) -> Result<String, PageError> {
    let radios = page.query_all(Some(group), markup::RADIO)?;
    if rating {
        let mut count = 0;
        for radio in radios {
            if is_checked(page, radio)? {
                count += 1;
            }
        }
        return Ok(if count == 0 { String::new() } else { count.to_string() });
    }
    for radio in radios {
        if is_checked(page, radio)? {
            return radio_label(page, radio);
        }
    }
    Ok(String::new())
}

impl Detector for RadioDetector {
    fn category(&self) -> FieldCategory {
        FieldCategory::Radio
    }

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut fields = Vec::new();

        for (ordinal, group) in page.query_all(None, markup::RADIO_GROUP)?.into_iter().enumerate() {
            if is_grid_variant(page, group)? {
                debug!(target: "detector", ordinal, "skipping grid radio group");
                continue;
            }

            let mut options = Vec::new();
            for radio in option_radios(page, group)? {
                let label = radio_label(page, radio)?;
                push_unique(&mut options, label);
            }
            if options.is_empty() {
                debug!(target: "detector", ordinal, "radio group has no options, skipping");
                continue;
            }

            let rating = page.has_attr(group, markup::RATING_MARKER)?;
            let (question, container_index) = identify(page, group, FieldCategory::Radio, ordinal)?;
            let value = current_answer(page, group, rating)?;

            let mut record = FieldRecord::new(FieldCategory::Radio, question)
                .with_options(options)
                .with_value(FieldValue::Single(value));
            record.traits.rating = rating;
            record.hints.container_index = container_index;
            record.hints.data_params = page.attr(group, "data-params")?;
            record.hints.label_ref = page.attr(group, "aria-labelledby")?;
            fields.push(record);
        }

        log_detection(FieldCategory::Radio, fields.len());
        Ok(fields)
    }
}
