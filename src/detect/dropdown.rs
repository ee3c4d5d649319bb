use tracing::debug;

use crate::detect::{Detector, dropdown_option_value, identify, is_placeholder_option, log_detection};
use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, push_unique};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord, FieldValue, PLACEHOLDER_OPTION};

/// Listbox dropdowns, collapsed or expanded.
pub struct DropdownDetector;

/// Value of the option marked selected, empty for the placeholder.
pub(crate) fn selected_value(page: &mut dyn Page, listbox: NodeId) -> Result<String, PageError> {
    let Some(selected) = page.query(Some(listbox), markup::SELECTED_OPTION)? else {
        return Ok(String::new());
    };
    if is_placeholder_option(page, selected)? {
        return Ok(String::new());
    }
    dropdown_option_value(page, selected)
}

impl Detector for DropdownDetector {
    fn category(&self) -> FieldCategory {
        FieldCategory::Dropdown
    }

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut fields = Vec::new();

        for (ordinal, listbox) in page.query_all(None, markup::LISTBOX)?.into_iter().enumerate() {
            if is_grid_variant(page, listbox)? {
                continue;
            }

            let mut options = Vec::new();
            for option in page.query_all(Some(listbox), markup::OPTION)? {
                if is_placeholder_option(page, option)? {
                    continue;
                }
                let value = dropdown_option_value(page, option)?;
                push_unique(&mut options, value);
            }

            let needs_expansion = options.is_empty();
            if needs_expansion {
                debug!(target: "detector", ordinal, "dropdown options not rendered, deferring to fill");
                options.push(PLACEHOLDER_OPTION.to_string());
            }

            let (question, container_index) = identify(page, listbox, FieldCategory::Dropdown, ordinal)?;
            let value = selected_value(page, listbox)?;

            let mut record = FieldRecord::new(FieldCategory::Dropdown, question)
                .with_options(options)
                .with_value(FieldValue::Single(value));
            record.traits.needs_expansion = needs_expansion;
            record.hints.container_index = container_index;
            record.hints.aria_label = page.attr(listbox, "aria-label")?;
            record.hints.data_params = page.attr(listbox, "data-params")?;
            record.hints.label_ref = page.attr(listbox, "aria-labelledby")?;
            fields.push(record);
        }

        log_detection(FieldCategory::Dropdown, fields.len());
        Ok(fields)
    }
}
