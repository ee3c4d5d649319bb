use tracing::debug;

use crate::detect::{Detector, checkbox_label, identify, is_checked, is_disabled, is_other_option, log_detection};
use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, push_unique};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord, FieldValue};

/// Multi-select checkbox groups.
pub struct CheckboxDetector;

/// Question-level scopes holding checkboxes, document order, no repeats.
///
/// A `role="list"` wrapper is shared with unrelated layout, so it only
/// counts when a checkbox is actually inside it.
pub(crate) fn checkbox_scopes(page: &mut dyn Page) -> Result<Vec<NodeId>, PageError> {
    let mut scopes = Vec::new();
    for checkbox in page.query_all(None, markup::CHECKBOX)? {
        let wrapper = match page.closest(checkbox, markup::CHECKBOX_CONTROLLER)? {
            Some(controller) => controller,
            None => match page.closest(checkbox, markup::GENERIC_LIST)? {
                Some(list) => list,
                None => continue,
            },
        };
        let scope = page
            .closest(wrapper, markup::QUESTION_BLOCK)?
            .unwrap_or(wrapper);
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    Ok(scopes)
}

/// Checkboxes of a scope that count as options: not in a grid cell, enabled,
/// not "Other", and without a grid row index.
pub(crate) fn option_checkboxes(page: &mut dyn Page, scope: NodeId) -> Result<Vec<NodeId>, PageError> {
    let mut valid = Vec::new();
    for checkbox in page.query_all(Some(scope), markup::CHECKBOX)? {
        if page.closest(checkbox, markup::GRID_CELL_WRAPPER)?.is_some()
            || page.closest(checkbox, markup::GRID_CONTAINER)?.is_some()
            || page.has_attr(checkbox, markup::GRID_ROW_INDEX)?
        {
            continue;
        }
        if is_disabled(page, checkbox)? || is_other_option(page, checkbox)? {
            continue;
        }
        valid.push(checkbox);
    }
    Ok(valid)
}

impl Detector for CheckboxDetector {
    fn category(&self) -> FieldCategory {
        FieldCategory::Checkbox
    }

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        let mut fields = Vec::new();

        for (ordinal, scope) in checkbox_scopes(page)?.into_iter().enumerate() {
            if is_grid_variant(page, scope)? {
                debug!(target: "detector", ordinal, "skipping grid checkbox group");
                continue;
            }

            let checkboxes = option_checkboxes(page, scope)?;
            let mut options = Vec::new();
            let mut checked = Vec::new();
            for checkbox in checkboxes {
                let label = checkbox_label(page, checkbox)?;
                if is_checked(page, checkbox)? {
                    push_unique(&mut checked, label.clone());
                }
                push_unique(&mut options, label);
            }
            if options.is_empty() {
                continue;
            }

            let (question, container_index) = identify(page, scope, FieldCategory::Checkbox, ordinal)?;
            let mut record = FieldRecord::new(FieldCategory::Checkbox, question)
                .with_options(options)
                .with_value(FieldValue::Multiple(checked));
            record.hints.container_index = container_index;
            record.hints.data_params = page.attr(scope, "data-params")?;
            fields.push(record);
        }

        log_detection(FieldCategory::Checkbox, fields.len());
        Ok(fields)
    }
}
