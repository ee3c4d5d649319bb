pub mod checkbox;
pub mod date;
pub mod dropdown;
pub mod radio;
pub mod text;
pub mod time;

use tracing::{debug, info};

use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{
    collapse_whitespace, container_index_of, fallback_name, normalize_option_text, question_text_of,
    resolve_label_ref,
};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};

pub use checkbox::CheckboxDetector;
pub use date::DateDetector;
pub use dropdown::DropdownDetector;
pub use radio::RadioDetector;
pub use text::TextDetector;
pub use time::TimeDetector;

/// Scans the whole page for one category of question.
///
/// Detectors share no traversal state: each one walks the page on its own,
/// so one heuristic going wrong cannot leak into another category.
pub trait Detector {
    fn category(&self) -> FieldCategory;

    fn detect(&self, page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError>;
}

/// Question text and container position for a control, falling back to a
/// numbered name when no text resolves.
pub(crate) fn identify(
    page: &mut dyn Page,
    element: NodeId,
    category: FieldCategory,
    ordinal: usize,
) -> Result<(String, Option<usize>), PageError> {
    let container_index = container_index_of(page, element)?;
    let question = question_text_of(page, element)?;
    if question.is_empty() {
        let name = fallback_name(category.fallback_prefix(), container_index, ordinal);
        debug!(target: "detector", category = %category, name = %name, "no question text, using fallback name");
        return Ok((name, container_index));
    }
    Ok((question, container_index))
}

/// Question text of a date/time composite: the regular derivation, then the
/// label reference of the inner part matching `labelled` with generic part
/// labels ("Date", "Waktu", ...) skipped.
pub fn composite_question(
    page: &mut dyn Page,
    controller: NodeId,
    labelled: &str,
) -> Result<String, PageError> {
    let question = question_text_of(page, controller)?;
    if !question.is_empty() {
        return Ok(question);
    }
    if let Some(inner) = page.query(Some(controller), labelled)? {
        if let Some(ids) = page.attr(inner, "aria-labelledby")? {
            return resolve_label_ref(page, &ids, true);
        }
    }
    Ok(String::new())
}

/// `identify` for date/time composites.
pub(crate) fn identify_composite(
    page: &mut dyn Page,
    controller: NodeId,
    labelled: &str,
    category: FieldCategory,
    ordinal: usize,
) -> Result<(String, Option<usize>), PageError> {
    let container_index = container_index_of(page, controller)?;
    let mut question = composite_question(page, controller, labelled)?;
    if question.is_empty() {
        question = fallback_name(category.fallback_prefix(), container_index, ordinal);
    }
    Ok((question, container_index))
}

pub(crate) fn log_detection(category: FieldCategory, count: usize) {
    if count > 0 {
        info!(target: "detector", category = %category, count, "detected fields");
    } else {
        debug!(target: "detector", category = %category, "no fields found");
    }
}

// ============================================================================
// Choice option helpers (shared with the fillers)
// ============================================================================

/// True for the free-text "Other" escape option of a choice group.
pub fn is_other_option(page: &mut dyn Page, control: NodeId) -> Result<bool, PageError> {
    for attr in ["data-value", "data-answer-value"] {
        if page.attr(control, attr)?.as_deref() == Some(markup::OTHER_OPTION_VALUE) {
            return Ok(true);
        }
    }
    if page.has_attr(control, "data-other-checkbox")? || page.has_attr(control, "data-other-radio")? {
        return Ok(true);
    }
    let aria_label = page.attr(control, "aria-label")?.unwrap_or_default().to_lowercase();
    Ok(aria_label.contains("other:") || aria_label.contains("yang lain"))
}

pub fn is_disabled(page: &mut dyn Page, control: NodeId) -> Result<bool, PageError> {
    Ok(page.attr(control, "aria-disabled")?.as_deref() == Some("true"))
}

pub fn is_checked(page: &mut dyn Page, control: NodeId) -> Result<bool, PageError> {
    Ok(page.attr(control, "aria-checked")?.as_deref() == Some("true"))
}

/// Label of a radio option: its `aria-label`, its `data-value`, or its text.
pub fn radio_label(page: &mut dyn Page, radio: NodeId) -> Result<String, PageError> {
    if let Some(label) = page.attr(radio, "aria-label")? {
        let label = normalize_option_text(&label);
        if !label.is_empty() {
            return Ok(label);
        }
    }
    if let Some(value) = page.attr(radio, "data-value")? {
        let value = normalize_option_text(&value);
        if !value.is_empty() {
            return Ok(value);
        }
    }
    Ok(normalize_option_text(&page.text(radio)?))
}

/// Label of a checkbox option: `data-answer-value`, then `aria-label`, then
/// the text of the enclosing `<label>`.
pub fn checkbox_label(page: &mut dyn Page, checkbox: NodeId) -> Result<String, PageError> {
    if let Some(value) = page.attr(checkbox, "data-answer-value")? {
        if value != markup::OTHER_OPTION_VALUE {
            let value = normalize_option_text(&value);
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    if let Some(label) = page.attr(checkbox, "aria-label")? {
        let label = normalize_option_text(&label);
        if !label.is_empty() {
            return Ok(label);
        }
    }
    if let Some(label) = page.closest(checkbox, "label")? {
        let node = page
            .query(Some(label), markup::CHECKBOX_LABEL_TEXT)?
            .unwrap_or(label);
        return Ok(normalize_option_text(&page.text(node)?));
    }
    Ok(String::new())
}

/// Value token of a dropdown option: `data-value`, else its text.
pub fn dropdown_option_value(page: &mut dyn Page, option: NodeId) -> Result<String, PageError> {
    if let Some(value) = page.attr(option, "data-value")? {
        let value = collapse_whitespace(&value);
        if !value.is_empty() {
            return Ok(value);
        }
    }
    dropdown_option_text(page, option)
}

/// Displayed text of a dropdown option.
pub fn dropdown_option_text(page: &mut dyn Page, option: NodeId) -> Result<String, PageError> {
    let node = page
        .query(Some(option), markup::OPTION_TEXT)?
        .unwrap_or(option);
    Ok(collapse_whitespace(&page.text(node)?))
}

/// "Choose"/"Pilih" entries and options with an explicitly empty value.
pub fn is_placeholder_option(page: &mut dyn Page, option: NodeId) -> Result<bool, PageError> {
    if page.attr(option, "data-value")?.is_some_and(|v| v.trim().is_empty()) {
        return Ok(true);
    }
    let text = dropdown_option_text(page, option)?;
    Ok(text.is_empty() || markup::PLACEHOLDER_LABELS.contains(&text.as_str()))
}
