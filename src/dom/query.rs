use tracing::warn;

use crate::dom::document::NodeId;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::error::PageError;

// ============================================================================
// Question identity
// ============================================================================

/// Best-effort question text for a field-bearing element.
///
/// Tries, in order: the heading of the enclosing question container, then
/// each ancestor's heading or `aria-labelledby` reference, then the
/// element's own `aria-label`. Returns an empty string when nothing
/// resolves; callers decide on a fallback name.
pub fn question_text_of(page: &mut dyn Page, element: NodeId) -> Result<String, PageError> {
    let container = page.closest(element, markup::QUESTION_CONTAINER)?;
    if let Some(container) = container {
        if let Some(heading) = page.query(Some(container), markup::HEADING)? {
            let text = heading_title(page, heading)?;
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }

    // The walk stops at the enclosing container: above it, a heading query
    // would pick up a neighbouring question.
    let mut cursor = Some(element);
    while let Some(current) = cursor {
        if let Some(heading) = page.query(Some(current), markup::HEADING)? {
            let text = heading_title(page, heading)?;
            if !text.is_empty() {
                return Ok(text);
            }
        }

        if let Some(ids) = page.attr(current, "aria-labelledby")? {
            let text = resolve_label_ref(page, &ids, true)?;
            if !text.is_empty() {
                return Ok(text);
            }
        }

        if Some(current) == container {
            break;
        }
        cursor = page.parent(current)?;
    }

    if let Some(label) = page.attr(element, "aria-label")? {
        let label = collapse_whitespace(&label);
        if !markup::GENERIC_LABELS.contains(&label.as_str()) {
            return Ok(label);
        }
    }

    Ok(String::new())
}

/// Title of a heading node, preferring the title span so a required-marker
/// asterisk never becomes part of the question.
pub fn heading_title(page: &mut dyn Page, heading: NodeId) -> Result<String, PageError> {
    let node = page
        .query(Some(heading), markup::HEADING_TITLE)?
        .unwrap_or(heading);
    Ok(collapse_whitespace(&page.text(node)?))
}

/// Resolves a space-separated id list against label nodes and joins the
/// texts with " - ". Generic part labels ("Date", "Waktu", ...) are dropped
/// when `skip_generic` is set.
pub fn resolve_label_ref(
    page: &mut dyn Page,
    ids: &str,
    skip_generic: bool,
) -> Result<String, PageError> {
    let mut texts = Vec::new();
    for id in ids.split_whitespace() {
        let Some(label) = page.element_by_id(id)? else {
            continue;
        };
        let text = collapse_whitespace(&page.text(label)?);
        if text.is_empty() {
            continue;
        }
        if skip_generic && markup::GENERIC_LABELS.contains(&text.as_str()) {
            continue;
        }
        texts.push(text);
    }
    Ok(texts.join(" - "))
}

// ============================================================================
// Containers
// ============================================================================

/// Every question block on the page, in document order. This order is the
/// numbering used for fallback field names.
pub fn all_question_containers(page: &mut dyn Page) -> Result<Vec<NodeId>, PageError> {
    page.query_all(None, markup::QUESTION_CONTAINER)
}

/// Position of the question container enclosing `element`, if any.
pub fn container_index_of(page: &mut dyn Page, element: NodeId) -> Result<Option<usize>, PageError> {
    let Some(container) = page.closest(element, markup::QUESTION_CONTAINER)? else {
        return Ok(None);
    };
    let containers = all_question_containers(page)?;
    Ok(containers.iter().position(|c| *c == container))
}

pub fn container_at(page: &mut dyn Page, index: usize) -> Result<Option<NodeId>, PageError> {
    Ok(all_question_containers(page)?.get(index).copied())
}

/// Fallback name for a field whose question text could not be derived:
/// numbered by its question container when it has one, otherwise by its
/// position among controls of its kind.
pub fn fallback_name(prefix: &str, container_index: Option<usize>, ordinal: usize) -> String {
    format!("{} {}", prefix, container_index.unwrap_or(ordinal) + 1)
}

/// True for matrix-style questions. Any single structural signal is enough:
/// a grid wrapper class, the grid controller, a per-row index attribute, or a
/// grid row class, found on the element, an ancestor, or a descendant.
pub fn is_grid_variant(page: &mut dyn Page, container: NodeId) -> Result<bool, PageError> {
    let row_index = format!("[{}]", markup::GRID_ROW_INDEX);
    let signals = [
        markup::GRID_CONTAINER,
        markup::GRID_CONTROLLER,
        row_index.as_str(),
        markup::GRID_ROW,
        markup::GRID_CELL_WRAPPER,
    ];

    for signal in signals {
        if page.closest(container, signal)?.is_some() {
            return Ok(true);
        }
        if page.query(Some(container), signal)?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn is_visible(page: &mut dyn Page, element: NodeId) -> Result<bool, PageError> {
    Ok(page.computed_style(element)?.is_visible())
}

/// First candidate whose question text equals `question` exactly. A second
/// match is logged and ignored.
pub fn find_by_question(
    page: &mut dyn Page,
    candidates: &[NodeId],
    question: &str,
) -> Result<Option<NodeId>, PageError> {
    find_by_question_with(page, candidates, question, question_text_of)
}

/// `find_by_question` with a custom question derivation, for controls whose
/// detector identifies them differently.
pub fn find_by_question_with<F>(
    page: &mut dyn Page,
    candidates: &[NodeId],
    question: &str,
    question_of: F,
) -> Result<Option<NodeId>, PageError>
where
    F: Fn(&mut dyn Page, NodeId) -> Result<String, PageError>,
{
    let mut found = None;
    for candidate in candidates {
        if question_of(page, *candidate)? != question {
            continue;
        }
        if found.is_none() {
            found = Some(*candidate);
        } else {
            warn!(target: "dom", question, "question text matches more than one control, using the first");
            break;
        }
    }
    Ok(found)
}

/// Locate a field control: by exact question text among `candidates`, then
/// through the recorded container position. The positional path only serves
/// fields that were stored under a fallback name: it accepts a candidate in
/// that container whose own question text is still underivable.
pub fn locate_by_question_or_position(
    page: &mut dyn Page,
    candidates: &[NodeId],
    question: &str,
    container_index: Option<usize>,
) -> Result<Option<NodeId>, PageError> {
    locate_with(page, candidates, question, container_index, question_text_of)
}

pub fn locate_with<F>(
    page: &mut dyn Page,
    candidates: &[NodeId],
    question: &str,
    container_index: Option<usize>,
    question_of: F,
) -> Result<Option<NodeId>, PageError>
where
    F: Fn(&mut dyn Page, NodeId) -> Result<String, PageError>,
{
    if let Some(found) = find_by_question_with(page, candidates, question, &question_of)? {
        return Ok(Some(found));
    }

    let Some(index) = container_index else {
        return Ok(None);
    };
    let Some(container) = container_at(page, index)? else {
        return Ok(None);
    };
    for candidate in candidates {
        if page.closest(*candidate, markup::QUESTION_CONTAINER)? == Some(container)
            && question_of(page, *candidate)?.is_empty()
        {
            return Ok(Some(*candidate));
        }
    }
    Ok(None)
}

// ============================================================================
// Text helpers
// ============================================================================

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Option text as stored and matched: trimmed, whitespace collapsed, and the
/// ", jawaban untuk ..." suffix that grid-style aria-labels carry removed.
pub fn normalize_option_text(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    // ASCII lowering keeps byte offsets aligned with `collapsed`.
    let lower = collapsed.to_ascii_lowercase();
    match lower.find(", jawaban untuk").or_else(|| lower.find(",jawaban untuk")) {
        Some(idx) => collapsed[..idx].trim().to_string(),
        None => collapsed,
    }
}

/// Appends `text` unless it is empty or already present (exact match).
pub fn push_unique(options: &mut Vec<String>, text: String) {
    if !text.is_empty() && !options.contains(&text) {
        options.push(text);
    }
}
