#![allow(dead_code)]

use form_autofill::dom::host::FormsHost;
use form_autofill::dom::snapshot::SnapshotNode;
use form_autofill::dom::{Document, NodeId, Page};

// ============================================================================
// Markup builders shaped like a rendered survey page
// ============================================================================

fn div() -> SnapshotNode {
    SnapshotNode::el("div")
}

fn span_text(class: &str, text: &str) -> SnapshotNode {
    SnapshotNode::el("span")
        .attr("class", class)
        .child(SnapshotNode::text_node(text))
}

/// Heading with the title span and a required-marker asterisk.
pub fn heading(title: &str, id: &str) -> SnapshotNode {
    div()
        .attr("role", "heading")
        .attr("id", id)
        .child(span_text("M7eMe", title))
        .child(span_text("vnumgf", "*"))
}

/// A question container: heading first, then the control markup.
pub fn question(title: &str, id: &str, body: SnapshotNode) -> SnapshotNode {
    div().attr("role", "listitem").child(
        div()
            .attr("jscontroller", "sWGJ4b")
            .child(heading(title, id))
            .child(body),
    )
}

/// A question container with no heading at all.
pub fn untitled_question(body: SnapshotNode) -> SnapshotNode {
    div()
        .attr("role", "listitem")
        .child(div().attr("jscontroller", "sWGJ4b").child(body))
}

pub fn text_input(label_ref: &str) -> SnapshotNode {
    SnapshotNode::el("input")
        .attr("type", "text")
        .attr("aria-labelledby", label_ref)
}

pub fn textarea(label_ref: &str) -> SnapshotNode {
    SnapshotNode::el("textarea").attr("aria-labelledby", label_ref)
}

fn radio(label: &str, checked: bool) -> SnapshotNode {
    div()
        .attr("role", "radio")
        .attr("aria-label", label)
        .attr("data-value", label)
        .attr("aria-checked", if checked { "true" } else { "false" })
}

pub fn radio_group(options: &[&str], checked: Option<&str>) -> SnapshotNode {
    div()
        .attr("role", "radiogroup")
        .children(options.iter().map(|o| radio(o, checked == Some(*o))))
}

/// Star rating: `active` of `stars` already lit.
pub fn rating_group(stars: usize, active: usize) -> SnapshotNode {
    div()
        .attr("role", "radiogroup")
        .attr("data-rating", "")
        .children((1..=stars).map(|n| radio(&n.to_string(), n <= active)))
}

fn checkbox(label: &str, checked: bool) -> SnapshotNode {
    SnapshotNode::el("label")
        .child(
            div()
                .attr("role", "checkbox")
                .attr("data-answer-value", label)
                .attr("aria-checked", if checked { "true" } else { "false" }),
        )
        .child(span_text("aDTYNe", label))
}

pub fn checkbox_group(options: &[&str], checked: &[&str]) -> SnapshotNode {
    div().attr("jscontroller", "sW52Ae").child(
        div()
            .attr("role", "list")
            .children(options.iter().map(|o| checkbox(o, checked.contains(o)))),
    )
}

fn option(value: &str, selected: bool) -> SnapshotNode {
    div()
        .attr("role", "option")
        .attr("data-value", value)
        .attr("aria-selected", if selected { "true" } else { "false" })
        .child(span_text("vRMGwf", value))
}

fn placeholder(selected: bool) -> SnapshotNode {
    div()
        .attr("role", "option")
        .attr("data-value", "")
        .attr("aria-selected", if selected { "true" } else { "false" })
        .child(span_text("vRMGwf", "Choose"))
}

/// Collapsed listbox: placeholder in the presentation layer, options in a
/// hidden popup.
pub fn dropdown(options: &[&str], selected: Option<&str>) -> SnapshotNode {
    div()
        .attr("role", "listbox")
        .attr("aria-expanded", "false")
        .child(
            div()
                .attr("role", "presentation")
                .child(placeholder(selected.is_none())),
        )
        .child(
            div()
                .attr("jsname", "V68bde")
                .attr("style", "display: none")
                .children(options.iter().map(|o| option(o, selected == Some(*o)))),
        )
}

/// Listbox whose options sit in the presentation layer; the popup is empty.
pub fn inline_dropdown(options: &[&str]) -> SnapshotNode {
    div()
        .attr("role", "listbox")
        .attr("aria-expanded", "false")
        .child(
            div()
                .attr("role", "presentation")
                .child(placeholder(true))
                .children(options.iter().map(|o| option(o, false))),
        )
        .child(div().attr("jsname", "V68bde").attr("style", "display: none"))
}

/// Listbox that renders nothing until first expanded.
pub fn lazy_dropdown() -> SnapshotNode {
    div()
        .attr("role", "listbox")
        .attr("aria-expanded", "false")
        .child(div().attr("role", "presentation").child(placeholder(true)))
        .child(div().attr("jsname", "V68bde").attr("style", "display: none"))
}

pub fn date_input(value: &str, max: Option<&str>) -> SnapshotNode {
    let mut input = SnapshotNode::el("input")
        .attr("type", "date")
        .attr("value", value);
    if let Some(max) = max {
        input = input.attr("max", max);
    }
    div()
        .attr("jscontroller", "lLliLe")
        .attr("data-includesyear", "true")
        .attr("data-supportsdate", "true")
        .child(input)
}

/// Hour and minute boxes; both carry `aria-labelledby` like real short
/// answers do.
pub fn time_input(label_ref: &str, hour: &str, minute: &str) -> SnapshotNode {
    let part = |label: &str, value: &str| {
        SnapshotNode::el("input")
            .attr("type", "text")
            .attr("aria-label", label)
            .attr("aria-labelledby", label_ref)
            .attr("value", value)
    };
    div().attr("jscontroller", "OZjhxc").child(
        div()
            .attr("role", "group")
            .attr("aria-labelledby", label_ref)
            .child(part("Hour", hour))
            .child(part("Minute", minute)),
    )
}

/// Matrix question: one radio row per entry of `rows`.
pub fn grid(rows: &[&str], columns: &[&str]) -> SnapshotNode {
    div().attr("class", "e12QUd").children(rows.iter().enumerate().map(|(i, row)| {
        div()
            .attr("role", "radiogroup")
            .attr("aria-label", row)
            .attr("data-field-index", &i.to_string())
            .children(columns.iter().map(|c| radio(c, false)))
    }))
}

pub fn form(questions: impl IntoIterator<Item = SnapshotNode>) -> SnapshotNode {
    SnapshotNode::el("body").child(SnapshotNode::el("form").children(questions))
}

/// One question of every kind, all unanswered, plus a grid.
pub fn survey() -> SnapshotNode {
    form([
        question("Full Name", "q1", text_input("q1")),
        question("Comments", "q2", textarea("q2")),
        question("Favourite colour", "q3", radio_group(&["Red", "Green", "Blue"], None)),
        question("Pets", "q4", checkbox_group(&["Cat", "Dog", "Fish"], &[])),
        question("City", "q5", dropdown(&["Jakarta", "Bandung", "Surabaya"], None)),
        question("Birthday", "q6", date_input("", None)),
        question("Arrival", "q7", time_input("q7", "", "")),
        question("Satisfaction", "q8", rating_group(5, 0)),
        question("Weekly schedule", "q9", grid(&["Monday", "Tuesday"], &["Morning", "Evening"])),
    ])
}

// ============================================================================
// Documents
// ============================================================================

pub fn page(root: &SnapshotNode) -> Document {
    Document::from_snapshot(root).with_host(FormsHost::new())
}

pub fn page_with(root: &SnapshotNode, host: FormsHost) -> Document {
    Document::from_snapshot(root).with_host(host)
}

/// First node matching `selector`; panics when there is none.
pub fn find(doc: &mut Document, selector: &str) -> NodeId {
    doc.query(None, selector)
        .expect("selector parses")
        .unwrap_or_else(|| panic!("no node matches {}", selector))
}

pub fn find_all(doc: &mut Document, selector: &str) -> Vec<NodeId> {
    doc.query_all(None, selector).expect("selector parses")
}

pub fn attr(doc: &Document, node: NodeId, name: &str) -> Option<String> {
    doc.tree().attr(node, name).map(str::to_string)
}

pub fn is_checked(doc: &Document, node: NodeId) -> bool {
    doc.tree().attr(node, "aria-checked") == Some("true")
}
