use form_autofill::dom::query::{
    all_question_containers, container_index_of, is_grid_variant, is_visible, question_text_of, resolve_label_ref,
};
use form_autofill::dom::snapshot::SnapshotNode;
use form_autofill::dom::{NodeId, Page};
use form_autofill::error::PageError;

mod common;
use common::forms::*;

// =========================================================================
// Question text
// =========================================================================

#[test]
fn container_heading_names_every_control_inside() {
    let mut doc = page(&survey());
    let checkbox = find(&mut doc, r#"[data-answer-value="Dog"]"#);
    assert_eq!(question_text_of(&mut doc, checkbox).unwrap(), "Pets");

    let hour = find(&mut doc, r#"input[aria-label="Hour"]"#);
    assert_eq!(question_text_of(&mut doc, hour).unwrap(), "Arrival");
}

#[test]
fn labelled_by_reference_is_used_outside_containers() {
    let root = form([
        SnapshotNode::el("span")
            .attr("id", "lbl")
            .child(SnapshotNode::text_node("  Home   town ")),
        text_input("lbl"),
    ]);
    let mut doc = page(&root);
    let input = find(&mut doc, "input");
    assert_eq!(question_text_of(&mut doc, input).unwrap(), "Home town", "Whitespace collapsed");
}

#[test]
fn generic_part_labels_are_skipped() {
    let root = form([
        SnapshotNode::el("span").attr("id", "a").child(SnapshotNode::text_node("Date")),
        SnapshotNode::el("span").attr("id", "b").child(SnapshotNode::text_node("Start of trip")),
        SnapshotNode::el("span").attr("id", "c").child(SnapshotNode::text_node("Leg 1")),
    ]);
    let mut doc = page(&root);
    assert_eq!(resolve_label_ref(&mut doc, "a b c missing", true).unwrap(), "Start of trip - Leg 1");
    assert_eq!(resolve_label_ref(&mut doc, "a b", false).unwrap(), "Date - Start of trip");
}

#[test]
fn untitled_control_has_no_question_text() {
    let mut doc = page(&form([untitled_question(text_input("nowhere"))]));
    let input = find(&mut doc, "input");
    assert_eq!(question_text_of(&mut doc, input).unwrap(), "");
}

// =========================================================================
// Containers, grids, visibility
// =========================================================================

#[test]
fn containers_are_numbered_in_document_order() {
    let mut doc = page(&survey());
    assert_eq!(all_question_containers(&mut doc).unwrap().len(), 9);

    let listbox = find(&mut doc, r#"[role="listbox"]"#);
    assert_eq!(container_index_of(&mut doc, listbox).unwrap(), Some(4));
}

#[test]
fn any_grid_signal_marks_a_grid() {
    let mut doc = page(&survey());
    let groups = find_all(&mut doc, r#"[role="radiogroup"]"#);
    let flags: Vec<bool> = groups
        .iter()
        .map(|g| is_grid_variant(&mut doc, *g).unwrap())
        .collect();
    assert_eq!(flags, vec![false, false, true, true], "Colour, rating, then two grid rows");

    let mut doc = page(&form([SnapshotNode::el("div")
        .attr("role", "radiogroup")
        .attr("data-field-index", "0")]));
    let group = find(&mut doc, r#"[role="radiogroup"]"#);
    assert!(is_grid_variant(&mut doc, group).unwrap(), "Row index alone is enough");
}

#[test]
fn hidden_ancestor_hides_descendants() {
    let mut doc = page(&survey());
    let option = find(&mut doc, r#"[data-value="Jakarta"]"#);
    assert!(!is_visible(&mut doc, option).unwrap(), "Popup starts hidden");

    let input = find(&mut doc, r#"input[aria-labelledby="q1"]"#);
    assert!(is_visible(&mut doc, input).unwrap());
}

// =========================================================================
// Page behavior
// =========================================================================

#[test]
fn stale_handle_and_bad_selector_are_errors() {
    let mut doc = page(&survey());
    assert!(matches!(doc.attr(NodeId(100_000), "id"), Err(PageError::StaleNode(100_000))));
    assert!(matches!(doc.query_all(None, "div:hover"), Err(PageError::UnsupportedSelector(_))));
}

#[test]
fn expansion_is_applied_when_time_passes() {
    let mut doc = page(&survey());
    let listbox = find(&mut doc, r#"[role="listbox"]"#);
    doc.click(listbox).unwrap();
    assert_eq!(attr(&doc, listbox, "aria-expanded").as_deref(), Some("false"), "Not yet");

    doc.pause(100).unwrap();
    assert_eq!(attr(&doc, listbox, "aria-expanded").as_deref(), Some("true"));
    assert_eq!(doc.now_ms(), 100);
}

#[test]
fn label_click_toggles_its_checkbox() {
    let mut doc = page(&survey());
    let fish = find(&mut doc, r#"[data-answer-value="Fish"]"#);
    let label = doc.closest(fish, "label").unwrap().unwrap();
    doc.click(label).unwrap();
    assert!(is_checked(&doc, fish));
    doc.click(fish).unwrap();
    assert!(!is_checked(&doc, fish), "Second click unchecks");
}
