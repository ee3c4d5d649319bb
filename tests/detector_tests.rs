use form_autofill::detect::{
    CheckboxDetector, DateDetector, Detector, DropdownDetector, RadioDetector, TextDetector, TimeDetector,
};
use form_autofill::dom::snapshot::SnapshotNode;
use form_autofill::field::field_model::{FieldCategory, FieldValue, PLACEHOLDER_OPTION};
use form_autofill::fill::Timing;
use form_autofill::orchestrator::{Orchestrator, Registry};

mod common;
use common::forms::*;

// ============================================================================
// Whole-page detection
// ============================================================================

#[test]
fn survey_yields_one_record_per_question() {
    let mut doc = page(&survey());
    let registry = Registry::standard(&Timing::default());
    let fields = Orchestrator::new(&registry).detect_all(&mut doc).unwrap();

    let found: Vec<(FieldCategory, &str)> = fields
        .iter()
        .map(|f| (f.category, f.question.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (FieldCategory::Text, "Full Name"),
            (FieldCategory::Textarea, "Comments"),
            (FieldCategory::Radio, "Favourite colour"),
            (FieldCategory::Radio, "Satisfaction"),
            (FieldCategory::Checkbox, "Pets"),
            (FieldCategory::Dropdown, "City"),
            (FieldCategory::Date, "Birthday"),
            (FieldCategory::Time, "Arrival"),
        ],
        "Every question once, grouped by detector order"
    );
}

#[test]
fn heading_asterisk_never_reaches_question_text() {
    let mut doc = page(&survey());
    let fields = TextDetector::short_text().detect(&mut doc).unwrap();
    assert_eq!(fields[0].question, "Full Name");
    assert_eq!(fields[0].hints.label_ref.as_deref(), Some("q1"));
    assert_eq!(fields[0].hints.container_index, Some(0));
}

#[test]
fn grid_rows_are_not_reported_as_choice_questions() {
    let root = form([question(
        "Weekly schedule",
        "g1",
        grid(&["Monday", "Tuesday"], &["Morning", "Evening"]),
    )]);
    let mut doc = page(&root);
    assert!(RadioDetector.detect(&mut doc).unwrap().is_empty(), "Grid radio rows skipped");
    assert!(CheckboxDetector.detect(&mut doc).unwrap().is_empty());
}

#[test]
fn controls_nested_in_a_grid_are_skipped_by_every_detector() {
    let in_grid = |body: SnapshotNode| SnapshotNode::el("div").attr("class", "e12QUd").child(body);
    let root = form([
        question("Notes", "q1", in_grid(text_input("q1"))),
        question("Start", "q2", in_grid(date_input("", None))),
        question("Arrival", "q3", in_grid(time_input("q3", "", ""))),
    ]);
    let mut doc = page(&root);
    assert!(TextDetector::short_text().detect(&mut doc).unwrap().is_empty());
    assert!(DateDetector.detect(&mut doc).unwrap().is_empty());
    assert!(TimeDetector.detect(&mut doc).unwrap().is_empty());
}

// ============================================================================
// Per-category details
// ============================================================================

#[test]
fn radio_detection_reads_options_and_checked_label() {
    let root = form([question(
        "Favourite colour",
        "q1",
        radio_group(&["Red", "Green", "Blue"], Some("Green")),
    )]);
    let mut doc = page(&root);
    let fields = RadioDetector.detect(&mut doc).unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].options, vec!["Red", "Green", "Blue"]);
    assert_eq!(fields[0].value, FieldValue::Single("Green".into()));
    assert!(!fields[0].traits.rating);
}

#[test]
fn other_option_is_left_out_of_radio_options() {
    let group = SnapshotNode::el("div")
        .attr("role", "radiogroup")
        .child(
            SnapshotNode::el("div")
                .attr("role", "radio")
                .attr("data-value", "Yes")
                .attr("aria-checked", "false"),
        )
        .child(
            SnapshotNode::el("div")
                .attr("role", "radio")
                .attr("data-value", "__other_option__")
                .attr("aria-checked", "false"),
        );
    let mut doc = page(&form([question("Agree?", "q1", group)]));
    let fields = RadioDetector.detect(&mut doc).unwrap();
    assert_eq!(fields[0].options, vec!["Yes"], "Other escape option excluded");
}

#[test]
fn rating_reports_active_star_count() {
    let mut doc = page(&form([question("Satisfaction", "q1", rating_group(5, 3))]));
    let fields = RadioDetector.detect(&mut doc).unwrap();
    assert!(fields[0].traits.rating);
    assert_eq!(fields[0].options, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(fields[0].value.as_single(), "3");
}

#[test]
fn checkbox_detection_collects_checked_labels() {
    let root = form([question(
        "Pets",
        "q1",
        checkbox_group(&["Cat", "Dog", "Fish"], &["Dog", "Fish"]),
    )]);
    let mut doc = page(&root);
    let fields = CheckboxDetector.detect(&mut doc).unwrap();
    assert_eq!(fields.len(), 1, "One record per group, not per checkbox");
    assert_eq!(fields[0].options, vec!["Cat", "Dog", "Fish"]);
    assert_eq!(fields[0].value, FieldValue::Multiple(vec!["Dog".into(), "Fish".into()]));
}

#[test]
fn dropdown_detection_skips_placeholder_and_reads_selection() {
    let root = form([question("City", "q1", dropdown(&["Jakarta", "Bandung"], Some("Bandung")))]);
    let mut doc = page(&root);
    let fields = DropdownDetector.detect(&mut doc).unwrap();
    assert_eq!(fields[0].options, vec!["Jakarta", "Bandung"]);
    assert_eq!(fields[0].value.as_single(), "Bandung");
    assert!(!fields[0].traits.needs_expansion);
}

#[test]
fn unrendered_dropdown_is_marked_for_expansion() {
    let mut doc = page(&form([question("City", "q1", lazy_dropdown())]));
    let fields = DropdownDetector.detect(&mut doc).unwrap();
    assert!(fields[0].traits.needs_expansion);
    assert_eq!(fields[0].options, vec![PLACEHOLDER_OPTION]);
    assert_eq!(fields[0].value.as_single(), "", "Placeholder selection reads as empty");
}

#[test]
fn date_detection_reads_value_and_traits() {
    let root = form([question("Birthday", "q1", date_input("2001-02-03", Some("2024-12-31")))]);
    let mut doc = page(&root);
    let fields = DateDetector.detect(&mut doc).unwrap();
    assert_eq!(fields[0].value.as_single(), "2001-02-03");
    assert_eq!(fields[0].traits.includes_year, Some(true));
    assert_eq!(fields[0].traits.supports_date, Some(true));
    assert_eq!(fields[0].traits.max_date.as_deref(), Some("2024-12-31"));
}

#[test]
fn time_boxes_form_one_time_record_and_no_text_records() {
    let mut doc = page(&form([question("Arrival", "q1", time_input("q1", "9", "5"))]));

    let times = TimeDetector.detect(&mut doc).unwrap();
    assert_eq!(times.len(), 1);
    assert_eq!(times[0].value.as_single(), "09:05", "Parts are zero-padded");
    assert_eq!(times[0].traits.hour_label.as_deref(), Some("Hour"));
    assert_eq!(times[0].traits.minute_label.as_deref(), Some("Minute"));

    assert!(
        TextDetector::short_text().detect(&mut doc).unwrap().is_empty(),
        "Hour and minute boxes are not short answers"
    );
}

#[test]
fn hidden_duplicate_text_input_is_skipped() {
    let body = SnapshotNode::el("div")
        .child(text_input("q1"))
        .child(
            SnapshotNode::el("div")
                .attr("style", "display: none")
                .child(text_input("q1")),
        );
    let mut doc = page(&form([question("Full Name", "q1", body)]));
    assert_eq!(TextDetector::short_text().detect(&mut doc).unwrap().len(), 1);
}

// ============================================================================
// Fallback names
// ============================================================================

#[test]
fn untitled_questions_get_numbered_fallback_names() {
    let root = form([
        untitled_question(text_input("nowhere")),
        untitled_question(radio_group(&["A", "B"], None)),
    ]);
    let mut doc = page(&root);

    let texts = TextDetector::short_text().detect(&mut doc).unwrap();
    assert_eq!(texts[0].question, "Text Input 1", "Numbered by question container");

    let radios = RadioDetector.detect(&mut doc).unwrap();
    assert_eq!(radios[0].question, "Multiple Choice 2");
    assert_eq!(radios[0].hints.container_index, Some(1));
}

#[test]
fn aria_label_names_a_control_outside_any_container() {
    let root = form([SnapshotNode::el("input")
        .attr("type", "text")
        .attr("aria-labelledby", "missing")
        .attr("aria-label", "Nickname")]);
    let mut doc = page(&root);
    let texts = TextDetector::short_text().detect(&mut doc).unwrap();
    assert_eq!(texts[0].question, "Nickname");
    assert_eq!(texts[0].hints.container_index, None);
}
