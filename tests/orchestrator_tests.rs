use form_autofill::detect::{Detector, RadioDetector};
use form_autofill::dom::Page;
use form_autofill::dom::snapshot::SnapshotNode;
use form_autofill::error::PageError;
use form_autofill::field::field_model::{FieldCategory, FieldRecord, FieldValue};
use form_autofill::fill::{FillFailure, FillOutcome, Filler, Timing};
use form_autofill::orchestrator::{CancelFlag, Orchestrator, Registry, handle_line};
use form_autofill::store::{FormStore, MemoryStore, SAVED_FORM_DATA};
use form_autofill::trace::logger::TraceLogger;

mod common;
use common::forms::*;

// ============================================================================
// Test doubles
// ============================================================================

struct BrokenDetector;

impl Detector for BrokenDetector {
    fn category(&self) -> FieldCategory {
        FieldCategory::Text
    }

    fn detect(&self, _page: &mut dyn Page) -> Result<Vec<FieldRecord>, PageError> {
        Err(PageError::SessionIo("pipe closed".into()))
    }
}

struct BrokenFiller;

impl Filler for BrokenFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Text
    }

    fn fill(&self, _page: &mut dyn Page, _record: &FieldRecord) -> Result<FillOutcome, PageError> {
        Err(PageError::StaleNode(7))
    }
}

/// Fills nothing and pulls the cancel switch.
struct CancellingFiller(CancelFlag);

impl Filler for CancellingFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Text
    }

    fn fill(&self, _page: &mut dyn Page, _record: &FieldRecord) -> Result<FillOutcome, PageError> {
        self.0.cancel();
        Ok(FillOutcome::filled(1))
    }
}

fn answers(fields: &mut [FieldRecord]) {
    for field in fields.iter_mut() {
        field.value = match field.question.as_str() {
            "Full Name" => FieldValue::Single("Jane Doe".into()),
            "Comments" => FieldValue::Single("Quick and friendly".into()),
            "Favourite colour" => FieldValue::Single("Green".into()),
            "Satisfaction" => FieldValue::Single("4".into()),
            "Pets" => FieldValue::Multiple(vec!["Cat".into(), "Fish".into()]),
            "City" => FieldValue::Single("Surabaya".into()),
            "Birthday" => FieldValue::Single("25/12/1990".into()),
            "Arrival" => FieldValue::Single("9:5".into()),
            other => panic!("unexpected question {}", other),
        };
    }
}

// ============================================================================
// Detection merge
// ============================================================================

#[test]
fn more_specific_category_wins_a_shared_question() {
    let root = form([
        question("City", "q1", text_input("q1")),
        question("City", "q2", dropdown(&["Jakarta", "Bandung"], None)),
    ]);
    let mut doc = page(&root);
    let registry = Registry::standard(&Timing::default());
    let fields = Orchestrator::new(&registry).detect_all(&mut doc).unwrap();

    assert_eq!(fields.len(), 1, "Question reported once");
    assert_eq!(fields[0].category, FieldCategory::Dropdown);
}

#[test]
fn same_category_questions_sharing_a_title_are_reported_once() {
    let root = form([
        question("Full Name", "q1", text_input("q1")),
        question("Full Name", "q2", text_input("q2")),
    ]);
    let mut doc = page(&root);
    let registry = Registry::standard(&Timing::default());
    let fields = Orchestrator::new(&registry).detect_all(&mut doc).unwrap();

    assert_eq!(fields.len(), 1, "One record per question text");
    assert_eq!(fields[0].hints.label_ref.as_deref(), Some("q1"), "First occurrence kept");
}

#[test]
fn failing_detector_does_not_sink_the_others() {
    let mut doc = page(&survey());
    let registry = Registry::empty()
        .with_detector(BrokenDetector)
        .with_detector(RadioDetector);
    let fields = Orchestrator::new(&registry).detect_all(&mut doc).unwrap();
    assert_eq!(fields.len(), 2, "Colour and rating still detected");

    let registry = Registry::empty().with_detector(BrokenDetector);
    assert!(Orchestrator::new(&registry).detect_all(&mut doc).is_err(), "Nothing ran at all");
}

// ============================================================================
// Fill passes
// ============================================================================

#[test]
fn detect_fill_detect_round_trip() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut doc = page(&survey());

    let mut fields = orchestrator.detect_all(&mut doc).unwrap();
    answers(&mut fields);
    let summary = orchestrator.fill_all(&mut doc, &fields);
    assert!(summary.all_filled(), "Failures: {:?}", summary.outcomes);
    assert_eq!(summary.filled, 8);

    let after = orchestrator.detect_all(&mut doc).unwrap();
    let value = |q: &str| after.iter().find(|f| f.question == q).unwrap().value.clone();
    assert_eq!(value("Full Name"), FieldValue::Single("Jane Doe".into()));
    assert_eq!(value("Favourite colour"), FieldValue::Single("Green".into()));
    assert_eq!(value("Satisfaction"), FieldValue::Single("4".into()));
    assert_eq!(value("Pets"), FieldValue::Multiple(vec!["Cat".into(), "Fish".into()]));
    assert_eq!(value("City"), FieldValue::Single("Surabaya".into()));
    assert_eq!(value("Birthday"), FieldValue::Single("1990-12-25".into()));
    assert_eq!(value("Arrival"), FieldValue::Single("09:05".into()));
}

#[test]
fn refilling_a_filled_page_changes_no_choices() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut doc = page(&survey());

    let mut fields = orchestrator.detect_all(&mut doc).unwrap();
    answers(&mut fields);
    orchestrator.fill_all(&mut doc, &fields);

    let current = orchestrator.detect_all(&mut doc).unwrap();
    let summary = orchestrator.fill_all(&mut doc, &current);
    assert!(summary.all_filled());
    for entry in &summary.outcomes {
        if matches!(entry.category, FieldCategory::Radio | FieldCategory::Checkbox) {
            assert_eq!(entry.outcome.changes, 0, "{} was touched again", entry.question);
        }
    }
}

#[test]
fn page_error_on_one_record_is_isolated() {
    let registry = Registry::standard(&Timing::default()).with_filler(BrokenFiller);
    let mut doc = page(&survey());
    let records = vec![
        FieldRecord::new(FieldCategory::Text, "Full Name").with_single("Jane"),
        FieldRecord::new(FieldCategory::Radio, "Favourite colour")
            .with_options(["Red", "Green", "Blue"])
            .with_single("Blue"),
    ];

    let summary = Orchestrator::new(&registry).fill_all(&mut doc, &records);
    assert_eq!(summary.filled, 1);
    assert_eq!(summary.failed, 1);
    assert!(matches!(
        &summary.outcomes[0].outcome.failure,
        Some(FillFailure::PageError { message }) if message.contains("Stale node")
    ));
    assert!(summary.outcomes[1].outcome.is_success(), "Later record still filled");
}

#[test]
fn cancel_marks_remaining_records() {
    let cancel = CancelFlag::new();
    let registry = Registry::standard(&Timing::default()).with_filler(CancellingFiller(cancel.clone()));
    let orchestrator = Orchestrator::new(&registry).with_cancel(cancel);
    let mut doc = page(&survey());
    let records = vec![
        FieldRecord::new(FieldCategory::Text, "Full Name").with_single("Jane"),
        FieldRecord::new(FieldCategory::Radio, "Favourite colour")
            .with_options(["Red"])
            .with_single("Red"),
        FieldRecord::new(FieldCategory::Checkbox, "Pets")
            .with_options(["Cat"])
            .with_multiple(["Cat"]),
    ];

    let summary = orchestrator.fill_all(&mut doc, &records);
    assert_eq!(summary.filled, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.outcomes[2].outcome.failure, Some(FillFailure::Cancelled));
    assert!(orchestrator.cancel_flag().is_cancelled());
}

#[test]
fn missing_filler_counts_as_unsupported() {
    let registry = Registry::empty();
    let mut doc = page(&survey());
    let records = vec![FieldRecord::new(FieldCategory::Text, "Full Name").with_single("Jane")];

    let summary = Orchestrator::new(&registry).fill_all(&mut doc, &records);
    assert_eq!(summary.skipped_no_filler, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.error_count(), 1);
    assert!(!summary.all_filled());
}

#[test]
fn tracer_writes_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("traces").join("run-1.jsonl");
    let tracer = TraceLogger::new(&path);
    assert!(tracer.is_enabled(), "Missing trace directory is created");

    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry).with_tracer(&tracer);
    let mut doc = page(&survey());
    let records = vec![
        FieldRecord::new(FieldCategory::Text, "Full Name").with_single("Jane"),
        FieldRecord::new(FieldCategory::Text, "Shoe size").with_single("42"),
    ];
    orchestrator.fill_all(&mut doc, &records);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["outcome"], "filled");
    assert_eq!(lines[1]["outcome"], "failed");
    assert_eq!(lines[1]["reason"], "control not found");
    assert_eq!(lines[1]["step"], 1);
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn save_then_load_and_fill_restores_answers() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut store = MemoryStore::new();

    let mut filled = page(&survey());
    let mut fields = orchestrator.detect_all(&mut filled).unwrap();
    answers(&mut fields);
    orchestrator.fill_all(&mut filled, &fields);

    let saved = handle_line(&orchestrator, &mut filled, &mut store, r#"{"action":"saveFormData"}"#);
    assert!(saved.success, "Save failed: {:?}", saved.error);
    assert_eq!(store.load(SAVED_FORM_DATA).unwrap().map(|r| r.len()), Some(8));

    let mut blank = page(&survey());
    let response = handle_line(&orchestrator, &mut blank, &mut store, r#"{"action":"loadAndFill"}"#);
    assert!(response.success);
    assert_eq!(response.filled_count, Some(8));
    assert_eq!(response.error_count, Some(0));

    let detected = handle_line(&orchestrator, &mut blank, &mut store, r#"{"action":"detectFields"}"#);
    let fields = detected.fields.unwrap();
    let city = fields.iter().find(|f| f.question == "City").unwrap();
    assert_eq!(city.value.as_single(), "Surabaya");
}

#[test]
fn fill_form_reports_counts_even_when_records_fail() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut store = MemoryStore::new();
    let mut doc = page(&survey());

    let line = r#"{"action":"fillForm","data":[
        {"type":"text","question":"Full Name","value":"Jane Doe"},
        {"type":"dropdown","question":"City","options":["Jakarta"],"value":"Medan"}
    ]}"#
    .replace('\n', "");
    let response = handle_line(&orchestrator, &mut doc, &mut store, &line);
    assert!(response.success, "A fill pass always answers success");
    assert_eq!(response.filled_count, Some(1));
    assert_eq!(response.error_count, Some(1));
}

#[test]
fn clear_and_empty_load_are_not_errors() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut store = MemoryStore::new();
    store
        .save(SAVED_FORM_DATA, &[FieldRecord::new(FieldCategory::Text, "Full Name")])
        .unwrap();
    let mut doc = page(&survey());

    let cleared = handle_line(&orchestrator, &mut doc, &mut store, r#"{"action":"clearData"}"#);
    assert!(cleared.success);
    assert_eq!(store.load(SAVED_FORM_DATA).unwrap(), None);

    let response = handle_line(&orchestrator, &mut doc, &mut store, r#"{"action":"loadAndFill"}"#);
    assert!(response.success);
    assert_eq!(response.filled_count, Some(0));
}

#[test]
fn bad_requests_come_back_as_failures() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut store = MemoryStore::new();
    let mut doc = page(&SnapshotNode::el("body"));

    let unknown = handle_line(&orchestrator, &mut doc, &mut store, r#"{"action":"submitForm"}"#);
    assert!(!unknown.success);
    assert_eq!(unknown.error.as_deref(), Some("Unknown action: submitForm"));

    let nothing = handle_line(&orchestrator, &mut doc, &mut store, r#"{"action":"saveFormData"}"#);
    assert!(!nothing.success);
    assert_eq!(nothing.error.as_deref(), Some("no fields detected"));
}

#[test]
fn saving_drops_records_that_cannot_be_persisted() {
    let registry = Registry::standard(&Timing::default());
    let orchestrator = Orchestrator::new(&registry);
    let mut store = MemoryStore::new();
    let mut doc = page(&survey());

    let invalid_only = r#"{"action":"saveFormData","data":[
        {"type":"text","question":""},
        {"type":"radio","question":"Colour","options":[]}
    ]}"#
    .replace('\n', "");
    let response = handle_line(&orchestrator, &mut doc, &mut store, &invalid_only);
    assert!(!response.success, "Nothing valid to save");
    assert_eq!(response.error.as_deref(), Some("no valid fields to save"));
    assert_eq!(store.load(SAVED_FORM_DATA).unwrap(), None, "Store untouched");

    let mixed = r#"{"action":"saveFormData","data":[
        {"type":"text","question":"   ","value":"x"},
        {"type":"text","question":"Full Name","value":"Jane Doe"}
    ]}"#
    .replace('\n', "");
    let response = handle_line(&orchestrator, &mut doc, &mut store, &mixed);
    assert!(response.success, "Save failed: {:?}", response.error);
    let saved = store.load(SAVED_FORM_DATA).unwrap().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].question, "Full Name");

    store
        .save("draft", &[FieldRecord::new(FieldCategory::Checkbox, "Pets")])
        .unwrap();
    assert_eq!(store.load("draft").unwrap(), Some(Vec::new()), "Direct saves are filtered too");
}
