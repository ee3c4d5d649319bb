//! Selectors and attribute markers of the form renderer's markup.
//!
//! Class names and `jscontroller`/`jsname` tokens are generated by the
//! renderer and change without notice; keeping them in one place is what
//! makes a markup change a one-file fix.

// Form structure
pub const QUESTION_CONTAINER: &str = r#"[role="listitem"]"#;
pub const QUESTION_BLOCK: &str = r#"[jscontroller="sWGJ4b"]"#;
pub const HEADING: &str = r#"[role="heading"]"#;
pub const HEADING_TITLE: &str = ".M7eMe";

// Text controls
pub const TEXT_INPUT: &str = r#"input[type="text"][aria-labelledby]"#;
pub const TEXTAREA: &str = "textarea[aria-labelledby]";

// Single choice
pub const RADIO_GROUP: &str = r#"[role="radiogroup"]"#;
pub const RADIO: &str = r#"[role="radio"]"#;
pub const RATING_MARKER: &str = "data-rating";

// Multi choice
pub const CHECKBOX: &str = r#"[role="checkbox"]"#;
pub const CHECKBOX_CONTROLLER: &str = r#"[jscontroller="sW52Ae"]"#;
pub const GENERIC_LIST: &str = r#"[role="list"]"#;
pub const CHECKBOX_LABEL_TEXT: &str = ".aDTYNe";

// Dropdown
pub const LISTBOX: &str = r#"[role="listbox"]"#;
pub const OPTION: &str = r#"[role="option"]"#;
pub const SELECTED_OPTION: &str = r#"[role="option"][aria-selected="true"]"#;
pub const DROPDOWN_PRESENTATION: &str = r#"[role="presentation"]"#;
pub const DROPDOWN_POPUP: &str = r#"[jsname="V68bde"]"#;
pub const DROPDOWN_OPTION: &str = r#"[jsname="wQNmvb"]"#;
pub const DATA_VALUE_OPTION: &str = "[data-value]";
pub const OPTION_TEXT: &str = ".vRMGwf";
pub const PLACEHOLDER_LABELS: [&str; 2] = ["Choose", "Pilih"];

// Grid signals
pub const GRID_CONTAINER: &str = ".e12QUd";
pub const GRID_CONTROLLER: &str = r#"[jscontroller="tjSPQb"]"#;
pub const GRID_ROW_INDEX: &str = "data-field-index";
pub const GRID_ROW: &str = ".EzyPc";
pub const GRID_CELL_WRAPPER: &str = ".gTGYUd";

// Date
pub const DATE_CONTROLLER: &str = r#"[jscontroller="lLliLe"]"#;
pub const DATE_INPUT: &str = r#"input[type="date"]"#;
pub const DATE_LABELLED: &str = "[aria-labelledby]";

// Time
pub const TIME_CONTROLLER: &str = r#"[jscontroller="OZjhxc"]"#;
pub const TIME_HOUR_INPUT: &str = r#"input[aria-label="Jam"], input[aria-label="Hour"]"#;
pub const TIME_MINUTE_INPUT: &str = r#"input[aria-label="Menit"], input[aria-label="Minute"]"#;
pub const TIME_HOUR_SLOT: &str = r#"[jsname="MKaSrf"]"#;
pub const TIME_MINUTE_SLOT: &str = r#"[jsname="QbtXXe"]"#;
pub const TIME_TEXT_INPUT: &str = r#"input[type="text"]"#;
pub const TIME_LABELLED: &str = r#"[role="group"][aria-labelledby]"#;

/// Sub-labels that name a control part rather than the question.
pub const GENERIC_LABELS: [&str; 4] = ["Date", "Tanggal", "Time", "Waktu"];

/// Escape option that opens a free-text box.
pub const OTHER_OPTION_VALUE: &str = "__other_option__";
