use serde::{Deserialize, Serialize};

/// Option list stored for a dropdown whose options were not rendered at
/// detection time.
pub const PLACEHOLDER_OPTION: &str = "(Options will be detected on fill)";

// ============================================================================
// Category
// ============================================================================

/// Kind of form question. Wire names follow the stored data format; the
/// descriptive names are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    #[serde(alias = "short-text")]
    Text,
    #[serde(alias = "paragraph")]
    Textarea,
    #[serde(alias = "single-choice")]
    Radio,
    #[serde(alias = "multi-choice")]
    Checkbox,
    Dropdown,
    Date,
    Time,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 7] = [
        FieldCategory::Text,
        FieldCategory::Textarea,
        FieldCategory::Radio,
        FieldCategory::Checkbox,
        FieldCategory::Dropdown,
        FieldCategory::Date,
        FieldCategory::Time,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldCategory::Text => "text",
            FieldCategory::Textarea => "textarea",
            FieldCategory::Radio => "radio",
            FieldCategory::Checkbox => "checkbox",
            FieldCategory::Dropdown => "dropdown",
            FieldCategory::Date => "date",
            FieldCategory::Time => "time",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldCategory::Radio | FieldCategory::Checkbox | FieldCategory::Dropdown
        )
    }

    /// Prefix of the numbered name given to a field without question text.
    pub fn fallback_prefix(&self) -> &'static str {
        match self {
            FieldCategory::Text => "Text Input",
            FieldCategory::Textarea => "Paragraph",
            FieldCategory::Radio => "Multiple Choice",
            FieldCategory::Checkbox => "Checkboxes",
            FieldCategory::Dropdown => "Dropdown",
            FieldCategory::Date => "Date",
            FieldCategory::Time => "Time",
        }
    }

    /// Rank used when two detectors claim the same question; higher wins.
    pub fn specificity(&self) -> u8 {
        match self {
            FieldCategory::Text => 0,
            FieldCategory::Textarea => 1,
            FieldCategory::Radio => 2,
            FieldCategory::Checkbox => 3,
            FieldCategory::Dropdown => 4,
            FieldCategory::Date | FieldCategory::Time => 5,
        }
    }
}

impl std::fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Value
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Single(String::new())
    }
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(value) => value.trim().is_empty(),
            FieldValue::Multiple(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }

    /// The value as one string; a list becomes its first entry.
    pub fn as_single(&self) -> &str {
        match self {
            FieldValue::Single(value) => value,
            FieldValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// The value as a list; a single string becomes a one-element list.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FieldValue::Single(value) if value.is_empty() => Vec::new(),
            FieldValue::Single(value) => vec![value.clone()],
            FieldValue::Multiple(values) => values.clone(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Single(value) => f.write_str(value),
            FieldValue::Multiple(values) => f.write_str(&values.join(", ")),
        }
    }
}

// ============================================================================
// Hints and traits
// ============================================================================

/// Secondary identifiers captured at detection time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorHints {
    /// `aria-labelledby` token list of the control.
    #[serde(default, rename = "ariaLabelledBy", skip_serializing_if = "Option::is_none")]
    pub label_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_params: Option<String>,
    /// Position of the enclosing question container, document order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_index: Option<usize>,
    #[serde(default, rename = "inputId", skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
}

/// Category-specific facts recorded by detectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTraits {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_expansion: bool,
    #[serde(default, rename = "isRating", skip_serializing_if = "std::ops::Not::not")]
    pub rating: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes_year: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
    #[serde(default, rename = "hourInputLabel", skip_serializing_if = "Option::is_none")]
    pub hour_label: Option<String>,
    #[serde(default, rename = "minuteInputLabel", skip_serializing_if = "Option::is_none")]
    pub minute_label: Option<String>,
}

// ============================================================================
// Record
// ============================================================================

/// One detected question: what it asks, what shape its answer has, and
/// what it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    #[serde(rename = "type")]
    pub category: FieldCategory,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub value: FieldValue,
    #[serde(flatten)]
    pub hints: LocatorHints,
    #[serde(flatten)]
    pub traits: FieldTraits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordProblem {
    EmptyQuestion,
    NoOptions,
}

impl std::fmt::Display for RecordProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordProblem::EmptyQuestion => f.write_str("question is empty"),
            RecordProblem::NoOptions => f.write_str("choice field has no options"),
        }
    }
}

impl FieldRecord {
    pub fn new(category: FieldCategory, question: impl Into<String>) -> Self {
        let value = match category {
            FieldCategory::Checkbox => FieldValue::Multiple(Vec::new()),
            _ => FieldValue::default(),
        };
        FieldRecord {
            category,
            question: question.into(),
            options: Vec::new(),
            value,
            hints: LocatorHints::default(),
            traits: FieldTraits::default(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value(mut self, value: FieldValue) -> Self {
        self.value = value;
        self
    }

    pub fn with_single(self, value: impl Into<String>) -> Self {
        self.with_value(FieldValue::Single(value.into()))
    }

    pub fn with_multiple<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_value(FieldValue::Multiple(values.into_iter().map(Into::into).collect()))
    }

    /// Stable identity for traces: SHA-1 of category and question.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(self.category.name().as_bytes());
        hasher.update(b"\x1f");
        hasher.update(self.question.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Checks the invariants a persisted record must hold.
    pub fn validate(&self) -> Result<(), RecordProblem> {
        if self.question.trim().is_empty() {
            return Err(RecordProblem::EmptyQuestion);
        }
        if self.category.is_choice() && self.options.is_empty() {
            return Err(RecordProblem::NoOptions);
        }
        Ok(())
    }
}
