use crate::field::field_model::{FieldRecord, FieldValue};
use crate::orchestrator::FillSummary;

// ============================================================================
// Console reporter — formatted terminal output
// ============================================================================

/// Format detected fields for terminal output.
///
/// Produces output like:
/// ```text
/// === Detected 2 fields ===
///
///  1. [text]      Full Name = "Jane Doe"
///  2. [radio]     Favourite colour (Red | Green | Blue) = "Green"
/// ```
pub fn format_detection_report(fields: &[FieldRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Detected {} fields ===\n\n", fields.len()));

    for (i, field) in fields.iter().enumerate() {
        let tag = format!("[{}]", field.category);
        out.push_str(&format!("{:>2}. {:<11} {}", i + 1, tag, field.question));
        if !field.options.is_empty() {
            out.push_str(&format!(" ({})", field.options.join(" | ")));
        }
        if !field.value.is_empty() {
            out.push_str(&format!(" = {}", format_value(&field.value)));
        }
        out.push('\n');
    }

    out
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Single(v) => format!("\"{}\"", v),
        FieldValue::Multiple(vs) => format!(
            "[{}]",
            vs.iter().map(|v| format!("\"{}\"", v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Preview of a saved slot: each question with its stored answer.
///
/// ```text
/// === Saved data for 2 fields ===
///
/// Full Name
///     Jane Doe
/// Pets
///     Cat, Dog
/// ```
pub fn format_saved_report(records: &[FieldRecord]) -> String {
    if records.is_empty() {
        return "No saved data yet\n".to_string();
    }

    let mut out = format!("=== Saved data for {} fields ===\n\n", records.len());
    for record in records {
        let answer = match &record.value {
            _ if record.value.is_empty() => "(empty)".to_string(),
            FieldValue::Single(v) => v.clone(),
            FieldValue::Multiple(vs) => vs.join(", "),
        };
        out.push_str(&format!("{}\n    {}\n", record.question, answer));
    }
    out
}

/// Format a fill pass for terminal output.
///
/// ```text
/// ✓ FILLED  [text] Full Name
/// ✗ FAILED  [dropdown] City — timed out waiting for dropdown expansion
///
/// === Results: 1 filled, 1 failed (2 total) ===
/// ```
pub fn format_fill_report(summary: &FillSummary) -> String {
    let mut out = String::new();

    for entry in &summary.outcomes {
        match &entry.outcome.failure {
            None => {
                let note = if entry.outcome.changes == 0 { " (unchanged)" } else { "" };
                out.push_str(&format!(
                    "\u{2713} FILLED  [{}] {}{}\n",
                    entry.category, entry.question, note
                ));
            }
            Some(failure) => {
                out.push_str(&format!(
                    "\u{2717} FAILED  [{}] {} \u{2014} {}\n",
                    entry.category, entry.question, failure
                ));
                if let Some(stage) = entry.outcome.stage {
                    out.push_str(&format!("    stopped at {:?}\n", stage));
                }
            }
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} filled, {} failed",
        summary.filled, summary.failed
    ));
    if summary.skipped_no_filler > 0 {
        out.push_str(&format!(", {} unsupported", summary.skipped_no_filler));
    }
    out.push_str(&format!(" ({} total) ===\n", summary.outcomes.len()));

    out
}
