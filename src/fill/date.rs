use chrono::{DateTime, NaiveDate};
use tracing::debug;

use crate::detect::composite_question;
use crate::dom::document::NodeId;
use crate::dom::events::{DomEvent, WriteMode};
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::locate_with;
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome, Filler, Timing, log_fill_result};

const ISO: &str = "%Y-%m-%d";

/// Formats tried after the explicit ISO and day-first forms.
const LOOSE_FORMATS: [&str; 8] = [
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%Y%m%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
];

/// Normalizes a date to `YYYY-MM-DD`.
///
/// Accepts ISO, day/month/year with `/` or `-`, and a handful of common
/// spelled-out forms. Day-first wins for ambiguous numeric dates.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format(ISO).to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_iso(value) {
        return Some(date);
    }

    for separator in ['/', '-'] {
        if let Some(date) = parse_day_first(value, separator) {
            return Some(date);
        }
    }

    for format in LOOSE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
}

fn parse_iso(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, ISO).ok()
}

/// `D/M/YYYY` or `D-M-YYYY`, one or two digit day and month.
fn parse_day_first(value: &str, separator: char) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split(separator).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    };
    if !digits(day, 1, 2) || !digits(month, 1, 2) || !digits(year, 4, 4) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Native date inputs inside date composites. Writes the ISO form, reads it
/// back, and falls back to an attribute write and then the native setter
/// when the page swallows plain assignment.
pub struct DateFiller {
    timing: Timing,
}

impl DateFiller {
    pub fn new(timing: Timing) -> Self {
        DateFiller { timing }
    }

    fn locate(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<Option<NodeId>, PageError> {
        let controllers = page.query_all(None, markup::DATE_CONTROLLER)?;
        let controller = locate_with(
            page,
            &controllers,
            &record.question,
            record.hints.container_index,
            |page, node| composite_question(page, node, markup::DATE_LABELLED),
        )?;
        match controller {
            Some(controller) => page.query(Some(controller), markup::DATE_INPUT),
            None => Ok(None),
        }
    }

    fn write(&self, page: &mut dyn Page, input: NodeId, iso: &str, mode: WriteMode) -> Result<bool, PageError> {
        match mode {
            WriteMode::Assign => {
                page.focus(input)?;
                page.pause(self.timing.short_ms)?;
                page.set_value(input, iso, mode)?;
                page.dispatch(input, DomEvent::Input)?;
                page.pause(self.timing.short_ms)?;
                page.dispatch(input, DomEvent::Change)?;
                page.pause(self.timing.medium_ms)?;
                page.blur(input)?;
                page.pause(self.timing.short_ms)?;
            }
            WriteMode::Attribute | WriteMode::NativeSetter => {
                page.set_value(input, iso, mode)?;
                page.dispatch(input, DomEvent::Input)?;
                page.dispatch(input, DomEvent::Change)?;
                page.pause(self.timing.medium_ms)?;
            }
        }
        Ok(page.value(input)? == iso)
    }

    fn apply(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let raw = record.value.as_single();
        if raw.trim().is_empty() {
            return Ok(FillOutcome::failed(FillFailure::EmptyValue));
        }
        let Some(date) = parse_date(raw) else {
            return Ok(FillOutcome::failed(FillFailure::InvalidValue {
                reason: format!("\"{}\" is not a date", raw),
            }));
        };
        let iso = date.format(ISO).to_string();

        let Some(input) = self.locate(page, record)? else {
            return Ok(FillOutcome::failed(FillFailure::NotFound));
        };

        let max = page
            .attr(input, "max")?
            .filter(|m| !m.is_empty())
            .or_else(|| record.traits.max_date.clone());
        if let Some(max) = max.as_deref().and_then(parse_iso) {
            if date > max {
                return Ok(FillOutcome::failed(FillFailure::InvalidValue {
                    reason: format!("{} is after the latest allowed date {}", iso, max.format(ISO)),
                }));
            }
        }

        page.scroll_into_view(input)?;
        page.pause(self.timing.short_ms)?;
        for mode in [WriteMode::Assign, WriteMode::Attribute, WriteMode::NativeSetter] {
            if self.write(page, input, &iso, mode)? {
                return Ok(FillOutcome::filled(1));
            }
            debug!(target: "filler", ?mode, "date write did not stick, trying next path");
        }

        Ok(FillOutcome::failed(FillFailure::Mismatch {
            expected: iso,
            actual: page.value(input)?,
        }))
    }
}

impl Filler for DateFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Date
    }

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let outcome = self.apply(page, record)?;
        log_fill_result(record, &outcome);
        Ok(outcome)
    }
}
