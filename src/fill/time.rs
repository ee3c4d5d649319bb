use crate::detect::composite_question;
use crate::detect::time::{find_hour_input, find_minute_input};
use crate::dom::document::NodeId;
use crate::dom::events::{DomEvent, WriteMode};
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::locate_with;
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome, Filler, Timing, log_fill_result};

/// Hour and minute as the time boxes expect them: the hour unpadded, the
/// minute padded to two digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParts {
    pub hour: String,
    pub minute: String,
}

/// Parses `HH:MM`, `HH.MM`, `HHMM` and their single-digit variants
/// (`9:05`, `9.5`, `905`). Hours run 0-23, minutes 0-59.
pub fn parse_time(raw: &str) -> Option<TimeParts> {
    let value = raw.trim();

    let (hour, minute) = match value.split_once([':', '.']) {
        Some((hour, minute)) => {
            if !is_digits(hour, 1, 2) || !is_digits(minute, 1, 2) {
                return None;
            }
            (hour, minute)
        }
        None => {
            if !is_digits(value, 3, 4) {
                return None;
            }
            value.split_at(value.len() - 2)
        }
    };

    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(TimeParts {
        hour: hour.to_string(),
        minute: format!("{:02}", minute),
    })
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
}

/// Time composites: clears and writes the hour box, then the minute box,
/// pausing between steps so the page can resync the pair.
pub struct TimeFiller {
    timing: Timing,
}

impl TimeFiller {
    pub fn new(timing: Timing) -> Self {
        TimeFiller { timing }
    }

    fn locate(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<Option<NodeId>, PageError> {
        let controllers = page.query_all(None, markup::TIME_CONTROLLER)?;
        locate_with(
            page,
            &controllers,
            &record.question,
            record.hints.container_index,
            |page, node| composite_question(page, node, markup::TIME_LABELLED),
        )
    }

    fn write_part(&self, page: &mut dyn Page, input: NodeId, value: &str) -> Result<(), PageError> {
        let pause = self.timing.short_ms;
        page.scroll_into_view(input)?;
        page.pause(pause)?;
        page.focus(input)?;
        page.pause(pause)?;

        page.set_value(input, "", WriteMode::Assign)?;
        page.dispatch(input, DomEvent::Input)?;
        page.pause(pause)?;

        page.set_value(input, value, WriteMode::Assign)?;
        page.dispatch(input, DomEvent::Input)?;
        page.pause(pause)?;
        page.dispatch(input, DomEvent::Change)?;
        page.pause(pause)?;
        page.blur(input)?;
        page.pause(pause)
    }

    fn apply(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let raw = record.value.as_single();
        if raw.trim().is_empty() {
            return Ok(FillOutcome::failed(FillFailure::EmptyValue));
        }
        let Some(parts) = parse_time(raw) else {
            return Ok(FillOutcome::failed(FillFailure::InvalidValue {
                reason: format!("\"{}\" is not a time of day", raw),
            }));
        };

        let Some(controller) = self.locate(page, record)? else {
            return Ok(FillOutcome::failed(FillFailure::NotFound));
        };
        let hour = find_hour_input(page, controller)?;
        let minute = find_minute_input(page, controller)?;
        let (Some(hour), Some(minute)) = (hour, minute) else {
            return Ok(FillOutcome::failed(FillFailure::NotFound));
        };

        self.write_part(page, hour, &parts.hour)?;
        page.pause(self.timing.short_ms)?;
        self.write_part(page, minute, &parts.minute)?;
        Ok(FillOutcome::filled(2))
    }
}

impl Filler for TimeFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Time
    }

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let outcome = self.apply(page, record)?;
        log_fill_result(record, &outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(hour: &str, minute: &str) -> Option<TimeParts> {
        Some(TimeParts {
            hour: hour.into(),
            minute: minute.into(),
        })
    }

    #[test]
    fn parses_supported_shapes() {
        assert_eq!(parse_time("14:30"), parts("14", "30"));
        assert_eq!(parse_time("14.30"), parts("14", "30"));
        assert_eq!(parse_time("1430"), parts("14", "30"));
        assert_eq!(parse_time("0905"), parts("9", "05"));
        assert_eq!(parse_time("905"), parts("9", "05"));
        assert_eq!(parse_time("9:05"), parts("9", "05"));
    }

    #[test]
    fn single_digit_minute_is_padded() {
        assert_eq!(parse_time("9:5"), parts("9", "05"));
        assert_eq!(parse_time(" 0:0 "), parts("0", "00"));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:60"), None);
        assert_eq!(parse_time("12"), None);
        assert_eq!(parse_time("12:3:4"), None);
        assert_eq!(parse_time("ab:cd"), None);
        assert_eq!(parse_time(""), None);
    }
}
