use crate::detect::radio::{current_answer, option_radios};
use crate::detect::{is_checked, radio_label};
use crate::dom::document::NodeId;
use crate::dom::events::pointer_select;
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, locate_by_question_or_position};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome, Filler, Timing, log_fill_result};

/// Single-choice groups and star ratings.
///
/// A rating is answered with a star count, compared against the number of
/// active stars. Everything else is matched by option label or value
/// token. The pointer sequence is only sent when the page disagrees.
pub struct RadioFiller {
    timing: Timing,
}

impl RadioFiller {
    pub fn new(timing: Timing) -> Self {
        RadioFiller { timing }
    }

    fn locate(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<Option<NodeId>, PageError> {
        let mut groups = Vec::new();
        for group in page.query_all(None, markup::RADIO_GROUP)? {
            if !is_grid_variant(page, group)? {
                groups.push(group);
            }
        }
        locate_by_question_or_position(page, &groups, &record.question, record.hints.container_index)
    }

    fn fill_rating(&self, page: &mut dyn Page, group: NodeId, value: &str) -> Result<FillOutcome, PageError> {
        let stars = option_radios(page, group)?;
        let target = match value.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= stars.len() => n,
            _ => {
                return Ok(FillOutcome::failed(FillFailure::InvalidValue {
                    reason: format!("rating \"{}\" is not between 1 and {}", value, stars.len()),
                }));
            }
        };

        if current_answer(page, group, true)? == target.to_string() {
            return Ok(FillOutcome::filled(0));
        }

        let star = stars[target - 1];
        page.scroll_into_view(star)?;
        pointer_select(page, star, self.timing.short_ms)?;
        page.pause(self.timing.medium_ms)?;

        let actual = current_answer(page, group, true)?;
        if actual == target.to_string() {
            Ok(FillOutcome::filled(1))
        } else {
            Ok(FillOutcome::failed(FillFailure::Mismatch {
                expected: target.to_string(),
                actual,
            }))
        }
    }

    fn fill_choice(&self, page: &mut dyn Page, group: NodeId, value: &str) -> Result<FillOutcome, PageError> {
        let mut target = None;
        let mut available = Vec::new();
        for radio in option_radios(page, group)? {
            let label = radio_label(page, radio)?;
            let token = page.attr(radio, "data-value")?;
            if target.is_none() && (label == value || token.as_deref() == Some(value)) {
                target = Some(radio);
            }
            available.push(label);
        }
        let Some(radio) = target else {
            return Ok(FillOutcome::failed(FillFailure::NoMatchingOption {
                requested: value.to_string(),
                available,
            }));
        };

        if is_checked(page, radio)? {
            return Ok(FillOutcome::filled(0));
        }

        page.scroll_into_view(radio)?;
        pointer_select(page, radio, self.timing.short_ms)?;
        page.pause(self.timing.medium_ms)?;

        if is_checked(page, radio)? {
            Ok(FillOutcome::filled(1))
        } else {
            Ok(FillOutcome::failed(FillFailure::Mismatch {
                expected: value.to_string(),
                actual: current_answer(page, group, false)?,
            }))
        }
    }
}

impl Filler for RadioFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Radio
    }

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let value = record.value.as_single().trim();
        let outcome = if value.is_empty() {
            FillOutcome::failed(FillFailure::EmptyValue)
        } else {
            match self.locate(page, record)? {
                None => FillOutcome::failed(FillFailure::NotFound),
                Some(group) => {
                    if page.has_attr(group, markup::RATING_MARKER)? {
                        self.fill_rating(page, group, value)?
                    } else {
                        self.fill_choice(page, group, value)?
                    }
                }
            }
        };
        log_fill_result(record, &outcome);
        Ok(outcome)
    }
}
