use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detect::{dropdown_option_text, dropdown_option_value, is_placeholder_option};
use crate::dom::document::NodeId;
use crate::dom::events::{DomEvent, simulate_click};
use crate::dom::markup;
use crate::dom::page::Page;
use crate::dom::query::{is_grid_variant, locate_by_question_or_position};
use crate::error::PageError;
use crate::field::field_model::{FieldCategory, FieldRecord};
use crate::fill::{FillFailure, FillOutcome, Filler, Timing, log_fill_result};

// ============================================================================
// Dropdown fill protocol
// ============================================================================
//
//   Collapsed -> Expanding -> Expanded -> PopupVisible -> OptionMatched
//             -> Selecting -> Verified | failed
//
// Every wait is a bounded poll of `Timing::max_wait_attempts`. A failed
// outcome carries the stage it stopped in.

/// Stage the dropdown protocol stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropdownStage {
    Collapsed,
    Expanding,
    Expanded,
    PopupVisible,
    OptionMatched,
    Selecting,
    Verified,
}

pub struct DropdownFiller {
    timing: Timing,
}

/// Where the options were found.
#[derive(Clone, Copy)]
enum OptionSource {
    Popup(NodeId),
    Inline,
}

impl DropdownFiller {
    pub fn new(timing: Timing) -> Self {
        DropdownFiller { timing }
    }

    fn locate(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<Option<NodeId>, PageError> {
        let mut listboxes = Vec::new();
        for listbox in page.query_all(None, markup::LISTBOX)? {
            if !is_grid_variant(page, listbox)? {
                listboxes.push(listbox);
            }
        }
        locate_by_question_or_position(page, &listboxes, &record.question, record.hints.container_index)
    }

    fn is_expanded(&self, page: &mut dyn Page, listbox: NodeId) -> Result<bool, PageError> {
        Ok(page.attr(listbox, "aria-expanded")?.as_deref() == Some("true"))
    }

    /// Opens the listbox. Clicks the presentation layer (or the listbox),
    /// then polls; past the halfway mark a raw pointer press is tried once.
    fn expand(&self, page: &mut dyn Page, listbox: NodeId) -> Result<bool, PageError> {
        let target = page
            .query(Some(listbox), markup::DROPDOWN_PRESENTATION)?
            .unwrap_or(listbox);
        page.click(target)?;
        page.pause(self.timing.long_ms)?;

        let max = self.timing.max_wait_attempts;
        let retry_at = max / 2 + 1;
        let mut attempts = 0;
        while !self.is_expanded(page, listbox)? && attempts < max {
            page.pause(self.timing.medium_ms)?;
            attempts += 1;
            if attempts == retry_at && !self.is_expanded(page, listbox)? {
                debug!(target: "filler", attempts, "dropdown still collapsed, retrying with pointer press");
                page.dispatch(listbox, DomEvent::PointerDown)?;
                page.dispatch(listbox, DomEvent::MouseDown)?;
            }
        }

        let expanded = self.is_expanded(page, listbox)?;
        if expanded {
            debug!(target: "filler", waited_ms = u64::from(attempts) * self.timing.medium_ms, "dropdown expanded");
        }
        Ok(expanded)
    }

    fn wait_until_visible(&self, page: &mut dyn Page, popup: NodeId) -> Result<bool, PageError> {
        for _ in 0..self.timing.max_wait_attempts {
            if page.computed_style(popup)?.display != "none" {
                page.pause(self.timing.validation_ms)?;
                return Ok(true);
            }
            page.pause(self.timing.medium_ms)?;
        }
        Ok(false)
    }

    /// Rendered options, trying progressively looser selectors.
    fn popup_options(&self, page: &mut dyn Page, popup: NodeId) -> Result<Vec<NodeId>, PageError> {
        for selector in [markup::OPTION, markup::DROPDOWN_OPTION, markup::DATA_VALUE_OPTION] {
            let options = page.query_all(Some(popup), selector)?;
            if !options.is_empty() {
                return Ok(options);
            }
        }
        Ok(Vec::new())
    }

    /// Options rendered in the listbox itself, outside any popup.
    fn inline_options(&self, page: &mut dyn Page, listbox: NodeId) -> Result<Vec<NodeId>, PageError> {
        let mut inline = Vec::new();
        for option in page.query_all(Some(listbox), markup::OPTION)? {
            if page.closest(option, markup::DROPDOWN_POPUP)?.is_none() {
                inline.push(option);
            }
        }
        Ok(inline)
    }

    /// First non-placeholder option whose value token or displayed text equals
    /// `value`, plus the list of what was available.
    fn match_option(
        &self,
        page: &mut dyn Page,
        options: &[NodeId],
        value: &str,
    ) -> Result<(Option<NodeId>, Vec<String>), PageError> {
        let mut available = Vec::new();
        let mut found = None;
        for option in options {
            if is_placeholder_option(page, *option)? {
                continue;
            }
            let token = dropdown_option_value(page, *option)?;
            let text = dropdown_option_text(page, *option)?;
            if found.is_none() && (token == value || text == value) {
                found = Some(*option);
            }
            available.push(text);
        }
        Ok((found, available))
    }

    fn select(&self, page: &mut dyn Page, listbox: NodeId, option: NodeId) -> Result<(), PageError> {
        page.scroll_into_view(option)?;
        page.pause(self.timing.medium_ms)?;
        simulate_click(page, option, self.timing.short_ms)?;
        page.pause(self.timing.expansion_ms)?;
        page.dispatch(listbox, DomEvent::Change)?;
        page.dispatch(listbox, DomEvent::Input)?;
        page.pause(self.timing.validation_ms)
    }

    /// Token and text of the option the listbox marks selected.
    fn selected(&self, page: &mut dyn Page, listbox: NodeId) -> Result<Option<(String, String)>, PageError> {
        let Some(selected) = page.query(Some(listbox), markup::SELECTED_OPTION)? else {
            return Ok(None);
        };
        Ok(Some((
            dropdown_option_value(page, selected)?,
            dropdown_option_text(page, selected)?,
        )))
    }

    fn run(&self, page: &mut dyn Page, listbox: NodeId, value: &str) -> Result<FillOutcome, PageError> {
        let failed = |failure, stage| FillOutcome::failed(failure).at_stage(stage);

        if !self.is_expanded(page, listbox)? {
            debug!(target: "filler", stage = ?DropdownStage::Collapsed, "dropdown collapsed, expanding");
            if !self.expand(page, listbox)? {
                let timeout = FillFailure::Timeout {
                    waiting_for: "dropdown expansion".to_string(),
                };
                return Ok(failed(timeout, DropdownStage::Expanding));
            }
        }

        let Some(popup) = page.query(Some(listbox), markup::DROPDOWN_POPUP)? else {
            warn!(target: "filler", "dropdown popup container not found");
            return Ok(failed(FillFailure::NotFound, DropdownStage::Expanded));
        };

        let source = if self.wait_until_visible(page, popup)? {
            OptionSource::Popup(popup)
        } else {
            debug!(target: "filler", "popup never became visible, trying inline options");
            OptionSource::Inline
        };

        let (options, stage) = match source {
            OptionSource::Popup(popup) => (self.popup_options(page, popup)?, DropdownStage::PopupVisible),
            OptionSource::Inline => (self.inline_options(page, listbox)?, DropdownStage::Expanded),
        };
        let (target, available) = self.match_option(page, &options, value)?;
        let Some(option) = target else {
            if matches!(source, OptionSource::Inline) {
                let timeout = FillFailure::Timeout {
                    waiting_for: "dropdown popup".to_string(),
                };
                return Ok(failed(timeout, stage));
            }
            info!(target: "filler", requested = value, available = ?available, "no dropdown option matched");
            let no_match = FillFailure::NoMatchingOption {
                requested: value.to_string(),
                available,
            };
            return Ok(failed(no_match, stage));
        };

        debug!(target: "filler", stage = ?DropdownStage::OptionMatched, option = %value, "dropdown option matched");
        self.select(page, listbox, option)?;

        let actual = match self.selected(page, listbox)? {
            Some((token, text)) if token == value || text == value => {
                return Ok(FillOutcome::filled(1).at_stage(DropdownStage::Verified));
            }
            Some((token, _)) => token,
            None => String::new(),
        };
        let mismatch = FillFailure::Mismatch {
            expected: value.to_string(),
            actual,
        };
        Ok(failed(mismatch, DropdownStage::Selecting))
    }
}

impl Filler for DropdownFiller {
    fn category(&self) -> FieldCategory {
        FieldCategory::Dropdown
    }

    fn fill(&self, page: &mut dyn Page, record: &FieldRecord) -> Result<FillOutcome, PageError> {
        let value = record.value.as_single().trim();
        let outcome = if value.is_empty() {
            FillOutcome::failed(FillFailure::EmptyValue)
        } else {
            match self.locate(page, record)? {
                None => FillOutcome::failed(FillFailure::NotFound),
                Some(listbox) => self.run(page, listbox, value)?,
            }
        };
        log_fill_result(record, &outcome);
        Ok(outcome)
    }
}
