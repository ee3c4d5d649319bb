use std::collections::HashMap;

use crate::dom::document::{DomTree, NodeId};
use crate::dom::events::{DomEvent, WriteMode};
use crate::dom::markup;
use crate::dom::selector::Selector;

/// Stand-in for the page's own scripts when running against an in-memory
/// `Document`. Hooks run synchronously inside the dispatching call.
pub trait HostBehavior {
    fn on_event(&mut self, tree: &mut DomTree, target: NodeId, event: DomEvent, now_ms: u64);

    /// Return `false` to swallow a value write (the control keeps its value).
    fn on_value_write(&mut self, _tree: &DomTree, _target: NodeId, _mode: WriteMode) -> bool {
        true
    }

    /// Runs after the clock advanced; due timers fire here.
    fn on_tick(&mut self, _tree: &mut DomTree, _now_ms: u64) {}
}

/// Which interaction opens a collapsed dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandTrigger {
    Click,
    /// Only a raw mousedown/pointerdown; a plain `click()` is ignored.
    MouseDown,
    Never,
}

/// Emulation of the form renderer's widget scripts.
///
/// Selects radios and ratings, toggles checkboxes, expands dropdowns after a
/// delay, shows and hides the option popup, marks the chosen option, and can
/// swallow naive writes to native date inputs.
#[derive(Debug, Clone)]
pub struct FormsHost {
    expand_trigger: ExpandTrigger,
    expand_delay_ms: u64,
    popup_stays_hidden: bool,
    intercepted_writes: Vec<WriteMode>,
    checkbox_needs_label: bool,
    lazy_options: HashMap<NodeId, Vec<String>>,
    pending_expansions: Vec<(u64, NodeId)>,
}

impl Default for FormsHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FormsHost {
    pub fn new() -> Self {
        FormsHost {
            expand_trigger: ExpandTrigger::Click,
            expand_delay_ms: 100,
            popup_stays_hidden: false,
            intercepted_writes: Vec::new(),
            checkbox_needs_label: false,
            lazy_options: HashMap::new(),
            pending_expansions: Vec::new(),
        }
    }

    pub fn expand_on(mut self, trigger: ExpandTrigger) -> Self {
        self.expand_trigger = trigger;
        self
    }

    pub fn expand_delay(mut self, ms: u64) -> Self {
        self.expand_delay_ms = ms;
        self
    }

    /// The popup is never shown, options stay reachable only inline.
    pub fn popup_hidden(mut self) -> Self {
        self.popup_stays_hidden = true;
        self
    }

    /// Swallow writes of this kind to `input[type=date]`.
    pub fn intercept_date_writes(mut self, mode: WriteMode) -> Self {
        self.intercepted_writes.push(mode);
        self
    }

    /// Clicks on the checkbox itself are ignored; only its `<label>` toggles.
    pub fn checkbox_label_only(mut self) -> Self {
        self.checkbox_needs_label = true;
        self
    }

    /// Options rendered into the listbox popup on first expansion.
    pub fn lazy_options(mut self, listbox: NodeId, options: &[&str]) -> Self {
        self.lazy_options
            .insert(listbox, options.iter().map(|o| o.to_string()).collect());
        self
    }

    fn schedule_expansion(&mut self, tree: &DomTree, listbox: NodeId, now_ms: u64) {
        if tree.attr(listbox, "aria-expanded") == Some("true") {
            return;
        }
        if self.pending_expansions.iter().any(|(_, node)| *node == listbox) {
            return;
        }
        self.pending_expansions
            .push((now_ms + self.expand_delay_ms, listbox));
    }

    fn expand(&mut self, tree: &mut DomTree, listbox: NodeId) {
        tree.set_attr(listbox, "aria-expanded", "true");
        let Some(popup) = select(tree, listbox, markup::DROPDOWN_POPUP) else {
            return;
        };
        if let Some(options) = self.lazy_options.remove(&listbox) {
            for text in options {
                let option = tree.append_element(popup, "div");
                tree.set_attr(option, "role", "option");
                tree.set_attr(option, "data-value", &text);
                tree.set_attr(option, "aria-selected", "false");
                let span = tree.append_element(option, "span");
                tree.set_attr(span, "class", "vRMGwf");
                tree.append_text(span, &text);
            }
        }
        if !self.popup_stays_hidden {
            tree.set_style_property(popup, "display", "block");
        }
    }

    fn select_option(&mut self, tree: &mut DomTree, option: NodeId) {
        let Some(listbox) = closest(tree, option, markup::LISTBOX) else {
            return;
        };
        let chosen = tree.attr(option, "data-value").unwrap_or("").to_string();
        for candidate in select_all(tree, listbox, markup::OPTION) {
            let selected = tree.attr(candidate, "data-value") == Some(chosen.as_str());
            tree.set_attr(candidate, "aria-selected", if selected { "true" } else { "false" });
        }
        tree.set_attr(listbox, "aria-expanded", "false");
        if let Some(popup) = select(tree, listbox, markup::DROPDOWN_POPUP) {
            tree.set_style_property(popup, "display", "none");
        }
        self.pending_expansions.retain(|(_, node)| *node != listbox);
    }

    fn select_radio(&mut self, tree: &mut DomTree, radio: NodeId) {
        if tree.attr(radio, "aria-disabled") == Some("true") {
            return;
        }
        let Some(group) = closest(tree, radio, markup::RADIO_GROUP) else {
            tree.set_attr(radio, "aria-checked", "true");
            return;
        };
        let radios = select_all(tree, group, markup::RADIO);
        let rating = tree.attr(group, markup::RATING_MARKER).is_some();
        let Some(chosen) = radios.iter().position(|r| *r == radio) else {
            return;
        };
        for (index, candidate) in radios.iter().enumerate() {
            let checked = if rating { index <= chosen } else { index == chosen };
            tree.set_attr(*candidate, "aria-checked", if checked { "true" } else { "false" });
        }
    }

    fn toggle_checkbox(&mut self, tree: &mut DomTree, checkbox: NodeId) {
        if tree.attr(checkbox, "aria-disabled") == Some("true") {
            return;
        }
        let checked = tree.attr(checkbox, "aria-checked") == Some("true");
        tree.set_attr(checkbox, "aria-checked", if checked { "false" } else { "true" });
    }

    fn on_click(&mut self, tree: &mut DomTree, target: NodeId, now_ms: u64) {
        if let Some(option) = closest(tree, target, markup::OPTION) {
            if closest(tree, option, markup::LISTBOX).is_some() {
                self.select_option(tree, option);
                return;
            }
        }
        if let Some(listbox) = closest(tree, target, markup::LISTBOX) {
            if self.expand_trigger == ExpandTrigger::Click {
                self.schedule_expansion(tree, listbox, now_ms);
            }
            return;
        }
        if let Some(radio) = closest(tree, target, markup::RADIO) {
            self.select_radio(tree, radio);
            return;
        }
        if let Some(checkbox) = closest(tree, target, markup::CHECKBOX) {
            if !self.checkbox_needs_label {
                self.toggle_checkbox(tree, checkbox);
            }
            return;
        }
        if let Some(label) = closest(tree, target, "label") {
            if let Some(checkbox) = select(tree, label, markup::CHECKBOX) {
                self.toggle_checkbox(tree, checkbox);
            }
        }
    }
}

impl HostBehavior for FormsHost {
    fn on_event(&mut self, tree: &mut DomTree, target: NodeId, event: DomEvent, now_ms: u64) {
        match event {
            DomEvent::Click => self.on_click(tree, target, now_ms),
            DomEvent::MouseDown | DomEvent::PointerDown => {
                if self.expand_trigger != ExpandTrigger::MouseDown {
                    return;
                }
                if closest(tree, target, markup::OPTION).is_some() {
                    return;
                }
                if let Some(listbox) = closest(tree, target, markup::LISTBOX) {
                    self.schedule_expansion(tree, listbox, now_ms);
                }
            }
            _ => {}
        }
    }

    fn on_value_write(&mut self, tree: &DomTree, target: NodeId, mode: WriteMode) -> bool {
        let is_date = tree
            .element(target)
            .is_some_and(|e| e.tag == "input" && e.attr("type") == Some("date"));
        !(is_date && self.intercepted_writes.contains(&mode))
    }

    fn on_tick(&mut self, tree: &mut DomTree, now_ms: u64) {
        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending_expansions
            .drain(..)
            .partition(|(at, _)| *at <= now_ms);
        self.pending_expansions = waiting;
        for (_, listbox) in due {
            self.expand(tree, listbox);
        }
    }
}

// Markup selectors are constants; a parse failure means no match.
fn select(tree: &DomTree, scope: NodeId, selector: &str) -> Option<NodeId> {
    let selector = Selector::parse(selector).ok()?;
    tree.select(Some(scope), &selector)
}

fn select_all(tree: &DomTree, scope: NodeId, selector: &str) -> Vec<NodeId> {
    match Selector::parse(selector) {
        Ok(selector) => tree.select_all(Some(scope), &selector),
        Err(_) => Vec::new(),
    }
}

fn closest(tree: &DomTree, node: NodeId, selector: &str) -> Option<NodeId> {
    let selector = Selector::parse(selector).ok()?;
    tree.closest(node, &selector)
}
