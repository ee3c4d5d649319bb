use serde::{Deserialize, Serialize};

use crate::dom::document::NodeId;
use crate::dom::page::Page;
use crate::error::PageError;
use crate::fill::timing::Timing;

/// Synthetic events the fillers dispatch. Keyboard events carry the Enter
/// key, which is what the form's validation listeners react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    Focus,
    Blur,
    KeyDown,
    KeyUp,
    MouseEnter,
    MouseDown,
    MouseUp,
    PointerDown,
    Click,
}

impl DomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::Focus => "focus",
            DomEvent::Blur => "blur",
            DomEvent::KeyDown => "keydown",
            DomEvent::KeyUp => "keyup",
            DomEvent::MouseEnter => "mouseenter",
            DomEvent::MouseDown => "mousedown",
            DomEvent::MouseUp => "mouseup",
            DomEvent::PointerDown => "pointerdown",
            DomEvent::Click => "click",
        }
    }

    pub fn key(&self) -> Option<&'static str> {
        match self {
            DomEvent::KeyDown | DomEvent::KeyUp => Some("Enter"),
            _ => None,
        }
    }
}

/// How a value reaches a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// `element.value = v`
    Assign,
    /// `element.setAttribute("value", v)`
    Attribute,
    /// The prototype's value setter, bypassing instance-level interception.
    NativeSetter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub target: NodeId,
    pub event: DomEvent,
    pub at_ms: u64,
}

// ============================================================================
// Interaction sequences
// ============================================================================

pub fn dispatch_input_events(page: &mut dyn Page, node: NodeId) -> Result<(), PageError> {
    page.dispatch(node, DomEvent::Input)?;
    page.dispatch(node, DomEvent::Change)?;
    page.dispatch(node, DomEvent::Blur)
}

/// Write a text value the way a typing user would leave it: focus, write,
/// input/change/blur, Enter key down/up, blur, then a trailing input event
/// once the page had a chance to react.
pub fn set_input_value(
    page: &mut dyn Page,
    node: NodeId,
    value: &str,
    timing: &Timing,
) -> Result<(), PageError> {
    page.focus(node)?;
    page.set_value(node, value, WriteMode::Assign)?;
    dispatch_input_events(page, node)?;
    page.dispatch(node, DomEvent::KeyDown)?;
    page.dispatch(node, DomEvent::KeyUp)?;
    page.blur(node)?;
    page.pause(timing.short_ms)?;
    page.dispatch(node, DomEvent::Input)
}

/// Hover, press, click, release with `delay_ms` between each step. Composite
/// widgets ignore a bare `click()`.
pub fn simulate_click(page: &mut dyn Page, node: NodeId, delay_ms: u64) -> Result<(), PageError> {
    page.dispatch(node, DomEvent::MouseEnter)?;
    page.pause(delay_ms)?;
    page.dispatch(node, DomEvent::MouseDown)?;
    page.pause(delay_ms)?;
    page.click(node)?;
    page.pause(delay_ms)?;
    page.dispatch(node, DomEvent::MouseUp)?;
    page.pause(delay_ms)
}

/// Enter, down, up, click: the pointer order choice widgets listen for.
pub fn pointer_select(page: &mut dyn Page, node: NodeId, delay_ms: u64) -> Result<(), PageError> {
    page.dispatch(node, DomEvent::MouseEnter)?;
    page.pause(delay_ms)?;
    page.dispatch(node, DomEvent::MouseDown)?;
    page.dispatch(node, DomEvent::MouseUp)?;
    page.click(node)?;
    page.pause(delay_ms)
}
