use serde::{Deserialize, Serialize};

use crate::dom::document::NodeId;
use crate::dom::events::{DomEvent, WriteMode};
use crate::error::PageError;

/// Computed style properties the visibility checks care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
}

impl ComputedStyle {
    pub fn is_visible(&self) -> bool {
        self.display != "none" && self.visibility != "hidden" && !is_zero(&self.opacity)
    }
}

fn is_zero(opacity: &str) -> bool {
    opacity.trim().parse::<f64>().map(|v| v == 0.0).unwrap_or(false)
}

/// The live page every detector and filler works against.
///
/// Implemented by the in-memory `Document` and by `BrowserSession`, which
/// forwards each call to a real browser tab. `pause` is the suspension point:
/// it gives the page's own scripts time to react to what was just done.
pub trait Page {
    /// All elements under `scope` (the whole document when `None`) matching
    /// `selector`, in document order.
    fn query_all(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, PageError>;

    fn query(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Option<NodeId>, PageError> {
        Ok(self.query_all(scope, selector)?.into_iter().next())
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&mut self, node: NodeId, selector: &str) -> Result<Option<NodeId>, PageError>;

    /// Parent element, `None` at the top of the document.
    fn parent(&mut self, node: NodeId) -> Result<Option<NodeId>, PageError>;

    fn element_by_id(&mut self, id: &str) -> Result<Option<NodeId>, PageError>;

    fn attr(&mut self, node: NodeId, name: &str) -> Result<Option<String>, PageError>;

    fn has_attr(&mut self, node: NodeId, name: &str) -> Result<bool, PageError> {
        Ok(self.attr(node, name)?.is_some())
    }

    /// Rendered text of the node and its descendants (untrimmed).
    fn text(&mut self, node: NodeId) -> Result<String, PageError>;

    fn value(&mut self, node: NodeId) -> Result<String, PageError>;

    fn set_value(&mut self, node: NodeId, value: &str, mode: WriteMode) -> Result<(), PageError>;

    fn computed_style(&mut self, node: NodeId) -> Result<ComputedStyle, PageError>;

    fn dispatch(&mut self, node: NodeId, event: DomEvent) -> Result<(), PageError>;

    /// Native activation (`element.click()`).
    fn click(&mut self, node: NodeId) -> Result<(), PageError>;

    fn focus(&mut self, node: NodeId) -> Result<(), PageError>;

    fn blur(&mut self, node: NodeId) -> Result<(), PageError>;

    fn scroll_into_view(&mut self, node: NodeId) -> Result<(), PageError>;

    fn pause(&mut self, ms: u64) -> Result<(), PageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(display: &str, visibility: &str, opacity: &str) -> ComputedStyle {
        ComputedStyle {
            display: display.into(),
            visibility: visibility.into(),
            opacity: opacity.into(),
        }
    }

    #[test]
    fn visibility_rules() {
        assert!(style("block", "visible", "1").is_visible());
        assert!(!style("none", "visible", "1").is_visible());
        assert!(!style("block", "hidden", "1").is_visible());
        assert!(!style("block", "visible", "0").is_visible());
        assert!(!style("block", "visible", "0.0").is_visible());
        assert!(style("block", "visible", "0.5").is_visible());
    }
}
