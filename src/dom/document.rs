use serde::{Deserialize, Serialize};

use crate::dom::events::{DomEvent, EventRecord, WriteMode};
use crate::dom::host::HostBehavior;
use crate::dom::page::{ComputedStyle, Page};
use crate::dom::selector::Selector;
use crate::error::PageError;

/// Handle to a node. For the in-memory document it is an arena index; for a
/// browser session it is an id minted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    // Set once the value was written through a property path; attribute
    // writes stop affecting the live value from then on.
    dirty: bool,
}

impl Element {
    fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            value: String::new(),
            dirty: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn is_value_bearing(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
        if name == "value" && self.is_value_bearing() && !self.dirty {
            self.value = value.to_string();
        }
    }

    /// Reads one declaration from the inline `style` attribute.
    pub fn style_property(&self, property: &str) -> Option<String> {
        parse_style(self.attr("style").unwrap_or(""))
            .into_iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value)
    }

    fn set_style_property(&mut self, property: &str, value: &str) {
        let mut decls = parse_style(self.attr("style").unwrap_or(""));
        match decls.iter_mut().find(|(key, _)| key == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        let serialized = decls
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr("style", &serialized);
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                return None;
            }
            Some((key, value.trim().to_string()))
        })
        .collect()
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

// ============================================================================
// DomTree — the arena
// ============================================================================

/// Arena-backed node tree. Host behaviors get mutable access to this while
/// the owning `Document` keeps the clock and event log.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    pub fn new() -> Self {
        DomTree {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(parent, NodeKind::Element(Element::new(tag)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn text_node(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.set_attr(name, value);
        }
    }

    pub fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.set_style_property(property, value);
        }
    }

    pub fn value(&self, node: NodeId) -> &str {
        self.element(node).map(|e| e.value()).unwrap_or("")
    }

    /// Property-path write: marks the control dirty.
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = value.to_string();
            element.dirty = true;
        }
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        match &n.kind {
            NodeKind::Text(text) => out.push_str(text),
            _ => {
                for child in &n.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Element descendants of `scope` in document order (scope excluded).
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(scope, &mut out);
        out
    }

    fn collect_elements(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node) {
            if self.element(*child).is_some() {
                out.push(*child);
            }
            self.collect_elements(*child, out);
        }
    }

    pub fn select_all(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope.unwrap_or(self.root))
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    pub fn select(&self, scope: Option<NodeId>, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope.unwrap_or(self.root))
            .into_iter()
            .find(|node| selector.matches(self, *node))
    }

    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if selector.matches(self, current) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    /// Inline-style based computed style: `display: none` and
    /// `visibility: hidden` inherit from ancestors, opacity is read from the
    /// element itself.
    pub fn computed_style(&self, node: NodeId) -> ComputedStyle {
        let own = self.element(node);
        let mut style = ComputedStyle {
            display: own
                .and_then(|e| e.style_property("display"))
                .unwrap_or_else(|| "block".to_string()),
            visibility: "visible".to_string(),
            opacity: own
                .and_then(|e| e.style_property("opacity"))
                .unwrap_or_else(|| "1".to_string()),
        };

        let mut visibility_set = false;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(element) = self.element(current) {
                if element.style_property("display").as_deref() == Some("none") {
                    style.display = "none".to_string();
                }
                if !visibility_set {
                    if let Some(visibility) = element.style_property("visibility") {
                        style.visibility = visibility;
                        visibility_set = true;
                    }
                }
            }
            cursor = self.parent(current);
        }
        style
    }
}

// ============================================================================
// Document — in-memory Page
// ============================================================================

/// An in-memory page: DOM tree, virtual clock, event log, and an optional
/// host behavior standing in for the page's own scripts.
pub struct Document {
    tree: DomTree,
    host: Option<Box<dyn HostBehavior>>,
    now_ms: u64,
    events: Vec<EventRecord>,
    focused: Option<NodeId>,
}

impl Document {
    pub fn new(tree: DomTree) -> Self {
        Document {
            tree,
            host: None,
            now_ms: 0,
            events: Vec::new(),
            focused: None,
        }
    }

    pub fn with_host(mut self, host: impl HostBehavior + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Event names dispatched on `node`, in order.
    pub fn events_for(&self, node: NodeId) -> Vec<&'static str> {
        self.events
            .iter()
            .filter(|e| e.target == node)
            .map(|e| e.event.name())
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    fn check(&self, node: NodeId) -> Result<(), PageError> {
        if self.tree.element(node).is_some() {
            Ok(())
        } else {
            Err(PageError::StaleNode(node.0))
        }
    }

    fn fire(&mut self, node: NodeId, event: DomEvent) {
        self.events.push(EventRecord {
            target: node,
            event,
            at_ms: self.now_ms,
        });
        if let Some(mut host) = self.host.take() {
            host.on_event(&mut self.tree, node, event, self.now_ms);
            self.host = Some(host);
        }
    }
}

impl Page for Document {
    fn query_all(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>, PageError> {
        let selector = Selector::parse(selector)?;
        if let Some(scope) = scope {
            self.check(scope)?;
        }
        Ok(self.tree.select_all(scope, &selector))
    }

    fn query(&mut self, scope: Option<NodeId>, selector: &str) -> Result<Option<NodeId>, PageError> {
        let selector = Selector::parse(selector)?;
        if let Some(scope) = scope {
            self.check(scope)?;
        }
        Ok(self.tree.select(scope, &selector))
    }

    fn closest(&mut self, node: NodeId, selector: &str) -> Result<Option<NodeId>, PageError> {
        let selector = Selector::parse(selector)?;
        self.check(node)?;
        Ok(self.tree.closest(node, &selector))
    }

    fn parent(&mut self, node: NodeId) -> Result<Option<NodeId>, PageError> {
        self.check(node)?;
        Ok(self
            .tree
            .parent(node)
            .filter(|parent| self.tree.element(*parent).is_some()))
    }

    fn element_by_id(&mut self, id: &str) -> Result<Option<NodeId>, PageError> {
        Ok(self.tree.by_id(id))
    }

    fn attr(&mut self, node: NodeId, name: &str) -> Result<Option<String>, PageError> {
        self.check(node)?;
        Ok(self.tree.attr(node, name).map(str::to_string))
    }

    fn text(&mut self, node: NodeId) -> Result<String, PageError> {
        self.check(node)?;
        Ok(self.tree.text_content(node))
    }

    fn value(&mut self, node: NodeId) -> Result<String, PageError> {
        self.check(node)?;
        Ok(self.tree.value(node).to_string())
    }

    fn set_value(&mut self, node: NodeId, value: &str, mode: WriteMode) -> Result<(), PageError> {
        self.check(node)?;
        let accepted = match self.host.as_mut() {
            Some(host) => host.on_value_write(&self.tree, node, mode),
            None => true,
        };
        if !accepted {
            return Ok(());
        }
        match mode {
            WriteMode::Attribute => self.tree.set_attr(node, "value", value),
            WriteMode::Assign | WriteMode::NativeSetter => self.tree.set_value(node, value),
        }
        Ok(())
    }

    fn computed_style(&mut self, node: NodeId) -> Result<ComputedStyle, PageError> {
        self.check(node)?;
        Ok(self.tree.computed_style(node))
    }

    fn dispatch(&mut self, node: NodeId, event: DomEvent) -> Result<(), PageError> {
        self.check(node)?;
        self.fire(node, event);
        Ok(())
    }

    fn click(&mut self, node: NodeId) -> Result<(), PageError> {
        self.check(node)?;
        self.fire(node, DomEvent::Click);
        Ok(())
    }

    fn focus(&mut self, node: NodeId) -> Result<(), PageError> {
        self.check(node)?;
        self.focused = Some(node);
        self.fire(node, DomEvent::Focus);
        Ok(())
    }

    fn blur(&mut self, node: NodeId) -> Result<(), PageError> {
        self.check(node)?;
        if self.focused == Some(node) {
            self.focused = None;
        }
        self.fire(node, DomEvent::Blur);
        Ok(())
    }

    fn scroll_into_view(&mut self, node: NodeId) -> Result<(), PageError> {
        self.check(node)
    }

    fn pause(&mut self, ms: u64) -> Result<(), PageError> {
        self.now_ms += ms;
        if let Some(mut host) = self.host.take() {
            host.on_tick(&mut self.tree, self.now_ms);
            self.host = Some(host);
        }
        Ok(())
    }
}
