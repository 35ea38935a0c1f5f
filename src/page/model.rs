//! In-memory page model backing the scanner and filler.
//!
//! A `PageModel` is built from a JSON page snapshot (one element tree with the
//! attributes the engine cares about) and exposes the query / read-value /
//! write-value / marker operations that a content script would perform against
//! a live DOM. Synthetic input/change events are recorded in an event journal
//! so callers can observe what host-page listeners would have seen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FormVaultError, Result};
use crate::page::query::Selector;

pub type NodeId = usize;

/// One `<option>` inside a select element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOptionSnapshot {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub selected: bool,
}

/// Width/height pair for the visibility check. Absent means "unknown",
/// which is treated as visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

/// Inline style subset relevant to input visibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSnapshot {
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub visibility: String,
}

/// One element in a page snapshot, as authored in the snapshot JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub input_type: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub aria_label: String,
    /// `for` attribute on label elements.
    #[serde(rename = "for", default)]
    pub for_id: String,
    /// Direct text content of this element (not descendants).
    #[serde(default)]
    pub text: String,
    /// `data-*` attributes, keyed without the `data-` prefix.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub options: Vec<SelectOptionSnapshot>,
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub style: StyleSnapshot,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

/// A full page snapshot: one root element tree plus page metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub root: SnapshotNode,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| FormVaultError::SnapshotError(format!("invalid page snapshot: {}", e)))
    }
}

/// Event kinds the filler dispatches to notify host-page listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Input,
    Change,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

/// Runtime state of one element.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub tag: String,
    pub id_attr: String,
    pub name: String,
    pub input_type: String,
    pub classes: Vec<String>,
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub required: bool,
    pub max_length: Option<u32>,
    pub pattern: String,
    pub placeholder: String,
    pub aria_label: String,
    pub for_id: String,
    pub text: String,
    pub data: BTreeMap<String, String>,
    pub options: Vec<SelectOptionSnapshot>,
    pub selected_index: i32,
    pub rect: Option<Rect>,
    pub style: StyleSnapshot,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Mutable element tree for one page. Node ids are assigned in document
/// (depth-first) order, so iterating ids ascending is document order.
#[derive(Debug, Clone)]
pub struct PageModel {
    pub url: String,
    pub title: String,
    pub(crate) nodes: Vec<Node>,
    events: Vec<DispatchedEvent>,
    focused: Option<NodeId>,
}

impl PageModel {
    pub fn from_snapshot(snapshot: &PageSnapshot) -> Self {
        let mut model = PageModel {
            url: snapshot.url.clone(),
            title: snapshot.title.clone(),
            nodes: Vec::new(),
            events: Vec::new(),
            focused: None,
        };
        model.build(&snapshot.root, None);
        model
    }

    fn build(&mut self, source: &SnapshotNode, parent: Option<NodeId>) -> NodeId {
        let tag = if source.tag.is_empty() {
            "body".to_string()
        } else {
            source.tag.to_lowercase()
        };

        // A select's initial index comes from the marked option, defaulting
        // to the first option as a real select does.
        let selected_index = if tag == "select" {
            source
                .options
                .iter()
                .position(|o| o.selected)
                .map(|i| i as i32)
                .unwrap_or(if source.options.is_empty() { -1 } else { 0 })
        } else {
            -1
        };

        let id = self.nodes.len();
        self.nodes.push(Node {
            tag,
            id_attr: source.id.clone(),
            name: source.name.clone(),
            input_type: source.input_type.to_lowercase(),
            classes: source
                .class
                .split_whitespace()
                .map(|c| c.to_string())
                .collect(),
            value: source.value.clone(),
            checked: source.checked,
            disabled: source.disabled,
            read_only: source.read_only,
            required: source.required,
            max_length: source.max_length,
            pattern: source.pattern.clone(),
            placeholder: source.placeholder.clone(),
            aria_label: source.aria_label.clone(),
            for_id: source.for_id.clone(),
            text: source.text.clone(),
            data: source.data.clone(),
            options: source.options.clone(),
            selected_index,
            rect: source.rect,
            style: source.style.clone(),
            parent,
            children: Vec::new(),
        });

        for child in &source.children {
            let child_id = self.build(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id].tag
    }

    pub fn input_type(&self, id: NodeId) -> &str {
        &self.nodes[id].input_type
    }

    pub fn id_attr(&self, id: NodeId) -> &str {
        &self.nodes[id].id_attr
    }

    pub fn name_attr(&self, id: NodeId) -> &str {
        &self.nodes[id].name
    }

    pub fn class_attr(&self, id: NodeId) -> String {
        self.nodes[id].classes.join(" ")
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        &self.nodes[id].classes
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes[id].classes.iter().any(|c| c == class)
    }

    pub fn data_attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id].data.get(key).map(|v| v.as_str())
    }

    pub fn placeholder(&self, id: NodeId) -> &str {
        &self.nodes[id].placeholder
    }

    pub fn aria_label(&self, id: NodeId) -> &str {
        &self.nodes[id].aria_label
    }

    pub fn required(&self, id: NodeId) -> bool {
        self.nodes[id].required
    }

    pub fn max_length(&self, id: NodeId) -> Option<u32> {
        self.nodes[id].max_length
    }

    pub fn pattern(&self, id: NodeId) -> &str {
        &self.nodes[id].pattern
    }

    pub fn disabled(&self, id: NodeId) -> bool {
        self.nodes[id].disabled
    }

    pub fn read_only(&self, id: NodeId) -> bool {
        self.nodes[id].read_only
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.nodes[id].rect
    }

    pub fn style(&self, id: NodeId) -> &StyleSnapshot {
        &self.nodes[id].style
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.nodes[id].checked
    }

    pub fn options(&self, id: NodeId) -> &[SelectOptionSnapshot] {
        &self.nodes[id].options
    }

    pub fn selected_index(&self, id: NodeId) -> i32 {
        self.nodes[id].selected_index
    }

    /// Text of the currently selected option, empty when none is selected.
    pub fn selected_text(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        usize::try_from(node.selected_index)
            .ok()
            .and_then(|i| node.options.get(i))
            .map(|o| o.text.clone())
            .unwrap_or_default()
    }

    /// Current value. For selects this is the selected option's value (empty
    /// when nothing is selected), mirroring `HTMLSelectElement.value`.
    pub fn value(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        if node.tag == "select" {
            usize::try_from(node.selected_index)
                .ok()
                .and_then(|i| node.options.get(i))
                .map(|o| o.value.clone())
                .unwrap_or_default()
        } else {
            node.value.clone()
        }
    }

    /// The literal `value` attribute, as distinct from select-derived values.
    /// For radio/checkbox this is the group member's constant value.
    pub fn value_attr(&self, id: NodeId) -> &str {
        &self.nodes[id].value
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Closest ancestor (not including the element itself) matching the
    /// predicate, like `Element.closest` minus self-matching.
    pub fn closest_ancestor<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&PageModel, NodeId) -> bool,
    {
        let mut current = self.nodes[id].parent;
        while let Some(cur) = current {
            if pred(self, cur) {
                return Some(cur);
            }
            current = self.nodes[cur].parent;
        }
        None
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == id)?;
        if pos == 0 {
            None
        } else {
            Some(siblings[pos - 1])
        }
    }

    /// 1-based position among same-tag siblings, the index used by
    /// generated `:nth-child` segments.
    pub fn same_tag_position(&self, id: NodeId) -> (usize, usize) {
        let tag = &self.nodes[id].tag;
        match self.nodes[id].parent {
            Some(parent) => {
                let same: Vec<NodeId> = self.nodes[parent]
                    .children
                    .iter()
                    .copied()
                    .filter(|&c| &self.nodes[c].tag == tag)
                    .collect();
                let pos = same.iter().position(|&c| c == id).unwrap_or(0);
                (pos + 1, same.len())
            }
            None => (1, 1),
        }
    }

    /// Concatenated text content of the element and its descendants,
    /// whitespace-normalized.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        self.collect_text(id, &mut parts);
        parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text(&self, id: NodeId, parts: &mut Vec<String>) {
        let trimmed = self.nodes[id].text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
        for &child in &self.nodes[id].children {
            self.collect_text(child, parts);
        }
    }

    /// All descendants of `id` in document order, not including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id].children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Resolve a selector string to the first matching element in document
    /// order. Handles every shape the selector generator emits.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        let parsed = Selector::parse(selector)?;
        self.ids().find(|&id| parsed.matches(self, id))
    }

    /// All elements matching a selector string, in document order.
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        match Selector::parse(selector) {
            Some(parsed) => self.ids().filter(|&id| parsed.matches(self, id)).collect(),
            None => Vec::new(),
        }
    }

    pub fn element_by_id(&self, dom_id: &str) -> Option<NodeId> {
        if dom_id.is_empty() {
            return None;
        }
        self.ids().find(|&id| self.nodes[id].id_attr == dom_id)
    }

    /// All radio inputs sharing a group name, in document order.
    pub fn radios_in_group(&self, group: &str) -> Vec<NodeId> {
        self.ids()
            .filter(|&id| {
                let node = &self.nodes[id];
                node.tag == "input" && node.input_type == "radio" && node.name == group
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        self.nodes[id].value = value.to_string();
    }

    /// Assign a select's value. When no option carries the value the
    /// selection is cleared, mirroring the DOM's behavior.
    pub fn set_select_value(&mut self, id: NodeId, value: &str) {
        let index = self.nodes[id]
            .options
            .iter()
            .position(|o| o.value == value)
            .map(|i| i as i32)
            .unwrap_or(-1);
        self.nodes[id].selected_index = index;
    }

    pub fn set_selected_index(&mut self, id: NodeId, index: i32) {
        let count = self.nodes[id].options.len() as i32;
        if index >= -1 && index < count {
            self.nodes[id].selected_index = index;
        }
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        self.nodes[id].checked = checked;
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            self.nodes[id].classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        self.nodes[id].classes.retain(|c| c != class);
    }

    /// Remove a marker class from every element carrying it.
    pub fn clear_class(&mut self, class: &str) {
        for node in &mut self.nodes {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn focus(&mut self, id: NodeId) {
        self.focused = Some(id);
    }

    pub fn blur(&mut self, id: NodeId) {
        if self.focused == Some(id) {
            self.focused = None;
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) {
        self.events.push(DispatchedEvent { target: id, kind });
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
