//! Document: arena-backed content tree
//!
//! Stands in for the live page tree the engine annotates. Elements carry a
//! tag and attributes, text nodes carry the text, and annotation units are
//! containers holding their matched text as a single text child.
//!
//! Every mutation is journaled (see [`mutation`]) so a host can forward
//! change notifications the way a mutation observer would.

pub mod mutation;

pub use mutation::{MutationKind, MutationRecord, Origin};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::highlight::annotate::{Annotation, Mode};
use mutation::Journal;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    attributes: BTreeMap<String, String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `contenteditable` present and not explicitly `"false"`
    pub fn is_content_editable(&self) -> bool {
        match self.attribute("contenteditable") {
            Some(value) => !value.eq_ignore_ascii_case("false"),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
    Annotation(Annotation),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Slot is on the free list
    released: bool,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            released: false,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// Content tree with a mutation journal.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. A detached
/// node keeps its slot until it is passed to [`Document::discard`]; after
/// that its id may be handed out again by the next `create_*` call.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    journal: Journal,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with a `body` root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Element(ElementData::new("body")))],
            free: Vec::new(),
            root: NodeId(0),
            journal: Journal::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn annotation(&self, id: NodeId) -> Option<&Annotation> {
        match self.data(id) {
            NodeData::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// True when `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// `id` and everything below it, in document order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Concatenated text of every text node under `id`
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Construction (detached nodes, not journaled)
    // -------------------------------------------------------------------------

    fn push_node(&mut self, data: NodeData) -> NodeId {
        if let Some(id) = self.free.pop() {
            *self.node_mut(id) = Node::new(data);
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Arena slots in use, attached or not
    pub fn live_nodes(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Arena slots ever allocated
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_string()))
    }

    /// Annotation unit wrapping `text`
    pub fn create_annotation(&mut self, annotation: Annotation, text: &str) -> NodeId {
        let unit = self.push_node(NodeData::Annotation(annotation));
        let child = self.create_text(text);
        self.node_mut(child).parent = Some(unit);
        self.node_mut(unit).children.push(child);
        unit
    }

    // -------------------------------------------------------------------------
    // Mutation (journaled)
    // -------------------------------------------------------------------------

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        self.journal.record(parent, MutationKind::ChildList);
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.create_text(text);
        self.append_child(parent, id);
        id
    }

    /// No-op on non-element nodes
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element(el) = &mut self.node_mut(id).data {
            el.attributes.insert(name.to_ascii_lowercase(), value.to_string());
            self.journal.record(id, MutationKind::Attributes);
        }
    }

    /// No-op on non-text nodes
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text(current) = &mut self.node_mut(id).data {
            *current = text.to_string();
            self.journal.record(id, MutationKind::CharacterData);
        }
    }

    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.detach(id);
            self.journal.record(parent, MutationKind::ChildList);
        }
    }

    /// Replace `old` with `fragment` in a single operation. Returns false
    /// when `old` has no parent.
    pub fn replace_with(&mut self, old: NodeId, fragment: Vec<NodeId>) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        for &node in &fragment {
            self.detach(node);
            self.node_mut(node).parent = Some(parent);
        }
        // Position is looked up after detaching, in case a fragment node
        // was a sibling of `old`.
        let Some(position) = self.children(parent).iter().position(|&c| c == old) else {
            return false;
        };
        let children = &mut self.node_mut(parent).children;
        children.remove(position);
        for (offset, node) in fragment.into_iter().enumerate() {
            children.insert(position + offset, node);
        }
        self.node_mut(old).parent = None;
        self.journal.record(parent, MutationKind::ChildList);
        true
    }

    /// Merge adjacent text children of `id` and drop empty ones. Dropped
    /// text nodes are discarded.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        let mut dropped: Vec<NodeId> = Vec::new();

        for child in children {
            let Some(text) = self.text(child).map(str::to_string) else {
                kept.push(child);
                continue;
            };
            if text.is_empty() {
                dropped.push(child);
                continue;
            }
            let previous_text = kept.last().copied().filter(|&prev| self.text(prev).is_some());
            match previous_text {
                Some(prev) => {
                    if let NodeData::Text(existing) = &mut self.node_mut(prev).data {
                        existing.push_str(&text);
                    }
                    dropped.push(child);
                }
                None => kept.push(child),
            }
        }

        if dropped.is_empty() {
            return;
        }
        self.node_mut(id).children = kept;
        for child in dropped {
            self.node_mut(child).parent = None;
            self.discard(child);
        }
        self.journal.record(id, MutationKind::ChildList);
    }

    /// Return a detached subtree's slots to the free list. Ids into the
    /// subtree must not be used afterwards. No-op for the root, attached
    /// nodes and already discarded nodes.
    pub fn discard(&mut self, id: NodeId) {
        if id == self.root || self.node(id).released || self.node(id).parent.is_some() {
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node_mut(current);
            stack.append(&mut node.children);
            node.data = NodeData::Text(String::new());
            node.parent = None;
            node.released = true;
            self.free.push(current);
        }
    }

    // -------------------------------------------------------------------------
    // Journal
    // -------------------------------------------------------------------------

    /// Drain journaled mutations
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.journal.take()
    }

    pub fn pending_records(&self) -> usize {
        self.journal.pending()
    }

    /// Monotonic count of mutations ever applied
    pub fn revision(&self) -> u64 {
        self.journal.revision()
    }

    pub fn origin(&self) -> Origin {
        self.journal.origin()
    }

    /// Run `f` with every mutation attributed to `origin`.
    pub fn edit_as<R>(&mut self, origin: Origin, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.journal.set_origin(origin);
        let result = f(self);
        self.journal.set_origin(previous);
        result
    }

    // -------------------------------------------------------------------------
    // Debug serialization
    // -------------------------------------------------------------------------

    /// Compact serialization: elements as bare tags, highlight units as
    /// `[text]`, exclude units as `~~text~~`.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(self.root, &mut out);
        out
    }

    pub fn markup_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(el) => {
                out.push_str(&format!("<{}>", el.tag));
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
            NodeData::Annotation(annotation) => {
                let (open, close) = match annotation.mode {
                    Mode::Highlight => ("[", "]"),
                    Mode::Exclude => ("~~", "~~"),
                };
                out.push_str(open);
                for &child in self.children(id) {
                    self.write_markup(child, out);
                }
                out.push_str(close);
            }
        }
    }
}

/// Pre-order walk, see [`Document::descendants`]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.doc.children(id).iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::style::StyleMode;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "P");
        let text = doc.append_text(p, "hello world");
        (doc, p, text)
    }

    #[test]
    fn test_tags_are_lowercased() {
        let (doc, p, _) = sample();
        assert_eq!(doc.element(p).unwrap().tag, "p");
        assert_eq!(doc.markup(), "<body><p>hello world</p></body>");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut doc = Document::new();
        let a = doc.append_element(doc.root(), "div");
        let a1 = doc.append_text(a, "a1");
        let b = doc.append_element(doc.root(), "div");
        let b1 = doc.append_text(b, "b1");
        let order: Vec<NodeId> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![doc.root(), a, a1, b, b1]);
        assert_eq!(doc.text_content(doc.root()), "a1b1");
    }

    #[test]
    fn test_replace_with_fragment() {
        let (mut doc, p, text) = sample();
        let left = doc.create_text("hello ");
        let unit = doc.create_annotation(Annotation::exclude(), "world");
        assert!(doc.replace_with(text, vec![left, unit]));
        assert_eq!(doc.children(p), &[left, unit]);
        assert!(!doc.is_attached(text));
        assert_eq!(doc.markup(), "<body><p>hello ~~world~~</p></body>");
    }

    #[test]
    fn test_replace_detached_node_is_noop() {
        let mut doc = Document::new();
        let orphan = doc.create_text("orphan");
        let other = doc.create_text("x");
        assert!(!doc.replace_with(orphan, vec![other]));
    }

    #[test]
    fn test_normalize_merges_adjacent_text() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p");
        doc.append_text(p, "new ");
        doc.append_text(p, "");
        doc.append_text(p, "job");
        let b = doc.append_element(p, "b");
        doc.append_text(p, " offer");
        doc.normalize(p);
        assert_eq!(doc.children(p).len(), 3);
        assert_eq!(doc.text(doc.children(p)[0]), Some("new job"));
        assert_eq!(doc.children(p)[1], b);
    }

    #[test]
    fn test_mutations_are_journaled_with_origin() {
        let (mut doc, p, text) = sample();
        assert_eq!(doc.take_records().len(), 2);

        doc.set_text(text, "changed");
        doc.edit_as(Origin::Engine, |doc| {
            doc.set_attribute(p, "class", "x");
        });
        let records = doc.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, MutationKind::CharacterData);
        assert_eq!(records[0].origin, Origin::Host);
        assert_eq!(records[1].kind, MutationKind::Attributes);
        assert_eq!(records[1].origin, Origin::Engine);
        assert_eq!(doc.origin(), Origin::Host, "origin restored after edit_as");
        assert_eq!(doc.pending_records(), 0);
    }

    #[test]
    fn test_remove_detaches_and_journals() {
        let (mut doc, p, text) = sample();
        doc.take_records();
        let before = doc.revision();
        doc.remove(text);
        assert!(doc.children(p).is_empty());
        assert!(!doc.is_attached(text));
        assert_eq!(doc.markup_of(p), "<p></p>");
        let records = doc.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, p);
        assert_eq!(records[0].kind, MutationKind::ChildList);
        assert_eq!(doc.revision(), before + 1);

        doc.remove(text);
        assert_eq!(doc.revision(), before + 1, "removing a detached node records nothing");
    }

    #[test]
    fn test_markup_of_subtree() {
        let mut doc = Document::new();
        let div = doc.append_element(doc.root(), "div");
        let p = doc.append_element(div, "p");
        doc.append_text(p, "a ");
        let unit = doc.create_annotation(Annotation::exclude(), "b");
        doc.append_child(p, unit);
        assert_eq!(doc.markup_of(p), "<p>a ~~b~~</p>");
        assert_eq!(doc.markup_of(div), "<div><p>a ~~b~~</p></div>");
    }

    #[test]
    fn test_discarded_slots_are_reused() {
        let (mut doc, p, text) = sample();
        let unit = doc.create_annotation(Annotation::exclude(), "world");
        assert!(doc.replace_with(text, vec![unit]));
        let capacity = doc.capacity();

        doc.discard(text);
        assert_eq!(doc.live_nodes(), capacity - 1);
        let reused = doc.create_text("again");
        assert_eq!(reused, text);
        assert_eq!(doc.text(reused), Some("again"));
        assert_eq!(doc.capacity(), capacity);
        assert_eq!(doc.markup_of(p), "<p>~~world~~</p>");
    }

    #[test]
    fn test_discard_takes_whole_subtree() {
        let mut doc = Document::new();
        let unit = doc.create_annotation(Annotation::exclude(), "spam");
        let capacity = doc.capacity();
        doc.discard(unit);
        assert_eq!(doc.live_nodes(), capacity - 2);
        doc.create_text("a");
        doc.create_text("b");
        assert_eq!(doc.capacity(), capacity);
    }

    #[test]
    fn test_discard_skips_attached_and_released() {
        let (mut doc, p, text) = sample();
        let live = doc.live_nodes();
        doc.discard(doc.root());
        doc.discard(p);
        doc.discard(text);
        assert_eq!(doc.live_nodes(), live);
        assert_eq!(doc.markup(), "<body><p>hello world</p></body>");

        doc.remove(text);
        doc.discard(text);
        doc.discard(text);
        assert_eq!(doc.live_nodes(), live - 1);
    }

    #[test]
    fn test_content_editable() {
        let mut el = ElementData::new("div");
        assert!(!el.is_content_editable());
        el.attributes.insert("contenteditable".into(), "".into());
        assert!(el.is_content_editable());
        el.attributes.insert("contenteditable".into(), "false".into());
        assert!(!el.is_content_editable());
    }

    #[test]
    fn test_annotation_text_content() {
        let mut doc = Document::new();
        let unit = doc.create_annotation(Annotation::highlight("Job", StyleMode::Bold), "job");
        doc.append_child(doc.root(), unit);
        assert_eq!(doc.text_content(unit), "job");
        assert_eq!(doc.markup(), "<body>[job]</body>");
        assert_eq!(doc.ancestors(doc.children(unit)[0]).collect::<Vec<_>>(), vec![unit, doc.root()]);
    }
}
