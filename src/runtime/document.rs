//! Host abstraction for the runtime plus an in-memory element tree.

use crate::error::HostError;
use indexmap::IndexSet;
use std::sync::mpsc::Sender;

/// A class attribute as a host reports it. Animated values (SVG elements)
/// carry a base and an animated string; only the base value is styled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassAttr {
    Plain(String),
    Animated { base_val: String, anim_val: String },
}

impl ClassAttr {
    pub fn value(&self) -> &str {
        match self {
            ClassAttr::Plain(value) => value,
            ClassAttr::Animated { base_val, .. } => base_val,
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.value().split_whitespace()
    }
}

impl From<&str> for ClassAttr {
    fn from(value: &str) -> Self {
        ClassAttr::Plain(value.to_string())
    }
}

impl From<String> for ClassAttr {
    fn from(value: String) -> Self {
        ClassAttr::Plain(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    ClassChanged { value: ClassAttr },
    /// A subtree was attached; carries every class attribute inside it.
    SubtreeAdded { classes: Vec<ClassAttr> },
}

/// Everything a host observed during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    pub fn new(records: Vec<MutationRecord>) -> Self {
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Unique class tokens in the order they first appear.
    pub fn class_tokens(&self) -> Vec<String> {
        let mut tokens = IndexSet::new();
        for record in &self.records {
            let attrs = match record {
                MutationRecord::ClassChanged { value } => std::slice::from_ref(value),
                MutationRecord::SubtreeAdded { classes } => classes.as_slice(),
            };
            for attr in attrs {
                tokens.extend(attr.tokens().map(str::to_string));
            }
        }
        tokens.into_iter().collect()
    }
}

/// Environment the runtime can read class attributes from and subscribe to.
pub trait DocumentHost {
    type Root;

    /// Class attributes of the root and every descendant.
    fn collect(&self, root: &Self::Root) -> Vec<ClassAttr>;

    /// Registers `sender` for mutation batches under `root`.
    fn subscribe(
        &mut self,
        root: &Self::Root,
        sender: Sender<MutationBatch>,
    ) -> Result<(), HostError>;
}

pub type ElementId = usize;

#[derive(Debug, Clone, Default)]
struct Element {
    class: Option<ClassAttr>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// In-memory element tree. Element `0` is the document root and is always
/// connected; other elements are connected once appended under it.
///
/// Mutations on connected elements are queued and delivered by [`flush`],
/// one batch per subscriber per call.
///
/// [`flush`]: Document::flush
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
    pending: Vec<(ElementId, MutationRecord)>,
    subscribers: Vec<(ElementId, Sender<MutationBatch>)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub const ROOT: ElementId = 0;

    pub fn new() -> Self {
        Self {
            elements: vec![Element::default()],
            pending: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn root(&self) -> ElementId {
        Self::ROOT
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, class: Option<ClassAttr>) -> ElementId {
        self.elements.push(Element {
            class,
            ..Element::default()
        });
        self.elements.len() - 1
    }

    /// Attaches `child` under `parent`. Does nothing for unknown ids, a child
    /// that already has a parent, or a parent inside the child's subtree.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if parent == child || child == Self::ROOT {
            return;
        }
        let (Some(_), Some(node)) = (self.elements.get(parent), self.elements.get(child)) else {
            return;
        };
        if node.parent.is_some() || is_within(&self.elements, parent, child) {
            return;
        }
        self.elements[child].parent = Some(parent);
        self.elements[parent].children.push(child);
        if self.is_connected(child) {
            let classes = self.subtree_classes(child);
            self.pending.push((child, MutationRecord::SubtreeAdded { classes }));
        }
    }

    pub fn set_class(&mut self, id: ElementId, class: impl Into<ClassAttr>) {
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        let value = class.into();
        element.class = Some(value.clone());
        if self.is_connected(id) {
            self.pending.push((id, MutationRecord::ClassChanged { value }));
        }
    }

    pub fn class_of(&self, id: ElementId) -> Option<&ClassAttr> {
        self.elements.get(id)?.class.as_ref()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        id < self.elements.len()
    }

    pub fn is_connected(&self, id: ElementId) -> bool {
        is_within(&self.elements, id, Self::ROOT)
    }

    fn subtree_classes(&self, root: ElementId) -> Vec<ClassAttr> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(element) = self.elements.get(id) else {
                continue;
            };
            if let Some(class) = &element.class {
                out.push(class.clone());
            }
            stack.extend(element.children.iter().rev());
        }
        out
    }

    /// Delivers queued mutations. Returns the number of records flushed.
    pub fn flush(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return 0;
        }
        let elements = &self.elements;
        self.subscribers.retain(|(root, sender)| {
            let records = pending
                .iter()
                .filter(|(target, _)| is_within(elements, *target, *root))
                .map(|(_, record)| record.clone())
                .collect::<Vec<_>>();
            if records.is_empty() {
                return true;
            }
            sender.send(MutationBatch::new(records)).is_ok()
        });
        pending.len()
    }
}

fn is_within(elements: &[Element], mut id: ElementId, ancestor: ElementId) -> bool {
    loop {
        if id == ancestor {
            return true;
        }
        match elements.get(id).and_then(|element| element.parent) {
            Some(parent) => id = parent,
            None => return false,
        }
    }
}

impl DocumentHost for Document {
    type Root = ElementId;

    fn collect(&self, root: &ElementId) -> Vec<ClassAttr> {
        if !self.contains(*root) {
            return Vec::new();
        }
        self.subtree_classes(*root)
    }

    fn subscribe(
        &mut self,
        root: &ElementId,
        sender: Sender<MutationBatch>,
    ) -> Result<(), HostError> {
        if !self.contains(*root) {
            return Err(HostError::Unavailable);
        }
        self.subscribers.push((*root, sender));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassAttr, Document, DocumentHost, MutationBatch, MutationRecord};
    use crate::error::HostError;
    use std::sync::mpsc::channel;

    #[test]
    fn animated_attributes_use_base_value() {
        let attr = ClassAttr::Animated {
            base_val: "p-4 m-2".to_string(),
            anim_val: "p-8".to_string(),
        };
        assert_eq!(attr.tokens().collect::<Vec<_>>(), vec!["p-4", "m-2"]);
    }

    #[test]
    fn batch_tokens_are_unique() {
        let batch = MutationBatch::new(vec![
            MutationRecord::ClassChanged {
                value: "p-4 flex".into(),
            },
            MutationRecord::SubtreeAdded {
                classes: vec!["flex m-2".into(), "p-4".into()],
            },
        ]);
        assert_eq!(batch.class_tokens(), vec!["p-4", "flex", "m-2"]);
    }

    #[test]
    fn collect_walks_connected_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let section = doc.create_element(Some("flex".into()));
        let item = doc.create_element(Some("p-4".into()));
        doc.append_child(section, item);
        doc.append_child(root, section);
        let values = doc
            .collect(&root)
            .iter()
            .map(|attr| attr.value().to_string())
            .collect::<Vec<_>>();
        assert_eq!(values, vec!["flex", "p-4"]);
    }

    #[test]
    fn flush_delivers_one_batch_per_tick() {
        let mut doc = Document::new();
        let (tx, rx) = channel();
        let root = doc.root();
        doc.subscribe(&root, tx).expect("subscribe");

        let detached = doc.create_element(None);
        doc.set_class(detached, "hidden");
        let a = doc.create_element(Some("p-4".into()));
        doc.append_child(root, a);
        doc.set_class(a, "p-4 m-2");

        assert_eq!(doc.flush(), 2);
        assert_eq!(doc.flush(), 0);
        let batch = rx.try_recv().expect("batch");
        assert_eq!(batch.records.len(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ancestors_cannot_move_under_descendants() {
        let mut doc = Document::new();
        let outer = doc.create_element(Some("p-4".into()));
        let inner = doc.create_element(Some("m-2".into()));
        doc.append_child(outer, inner);
        doc.append_child(inner, outer);
        assert!(!doc.is_connected(outer));
        assert!(!doc.is_connected(inner));

        let root = doc.root();
        doc.append_child(root, outer);
        assert!(doc.is_connected(inner));
        assert_eq!(doc.flush(), 1);
    }

    #[test]
    fn unknown_root_is_unavailable() {
        let mut doc = Document::new();
        let (tx, _rx) = channel();
        assert!(matches!(doc.subscribe(&42, tx), Err(HostError::Unavailable)));
    }
}
