//! The in-memory mutable tree node grown by the parser driver and by
//! callers constructing manual nodes (§3, §4.2).

use crate::flags::NodeFlags;
use crate::silo::record::{ATTR_RECORD_SIZE, NODE_PREFIX_SIZE, U32};

/// One name/value attribute pair, in source order.
pub type Attr = (String, String);

#[derive(Debug, Clone, Default)]
pub struct BuilderNode {
    pub element: String,
    pub text: Option<String>,
    pub attrs: Vec<Attr>,
    pub flags: NodeFlags,
    pub children: Vec<BuilderNode>,

    /// Transient compile fields, valid only after their pass has run.
    pub(crate) element_idx: Option<u32>,
    pub(crate) text_idx: Option<u32>,
    pub(crate) attr_name_idx: Vec<u32>,
    pub(crate) attr_value_idx: Vec<u32>,
    pub(crate) offset: Option<u32>,
}

impl BuilderNode {
    /// Constructs a node with `element` already set, as required before
    /// emission (§3 invariants).
    pub fn new(element: impl Into<String>) -> Self {
        BuilderNode {
            element: element.into(),
            ..Default::default()
        }
    }

    /// Appends an attribute. No deduplication: duplicate names are legal
    /// and preserved in source order.
    pub fn add_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((name.into(), value.into()));
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: NodeFlags) {
        self.flags = flags;
    }

    pub fn children(&self) -> &[BuilderNode] {
        &self.children
    }

    pub fn push_child(&mut self, child: BuilderNode) {
        self.children.push(child);
    }

    pub fn is_ignored(&self) -> bool {
        self.flags.contains(NodeFlags::IGNORE_CDATA)
    }

    /// Number of bytes this node will occupy in the emitted node table,
    /// assuming `has_text` is true; callers subtract one `u32` when the
    /// node ultimately has no text (§4.2).
    pub fn size(&self) -> usize {
        NODE_PREFIX_SIZE + U32 + self.attrs.len() * ATTR_RECORD_SIZE
    }

    /// Deep-clones `self` and appends the clone as a child of `parent`.
    /// Used both for splicing `info` nodes (§4.4) and manual nodes (§4.5
    /// step 2) — both operations deep-clone rather than move, since the
    /// same `info` tree is spliced under every top-level element of an
    /// import.
    pub fn clone_into(&self, parent: &mut BuilderNode) {
        parent.children.push(self.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accounts_for_text_and_attrs() {
        let mut node = BuilderNode::new("a");
        node.add_attr("x", "1");
        node.add_attr("y", "2");
        // prefix(5) + text(4) + 2 attrs * 8 = 25
        assert_eq!(node.size(), 5 + 4 + 16);
    }

    #[test]
    fn ignore_cdata_flag_is_queryable() {
        let mut node = BuilderNode::new("a");
        assert!(!node.is_ignored());
        node.set_flags(NodeFlags::IGNORE_CDATA);
        assert!(node.is_ignored());
    }

    #[test]
    fn clone_into_preserves_attrs_and_children() {
        let mut info = BuilderNode::new("info");
        info.add_attr("k", "v");
        info.push_child(BuilderNode::new("child"));

        let mut root = BuilderNode::new("root");
        info.clone_into(&mut root);

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].element, "info");
        assert_eq!(root.children[0].attrs, vec![("k".to_string(), "v".to_string())]);
        assert_eq!(root.children[0].children.len(), 1);
    }
}
