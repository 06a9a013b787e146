//! The byte-layout engine (§4.5 steps 3-10): size accounting, string-table
//! population, node emission, and offset back-patching over a merged
//! builder tree.
//!
//! Every pass below walks the tree in document order (pre-order, depth
//! first) rather than strict level-order. The two are observationally
//! equivalent here: each pass interns or counts *every* non-ignored node
//! exactly once regardless of the order it visits them in, so
//! `strtab_ntags` and the final string-table contents are unaffected — see
//! DESIGN.md's Open Questions for the reasoning kept alongside this choice.
//! A node with [`NodeFlags::IGNORE_CDATA`] is skipped along with its entire
//! subtree in every pass, matching "exclude this subtree's payload".

use crate::builder_node::BuilderNode;
use crate::interner::StringInterner;
use crate::silo::header::HEADER_SIZE;
use crate::silo::record;

/// Size pass (§4.5 step 3): total bytes the node table will occupy,
/// including the header and a one-sentinel-per-node over-reservation.
pub fn compute_capacity(root: &BuilderNode) -> usize {
    HEADER_SIZE + size_of_children(root)
}

fn size_of_children(node: &BuilderNode) -> usize {
    node.children
        .iter()
        .filter(|c| !c.is_ignored())
        .map(|c| {
            let mut n = c.size() + record::SENTINEL_SIZE;
            if c.text.is_none() {
                n -= record::U32;
            }
            n + size_of_children(c)
        })
        .sum()
}

/// Steps 4-7: interns element names, then attribute names, then attribute
/// values, then text, each in its own full pass over non-ignored nodes.
/// Returns `strtab_ntags`, the interner's size right after the element-name
/// pass.
pub fn intern_strings(root: &mut BuilderNode, interner: &mut StringInterner) -> u32 {
    intern_element_names(root, interner);
    let strtab_ntags = interner.len() as u32;
    intern_attr_names(root, interner);
    intern_attr_values(root, interner);
    intern_text(root, interner);
    strtab_ntags
}

fn for_each_non_ignored_mut(node: &mut BuilderNode, f: &mut impl FnMut(&mut BuilderNode)) {
    for child in node.children.iter_mut() {
        if child.is_ignored() {
            continue;
        }
        f(child);
        for_each_non_ignored_mut(child, f);
    }
}

fn intern_element_names(root: &mut BuilderNode, interner: &mut StringInterner) {
    for_each_non_ignored_mut(root, &mut |node| {
        node.element_idx = Some(interner.intern(node.element.as_bytes()));
    });
}

fn intern_attr_names(root: &mut BuilderNode, interner: &mut StringInterner) {
    for_each_non_ignored_mut(root, &mut |node| {
        node.attr_name_idx = node
            .attrs
            .iter()
            .map(|(name, _)| interner.intern(name.as_bytes()))
            .collect();
    });
}

fn intern_attr_values(root: &mut BuilderNode, interner: &mut StringInterner) {
    for_each_non_ignored_mut(root, &mut |node| {
        node.attr_value_idx = node
            .attrs
            .iter()
            .map(|(_, value)| interner.intern(value.as_bytes()))
            .collect();
    });
}

fn intern_text(root: &mut BuilderNode, interner: &mut StringInterner) {
    for_each_non_ignored_mut(root, &mut |node| {
        if let Some(text) = &node.text {
            node.text_idx = Some(interner.intern(text.as_bytes()));
        }
    });
}

/// Step 9: emits the node table in pre-order, recording each node's byte
/// offset, and returns the depth of the last node emitted (used to compute
/// the trailing sentinel count).
pub fn emit_nodes(root: &mut BuilderNode, out: &mut Vec<u8>) -> i64 {
    let mut level: i64 = 0;
    for child in root.children.iter_mut() {
        emit_preorder(child, 1, &mut level, out);
    }
    let trailing = (level - 1).max(0);
    for _ in 0..trailing {
        record::emit_sentinel(out);
    }
    level
}

fn emit_preorder(node: &mut BuilderNode, depth: i64, level: &mut i64, out: &mut Vec<u8>) {
    if node.is_ignored() {
        return;
    }
    let sentinels = (*level - depth + 1).max(0);
    for _ in 0..sentinels {
        record::emit_sentinel(out);
    }

    let element_idx = node.element_idx.expect("element names interned before emission");
    let nr_attrs = node.attr_name_idx.len();
    let offset = record::emit_node(out, element_idx, 0, 0, node.text_idx, nr_attrs);
    for i in 0..nr_attrs {
        record::emit_attr(out, node.attr_name_idx[i], node.attr_value_idx[i]);
    }
    node.offset = Some(offset as u32);
    *level = depth;

    for child in node.children.iter_mut() {
        emit_preorder(child, depth + 1, level, out);
    }
}

/// Step 10: patches `next`/`parent` fields now that every non-ignored node
/// has a recorded offset.
pub fn fixup(root: &BuilderNode, buf: &mut [u8]) {
    fixup_siblings(&root.children, None, buf);
}

fn fixup_siblings(siblings: &[BuilderNode], parent_offset: Option<u32>, buf: &mut [u8]) {
    let mut prev_offset: Option<usize> = None;
    for node in siblings {
        if node.is_ignored() {
            continue;
        }
        let offset = node.offset.expect("every non-ignored node was emitted") as usize;
        if let Some(po) = parent_offset {
            record::patch_parent(buf, offset, po);
        }
        if let Some(prev) = prev_offset {
            record::patch_next(buf, prev, offset as u32);
        }
        prev_offset = Some(offset);
        fixup_siblings(&node.children, Some(offset as u32), buf);
    }
}
