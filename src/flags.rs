//! Bit-flag sets used by the builder tree and the compiler.
//!
//! Grounded on this house's convention (see `EDGW-karox`'s `lib/dt` and
//! `lib/config` crates) of reaching for the `bitflags` crate for any bit set
//! rather than hand-rolled masks.

use bitflags::bitflags;

bitflags! {
    /// Flags carried on a single [`crate::builder_node::BuilderNode`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Exclude this subtree's payload from the emitted silo.
        const IGNORE_CDATA = 0b0000_0001;
        /// Disable whitespace collapsing on this node's text.
        const LITERAL_TEXT = 0b0000_0010;
    }
}

bitflags! {
    /// Flags passed to [`crate::compile::Builder::compile`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompileFlags: u8 {
        /// Suppress whitespace normalization on every text-bearing node.
        const LITERAL_TEXT = 0b0000_0001;
        /// Enable `xml:lang` pruning against the accepted-locale list.
        const NATIVE_LANGS = 0b0000_0010;
        /// Continue past per-import parse failures instead of aborting.
        const IGNORE_INVALID = 0b0000_0100;
    }
}
