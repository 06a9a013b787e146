//! Compiles XML documents into compact, mmap-friendly binary silos.
//!
//! # Architecture
//! - `error`: the layered `CompileError` type callers match on.
//! - `flags`: `bitflags!` sets carried on builder nodes and passed to `compile()`.
//! - `interner`: the deduplicating string table.
//! - `builder_node`: the in-memory mutable tree grown while parsing.
//! - `cancel`: the cooperative cancellation token.
//! - `import`: one logical XML source (inline text, a file, or a gzip file).
//! - `parser`: the quick-xml-backed driver that grows a builder tree from SAX events.
//! - `silo`: the binary format itself — header, node records, and the loader.
//! - `compile`: the orchestration layer tying the above into `Builder::compile`/`ensure`.

pub mod builder_node;
pub mod cancel;
pub mod compile;
pub mod error;
pub mod flags;
pub mod import;
pub mod interner;
pub mod parser;
pub mod silo;

pub use builder_node::BuilderNode;
pub use compile::Builder;
pub use error::{CompileError, Result};
pub use flags::{CompileFlags, NodeFlags};
pub use silo::Silo;
