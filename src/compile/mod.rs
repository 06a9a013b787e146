//! The compiler (§4.5): orchestrates multi-import parsing, string interning,
//! node emission, and offset fixup into a finished [`Silo`], plus the
//! `ensure()` cache-reuse path (§4.6).

pub mod guid;
mod layout;

use std::path::Path;

use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::builder_node::BuilderNode;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::flags::CompileFlags;
use crate::import::Import;
use crate::interner::StringInterner;
use crate::parser;
use crate::silo::header::{self, Header};
use crate::silo::Silo;
use guid::GuidAccumulator;

/// Accumulates imports and manually-added nodes, and turns them into a
/// [`Silo`] on demand. Not `Sync`: no two `compile()`/`ensure()` calls on the
/// same `Builder` may run concurrently (§5); independent `Builder`s are free
/// to run in parallel, which is how the CLI's `batch` subcommand fans out
/// across `rayon`.
#[derive(Debug, Default)]
pub struct Builder {
    imports: Vec<Import>,
    manual_nodes: Vec<BuilderNode>,
    guid: GuidAccumulator,
    held: Option<Silo>,
    cancel: CancellationToken,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `text` as an inline import with no explicit origin tag, so its
    /// GUID falls back to a content hash.
    pub fn import_xml(&mut self, text: impl Into<String>) {
        self.imports.push(Import::new_from_xml(text, ""));
    }

    /// Adds a single file import. `info`, if given, is spliced under every
    /// top-level element this file parses into.
    pub fn import_file(&mut self, path: impl AsRef<Path>, info: Option<BuilderNode>) -> Result<()> {
        self.imports.push(Import::new_from_file(path, info)?);
        Ok(())
    }

    /// Walks `path` and imports every file ending in `.xml` or `.xml.gz`,
    /// each carrying a clone of `info`.
    pub fn import_dir(&mut self, path: impl AsRef<Path>, info: Option<BuilderNode>) -> Result<()> {
        let path = path.as_ref();
        for result in ignore::WalkBuilder::new(path).build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping directory entry due to error: {e}");
                    continue;
                }
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if name.ends_with(".xml") || name.ends_with(".xml.gz") {
                self.imports.push(Import::new_from_file(entry.path(), info.clone())?);
            }
        }
        Ok(())
    }

    /// Adds a manually-constructed node, spliced under the synthetic root
    /// alongside every import's top-level elements.
    pub fn import_node(&mut self, node: BuilderNode) {
        self.manual_nodes.push(node);
    }

    /// Extends the builder's GUID fingerprint with arbitrary text.
    pub fn append_guid(&mut self, s: impl AsRef<str>) {
        self.guid.append(s.as_ref());
    }

    /// Requests cooperative cancellation of an in-progress `compile()`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Runs the full compile pipeline: parse, splice, intern, emit, fixup.
    pub fn compile(&mut self, flags: CompileFlags, locales: &[String]) -> Result<Silo> {
        let (merged, guid_bytes) = self.parse_and_merge(flags, locales)?;
        let silo = emit(merged, guid_bytes)?;
        self.held = Some(silo.clone());
        Ok(silo)
    }

    /// Reuses a cached silo at `path` when its GUID already matches the
    /// current inputs, recompiling and overwriting it otherwise (§4.6).
    pub fn ensure(&mut self, path: impl AsRef<Path>, flags: CompileFlags, locales: &[String]) -> Result<Silo> {
        let path = path.as_ref();

        let loaded = match Silo::load_from_file(path) {
            Ok(silo) => Some(silo),
            Err(e) => {
                debug!(?path, error = %e, "no usable cached silo, will recompile");
                None
            }
        };

        let (merged, guid_bytes) = self.parse_and_merge(flags, locales)?;

        if let (Some(loaded), Some(held)) = (&loaded, &self.held) {
            if loaded.guid_bytes() == held.guid_bytes() {
                info!(?path, "ensure: cached silo matches held silo, reusing");
                return Ok(held.clone());
            }
        }

        if let Some(loaded) = loaded {
            if loaded.guid_bytes() == guid_bytes {
                info!(?path, "ensure: cached silo matches current inputs, rebinding");
                self.held = Some(loaded.clone());
                return Ok(loaded);
            }
        }

        info!(?path, "ensure: recompiling");
        let silo = emit(merged, guid_bytes)?;
        silo.save_to_file(path)?;
        self.held = Some(silo.clone());
        Ok(silo)
    }

    /// Steps 1-2: parses every import into a merged synthetic-root tree and
    /// computes the GUID bytes that compiling it right now would produce,
    /// without writing anything. Reused by `ensure()`'s probe and `compile()`
    /// itself so the parse work is never done twice for one call.
    fn parse_and_merge(&self, flags: CompileFlags, locales: &[String]) -> Result<(BuilderNode, [u8; 16])> {
        let mut root = BuilderNode::new("");
        let mut guid = self.guid.clone();

        for import in &self.imports {
            let reader = import.open_cancellable(&self.cancel)?;
            let mut xml_reader = Reader::from_reader(reader);
            match parser::parse_import(&mut xml_reader, flags, locales, import.info.as_ref(), import.guid()) {
                Ok(parsed) => {
                    guid.append(import.guid());
                    root.children.extend(parsed.children);
                    debug!(guid = import.guid(), "parsed import");
                }
                Err(e) => {
                    if flags.contains(CompileFlags::IGNORE_INVALID) {
                        warn!(guid = import.guid(), error = %e, "skipping invalid import");
                    } else {
                        return Err(e.with_import_guid(import.guid()));
                    }
                }
            }
        }

        for node in &self.manual_nodes {
            node.clone_into(&mut root);
        }

        Ok((root, guid.finish()))
    }
}

/// Steps 3-12: size accounting, the four interning passes, header
/// construction, node emission, fixup, and final concatenation.
fn emit(mut root: BuilderNode, guid_bytes: [u8; 16]) -> Result<Silo> {
    let capacity = layout::compute_capacity(&root);

    let mut interner = StringInterner::new();
    let strtab_ntags = layout::intern_strings(&mut root, &mut interner);

    let mut node_table = Vec::with_capacity(capacity.saturating_sub(header::HEADER_SIZE));
    layout::emit_nodes(&mut root, &mut node_table);
    layout::fixup(&root, &mut node_table);

    let strtab_bytes = interner.into_bytes();
    let head = Header {
        version: header::VERSION,
        strtab: (header::HEADER_SIZE + node_table.len()) as u32,
        strtab_ntags,
        guid: guid_bytes,
    };

    let mut bytes = Vec::with_capacity(header::HEADER_SIZE + node_table.len() + strtab_bytes.len());
    bytes.extend_from_slice(&head.encode());
    bytes.extend_from_slice(&node_table);
    bytes.extend_from_slice(&strtab_bytes);

    info!(bytes = bytes.len(), strtab_ntags, "compiled silo");
    Ok(Silo::from_parts(head, bytes))
}
