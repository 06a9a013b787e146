//! One logical XML source added to a [`crate::compile::Builder`] (§3, §4.3).

use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::bufread::GzDecoder;
use sha1::{Digest, Sha1};

use crate::builder_node::BuilderNode;
use crate::cancel::CancellationToken;
use crate::error::{CompileError, Result};

/// Maximum bytes requested from the inner reader per `read()` call, per
/// §5's "blocking reads on each import's input stream in 32 KiB chunks".
const CHUNK: usize = 32 * 1024;

/// Wraps a reader so every `read()` call first checks a [`CancellationToken`]
/// and is capped at [`CHUNK`] bytes, giving the token a chance to be
/// observed between chunks even for large single reads.
struct CancellableReader<R> {
    inner: R,
    token: CancellationToken,
}

impl<R: Read> Read for CancellableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.token.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "compile cancelled"));
        }
        let cap = buf.len().min(CHUNK);
        self.inner.read(&mut buf[..cap])
    }
}

impl<R: BufRead> BufRead for CancellableReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.token.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "compile cancelled"));
        }
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

#[derive(Debug, Clone)]
enum ImportSource {
    /// In-memory XML text, as given to `import_xml`.
    Inline(String),
    /// A file on disk, transparently gzip-decompressed if its name ends in
    /// `.xml.gz`.
    File { path: PathBuf, gzip: bool },
}

/// `{stream, info?, guid}` (§4.3).
#[derive(Debug, Clone)]
pub struct Import {
    source: ImportSource,
    /// Optional subtree spliced under every top-level element parsed from
    /// this import.
    pub info: Option<BuilderNode>,
    guid: String,
}

impl Import {
    /// Wraps in-memory XML text. `guid` is `origin_tag` if non-empty, else a
    /// hash of the content.
    pub fn new_from_xml(text: impl Into<String>, origin_tag: impl Into<String>) -> Self {
        let text = text.into();
        let origin_tag = origin_tag.into();
        let guid = if origin_tag.is_empty() {
            hash_content(text.as_bytes())
        } else {
            origin_tag
        };
        Import {
            source: ImportSource::Inline(text),
            info: None,
            guid,
        }
    }

    /// Opens `path` for later parsing. GUID is the absolute path string.
    /// Decompression is transparent for paths ending in `.xml.gz`.
    pub fn new_from_file(path: impl AsRef<Path>, info: Option<BuilderNode>) -> Result<Self> {
        let path = path.as_ref();
        let gzip = path
            .to_string_lossy()
            .to_ascii_lowercase()
            .ends_with(".xml.gz");
        let absolute = std::fs::canonicalize(path).map_err(|e| CompileError::io(path, e))?;
        let guid = absolute.to_string_lossy().into_owned();
        Ok(Import {
            source: ImportSource::File {
                path: path.to_path_buf(),
                gzip,
            },
            info,
            guid,
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Opens a fresh reader over this import's bytes, decompressing gzip
    /// transparently. Each call re-opens the underlying file, so an import
    /// can be parsed more than once (e.g. by `ensure()`'s GUID probe and a
    /// later `compile()`).
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        self.open_cancellable(&CancellationToken::new())
    }

    /// Same as [`Import::open`], but reads honor `token`: once cancelled,
    /// the next read returns an I/O error that the parser driver surfaces
    /// as [`CompileError::Cancelled`].
    pub fn open_cancellable(&self, token: &CancellationToken) -> Result<Box<dyn BufRead + Send>> {
        let inner: Box<dyn BufRead + Send> = match &self.source {
            ImportSource::Inline(text) => Box::new(Cursor::new(text.clone().into_bytes())),
            ImportSource::File { path, gzip } => {
                let file = std::fs::File::open(path).map_err(|e| CompileError::io(path, e))?;
                let reader = BufReader::new(file);
                if *gzip {
                    Box::new(BufReader::new(GzDecoder::new(reader)))
                } else {
                    Box::new(reader)
                }
            }
        };
        Ok(Box::new(CancellableReader {
            inner,
            token: token.clone(),
        }))
    }
}

/// Hashes arbitrary content into a GUID string for inline imports with no
/// explicit origin tag.
fn hash_content(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
