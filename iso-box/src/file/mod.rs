use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::de::DeserializeOwned;
use crate::header::{BoxHeader, HEADER_LEN};
use crate::{Error, FourCc, Result, Stream};

pub mod reader;
pub mod writer;

pub use self::reader::TreeNode;
pub use self::writer::Payload;

/// Where a box sits in the tree, captured while descending from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lineage {
    Root,
    /// Header offsets of the enclosing boxes, outermost first. Empty for top level boxes.
    Child(Vec<u64>),
}

/// A box as it was on disk when its header was last read.
///
/// This is plain data: it owns no part of the stream and does not track later
/// writes made by anyone but the [`IsoFile`] methods it is passed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxRef {
    pub(crate) tag: FourCc,
    pub(crate) size: u64,
    pub(crate) offset: u64,
    pub(crate) lineage: Lineage,
}

impl BoxRef {
    #[inline(always)]
    pub fn tag(&self) -> FourCc {
        self.tag
    }

    /// Total size including the header. For the root this is the stream length.
    #[inline(always)]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline(always)]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline(always)]
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.lineage == Lineage::Root
    }

    /// The root has no header; every other box has the 8 byte one.
    #[inline(always)]
    pub fn header_len(&self) -> u64 {
        if self.is_root() {
            0
        } else {
            HEADER_LEN
        }
    }

    #[inline(always)]
    pub fn payload_offset(&self) -> u64 {
        self.offset + self.header_len()
    }

    #[inline(always)]
    pub fn payload_len(&self) -> u64 {
        self.size.saturating_sub(self.header_len())
    }

    /// Header offsets of every enclosing box below the root, outermost first.
    pub fn ancestors(&self) -> &[u64] {
        match &self.lineage {
            Lineage::Root => &[],
            Lineage::Child(offsets) => offsets,
        }
    }

    /// Nesting level: 0 for top level boxes and for the root itself.
    pub fn depth(&self) -> usize {
        self.ancestors().len()
    }

    pub(crate) fn child_lineage(&self) -> Lineage {
        match &self.lineage {
            Lineage::Root => Lineage::Child(vec![]),
            Lineage::Child(offsets) => {
                let mut offsets = offsets.clone();
                offsets.push(self.offset);
                Lineage::Child(offsets)
            }
        }
    }
}

/// A box structured file, bound to a single read-write stream.
///
/// The file itself is the root box: it has no header and spans the whole stream.
#[derive(Debug)]
pub struct IsoFile<S = File> {
    pub(crate) stream: S,
    pub(crate) len: u64,
    pub(crate) path: Option<PathBuf>,
}

impl IsoFile<File> {
    /// Opens an existing file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<IsoFile<File>> {
        let path = path.as_ref();
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .and_then(|file| IsoFile::bind(file, Some(path.to_path_buf())))
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Creates a new empty file for reading and writing, and errors if the file already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<IsoFile<File>> {
        let path = path.as_ref();
        OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .and_then(|file| IsoFile::bind(file, Some(path.to_path_buf())))
            .map_err(|source| Error::Open {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl<S: Stream> IsoFile<S> {
    pub fn new(stream: S) -> Result<IsoFile<S>> {
        Ok(IsoFile::bind(stream, None)?)
    }

    fn bind(mut stream: S, path: Option<PathBuf>) -> std::io::Result<IsoFile<S>> {
        let len = stream.seek(SeekFrom::End(0))?;
        tracing::debug!(len, path = ?path, "bound stream");
        Ok(IsoFile { stream, len, path })
    }

    pub fn root(&self) -> BoxRef {
        BoxRef {
            tag: FourCc::ROOT,
            size: self.len,
            offset: 0,
            lineage: Lineage::Root,
        }
    }

    /// Current stream length, as tracked across every append made through this file.
    #[inline(always)]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Writes are not flushed implicitly. Call this before any other process reads the file.
    pub fn flush(&mut self) -> Result<()> {
        self.stream.sync()?;
        Ok(())
    }

    pub(crate) fn read_header_at(&mut self, offset: u64) -> std::io::Result<BoxHeader> {
        self.stream.seek(SeekFrom::Start(offset))?;
        BoxHeader::deserialize_owned(&mut self.stream)
    }

    /// End offset of the box enclosing `b`, re-read from disk.
    pub(crate) fn parent_end(&mut self, b: &BoxRef) -> std::io::Result<u64> {
        match b.ancestors().last() {
            Some(&parent) => {
                let header = self.read_header_at(parent)?;
                Ok(parent + header.size as u64)
            }
            None => Ok(self.len),
        }
    }

    /// Re-reads the stream length after a failed write. If that fails too the
    /// tracked length is left as it was.
    pub(crate) fn sync_len(&mut self) {
        match self.stream.seek(SeekFrom::End(0)) {
            Ok(len) => self.len = len,
            Err(e) => tracing::warn!(
                len = self.len,
                error = %e,
                "cannot resync stream length; it may be stale"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.mp4");
        match IsoFile::open(&path) {
            Err(Error::Open { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.mp4");
        let file = IsoFile::create(&path).unwrap();
        assert!(file.is_empty());
        assert_eq!(file.path(), Some(path.as_path()));
        assert!(matches!(IsoFile::create(&path), Err(Error::Open { .. })));
    }

    #[test]
    fn root_spans_stream() {
        let file = IsoFile::new(Cursor::new(vec![0u8; 24])).unwrap();
        let root = file.root();
        assert!(root.is_root());
        assert_eq!(root.tag(), FourCc::ROOT);
        assert_eq!(root.offset(), 0);
        assert_eq!(root.size(), 24);
        assert_eq!(root.header_len(), 0);
        assert_eq!(root.payload_len(), 24);
    }

    #[test]
    fn lineage_grows_by_one_offset_per_level() {
        let root = BoxRef {
            tag: FourCc::ROOT,
            size: 100,
            offset: 0,
            lineage: Lineage::Root,
        };
        let top = BoxRef {
            tag: FourCc::new(b"moov"),
            size: 50,
            offset: 16,
            lineage: root.child_lineage(),
        };
        let inner = BoxRef {
            tag: FourCc::new(b"trak"),
            size: 20,
            offset: 24,
            lineage: top.child_lineage(),
        };
        assert_eq!(top.depth(), 0);
        assert_eq!(inner.ancestors(), &[16]);
        assert_eq!(inner.depth(), 1);
        assert!(!inner.is_root());
    }
}
