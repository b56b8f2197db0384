use std::io::{ErrorKind, Read, Seek, SeekFrom};

use super::{BoxRef, IsoFile, Lineage};
use crate::de::DeserializeOwned;
use crate::header::{FullBoxHeader, FULL_BOX_LEN, HEADER_LEN};
use crate::{known, Error, FourCc, Result, Stream};

/// One entry of a depth first walk, see [`IsoFile::tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub depth: usize,
    pub node: BoxRef,
}

impl<S: Stream> IsoFile<S> {
    /// Finds the first child of `parent`, optionally the first one with type `tag`.
    ///
    /// Full boxes keep their version and flags in front of their children, so pass
    /// `extra_offset` of 4 for them.
    pub fn first(
        &mut self,
        parent: &BoxRef,
        tag: Option<FourCc>,
        extra_offset: u64,
    ) -> Result<Option<BoxRef>> {
        let (start, end) = if parent.is_root() {
            (0, self.len)
        } else {
            (parent.offset + HEADER_LEN + extra_offset, parent.end())
        };
        self.walk(start, end, parent.child_lineage(), tag)
    }

    /// Finds the sibling following `b`, optionally the next one with type `tag`.
    pub fn next(&mut self, b: &BoxRef, tag: Option<FourCc>) -> Result<Option<BoxRef>> {
        if b.is_root() {
            return Ok(None);
        }
        let end = self.parent_end(b)?;
        self.walk(b.end(), end, b.lineage.clone(), tag)
    }

    /// First child of `parent` with type `tag`.
    #[inline(always)]
    pub fn child(&mut self, parent: &BoxRef, tag: FourCc) -> Result<Option<BoxRef>> {
        self.first(parent, Some(tag), 0)
    }

    /// Follows a chain of [`child`](IsoFile::child) lookups, e.g. `moov`, `trak`, `tkhd`.
    pub fn lookup(&mut self, parent: &BoxRef, tags: &[FourCc]) -> Result<Option<BoxRef>> {
        let mut current = parent.clone();
        for tag in tags {
            current = match self.child(&current, *tag)? {
                Some(b) => b,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    pub fn children(&mut self, parent: &BoxRef, extra_offset: u64) -> Result<Vec<BoxRef>> {
        let mut out = vec![];
        let mut cursor = self.first(parent, None, extra_offset)?;
        while let Some(b) = cursor {
            cursor = self.next(&b, None)?;
            out.push(b);
        }
        Ok(out)
    }

    /// Whether `b` ends the stream, which is the only place anything may be appended.
    pub fn is_last(&self, b: &BoxRef) -> bool {
        b.is_root() || b.end() == self.len
    }

    pub fn full_box_header(&mut self, b: &BoxRef) -> Result<FullBoxHeader> {
        if b.is_root() || b.payload_len() < FULL_BOX_LEN {
            return Err(Error::OutOfBounds {
                tag: b.tag,
                offset: 0,
                len: FULL_BOX_LEN,
                size: b.size,
            });
        }
        self.stream.seek(SeekFrom::Start(b.payload_offset()))?;
        Ok(FullBoxHeader::deserialize_owned(&mut self.stream)?)
    }

    /// Reads up to `buf.len()` bytes from `offset` within the payload of `b`.
    ///
    /// Reads are clipped to the box, so a short count is normal near its end.
    pub fn read(&mut self, b: &BoxRef, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let available = match b.payload_len().checked_sub(offset) {
            Some(n) if n > 0 => n,
            _ => return Ok(0),
        };
        let len = (buf.len() as u64).min(available) as usize;
        self.stream.seek(SeekFrom::Start(b.payload_offset() + offset))?;

        let mut filled = 0;
        while filled < len {
            match self.stream.read(&mut buf[filled..len]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Depth first walk of every box below `parent`, descending into the
    /// container types listed in [`known`].
    pub fn tree(&mut self, parent: &BoxRef) -> Result<Vec<TreeNode>> {
        let mut out = vec![];
        let extra = if parent.is_root() {
            Some(0)
        } else {
            known::container_offset(parent.tag)
        };
        if let Some(extra) = extra {
            self.tree_inner(parent, extra, 0, &mut out)?;
        }
        Ok(out)
    }

    fn tree_inner(
        &mut self,
        parent: &BoxRef,
        extra_offset: u64,
        depth: usize,
        out: &mut Vec<TreeNode>,
    ) -> Result<()> {
        for node in self.children(parent, extra_offset)? {
            let descend = known::container_offset(node.tag);
            out.push(TreeNode {
                depth,
                node: node.clone(),
            });
            if let Some(extra) = descend {
                self.tree_inner(&node, extra, depth + 1, out)?;
            }
        }
        Ok(())
    }

    fn walk(
        &mut self,
        start: u64,
        end: u64,
        lineage: Lineage,
        tag: Option<FourCc>,
    ) -> Result<Option<BoxRef>> {
        let mut offset = start;
        loop {
            let candidate = match self.box_at(offset, end, &lineage)? {
                Some(b) => b,
                None => return Ok(None),
            };
            if tag.map_or(true, |t| t == candidate.tag) {
                return Ok(Some(candidate));
            }
            offset = candidate.end();
        }
    }

    /// Reads the box whose header starts at `offset`, provided it fits before `end`.
    fn box_at(&mut self, offset: u64, end: u64, lineage: &Lineage) -> Result<Option<BoxRef>> {
        if offset + HEADER_LEN > end {
            return Ok(None);
        }

        let header = self.read_header_at(offset)?;
        let size = header.size as u64;
        if size < HEADER_LEN || offset + size > end {
            tracing::warn!(
                offset = format_args!("{:#x}", offset),
                end = format_args!("{:#x}", end),
                size,
                tag = %header.tag,
                "box does not fit its parent; stopping"
            );
            return Ok(None);
        }

        Ok(Some(BoxRef {
            tag: header.tag,
            size,
            offset,
            lineage: lineage.clone(),
        }))
    }
}
