use std::convert::TryFrom;
use std::io::{Read, Seek, SeekFrom, Write};

use super::{BoxRef, IsoFile};
use crate::endian::write_u32_be;
use crate::header::{BoxHeader, FullBoxHeader, FULL_BOX_LEN, HEADER_LEN};
use crate::ser::Serialize;
use crate::{Error, FourCc, Result, Stream};

/// Bytes to write, either borrowed or a run of zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Bytes(&'a [u8]),
    Zeroed(u64),
}

impl<'a> Payload<'a> {
    pub const EMPTY: Payload<'static> = Payload::Zeroed(0);

    pub fn len(&self) -> u64 {
        match self {
            Payload::Bytes(bytes) => bytes.len() as u64,
            Payload::Zeroed(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Payload::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

/// Size fields to rewrite for one resize, innermost box first.
#[derive(Debug)]
struct ResizePlan {
    fields: Vec<(u64, u32)>,
    delta: u64,
}

impl<S: Stream> IsoFile<S> {
    /// Appends a new child box of type `tag` to the end of `parent`, growing
    /// `parent` and all of its ancestors to cover it.
    ///
    /// `parent` must be the last box in the stream at its level, otherwise the
    /// new bytes would land on top of whatever follows it.
    pub fn append_box(
        &mut self,
        parent: &mut BoxRef,
        tag: FourCc,
        payload: Payload<'_>,
    ) -> Result<BoxRef> {
        self.append_child(parent, tag, None, payload)
    }

    /// Like [`append_box`](IsoFile::append_box), writing version and flags in
    /// front of the payload.
    pub fn append_full_box(
        &mut self,
        parent: &mut BoxRef,
        tag: FourCc,
        full: FullBoxHeader,
        payload: Payload<'_>,
    ) -> Result<BoxRef> {
        self.append_child(parent, tag, Some(full), payload)
    }

    /// Appends raw bytes to the payload of `b`, which must be the last box in the stream.
    pub fn append_bytes(&mut self, b: &mut BoxRef, payload: Payload<'_>) -> Result<()> {
        self.ensure_last(b)?;
        let plan = self.plan_resize(b, payload.len())?;

        let offset = self.tail_of(b);
        self.write_at(offset, |file| file.write_payload(payload))?;
        self.len += payload.len();

        tracing::debug!(
            offset = format_args!("{:#x}", offset),
            bytes = payload.len(),
            tag = %b.tag,
            "appended bytes"
        );

        self.commit_resize(b, plan)
    }

    /// Overwrites payload bytes of `b` starting at `offset`. Never changes its size.
    pub fn update(&mut self, b: &BoxRef, offset: u64, payload: Payload<'_>) -> Result<()> {
        let fits = offset
            .checked_add(b.header_len())
            .and_then(|x| x.checked_add(payload.len()))
            .map_or(false, |end| end <= b.size);
        if !fits {
            return Err(Error::OutOfBounds {
                tag: b.tag,
                offset,
                len: payload.len(),
                size: b.size,
            });
        }

        let start = b.payload_offset() + offset;
        self.stream.seek(SeekFrom::Start(start))?;
        self.write_payload(payload)?;

        tracing::debug!(
            offset = format_args!("{:#x}", start),
            bytes = payload.len(),
            tag = %b.tag,
            "updated payload"
        );
        Ok(())
    }

    /// Grows `b` and every ancestor by `delta` bytes, rewriting their size fields.
    ///
    /// Only size fields are written; the bytes they now cover must already be in place.
    pub fn resize(&mut self, b: &mut BoxRef, delta: u64) -> Result<()> {
        let plan = self.plan_resize(b, delta)?;
        self.commit_resize(b, plan)
    }

    fn append_child(
        &mut self,
        parent: &mut BoxRef,
        tag: FourCc,
        full: Option<FullBoxHeader>,
        payload: Payload<'_>,
    ) -> Result<BoxRef> {
        self.ensure_last(parent)?;

        let offset = self.tail_of(parent);
        let prefix = full.map_or(0, |_| FULL_BOX_LEN);
        let size = HEADER_LEN + prefix + payload.len();
        let size32 =
            u32::try_from(size).map_err(|_| Error::TooLarge { tag, offset, size })?;
        let plan = self.plan_resize(parent, size)?;

        self.write_at(offset, |file| {
            BoxHeader::new(tag, size32).write(&mut file.stream)?;
            if let Some(full) = full {
                full.write(&mut file.stream)?;
            }
            file.write_payload(payload)
        })?;
        self.len += size;

        tracing::debug!(
            offset = format_args!("{:#x}", offset),
            size,
            %tag,
            parent = %parent.tag,
            "appended box"
        );

        let child = BoxRef {
            tag,
            size,
            offset,
            lineage: parent.child_lineage(),
        };
        self.commit_resize(parent, plan)?;
        Ok(child)
    }

    fn ensure_last(&self, b: &BoxRef) -> Result<()> {
        if self.is_last(b) {
            return Ok(());
        }
        Err(Error::NotLast {
            tag: b.tag,
            offset: b.offset,
            end: b.end(),
            stream_len: self.len,
        })
    }

    /// Computes every new size before anything is written, so an overflow
    /// anywhere on the path leaves the stream untouched.
    fn plan_resize(&mut self, b: &BoxRef, delta: u64) -> Result<ResizePlan> {
        let mut fields = vec![];
        if !b.is_root() {
            fields.push((b.offset, grown(b.tag, b.offset, b.size, delta)?));
            for &ancestor in b.ancestors().iter().rev() {
                let header = self.read_header_at(ancestor)?;
                fields.push((
                    ancestor,
                    grown(header.tag, ancestor, header.size as u64, delta)?,
                ));
            }
        }
        Ok(ResizePlan { fields, delta })
    }

    fn commit_resize(&mut self, b: &mut BoxRef, plan: ResizePlan) -> Result<()> {
        let total = plan.fields.len();
        for (committed, &(offset, size)) in plan.fields.iter().enumerate() {
            let written = self
                .stream
                .seek(SeekFrom::Start(offset))
                .and_then(|_| write_u32_be(&mut self.stream, size));
            if let Err(source) = written {
                return Err(match committed {
                    0 => Error::Io(source),
                    _ => Error::PartialResize {
                        committed,
                        total,
                        source,
                    },
                });
            }
            tracing::debug!(
                offset = format_args!("{:#x}", offset),
                size,
                delta = plan.delta,
                "rewrote size field"
            );
        }
        if b.is_root() {
            b.size = self.len;
        } else {
            b.size += plan.delta;
        }
        Ok(())
    }

    /// Where bytes appended to `b` land. The root always ends at the stream end,
    /// however stale the handle is.
    fn tail_of(&self, b: &BoxRef) -> u64 {
        if b.is_root() {
            self.len
        } else {
            b.end()
        }
    }

    /// Runs `f` with the stream positioned at `offset`, resynchronising the
    /// tracked length if it fails partway.
    fn write_at<F>(&mut self, offset: u64, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> std::io::Result<()>,
    {
        let result = match self.stream.seek(SeekFrom::Start(offset)) {
            Ok(_) => f(self),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.sync_len();
            return Err(e.into());
        }
        Ok(())
    }

    fn write_payload(&mut self, payload: Payload<'_>) -> std::io::Result<()> {
        match payload {
            Payload::Bytes(bytes) => self.stream.write_all(bytes),
            Payload::Zeroed(len) => {
                let written = std::io::copy(&mut std::io::repeat(0).take(len), &mut self.stream)?;
                if written != len {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "short write while zero filling",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn grown(tag: FourCc, offset: u64, size: u64, delta: u64) -> Result<u32> {
    size.checked_add(delta)
        .and_then(|size| u32::try_from(size).ok())
        .ok_or_else(|| Error::TooLarge {
            tag,
            offset,
            size: size.saturating_add(delta),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEST: FourCc = FourCc::new(b"TEST");

    fn empty() -> IsoFile<Cursor<Vec<u8>>> {
        IsoFile::new(Cursor::new(vec![])).unwrap()
    }

    fn stored_size<S: Stream>(file: &mut IsoFile<S>, offset: u64) -> u32 {
        file.read_header_at(offset).unwrap().size
    }

    /// Lets `writes_left` write calls through, then fails every one after.
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        writes_left: usize,
        fail_seek_end: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.writes_left == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.writes_left -= 1;
            self.inner.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Seek for Flaky {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            if self.fail_seek_end {
                if let SeekFrom::End(_) = pos {
                    return Err(std::io::Error::new(std::io::ErrorKind::Other, "seek"));
                }
            }
            self.inner.seek(pos)
        }
    }

    impl Stream for Flaky {}

    /// moov { trak { mdia } } with every box empty, on a stream allowing `writes_left` writes.
    fn flaky_chain(writes_left: usize) -> (IsoFile<Flaky>, BoxRef) {
        let mut file = empty();
        let mut root = file.root();
        let mut a = file
            .append_box(&mut root, FourCc::new(b"moov"), Payload::EMPTY)
            .unwrap();
        let mut b = file
            .append_box(&mut a, FourCc::new(b"trak"), Payload::EMPTY)
            .unwrap();
        file.append_box(&mut b, FourCc::new(b"mdia"), Payload::EMPTY)
            .unwrap();

        let mut file = IsoFile::new(Flaky {
            inner: Cursor::new(file.into_inner().into_inner()),
            writes_left,
            fail_seek_end: false,
        })
        .unwrap();
        let root = file.root();
        let c = file
            .lookup(
                &root,
                &[FourCc::new(b"moov"), FourCc::new(b"trak"), FourCc::new(b"mdia")],
            )
            .unwrap()
            .unwrap();
        (file, c)
    }

    #[test]
    fn append_to_empty_stream() {
        let mut file = empty();
        let mut root = file.root();
        let b = file
            .append_box(&mut root, TEST, Payload::Bytes(&[1, 2, 3, 4]))
            .unwrap();

        assert_eq!(b.offset(), 0);
        assert_eq!(b.size(), 12);
        assert!(file.is_last(&b));
        assert_eq!(root.size(), 12);
        assert_eq!(file.len(), 12);
        assert_eq!(
            file.into_inner().into_inner(),
            b"\x00\x00\x00\x0cTEST\x01\x02\x03\x04"
        );
    }

    #[test]
    fn zero_filled_and_empty_boxes() {
        let mut file = empty();
        let mut root = file.root();
        let mut outer = file
            .append_box(&mut root, FourCc::new(b"sinf"), Payload::EMPTY)
            .unwrap();
        assert_eq!(outer.size(), 8);
        file.append_box(&mut outer, FourCc::new(b"sibo"), Payload::Zeroed(5))
            .unwrap();
        assert_eq!(outer.size(), 21);
        assert_eq!(
            file.into_inner().into_inner(),
            b"\x00\x00\x00\x15sinf\x00\x00\x00\x0dsibo\x00\x00\x00\x00\x00"
        );
    }

    #[test]
    fn full_box_prefix() {
        let mut file = empty();
        let mut root = file.root();
        let mut meta = file
            .append_full_box(
                &mut root,
                FourCc::new(b"meta"),
                FullBoxHeader::default(),
                Payload::EMPTY,
            )
            .unwrap();
        assert_eq!(meta.size(), 12);
        assert_eq!(file.full_box_header(&meta).unwrap(), FullBoxHeader::default());

        let child = file
            .append_box(&mut meta, FourCc::new(b"sumi"), Payload::Zeroed(4))
            .unwrap();
        let found = file
            .first(&meta, Some(FourCc::new(b"sumi")), FULL_BOX_LEN)
            .unwrap()
            .unwrap();
        assert_eq!(found, child);
        assert_eq!(stored_size(&mut file, 0), 24);
    }

    #[test]
    fn append_bytes_extends_payload() {
        let mut file = empty();
        let mut root = file.root();
        let mut outer = file
            .append_box(&mut root, FourCc::new(b"udta"), Payload::EMPTY)
            .unwrap();
        let mut inner = file
            .append_box(&mut outer, TEST, Payload::Bytes(b"ab"))
            .unwrap();
        file.append_bytes(&mut inner, Payload::Bytes(b"cd")).unwrap();

        assert_eq!(inner.size(), 12);
        assert_eq!(stored_size(&mut file, 8), 12);
        assert_eq!(stored_size(&mut file, 0), 20);
        assert_eq!(file.len(), 20);

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&inner, 0, &mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"abcd");
    }

    #[test]
    fn append_requires_last_box() {
        let mut file = empty();
        let mut root = file.root();
        let mut first = file
            .append_box(&mut root, FourCc::new(b"moov"), Payload::EMPTY)
            .unwrap();
        file.append_box(&mut root, FourCc::new(b"mdat"), Payload::Zeroed(4))
            .unwrap();
        let before = file.get_ref().get_ref().clone();

        match file.append_box(&mut first, TEST, Payload::Zeroed(4)) {
            Err(Error::NotLast {
                offset, stream_len, ..
            }) => {
                assert_eq!(offset, 0);
                assert_eq!(stream_len, 20);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            file.append_bytes(&mut first, Payload::Zeroed(1)),
            Err(Error::NotLast { .. })
        ));
        assert_eq!(first.size(), 8);
        assert_eq!(file.get_ref().get_ref(), &before);
    }

    #[test]
    fn update_bounds() {
        let mut file = empty();
        let mut root = file.root();
        let b = file
            .append_box(&mut root, TEST, Payload::Bytes(&[1, 2, 3, 4]))
            .unwrap();

        file.update(&b, 2, Payload::Bytes(&[9, 9])).unwrap();
        let err = file.update(&b, 2, Payload::Bytes(&[7, 7, 7])).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { offset: 2, len: 3, size: 12, .. }));
        assert!(file.update(&b, u64::MAX, Payload::Bytes(&[1])).is_err());

        let mut buf = [0u8; 4];
        assert_eq!(file.read(&b, 0, &mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 9, 9]);

        file.update(&b, 0, Payload::Zeroed(4)).unwrap();
        file.read(&b, 0, &mut buf).unwrap();
        assert_eq!(buf, [0; 4]);
        assert_eq!(file.len(), 12);
    }

    #[test]
    fn resize_rewrites_every_ancestor() {
        let mut file = empty();
        let mut root = file.root();
        let mut a = file
            .append_box(&mut root, FourCc::new(b"moov"), Payload::EMPTY)
            .unwrap();
        let mut b = file
            .append_box(&mut a, FourCc::new(b"trak"), Payload::EMPTY)
            .unwrap();
        let mut c = file
            .append_box(&mut b, FourCc::new(b"mdia"), Payload::EMPTY)
            .unwrap();

        file.resize(&mut c, 3).unwrap();
        assert_eq!(c.size(), 11);
        assert_eq!(stored_size(&mut file, 16), 11);
        assert_eq!(stored_size(&mut file, 8), 19);
        assert_eq!(stored_size(&mut file, 0), 27);

        // the root has no size field to rewrite
        let len = file.len();
        file.resize(&mut root, 5).unwrap();
        assert_eq!(file.len(), len);
    }

    #[test]
    fn resize_overflow_writes_nothing() {
        let mut file = empty();
        let mut root = file.root();
        let mut a = file
            .append_box(&mut root, FourCc::new(b"moov"), Payload::EMPTY)
            .unwrap();
        let mut b = file
            .append_box(&mut a, FourCc::new(b"trak"), Payload::EMPTY)
            .unwrap();
        let before = file.get_ref().get_ref().clone();

        let err = file.resize(&mut b, u32::MAX as u64).unwrap_err();
        assert!(matches!(err, Error::TooLarge { .. }));
        assert_eq!(b.size(), 8);
        assert_eq!(file.get_ref().get_ref(), &before);

        let err = file
            .append_box(&mut b, TEST, Payload::Zeroed(u32::MAX as u64))
            .unwrap_err();
        assert!(matches!(err, Error::TooLarge { .. }));
        assert_eq!(file.get_ref().get_ref(), &before);
    }

    #[test]
    fn failure_on_first_size_field_is_io() {
        let (mut file, mut c) = flaky_chain(0);
        let err = file.resize(&mut c, 3).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(c.size(), 8);
        assert_eq!(stored_size(&mut file, 16), 8);
        assert_eq!(stored_size(&mut file, 8), 16);
        assert_eq!(stored_size(&mut file, 0), 24);
    }

    #[test]
    fn failure_partway_reports_committed_fields() {
        let (mut file, mut c) = flaky_chain(1);
        match file.resize(&mut c, 3) {
            Err(Error::PartialResize {
                committed, total, ..
            }) => {
                assert_eq!(committed, 1);
                assert_eq!(total, c.depth() + 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.size(), 8);
        assert_eq!(stored_size(&mut file, 16), 11);
        assert_eq!(stored_size(&mut file, 8), 16);
        assert_eq!(stored_size(&mut file, 0), 24);

        let (mut file, mut c) = flaky_chain(2);
        assert!(matches!(
            file.resize(&mut c, 3),
            Err(Error::PartialResize {
                committed: 2,
                total: 3,
                ..
            })
        ));
        assert_eq!(stored_size(&mut file, 16), 11);
        assert_eq!(stored_size(&mut file, 8), 19);
        assert_eq!(stored_size(&mut file, 0), 24);
    }

    #[test]
    fn failed_append_resyncs_length() {
        // the size field lands, the type code does not
        let (mut file, mut c) = flaky_chain(1);
        let err = file.append_box(&mut c, TEST, Payload::EMPTY).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(file.len(), 28);
        assert_eq!(file.get_ref().inner.get_ref().len(), 28);
        assert_eq!(c.size(), 8);
        assert_eq!(stored_size(&mut file, 0), 24);
    }

    #[test]
    fn failed_resync_keeps_tracked_length() {
        let (mut file, mut c) = flaky_chain(1);
        file.stream.fail_seek_end = true;
        assert!(file.append_box(&mut c, TEST, Payload::EMPTY).is_err());
        assert_eq!(file.len(), 24);
    }
}
