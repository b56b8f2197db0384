use std::fs::File;
use std::io::{Cursor, Read, Result, Seek, Write};

/// Random access storage an [`IsoFile`](crate::IsoFile) can be bound to.
pub trait Stream: Read + Write + Seek {
    /// Push buffered writes down to durable storage.
    fn sync(&mut self) -> Result<()> {
        self.flush()
    }
}

impl Stream for File {
    fn sync(&mut self) -> Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl Stream for Cursor<Vec<u8>> {}

impl Stream for Cursor<&mut Vec<u8>> {}

impl<S: Stream + ?Sized> Stream for &mut S {
    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}
