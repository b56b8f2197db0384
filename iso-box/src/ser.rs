use std::io::{Seek, Write};

use crate::endian::write_u32_be;
use crate::header::{BoxHeader, FullBoxHeader};
use crate::FourCc;

pub(crate) trait Serialize {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> std::io::Result<()>;
}

impl Serialize for FourCc {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

impl Serialize for BoxHeader {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> std::io::Result<()> {
        write_u32_be(writer, self.size)?;
        self.tag.write(writer)
    }
}

impl Serialize for FullBoxHeader {
    fn write<W: Write + Seek>(&self, writer: &mut W) -> std::io::Result<()> {
        write_u32_be(writer, ((self.version as u32) << 24) | (self.flags & 0x00ff_ffff))
    }
}
