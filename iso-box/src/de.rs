use std::io::{Read, Seek};

use crate::endian::read_u32_be;
use crate::header::{BoxHeader, FullBoxHeader};
use crate::FourCc;

pub(crate) trait DeserializeOwned {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self>
    where
        Self: Sized;
}

impl DeserializeOwned for FourCc {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let mut bytes = [0u8; 4];
        reader.read_exact(&mut bytes)?;
        Ok(FourCc::from(bytes))
    }
}

impl DeserializeOwned for BoxHeader {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let start = reader.stream_position()?;
        let size = read_u32_be(reader)?;
        let tag = FourCc::deserialize_owned(reader)?;

        tracing::debug!(
            start = format_args!("{:#x}", start),
            size,
            %tag,
            "deserialized BoxHeader"
        );

        Ok(BoxHeader { size, tag })
    }
}

impl DeserializeOwned for FullBoxHeader {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let value = read_u32_be(reader)?;
        Ok(FullBoxHeader {
            version: (value >> 24) as u8,
            flags: value & 0x00ff_ffff,
        })
    }
}
