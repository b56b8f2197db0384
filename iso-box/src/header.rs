use crate::FourCc;

/// Length of a plain box header: 32-bit size followed by the type code.
pub const HEADER_LEN: u64 = 8;

/// Length of the version and flags field that opens a full box payload.
pub const FULL_BOX_LEN: u64 = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BoxHeader {
    /// Total size of the box, header included.
    pub size: u32,
    pub tag: FourCc,
}

impl BoxHeader {
    pub fn new(tag: FourCc, size: u32) -> BoxHeader {
        BoxHeader { size, tag }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct FullBoxHeader {
    pub version: u8,
    /// Only the low 24 bits are stored.
    pub flags: u32,
}

impl FullBoxHeader {
    pub fn new(version: u8, flags: u32) -> FullBoxHeader {
        FullBoxHeader {
            version,
            flags: flags & 0x00ff_ffff,
        }
    }
}
