//! Box types whose payload is a sequence of child boxes.

use crate::FourCc;

pub const FTYP: FourCc = FourCc::new(b"ftyp");
pub const MOOV: FourCc = FourCc::new(b"moov");
pub const TRAK: FourCc = FourCc::new(b"trak");
pub const TKHD: FourCc = FourCc::new(b"tkhd");
pub const MDIA: FourCc = FourCc::new(b"mdia");
pub const MINF: FourCc = FourCc::new(b"minf");
pub const STBL: FourCc = FourCc::new(b"stbl");
pub const DINF: FourCc = FourCc::new(b"dinf");
pub const EDTS: FourCc = FourCc::new(b"edts");
pub const UDTA: FourCc = FourCc::new(b"udta");
pub const MVEX: FourCc = FourCc::new(b"mvex");
pub const MOOF: FourCc = FourCc::new(b"moof");
pub const TRAF: FourCc = FourCc::new(b"traf");
pub const MFRA: FourCc = FourCc::new(b"mfra");
pub const MDAT: FourCc = FourCc::new(b"mdat");
pub const META: FourCc = FourCc::new(b"meta");
pub const IPRO: FourCc = FourCc::new(b"ipro");
pub const SINF: FourCc = FourCc::new(b"sinf");
pub const SCHM: FourCc = FourCc::new(b"schm");
pub const SCHI: FourCc = FourCc::new(b"schi");

/// Offset from the end of the header of `tag` to its first child, or `None`
/// when boxes of that type do not hold children.
pub fn container_offset(tag: FourCc) -> Option<u64> {
    match tag {
        MOOV | TRAK | MDIA | MINF | STBL | DINF | EDTS | UDTA | MVEX | MOOF | TRAF | MFRA
        | SINF | SCHI => Some(0),
        // full box
        META => Some(4),
        // full box followed by a 16-bit entry count
        IPRO => Some(6),
        _ => None,
    }
}
