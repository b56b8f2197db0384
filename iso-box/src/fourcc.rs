use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A four character box type code, such as `moov` or `meta`.
///
/// The code is held as the four bytes packed big-endian, which is the same
/// order they have on disk.
#[repr(transparent)]
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct FourCc(u32);

impl FourCc {
    /// Reserved for the headerless root of a file. Never read from disk.
    pub const ROOT: FourCc = FourCc(0);

    pub const fn new(bytes: &[u8; 4]) -> FourCc {
        FourCc(u32::from_be_bytes(*bytes))
    }

    pub const fn from_u32(value: u32) -> FourCc {
        FourCc(value)
    }

    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(bytes: [u8; 4]) -> Self {
        FourCc::new(&bytes)
    }
}

impl From<FourCc> for u32 {
    fn from(fourcc: FourCc) -> Self {
        fourcc.0
    }
}

impl FromStr for FourCc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii()) {
            return Err(Error::InvalidFourCc(s.to_string()));
        }
        Ok(FourCc::new(&[bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes().iter() {
            if b.is_ascii_graphic() || *b == b' ' {
                write!(f, "{}", *b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({:?})", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_like_a_multichar_literal() {
        assert_eq!(FourCc::new(b"meta").get(), 0x6d65_7461);
        assert_eq!(FourCc::new(b"meta").to_bytes(), *b"meta");
    }

    #[test]
    fn parse_and_display() {
        let tag: FourCc = "sibo".parse().unwrap();
        assert_eq!(tag, FourCc::new(b"sibo"));
        assert_eq!(tag.to_string(), "sibo");
        assert_eq!(FourCc::from_u32(0x0000_0141).to_string(), "\\x00\\x00\\x01A");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "abc".parse::<FourCc>(),
            Err(Error::InvalidFourCc(s)) if s == "abc"
        ));
        assert!("abcde".parse::<FourCc>().is_err());
        assert!("ab\u{e9}".parse::<FourCc>().is_err());
    }
}
