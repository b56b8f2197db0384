//! Payloads of the boxes written by `isosign sign`.

use std::convert::TryInto;

use byteorder::{BigEndian, ByteOrder};
use iso_box::FourCc;

pub const SUMI: FourCc = FourCc::new(b"sumi");
pub const SIBO: FourCc = FourCc::new(b"sibo");
pub const CERT: FourCc = FourCc::new(b"cert");
pub const CSTB: FourCc = FourCc::new(b"cstb");
pub const AUIB: FourCc = FourCc::new(b"auib");

pub const SCHEME_TYPE: FourCc = FourCc::new(b"OEFF");
pub const SCHEME_VERSION: u32 = 0x0000_0100;

/// Three UUIDs, start time, duration and two URI sizes.
pub const SUMI_LEN: usize = 3 * 16 + 8 + 8 + 2 + 2;

/// Version and flags followed by an entry count of one.
pub const IPRO_INITIAL: [u8; 6] = [0, 0, 0, 0, 0, 1];

/// Offset of the 16-bit entry count inside the `ipro` payload.
pub const IPRO_COUNT_OFFSET: u64 = 4;

pub const MAX_CERTIFICATE_LEN: usize = 2048;

/// Bytes of `tkhd` needed to find the track id for either version.
pub const TKHD_PREFIX_LEN: usize = 24;

pub fn sumi(start_time: u64) -> [u8; SUMI_LEN] {
    // fragment, previous and next fragment UUIDs stay zero, as do duration and URI sizes
    let mut out = [0u8; SUMI_LEN];
    BigEndian::write_u64(&mut out[48..56], start_time);
    out
}

pub fn schm() -> [u8; 12] {
    let mut out = [0u8; 12];
    BigEndian::write_u32(&mut out[4..8], SCHEME_TYPE.get());
    BigEndian::write_u32(&mut out[8..12], SCHEME_VERSION);
    out
}

/// Corrected start time for one track.
pub fn cstb(track_id: u32, start_time: u64) -> [u8; 16] {
    let mut out = [0u8; 16];
    BigEndian::write_u32(&mut out[0..4], 1);
    BigEndian::write_u32(&mut out[4..8], track_id);
    BigEndian::write_u64(&mut out[8..16], start_time);
    out
}

/// The comment as a NUL terminated string.
pub fn auib(comment: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(comment.len() + 1);
    out.extend_from_slice(comment.as_bytes());
    out.push(0);
    out
}

/// Track id from the start of a `tkhd` payload. Any nonzero version is read
/// with 64-bit times ahead of it, version 0 with 32-bit ones.
pub fn track_id(tkhd: &[u8; TKHD_PREFIX_LEN]) -> u32 {
    let at = if tkhd[0] != 0 { 20 } else { 12 };
    BigEndian::read_u32(&tkhd[at..at + 4])
}

pub fn entry_count(bytes: &[u8]) -> Option<u16> {
    bytes.get(..2)?.try_into().ok().map(u16::from_be_bytes)
}
