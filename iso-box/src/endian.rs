//! Byte order helpers. Every numeric field in a box is stored big-endian.

use std::io::{Read, Result, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// Swap the byte order of a 32-bit value.
#[inline(always)]
pub fn swap32(x: u32) -> u32 {
    x.swap_bytes()
}

/// Swap the byte order of a 64-bit value.
#[inline(always)]
pub fn swap64(x: u64) -> u64 {
    x.swap_bytes()
}

#[inline(always)]
pub fn read_u16_be<R: Read>(reader: &mut R) -> Result<u16> {
    reader.read_u16::<BigEndian>()
}

#[inline(always)]
pub fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32> {
    reader.read_u32::<BigEndian>()
}

#[inline(always)]
pub fn read_u64_be<R: Read>(reader: &mut R) -> Result<u64> {
    reader.read_u64::<BigEndian>()
}

#[inline(always)]
pub fn write_u16_be<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_u16::<BigEndian>(value)
}

#[inline(always)]
pub fn write_u32_be<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_u32::<BigEndian>(value)
}

#[inline(always)]
pub fn write_u64_be<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    writer.write_u64::<BigEndian>(value)
}
