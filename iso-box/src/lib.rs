//! Herein lies the box tree of ISO base media files (`.mp4`, `.mov`, `.m4a`, ...).
//!
//! Open a file with [IsoFile][IsoFile], descend from its [root][IsoFile::root] with
//! [first][IsoFile::first] and [next][IsoFile::next], and grow the last box of the
//! file with [append_box][IsoFile::append_box]. Every size field on the path back to
//! the root is rewritten before an append returns.

pub mod endian;
mod de;
mod error;
mod file;
mod fourcc;
pub mod header;
pub mod known;
mod ser;
mod stream;

pub use error::{Error, Result};
pub use file::{BoxRef, IsoFile, Payload, TreeNode};
pub use fourcc::FourCc;
pub use header::{BoxHeader, FullBoxHeader};
pub use stream::Stream;
