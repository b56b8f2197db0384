use std::path::PathBuf;

use crate::FourCc;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open `{}`", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Growing a box that does not end the stream would overwrite whatever follows it.
    #[error("Cannot grow `{tag}` at {offset:#x}: it ends at {end:#x} but the stream ends at {stream_len:#x}")]
    NotLast {
        tag: FourCc,
        offset: u64,
        end: u64,
        stream_len: u64,
    },

    #[error("Write of {len} bytes at payload offset {offset} exceeds `{tag}` of size {size}")]
    OutOfBounds {
        tag: FourCc,
        offset: u64,
        len: u64,
        size: u64,
    },

    #[error("Box `{tag}` at {offset:#x} cannot grow to {size} bytes")]
    TooLarge { tag: FourCc, offset: u64, size: u64 },

    /// Some, but not all, size fields on the path to the root were rewritten.
    #[error("Resize stopped after rewriting {committed} of {total} size fields")]
    PartialResize {
        committed: usize,
        total: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid box type `{0}`: expected four ASCII characters")]
    InvalidFourCc(String),
}
