use std::path::PathBuf;
use std::process::ExitStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: iso_box::Error,
    },

    #[error("Cannot modify meta box at {offset:#x} which is not the last box in the file")]
    MetaNotLast { offset: u64 },

    #[error("Cannot add a signature to ipro box at {offset:#x} which is not the last box in meta")]
    IproNotLast { offset: u64 },

    #[error("Cannot read certificate `{}`", .path.display())]
    ReadCertificate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Certificate `{}` is {size} bytes; at most {max} are supported", .path.display())]
    CertificateTooLarge { path: PathBuf, size: usize, max: usize },

    #[error("Invalid start time `{value}`: expected yyyy-mm-ddThh:mm:ss[.zzz]")]
    InvalidTimestamp { value: String },

    #[error("File was opened without a path; it cannot be handed to a signer")]
    NoPath,

    #[error("Cannot run signer `{}`", .program.display())]
    SpawnSigner {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error hashing file with `{}`: {status}", .program.display())]
    SignerFailed { program: PathBuf, status: ExitStatus },

    #[error("Cannot read signature `{}`", .path.display())]
    ReadSignature {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Signature box size does not match: {reserved} bytes reserved, signature is {actual} bytes")]
    SignatureSize { reserved: u64, actual: usize },

    #[error(transparent)]
    Engine(#[from] iso_box::Error),
}
