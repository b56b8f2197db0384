use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Produces a detached signature over a file that has already been flushed to disk.
pub trait Signer {
    fn sign(&self, file: &Path, key: &Path) -> Result<Vec<u8>>;
}

/// RSA-PSS over SHA-256, computed by the `openssl` command line tool.
#[derive(Debug, Clone)]
pub struct OpenSsl {
    pub program: PathBuf,
}

impl OpenSsl {
    pub fn new<P: Into<PathBuf>>(program: P) -> OpenSsl {
        OpenSsl {
            program: program.into(),
        }
    }

    fn command(&self, file: &Path, key: &Path, out: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&["dgst", "-sha256"])
            .args(&["-sigopt", "rsa_padding_mode:pss"])
            .args(&["-sigopt", "rsa_pss_saltlen:20"])
            .arg("-sign")
            .arg(key)
            .arg("-out")
            .arg(out)
            .arg(file);
        command
    }
}

impl Signer for OpenSsl {
    fn sign(&self, file: &Path, key: &Path) -> Result<Vec<u8>> {
        let out = tempfile::NamedTempFile::new().map_err(|source| Error::SpawnSigner {
            program: self.program.clone(),
            source,
        })?;

        let mut command = self.command(file, key, out.path());
        tracing::debug!(?command, "running signer");
        let status = command.status().map_err(|source| Error::SpawnSigner {
            program: self.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(Error::SignerFailed {
                program: self.program.clone(),
                status,
            });
        }

        std::fs::read(out.path()).map_err(|source| Error::ReadSignature {
            path: out.path().to_path_buf(),
            source,
        })
    }
}
