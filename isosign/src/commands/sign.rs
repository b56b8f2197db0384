use std::path::{Path, PathBuf};

use iso_box::header::FULL_BOX_LEN;
use iso_box::{known, BoxRef, FullBoxHeader, IsoFile, Payload, Stream};

use crate::error::{Error, Result};
use crate::layout;
use crate::signer::Signer;

#[derive(Debug, Clone)]
pub struct SignOptions {
    pub certificate: Vec<u8>,
    pub key: PathBuf,
    /// FILETIME ticks, see [`crate::filetime`].
    pub start_time: Option<u64>,
    pub comment: Option<String>,
    pub signature_size: u64,
}

pub fn run<S: Signer>(path: &Path, options: SignOptions, signer: &S) -> Result<()> {
    let mut file = IsoFile::open(path).map_err(|source| Error::OpenFile {
        path: path.to_path_buf(),
        source,
    })?;

    let sibo = sign(&mut file, &options, signer)?;
    tracing::info!(
        file = %path.display(),
        offset = format_args!("{:#x}", sibo.offset()),
        bytes = options.signature_size,
        "signed"
    );
    Ok(())
}

pub fn read_certificate(path: &Path) -> Result<Vec<u8>> {
    let certificate = std::fs::read(path).map_err(|source| Error::ReadCertificate {
        path: path.to_path_buf(),
        source,
    })?;
    if certificate.len() > layout::MAX_CERTIFICATE_LEN {
        return Err(Error::CertificateTooLarge {
            path: path.to_path_buf(),
            size: certificate.len(),
            max: layout::MAX_CERTIFICATE_LEN,
        });
    }
    Ok(certificate)
}

/// Appends a new signature entry to the `meta` box at the end of `file` and
/// fills it with a signature over everything written so far.
///
/// Returns the `sibo` box holding the signature.
pub fn sign<St: Stream, S: Signer + ?Sized>(
    file: &mut IsoFile<St>,
    options: &SignOptions,
    signer: &S,
) -> Result<BoxRef> {
    let path = file.path().map(Path::to_path_buf).ok_or(Error::NoPath)?;
    let mut root = file.root();

    let mut meta = match file.child(&root, known::META)? {
        Some(meta) if !file.is_last(&meta) => {
            return Err(Error::MetaNotLast {
                offset: meta.offset(),
            })
        }
        Some(meta) => meta,
        None => file.append_full_box(
            &mut root,
            known::META,
            FullBoxHeader::default(),
            Payload::EMPTY,
        )?,
    };

    let sumi = file.first(&meta, Some(layout::SUMI), FULL_BOX_LEN)?;
    let ipro = file.first(&meta, Some(known::IPRO), FULL_BOX_LEN)?;

    // a new signature lands at the end of an existing ipro, so nothing may follow it
    if let Some(ipro) = &ipro {
        if sumi.is_none() || !file.is_last(ipro) {
            return Err(Error::IproNotLast {
                offset: ipro.offset(),
            });
        }
    }

    let sumi_existed = sumi.is_some();
    if !sumi_existed {
        let sumi = layout::sumi(options.start_time.unwrap_or(0));
        file.append_box(&mut meta, layout::SUMI, Payload::Bytes(&sumi))?;
    }

    let ipro_existed = ipro.is_some();
    let mut ipro = match ipro {
        Some(ipro) => ipro,
        None => file.append_box(&mut meta, known::IPRO, Payload::Bytes(&layout::IPRO_INITIAL))?,
    };

    let mut sinf = file.append_box(&mut ipro, known::SINF, Payload::EMPTY)?;
    if ipro_existed {
        bump_entry_count(file, &ipro)?;
    }
    file.append_box(&mut sinf, known::SCHM, Payload::Bytes(&layout::schm()))?;
    let mut schi = file.append_box(&mut sinf, known::SCHI, Payload::EMPTY)?;

    let sibo = file.append_box(
        &mut schi,
        layout::SIBO,
        Payload::Zeroed(options.signature_size),
    )?;
    file.append_box(&mut schi, layout::CERT, Payload::Bytes(&options.certificate))?;

    match options.start_time {
        Some(start_time) if sumi_existed => match first_track_id(file)? {
            Some(track_id) => {
                let cstb = layout::cstb(track_id, start_time);
                file.append_box(&mut schi, layout::CSTB, Payload::Bytes(&cstb))?;
            }
            None => tracing::warn!("no readable moov/trak/tkhd; skipping corrected start time"),
        },
        _ => {}
    }

    if let Some(comment) = &options.comment {
        let auib = layout::auib(comment);
        file.append_box(&mut schi, layout::AUIB, Payload::Bytes(&auib))?;
    }

    file.flush()?;
    let signature = signer.sign(&path, &options.key)?;
    if signature.len() as u64 != options.signature_size {
        return Err(Error::SignatureSize {
            reserved: options.signature_size,
            actual: signature.len(),
        });
    }
    file.update(&sibo, 0, Payload::Bytes(&signature))?;
    file.flush()?;

    Ok(sibo)
}

fn bump_entry_count<St: Stream>(file: &mut IsoFile<St>, ipro: &BoxRef) -> Result<()> {
    let mut buf = [0u8; 2];
    let read = file.read(ipro, layout::IPRO_COUNT_OFFSET, &mut buf)?;
    let count = match layout::entry_count(&buf[..read]) {
        Some(count) => count,
        None => {
            tracing::warn!(
                offset = format_args!("{:#x}", ipro.offset()),
                "ipro box has no entry count; leaving it alone"
            );
            return Ok(());
        }
    };
    let count = count.saturating_add(1);
    file.update(ipro, layout::IPRO_COUNT_OFFSET, Payload::Bytes(&count.to_be_bytes()))?;
    tracing::debug!(count, "bumped ipro entry count");
    Ok(())
}

fn first_track_id<St: Stream>(file: &mut IsoFile<St>) -> Result<Option<u32>> {
    let root = file.root();
    let tkhd = match file.lookup(&root, &[known::MOOV, known::TRAK, known::TKHD])? {
        Some(tkhd) => tkhd,
        None => return Ok(None),
    };
    let mut prefix = [0u8; layout::TKHD_PREFIX_LEN];
    if file.read(&tkhd, 0, &mut prefix)? != prefix.len() {
        return Ok(None);
    }
    Ok(Some(layout::track_id(&prefix)))
}
