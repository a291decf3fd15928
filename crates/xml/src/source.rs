//! Reading source documents, which may or may not be gzipped.
use std::io::Read;
use std::path::Path;

use log::*;

use crate::errors::Result;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read a whole file, decompressing it first if it starts with the gzip magic bytes.
///
/// Anything else is returned as-is.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    let raw = std::fs::read(path)?;
    decompress_if_gzipped(raw)
}

pub fn decompress_if_gzipped(raw: Vec<u8>) -> Result<Vec<u8>> {
    if !raw.starts_with(&GZIP_MAGIC) {
        debug!("Source is not gzipped; using it as-is");
        return Ok(raw);
    }

    let mut out = Vec::with_capacity(raw.len() * 4);
    flate2::read::MultiGzDecoder::new(&raw[..]).read_to_end(&mut out)?;
    info!("Decompressed {} bytes to {}", raw.len(), out.len());
    Ok(out)
}
