//! The zlib envelope around module files
//!
//! Furnace saves modules zlib-compressed, but it reads plain ones just fine. Whether a stream is
//! compressed is decided by looking for the module magic at its very start.

use super::Module;
use crate::serde::ReadError;
use flate2::{Compression as Level, read::ZlibDecoder, write::ZlibEncoder};
use std::io::{self, Read, Write};
use tracing::debug;

/// Is the module data wrapped in a zlib envelope?
pub fn is_compressed(bytes: &[u8]) -> bool {
    !bytes.starts_with(Module::MAGIC)
}

/// Read an entire module stream, inflating it if it is compressed
///
/// The returned bytes always start with the module magic, or this fails with
/// [`ReadError::BadMagic`].
pub fn decompress<R>(mut reader: R) -> Result<Vec<u8>, ReadError>
where
    R: Read,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if !is_compressed(&bytes) {
        debug!(len = bytes.len(), "Module is not compressed");
        return Ok(bytes);
    }

    let mut inflated = Vec::new();
    if let Err(error) = ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut inflated) {
        debug!(%error, "Inflating the module failed");
        return Err(bad_magic(&bytes));
    }

    if is_compressed(&inflated) {
        return Err(bad_magic(&inflated));
    }

    debug!(compressed = bytes.len(), inflated = inflated.len(), "Inflated module");
    Ok(inflated)
}

/// Wrap module data in a zlib envelope
pub fn compress<W>(bytes: &[u8], writer: W) -> io::Result<()>
where
    W: Write,
{
    let mut encoder = ZlibEncoder::new(writer, Level::default());
    encoder.write_all(bytes)?;
    encoder.finish()?;

    Ok(())
}

fn bad_magic(bytes: &[u8]) -> ReadError {
    let found = &bytes[..bytes.len().min(Module::MAGIC.len())];

    ReadError::BadMagic {
        expected: String::from_utf8_lossy(Module::MAGIC).into_owned(),
        found: found.escape_ascii().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Vec<u8> {
        let mut bytes = Module::MAGIC.to_vec();
        bytes.extend_from_slice(&[0x53, 0, 0, 0]);
        bytes
    }

    #[test]
    fn plain_passes_through() {
        let bytes = plain();
        assert!(!is_compressed(&bytes));
        assert_eq!(decompress(bytes.as_slice()).unwrap(), bytes);
    }

    #[test]
    fn compressed_is_inflated() {
        let mut compressed = Vec::new();
        compress(&plain(), &mut compressed).unwrap();

        assert!(is_compressed(&compressed));
        assert_eq!(compressed[0], 0x78);
        assert_eq!(decompress(compressed.as_slice()).unwrap(), plain());
    }

    #[test]
    fn garbage() {
        assert!(matches!(
            decompress(&b"definitely not a module"[..]),
            Err(ReadError::BadMagic { .. })
        ));
    }

    #[test]
    fn compressed_garbage() {
        let mut compressed = Vec::new();
        compress(b"-Furnace instr.-", &mut compressed).unwrap();

        assert!(matches!(
            decompress(compressed.as_slice()),
            Err(ReadError::BadMagic { found, .. }) if found == "-Furnace instr.-"
        ));
    }
}
