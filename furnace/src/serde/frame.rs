//! Block framing and pointer backpatching
//!
//! Furnace files refer to their blocks through absolute offsets, and blocks announce their own
//! size up front. Neither is known until the block has been written, so writing happens in two
//! passes: reserve room for the number, write what it describes, then seek back and fill it in.

use super::{LE, WriteError};
use byteorder::WriteBytesExt;
use std::io::{self, Seek, SeekFrom, Write};

/// A block whose size field is filled in once its contents have been written
///
/// ```
/// # use furnace::serde::BlockWriter;
/// # use std::io::{Cursor, Write};
/// let mut writer = Cursor::new(Vec::new());
/// let block = BlockWriter::begin(&mut writer, b"WAVE")?;
/// writer.write_all(&[1, 2, 3])?;
/// block.finish(&mut writer)?;
///
/// assert_eq!(writer.into_inner(), b"WAVE\x03\0\0\0\x01\x02\x03");
/// # Ok::<(), furnace::serde::WriteError>(())
/// ```
#[derive(Debug)]
#[must_use = "the block size is only written by finish()"]
pub struct BlockWriter {
    size_position: u64,
}

impl BlockWriter {
    /// Write the block tag and a placeholder size
    pub fn begin<W>(writer: &mut W, tag: &[u8; 4]) -> io::Result<Self>
    where
        W: Write + Seek + ?Sized,
    {
        writer.write_all(tag)?;
        let size_position = writer.stream_position()?;
        writer.write_u32::<LE>(0)?;

        Ok(Self { size_position })
    }

    /// Backpatch the size of everything written since [`BlockWriter::begin()`]
    ///
    /// The stream position is restored to the end of the block afterwards.
    pub fn finish<W>(self, writer: &mut W) -> Result<(), WriteError>
    where
        W: Write + Seek + ?Sized,
    {
        let end = writer.stream_position()?;
        let size = end - self.size_position - 4;
        let size = u32::try_from(size).map_err(|_| WriteError::OutOfRange {
            field: "block size",
            value: size as i64,
        })?;

        writer.seek(SeekFrom::Start(self.size_position))?;
        writer.write_u32::<LE>(size)?;
        writer.seek(SeekFrom::Start(end))?;

        Ok(())
    }
}

/// A run of zeroed 32-bit pointers, reserved to be filled in later
#[derive(Debug)]
#[must_use = "the pointers are only written by fill()"]
pub struct PointerTable {
    position: u64,
    len: usize,
}

impl PointerTable {
    /// Write `len` zero pointers and remember where they are
    pub fn reserve<W>(writer: &mut W, len: usize) -> io::Result<Self>
    where
        W: Write + Seek + ?Sized,
    {
        let position = writer.stream_position()?;
        for _ in 0..len {
            writer.write_u32::<LE>(0)?;
        }

        Ok(Self { position, len })
    }

    /// The number of pointers in the table
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Overwrite the placeholders with the actual offsets
    ///
    /// The stream position is left where it was before the call.
    pub fn fill<W>(self, writer: &mut W, offsets: &[u64]) -> Result<(), WriteError>
    where
        W: Write + Seek + ?Sized,
    {
        if offsets.len() != self.len {
            return Err(WriteError::FieldLength {
                field: "pointer table",
                expected: self.len,
                found: offsets.len(),
            });
        }

        let end = writer.stream_position()?;
        writer.seek(SeekFrom::Start(self.position))?;

        for offset in offsets {
            let offset = u32::try_from(*offset).map_err(|_| WriteError::OutOfRange {
                field: "pointer",
                value: *offset as i64,
            })?;
            writer.write_u32::<LE>(offset)?;
        }

        writer.seek(SeekFrom::Start(end))?;
        Ok(())
    }
}
