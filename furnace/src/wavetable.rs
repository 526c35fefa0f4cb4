//! Wavetables: single-cycle waveforms for wavetable chips

use crate::serde::{
    BlockWriter, LE, ReadError, WriteError, expect_tag, read_string, skip, write_string,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::debug;

/// A single-cycle waveform
///
/// The values are meant to lie between `min` and `max`, but the format doesn't enforce this and
/// neither do we.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wavetable {
    pub name: String,
    pub min: i32,
    pub max: i32,
    pub data: Vec<i32>,
}

impl Wavetable {
    /// Decode a `WAVE` block
    pub fn from_reader<R>(reader: &mut R) -> Result<Self, ReadError>
    where
        R: Read + Seek + ?Sized,
    {
        expect_tag(reader, b"WAVE")?;
        skip(reader, 4)?;

        let name = read_string(reader)?;
        let width = reader.read_u32::<LE>()?;
        let min = reader.read_i32::<LE>()?;
        let max = reader.read_i32::<LE>()?;

        let mut data = Vec::new();
        for _ in 0..width {
            data.push(reader.read_i32::<LE>()?);
        }

        debug!(%name, width, "Read wavetable");

        Ok(Self {
            name,
            min,
            max,
            data,
        })
    }

    /// Encode the wavetable as a `WAVE` block
    pub fn to_writer<W>(&self, writer: &mut W) -> Result<(), WriteError>
    where
        W: Write + Seek + ?Sized,
    {
        let width = u32::try_from(self.data.len()).map_err(|_| WriteError::TooManyEntries {
            what: "wavetable values",
            count: self.data.len(),
            max: u32::MAX as usize,
        })?;

        let block = BlockWriter::begin(writer, b"WAVE")?;
        write_string(writer, &self.name)?;
        writer.write_u32::<LE>(width)?;
        writer.write_i32::<LE>(self.min)?;
        writer.write_i32::<LE>(self.max)?;
        for value in &self.data {
            writer.write_i32::<LE>(*value)?;
        }
        block.finish(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trip() {
        let wave = Wavetable {
            name: "SAW".to_string(),
            min: 0,
            max: 15,
            data: vec![0, 4, 8, 12, 16],
        };

        let mut writer = Cursor::new(Vec::new());
        wave.to_writer(&mut writer).unwrap();

        let bytes = writer.get_ref();
        assert_eq!(&bytes[0..4], b"WAVE");
        assert_eq!(bytes.len(), 8 + 4 + 12 + 5 * 4);
        assert_eq!(&bytes[4..8], &36u32.to_le_bytes());

        writer.set_position(0);
        assert_eq!(Wavetable::from_reader(&mut writer).unwrap(), wave);
    }

    #[test]
    fn truncated() {
        let bytes = b"WAVE\0\0\0\0\0\x02\0\0\0\0\0\0\0\x0F\0\0\0\x01\0\0\0";
        assert!(matches!(
            Wavetable::from_reader(&mut Cursor::new(bytes)),
            Err(ReadError::TruncatedStream)
        ));
    }
}
