//! Samples: raw PCM and chip-specific compressed audio

use crate::serde::{
    BlockWriter, LE, ReadError, WriteError, expect_tag, read_string, skip, write_string,
    write_zeros,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::debug;

/// The encoding of the payload of a [`Sample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleDepth {
    /// One bit per sample
    OneBit,

    /// NES delta modulation, one bit per sample
    Dpcm,

    /// Yamaha YMZ ADPCM
    Ymz,

    /// QSound ADPCM
    QSound,

    /// YM2610 ADPCM-A
    AdpcmA,

    /// YM2610 ADPCM-B
    AdpcmB,

    /// Signed 8-bit PCM
    EightBit,

    /// SNES bit rate reduction, 9 bytes per 16 samples
    Brr,

    /// Dialogic ADPCM
    Vox,

    /// Signed 16-bit PCM
    #[default]
    SixteenBit,
}

impl SampleDepth {
    /// Decode the on-disk depth value
    pub fn from_u8(value: u8) -> Result<Self, ReadError> {
        Ok(match value {
            0 => Self::OneBit,
            1 => Self::Dpcm,
            3 => Self::Ymz,
            4 => Self::QSound,
            5 => Self::AdpcmA,
            6 => Self::AdpcmB,
            8 => Self::EightBit,
            9 => Self::Brr,
            10 => Self::Vox,
            16 => Self::SixteenBit,
            value => return Err(ReadError::UnknownSampleDepth(value)),
        })
    }

    /// The on-disk depth value
    pub fn to_u8(self) -> u8 {
        match self {
            Self::OneBit => 0,
            Self::Dpcm => 1,
            Self::Ymz => 3,
            Self::QSound => 4,
            Self::AdpcmA => 5,
            Self::AdpcmB => 6,
            Self::EightBit => 8,
            Self::Brr => 9,
            Self::Vox => 10,
            Self::SixteenBit => 16,
        }
    }

    /// The number of payload bytes needed for a number of samples
    pub fn byte_len(self, samples: u32) -> u64 {
        let samples = samples as u64;
        match self {
            Self::OneBit | Self::Dpcm => samples.div_ceil(8),
            Self::Ymz | Self::QSound | Self::AdpcmA | Self::AdpcmB | Self::Vox => {
                samples.div_ceil(2)
            }
            Self::EightBit => samples,
            Self::Brr => 9 * samples.div_ceil(16),
            Self::SixteenBit => 2 * samples,
        }
    }
}

/// A single sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub name: String,

    /// The number of samples (not bytes) in the payload
    pub length: u32,

    /// The playback rate in Hz
    pub rate: u32,

    pub volume: i16,
    pub pitch: i16,
    pub depth: SampleDepth,

    /// The rate at which the sample sounds like a C
    pub base_rate: u16,

    /// The sample the loop starts at, or -1
    pub loop_point: i32,

    /// The raw payload, encoded according to `depth`
    pub data: Vec<u8>,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: String::new(),
            length: 0,
            rate: 32000,
            volume: 50,
            pitch: 5,
            depth: SampleDepth::SixteenBit,
            base_rate: 32000,
            loop_point: -1,
            data: Vec::new(),
        }
    }
}

impl Sample {
    /// Decode a `SMPL` block
    pub fn from_reader<R>(reader: &mut R) -> Result<Self, ReadError>
    where
        R: Read + Seek + ?Sized,
    {
        expect_tag(reader, b"SMPL")?;
        skip(reader, 4)?;

        let name = read_string(reader)?;
        let length = reader.read_u32::<LE>()?;
        let rate = reader.read_u32::<LE>()?;
        let volume = reader.read_i16::<LE>()?;
        let pitch = reader.read_i16::<LE>()?;
        let depth = SampleDepth::from_u8(reader.read_u8()?)?;
        skip(reader, 1)?;
        let base_rate = reader.read_u16::<LE>()?;
        let loop_point = reader.read_i32::<LE>()?;

        let byte_len = depth.byte_len(length);
        let mut data = Vec::new();
        Read::take(&mut *reader, byte_len).read_to_end(&mut data)?;
        if (data.len() as u64) < byte_len {
            return Err(ReadError::TruncatedStream);
        }

        debug!(%name, length, ?depth, "Read sample");

        Ok(Self {
            name,
            length,
            rate,
            volume,
            pitch,
            depth,
            base_rate,
            loop_point,
            data,
        })
    }

    /// Encode the sample as a `SMPL` block
    ///
    /// The payload has to be exactly as long as `length` samples at `depth` take up.
    pub fn to_writer<W>(&self, writer: &mut W) -> Result<(), WriteError>
    where
        W: Write + Seek + ?Sized,
    {
        let expected = self.depth.byte_len(self.length);
        if self.data.len() as u64 != expected {
            return Err(WriteError::FieldLength {
                field: "sample payload",
                expected: expected as usize,
                found: self.data.len(),
            });
        }

        let block = BlockWriter::begin(writer, b"SMPL")?;
        write_string(writer, &self.name)?;
        writer.write_u32::<LE>(self.length)?;
        writer.write_u32::<LE>(self.rate)?;
        writer.write_i16::<LE>(self.volume)?;
        writer.write_i16::<LE>(self.pitch)?;
        writer.write_u8(self.depth.to_u8())?;
        write_zeros(writer, 1)?;
        writer.write_u16::<LE>(self.base_rate)?;
        writer.write_i32::<LE>(self.loop_point)?;
        writer.write_all(&self.data)?;
        block.finish(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn byte_lengths() {
        assert_eq!(SampleDepth::OneBit.byte_len(9), 2);
        assert_eq!(SampleDepth::Dpcm.byte_len(16), 2);
        assert_eq!(SampleDepth::AdpcmA.byte_len(3), 2);
        assert_eq!(SampleDepth::Vox.byte_len(4), 2);
        assert_eq!(SampleDepth::Brr.byte_len(17), 18);
        assert_eq!(SampleDepth::EightBit.byte_len(5), 5);
        assert_eq!(SampleDepth::SixteenBit.byte_len(5), 10);
        assert_eq!(SampleDepth::Brr.byte_len(0), 0);
    }

    #[test]
    fn round_trip() {
        let sample = Sample {
            name: "KICK".to_string(),
            length: 3,
            depth: SampleDepth::EightBit,
            loop_point: 1,
            data: vec![0x7F, 0x00, 0x80],
            ..Sample::default()
        };

        let mut writer = Cursor::new(Vec::new());
        sample.to_writer(&mut writer).unwrap();

        let bytes = writer.get_ref();
        assert_eq!(&bytes[0..4], b"SMPL");
        assert_eq!(bytes[8 + 5 + 12], 8);

        writer.set_position(0);
        assert_eq!(Sample::from_reader(&mut writer).unwrap(), sample);
    }

    #[test]
    fn payload_length_is_checked() {
        let sample = Sample {
            length: 4,
            data: vec![0; 4],
            ..Sample::default()
        };

        assert!(matches!(
            sample.to_writer(&mut Cursor::new(Vec::new())),
            Err(WriteError::FieldLength {
                expected: 8,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn unknown_depth() {
        let mut bytes = b"SMPL\0\0\0\0\0".to_vec();
        bytes.extend_from_slice(&[0; 12]);
        bytes.push(7);

        assert!(matches!(
            Sample::from_reader(&mut Cursor::new(bytes)),
            Err(ReadError::UnknownSampleDepth(7))
        ));
    }

    #[test]
    fn truncated_payload() {
        let sample = Sample {
            length: 100,
            data: vec![0; 200],
            ..Sample::default()
        };

        let mut writer = Cursor::new(Vec::new());
        sample.to_writer(&mut writer).unwrap();

        let mut bytes = writer.into_inner();
        bytes.truncate(bytes.len() - 1);

        assert!(matches!(
            Sample::from_reader(&mut Cursor::new(bytes)),
            Err(ReadError::TruncatedStream)
        ));
    }
}
