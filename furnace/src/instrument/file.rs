//! Standalone instrument files (`.fui`)

use super::{AssetList, Feature, Instrument, InstrumentBody};
use crate::sample::Sample;
use crate::serde::{
    LE, PointerTable, ReadError, WriteError, expect_tag, seek_to, skip, write_zeros,
};
use crate::wavetable::Wavetable;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::{
    borrow::Cow,
    fs::File,
    io::{self, Cursor, Read, Seek, Write},
    path::Path,
};
use system_interface::io::Peek;
use thiserror::Error;
use tracing::debug;

/// An instrument exported from a module, together with the wavetables and samples it uses
///
/// # Example
///
/// ```no_run
/// use furnace::instrument::InstrumentFile;
///
/// let file = InstrumentFile::from_path("bass.fui")?;
/// println!("{}", file.instrument.name());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentFile {
    /// The format version of the file itself
    pub version: u16,

    pub instrument: Instrument,
    pub wavetables: Vec<Wavetable>,
    pub samples: Vec<Sample>,
}

impl InstrumentFile {
    /// The magic string every instrument file starts with
    pub const MAGIC: &'static [u8; 16] = b"-Furnace instr.-";

    /// The size of the header, up to the pointer tables
    const HEADER_LEN: u64 = 32;

    /// Wrap an instrument in a file without any wavetables or samples
    pub fn new(instrument: Instrument) -> Self {
        Self {
            version: instrument.version,
            instrument,
            wavetables: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Deserialize an instrument file from an arbitrary I/O reader
    pub fn from_reader<R>(reader: &mut R) -> Result<Self, ReadError>
    where
        R: Read + Seek + Peek,
    {
        expect_tag(reader, Self::MAGIC)?;

        let version = reader.read_u16::<LE>()?;
        skip(reader, 2)?;
        let instrument_pointer = reader.read_u32::<LE>()?;
        let wavetable_count = reader.read_u16::<LE>()? as usize;
        let sample_count = reader.read_u16::<LE>()? as usize;
        skip(reader, 4)?;

        let mut wavetable_pointers = vec![0; wavetable_count];
        reader.read_u32_into::<LE>(&mut wavetable_pointers)?;
        let mut sample_pointers = vec![0; sample_count];
        reader.read_u32_into::<LE>(&mut sample_pointers)?;

        seek_to(reader, instrument_pointer as u64)?;
        let instrument = Instrument::from_reader(reader)?;

        let mut wavetables = Vec::with_capacity(wavetable_count);
        for pointer in wavetable_pointers {
            seek_to(reader, pointer as u64)?;
            wavetables.push(Wavetable::from_reader(reader)?);
        }

        let mut samples = Vec::with_capacity(sample_count);
        for pointer in sample_pointers {
            seek_to(reader, pointer as u64)?;
            samples.push(Sample::from_reader(reader)?);
        }

        debug!(
            version,
            name = instrument.name(),
            wavetables = wavetables.len(),
            samples = samples.len(),
            "Read instrument file"
        );

        Ok(Self {
            version,
            instrument,
            wavetables,
            samples,
        })
    }

    /// Deserialize an instrument file from a path on disk
    pub fn from_path<P>(path: P) -> Result<Self, FromPathError>
    where
        P: AsRef<Path>,
    {
        let mut file = File::open(path)?;
        let instrument = Self::from_reader(&mut file)?;

        Ok(instrument)
    }

    /// Serialize the instrument file to an arbitrary I/O writer
    pub fn to_writer<W>(&self, writer: &mut W) -> Result<(), WriteError>
    where
        W: Write + Seek,
    {
        let wavetable_count = count(self.wavetables.len(), "wavetables")?;
        let sample_count = count(self.samples.len(), "samples")?;

        writer.write_all(Self::MAGIC)?;
        writer.write_u16::<LE>(self.version)?;
        write_zeros(writer, 2)?;
        let instrument_pointer = PointerTable::reserve(writer, 1)?;
        writer.write_u16::<LE>(wavetable_count)?;
        writer.write_u16::<LE>(sample_count)?;
        write_zeros(writer, 4)?;

        let wavetable_pointers = PointerTable::reserve(writer, self.wavetables.len())?;
        let sample_pointers = PointerTable::reserve(writer, self.samples.len())?;

        let instrument = self.instrument_with_pointers()?;
        let offset = writer.stream_position()?;
        instrument.to_writer(writer)?;
        instrument_pointer.fill(writer, &[offset])?;

        let mut offsets = Vec::with_capacity(self.wavetables.len());
        for wavetable in &self.wavetables {
            offsets.push(writer.stream_position()?);
            wavetable.to_writer(writer)?;
        }
        wavetable_pointers.fill(writer, &offsets)?;

        let mut offsets = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            offsets.push(writer.stream_position()?);
            sample.to_writer(writer)?;
        }
        sample_pointers.fill(writer, &offsets)?;

        Ok(())
    }

    /// The instrument, with its sample and wavetable lists pointing at the bundled assets
    ///
    /// Lists that don't match the number of bundled assets are left alone.
    fn instrument_with_pointers(&self) -> Result<Cow<'_, Instrument>, WriteError> {
        let InstrumentBody::Features(features) = &self.instrument.body else {
            return Ok(Cow::Borrowed(&self.instrument));
        };
        let has_lists = features
            .iter()
            .any(|f| matches!(f, Feature::SampleList(_) | Feature::WavetableList(_)));
        if !has_lists {
            return Ok(Cow::Borrowed(&self.instrument));
        }

        let tables = 4 * (self.wavetables.len() + self.samples.len()) as u64;
        let mut offset = Self::HEADER_LEN + tables + encoded_len(|w| self.instrument.to_writer(w))?;

        let mut wavetable_offsets = Vec::with_capacity(self.wavetables.len());
        for wavetable in &self.wavetables {
            wavetable_offsets.push(offset);
            offset += encoded_len(|w| wavetable.to_writer(w))?;
        }

        let mut sample_offsets = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            sample_offsets.push(offset);
            offset += encoded_len(|w| sample.to_writer(w))?;
        }

        let mut instrument = self.instrument.clone();
        if let InstrumentBody::Features(features) = &mut instrument.body {
            for feature in features {
                match feature {
                    Feature::WavetableList(list) => point_at(list, &wavetable_offsets)?,
                    Feature::SampleList(list) => point_at(list, &sample_offsets)?,
                    _ => {}
                }
            }
        }

        Ok(Cow::Owned(instrument))
    }

    /// Serialize the instrument file to a path on disk
    pub fn to_path<P>(&self, path: P) -> Result<(), WriteError>
    where
        P: AsRef<Path>,
    {
        let mut file = File::create(path)?;
        self.to_writer(&mut file)
    }
}

fn encoded_len<F>(write: F) -> Result<u64, WriteError>
where
    F: FnOnce(&mut Cursor<Vec<u8>>) -> Result<(), WriteError>,
{
    let mut writer = Cursor::new(Vec::new());
    write(&mut writer)?;
    Ok(writer.into_inner().len() as u64)
}

fn point_at(list: &mut AssetList, offsets: &[u64]) -> Result<(), WriteError> {
    if list.indices.len() != offsets.len() {
        return Ok(());
    }

    list.pointers = offsets
        .iter()
        .map(|offset| {
            u32::try_from(*offset).map_err(|_| WriteError::OutOfRange {
                field: "asset pointer",
                value: *offset as i64,
            })
        })
        .collect::<Result<_, _>>()?;

    Ok(())
}

fn count(len: usize, what: &'static str) -> Result<u16, WriteError> {
    u16::try_from(len).map_err(|_| WriteError::TooManyEntries {
        what,
        count: len,
        max: u16::MAX as usize,
    })
}

/// Errors that might be returned from [`InstrumentFile::from_path()`]
#[derive(Debug, Error)]
pub enum FromPathError {
    /// Opening the file itself failed
    #[error("Opening the file failed")]
    FileOpen(#[from] io::Error),

    /// Deserialization failed
    #[error("Reading the instrument file failed")]
    Read(#[from] ReadError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{InstrumentBody, InstrumentKind, LegacyBody};
    use crate::sample::SampleDepth;
    use std::io::Cursor;

    #[test]
    fn header() {
        let mut writer = Cursor::new(Vec::new());
        InstrumentFile::new(Instrument::new(InstrumentKind::Standard, ""))
            .to_writer(&mut writer)
            .unwrap();

        let bytes = writer.into_inner();
        assert_eq!(&bytes[0..16], b"-Furnace instr.-");
        assert_eq!(&bytes[16..20], [127, 0, 0, 0]);
        assert_eq!(&bytes[20..24], [0x20, 0, 0, 0]);
        assert_eq!(&bytes[24..32], [0; 8]);
        assert_eq!(&bytes[32..36], b"INS2");
    }

    #[test]
    fn round_trip() {
        let file = InstrumentFile {
            version: 84,
            instrument: Instrument {
                version: 84,
                kind: InstrumentKind::Amiga,
                body: InstrumentBody::Legacy(LegacyBody {
                    name: "SNARE".to_string(),
                    ..LegacyBody::default()
                }),
            },
            wavetables: vec![
                Wavetable {
                    name: "SAW".to_string(),
                    min: 0,
                    max: 15,
                    data: (0..16).collect(),
                },
                Wavetable::default(),
            ],
            samples: vec![Sample {
                name: "SNARE".to_string(),
                length: 4,
                depth: SampleDepth::EightBit,
                data: vec![1, 2, 3, 4],
                ..Sample::default()
            }],
        };

        let mut writer = Cursor::new(Vec::new());
        file.to_writer(&mut writer).unwrap();

        let bytes = writer.get_ref();
        assert_eq!(&bytes[24..26], [2, 0]);
        assert_eq!(&bytes[26..28], [1, 0]);
        assert_eq!(&bytes[28..32], [0; 4]);
        assert_eq!(&bytes[20..24], [0x2C, 0, 0, 0]);

        writer.set_position(0);
        assert_eq!(InstrumentFile::from_reader(&mut writer).unwrap(), file);
    }

    #[test]
    fn not_an_instrument_file() {
        let mut reader = Cursor::new(b"-Furnace module-".to_vec());
        assert!(matches!(
            InstrumentFile::from_reader(&mut reader),
            Err(ReadError::BadMagic { .. })
        ));
    }

    #[test]
    fn dangling_pointer() {
        let mut bytes = b"-Furnace instr.-".to_vec();
        bytes.extend_from_slice(&[127, 0, 0, 0, 0xFF, 0, 0, 0]);
        bytes.extend_from_slice(&[0; 8]);

        assert!(matches!(
            InstrumentFile::from_reader(&mut Cursor::new(bytes)),
            Err(ReadError::TruncatedStream)
        ));
    }
}
