//! Modules: songs, with everything they need to be played back
//!
//! A module file starts with a small header pointing at the `INFO` block. That block holds
//! the song settings, the chip list and the order lists, plus a pointer table for every other
//! kind of block (instruments, wavetables, samples and patterns). Those follow it, each
//! found through its pointer.

pub mod compress;

use crate::chip::Chip;
use crate::instrument::{AssetList, Feature, Instrument, InstrumentBody, InstrumentFile};
use crate::pattern::{Pattern, PatternLayout, Row};
use crate::sample::Sample;
use crate::serde::{
    BlockWriter, LE, PointerTable, ReadError, WriteError, expect_tag, read_bool, read_string,
    seek_to, skip, write_bool, write_string, write_zeros,
};
use crate::wavetable::Wavetable;
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::{
    collections::BTreeSet,
    fs::File,
    io::{self, Cursor, Read, Seek, Write},
    path::Path,
};
use system_interface::io::Peek;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Descriptive information about a song
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meta {
    pub name: String,
    pub author: String,
    pub comment: String,
}

/// Tempo and display settings
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    /// Ticks per engine step, minus one
    pub time_base: u8,

    /// Ticks per row, alternating between the two
    pub speed: (u8, u8),

    pub arp_speed: u8,

    /// Engine ticks per second
    pub clock_speed: f32,

    /// Rows between the minor and major highlights in the pattern view
    pub highlight: (u8, u8),
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            time_base: 0,
            speed: (6, 6),
            arp_speed: 1,
            clock_speed: 60.0,
            highlight: (4, 16),
        }
    }
}

/// Per-channel settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// The number of effect columns in the channel's patterns
    pub effect_columns: u8,

    pub shown: bool,
    pub collapsed: bool,

    /// A custom channel name, or empty for the default
    pub name: String,

    /// A custom short channel name, or empty for the default
    pub abbreviation: String,
}

impl Default for ChannelInfo {
    fn default() -> Self {
        Self {
            effect_columns: 1,
            shown: true,
            collapsed: false,
            name: String::new(),
            abbreviation: String::new(),
        }
    }
}

/// How [`Module::to_writer_with()`] stores the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Plain module data, which Furnace opens as well
    None,

    /// A zlib envelope, the way Furnace itself saves modules
    #[default]
    Zlib,
}

/// A Furnace module
///
/// # Example
///
/// ```no_run
/// use furnace::Module;
///
/// let module = Module::from_path("bangers.fur")?;
/// for (channel, order) in module.orders.iter().enumerate() {
///     println!("{channel}: {order:?}");
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// The format version the module was saved with
    pub version: u16,

    pub meta: Meta,
    pub timing: Timing,

    /// The number of rows in every pattern
    pub pattern_length: u16,

    /// The chips the module plays on, at most [`Module::MAX_CHIPS`]
    pub chips: Vec<Chip>,

    /// Per-chip volume, 1.0 being unity
    pub chip_volumes: [f32; Module::MAX_CHIPS],

    pub chip_panning: [i8; Module::MAX_CHIPS],
    pub chip_settings: [[u8; 4]; Module::MAX_CHIPS],

    /// The frequency of A-4, in Hz
    pub tuning: f32,

    pub compat_flags: [u8; 20],

    /// One order list per channel, all of the same length
    ///
    /// Each entry is the index of the pattern the channel plays at that point of the song.
    pub orders: Vec<Vec<u8>>,

    /// One entry per channel
    pub channels: Vec<ChannelInfo>,

    /// Stored from version 59 on
    pub master_volume: f32,

    /// Compatibility flags added after the first 20, as many as [`Module::version`] implies
    pub extended_compat_flags: Vec<u8>,

    pub instruments: Vec<Instrument>,
    pub wavetables: Vec<Wavetable>,
    pub samples: Vec<Sample>,
    pub patterns: Vec<Pattern>,
}

impl Module {
    /// The magic string every module starts with
    pub const MAGIC: &'static [u8; 16] = b"-Furnace module-";

    /// The newest format version this crate decodes
    pub const MAX_VERSION: u16 = 239;

    /// The version [`Module::new()`] creates modules with
    pub const DEFAULT_VERSION: u16 = 83;

    /// The number of chip slots in a module
    pub const MAX_CHIPS: usize = 32;

    /// The master volume of modules saved before it was stored
    const LEGACY_MASTER_VOLUME: f32 = 2.0;

    /// Where the `INFO` block is written, right after the header
    const INFO_POINTER: u64 = 0x20;

    /// Create a minimal module: a single Game Boy, with one empty row per channel
    pub fn new() -> Self {
        let chips = vec![Chip::GameBoy];
        let channel_count = Chip::GameBoy.channel_count();

        let patterns = (0..channel_count as u16)
            .map(|channel| Pattern {
                channel,
                index: 0,
                name: String::new(),
                rows: vec![Row::empty(1)],
            })
            .collect();

        Self {
            version: Self::DEFAULT_VERSION,
            meta: Meta::default(),
            timing: Timing::default(),
            pattern_length: 1,
            chips,
            chip_volumes: [1.0; Self::MAX_CHIPS],
            chip_panning: [0; Self::MAX_CHIPS],
            chip_settings: [[0; 4]; Self::MAX_CHIPS],
            tuning: 440.0,
            compat_flags: [0, 1, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1],
            orders: vec![vec![0]; channel_count],
            channels: vec![ChannelInfo::default(); channel_count],
            master_volume: 1.0,
            extended_compat_flags: vec![0; extended_compat_len(Self::DEFAULT_VERSION)],
            instruments: Vec::new(),
            wavetables: Vec::new(),
            samples: Vec::new(),
            patterns,
        }
    }

    /// The number of channels the chips provide together
    pub fn channel_count(&self) -> usize {
        self.chips.iter().map(|chip| chip.channel_count()).sum()
    }

    /// The number of entries in each order list
    pub fn order_length(&self) -> usize {
        self.orders.first().map_or(0, Vec::len)
    }

    /// The pattern a channel plays at a position in the order list
    ///
    /// Returns `None` if the channel or slot doesn't exist, or if the order refers to a
    /// pattern the module has no data for.
    pub fn pattern(&self, channel: usize, slot: usize) -> Option<&Pattern> {
        let index = *self.orders.get(channel)?.get(slot)? as u16;

        self.patterns
            .iter()
            .find(|pattern| pattern.channel as usize == channel && pattern.index == index)
    }

    /// Package an instrument together with the wavetables and samples it plays
    ///
    /// Returns `None` if the module has no such instrument. Feature-block instruments get their
    /// sample and wavetable lists rebuilt to match what was bundled.
    pub fn instrument_file(&self, index: usize) -> Option<InstrumentFile> {
        let mut file = InstrumentFile::new(self.instruments.get(index)?.clone());
        file.version = self.version;

        let instrument = &file.instrument;
        let max = match instrument.body {
            InstrumentBody::Legacy(_) => usize::MAX,
            InstrumentBody::Features(_) => u8::MAX as usize,
        };
        let wavetables = pick(&self.wavetables, instrument.wavetable_indices(), max, "wavetable");
        let samples = pick(&self.samples, instrument.sample_indices(), max, "sample");

        if let InstrumentBody::Features(features) = &mut file.instrument.body {
            features.retain(|f| !matches!(f, Feature::SampleList(_) | Feature::WavetableList(_)));
            if !samples.is_empty() {
                features.push(Feature::SampleList(asset_list(&samples)));
            }
            if !wavetables.is_empty() {
                features.push(Feature::WavetableList(asset_list(&wavetables)));
            }
        }

        file.wavetables = wavetables.into_iter().map(|(_, wavetable)| wavetable).collect();
        file.samples = samples.into_iter().map(|(_, sample)| sample).collect();
        Some(file)
    }

    /// Deserialize a module from an arbitrary I/O reader
    ///
    /// Both plain and zlib-compressed modules are accepted.
    pub fn from_reader<R>(reader: R) -> Result<Self, ReadError>
    where
        R: Read,
    {
        let bytes = compress::decompress(reader)?;
        Self::read_plain(&mut Cursor::new(bytes))
    }

    /// Deserialize a module from a path on disk (.fur)
    pub fn from_path<P>(path: P) -> Result<Self, FromPathError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        let module = Self::from_reader(file)?;

        Ok(module)
    }

    /// Serialize the module to an arbitrary I/O writer, compressed
    pub fn to_writer<W>(&self, writer: W) -> Result<(), WriteError>
    where
        W: Write,
    {
        self.to_writer_with(writer, Compression::default())
    }

    /// Serialize the module to an arbitrary I/O writer
    pub fn to_writer_with<W>(
        &self,
        mut writer: W,
        compression: Compression,
    ) -> Result<(), WriteError>
    where
        W: Write,
    {
        let mut plain = Cursor::new(Vec::new());
        self.write_plain(&mut plain)?;

        match compression {
            Compression::None => writer.write_all(plain.get_ref())?,
            Compression::Zlib => compress::compress(plain.get_ref(), writer)?,
        }

        Ok(())
    }

    /// Serialize the module to a path on disk (.fur), compressed
    pub fn to_path<P>(&self, path: P) -> Result<(), WriteError>
    where
        P: AsRef<Path>,
    {
        self.to_writer(File::create(path)?)
    }

    fn read_plain<R>(reader: &mut R) -> Result<Self, ReadError>
    where
        R: Read + Seek + Peek,
    {
        expect_tag(reader, Self::MAGIC)?;

        let version = reader.read_u16::<LE>()?;
        if !(1..=Self::MAX_VERSION).contains(&version) {
            return Err(ReadError::UnsupportedVersion(version));
        }

        skip(reader, 2)?;
        let info_pointer = reader.read_u32::<LE>()?;
        skip(reader, 8)?;

        debug!(version, info_pointer, "Read module header");
        seek_to(reader, info_pointer as u64)?;

        expect_tag(reader, b"INFO")?;
        skip(reader, 4)?;

        let time_base = reader.read_u8()?;
        let speed = (reader.read_u8()?, reader.read_u8()?);
        let arp_speed = reader.read_u8()?;
        let clock_speed = reader.read_f32::<LE>()?;
        let pattern_length = reader.read_u16::<LE>()?;
        let order_length = reader.read_u16::<LE>()? as usize;
        let highlight = (reader.read_u8()?, reader.read_u8()?);

        let instrument_count = reader.read_u16::<LE>()? as usize;
        let wavetable_count = reader.read_u16::<LE>()? as usize;
        let sample_count = reader.read_u16::<LE>()? as usize;
        let pattern_count = reader.read_u32::<LE>()? as usize;

        let mut chip_ids = [0; Self::MAX_CHIPS];
        reader.read_exact(&mut chip_ids)?;
        let chips = chip_ids
            .into_iter()
            .take_while(|id| *id != 0)
            .map(Chip::from_id)
            .collect::<Result<Vec<_>, _>>()?;
        let channel_count: usize = chips.iter().map(|chip| chip.channel_count()).sum();

        let mut chip_volumes = [0.0; Self::MAX_CHIPS];
        for volume in &mut chip_volumes {
            *volume = reader.read_i8()? as f32 / 64.0;
        }

        let mut chip_panning = [0; Self::MAX_CHIPS];
        reader.read_i8_into(&mut chip_panning)?;

        let mut chip_settings = [[0; 4]; Self::MAX_CHIPS];
        for settings in &mut chip_settings {
            reader.read_exact(settings)?;
        }

        let name = read_string(reader)?;
        let author = read_string(reader)?;
        let tuning = reader.read_f32::<LE>()?;

        let mut compat_flags = [0; 20];
        reader.read_exact(&mut compat_flags)?;

        let instrument_pointers = read_pointers(reader, instrument_count)?;
        let wavetable_pointers = read_pointers(reader, wavetable_count)?;
        let sample_pointers = read_pointers(reader, sample_count)?;
        let pattern_pointers = read_pointers(reader, pattern_count)?;

        debug!(
            %name,
            chips = chips.len(),
            channel_count,
            order_length,
            pattern_length,
            "Read song info"
        );

        let mut orders = vec![vec![0; order_length]; channel_count];
        for order in &mut orders {
            reader.read_exact(order)?;
        }

        let mut effect_columns = vec![0; channel_count];
        reader.read_exact(&mut effect_columns)?;

        let mut channels = effect_columns
            .iter()
            .map(|effect_columns| ChannelInfo {
                effect_columns: *effect_columns,
                ..ChannelInfo::default()
            })
            .collect::<Vec<_>>();
        for channel in &mut channels {
            channel.shown = read_bool(reader)?;
        }
        for channel in &mut channels {
            channel.collapsed = read_bool(reader)?;
        }
        for channel in &mut channels {
            channel.name = read_string(reader)?;
        }
        for channel in &mut channels {
            channel.abbreviation = read_string(reader)?;
        }

        let comment = read_string(reader)?;

        let master_volume = if version >= 59 {
            reader.read_f32::<LE>()?
        } else {
            Self::LEGACY_MASTER_VOLUME
        };

        let mut extended_compat_flags = vec![0; extended_compat_len(version)];
        reader.read_exact(&mut extended_compat_flags)?;

        let mut instruments = Vec::with_capacity(instrument_pointers.len());
        for pointer in instrument_pointers {
            trace!(pointer, "Reading instrument");
            seek_to(reader, pointer as u64)?;
            instruments.push(Instrument::from_reader(reader)?);
        }

        let mut wavetables = Vec::with_capacity(wavetable_pointers.len());
        for pointer in wavetable_pointers {
            trace!(pointer, "Reading wavetable");
            seek_to(reader, pointer as u64)?;
            wavetables.push(Wavetable::from_reader(reader)?);
        }

        let mut samples = Vec::with_capacity(sample_pointers.len());
        for pointer in sample_pointers {
            trace!(pointer, "Reading sample");
            seek_to(reader, pointer as u64)?;
            samples.push(Sample::from_reader(reader)?);
        }

        let layout = PatternLayout {
            rows: pattern_length,
            effect_columns: &effect_columns,
        };
        let mut patterns = Vec::with_capacity(pattern_pointers.len());
        for pointer in pattern_pointers {
            trace!(pointer, "Reading pattern");
            seek_to(reader, pointer as u64)?;
            patterns.push(Pattern::from_reader(reader, layout)?);
        }

        Ok(Self {
            version,
            meta: Meta {
                name,
                author,
                comment,
            },
            timing: Timing {
                time_base,
                speed,
                arp_speed,
                clock_speed,
                highlight,
            },
            pattern_length,
            chips,
            chip_volumes,
            chip_panning,
            chip_settings,
            tuning,
            compat_flags,
            orders,
            channels,
            master_volume,
            extended_compat_flags,
            instruments,
            wavetables,
            samples,
            patterns,
        })
    }

    fn write_plain<W>(&self, writer: &mut W) -> Result<(), WriteError>
    where
        W: Write + Seek,
    {
        self.check_channels()?;

        writer.write_all(Self::MAGIC)?;
        writer.write_u16::<LE>(self.version)?;
        write_zeros(writer, 2)?;
        let info_pointer = PointerTable::reserve(writer, 1)?;
        write_zeros(writer, 8)?;

        let info_offset = writer.stream_position()?;
        debug_assert_eq!(info_offset, Self::INFO_POINTER);

        let info = BlockWriter::begin(writer, b"INFO")?;
        writer.write_u8(self.timing.time_base)?;
        writer.write_u8(self.timing.speed.0)?;
        writer.write_u8(self.timing.speed.1)?;
        writer.write_u8(self.timing.arp_speed)?;
        writer.write_f32::<LE>(self.timing.clock_speed)?;

        writer.write_u16::<LE>(self.pattern_length)?;
        writer.write_u16::<LE>(count(self.order_length(), "order list entries")?)?;
        writer.write_u8(self.timing.highlight.0)?;
        writer.write_u8(self.timing.highlight.1)?;

        writer.write_u16::<LE>(count(self.instruments.len(), "instruments")?)?;
        writer.write_u16::<LE>(count(self.wavetables.len(), "wavetables")?)?;
        writer.write_u16::<LE>(count(self.samples.len(), "samples")?)?;
        let pattern_count =
            u32::try_from(self.patterns.len()).map_err(|_| WriteError::TooManyEntries {
                what: "patterns",
                count: self.patterns.len(),
                max: u32::MAX as usize,
            })?;
        writer.write_u32::<LE>(pattern_count)?;

        for chip in &self.chips {
            writer.write_u8(chip.id())?;
        }
        write_zeros(writer, Self::MAX_CHIPS - self.chips.len())?;

        for volume in self.chip_volumes {
            let stored = (volume * 64.0).round();
            if !(i8::MIN as f32..=i8::MAX as f32).contains(&stored) {
                return Err(WriteError::OutOfRange {
                    field: "chip volume",
                    value: stored as i64,
                });
            }
            writer.write_i8(stored as i8)?;
        }
        for panning in self.chip_panning {
            writer.write_i8(panning)?;
        }
        for settings in &self.chip_settings {
            writer.write_all(settings)?;
        }

        write_string(writer, &self.meta.name)?;
        write_string(writer, &self.meta.author)?;
        writer.write_f32::<LE>(self.tuning)?;
        writer.write_all(&self.compat_flags)?;

        let instrument_pointers = PointerTable::reserve(writer, self.instruments.len())?;
        let wavetable_pointers = PointerTable::reserve(writer, self.wavetables.len())?;
        let sample_pointers = PointerTable::reserve(writer, self.samples.len())?;
        let pattern_pointers = PointerTable::reserve(writer, self.patterns.len())?;

        for order in &self.orders {
            writer.write_all(order)?;
        }
        for channel in &self.channels {
            writer.write_u8(channel.effect_columns)?;
        }
        for channel in &self.channels {
            write_bool(writer, channel.shown)?;
        }
        for channel in &self.channels {
            write_bool(writer, channel.collapsed)?;
        }
        for channel in &self.channels {
            write_string(writer, &channel.name)?;
        }
        for channel in &self.channels {
            write_string(writer, &channel.abbreviation)?;
        }

        write_string(writer, &self.meta.comment)?;
        if self.version >= 59 {
            writer.write_f32::<LE>(self.master_volume)?;
        }
        writer.write_all(&self.extended_compat_flags)?;

        info.finish(writer)?;
        info_pointer.fill(writer, &[info_offset])?;

        let mut offsets = Vec::with_capacity(self.instruments.len());
        for instrument in &self.instruments {
            offsets.push(writer.stream_position()?);
            instrument.to_writer(writer)?;
        }
        instrument_pointers.fill(writer, &offsets)?;

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

        let effect_columns = self
            .channels
            .iter()
            .map(|channel| channel.effect_columns)
            .collect::<Vec<_>>();
        let layout = PatternLayout {
            rows: self.pattern_length,
            effect_columns: &effect_columns,
        };
        let mut offsets = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            offsets.push(writer.stream_position()?);
            pattern.to_writer(writer, layout)?;
        }
        pattern_pointers.fill(writer, &offsets)?;

        debug!(
            name = %self.meta.name,
            version = self.version,
            len = writer.stream_position()?,
            "Wrote module"
        );

        Ok(())
    }

    /// Check that everything sized per chip or per channel agrees with the chip list
    fn check_channels(&self) -> Result<(), WriteError> {
        if self.chips.len() > Self::MAX_CHIPS {
            return Err(WriteError::TooManyEntries {
                what: "chips",
                count: self.chips.len(),
                max: Self::MAX_CHIPS,
            });
        }

        let expected = self.channel_count();
        for (field, found) in [("orders", self.orders.len()), ("channels", self.channels.len())] {
            if found != expected {
                return Err(WriteError::ChannelMismatch {
                    field,
                    expected,
                    found,
                });
            }
        }

        let order_length = self.order_length();
        if let Some(order) = self.orders.iter().find(|order| order.len() != order_length) {
            return Err(WriteError::FieldLength {
                field: "order list",
                expected: order_length,
                found: order.len(),
            });
        }

        let extended_compat_len = extended_compat_len(self.version);
        if self.extended_compat_flags.len() != extended_compat_len {
            return Err(WriteError::FieldLength {
                field: "extended compat flags",
                expected: extended_compat_len,
                found: self.extended_compat_flags.len(),
            });
        }

        Ok(())
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

/// The number of extended compat flag bytes a format version stores
pub fn extended_compat_len(version: u16) -> usize {
    [(70, 1), (71, 3), (72, 2), (78, 1), (83, 2)]
        .into_iter()
        .filter(|(since, _)| version >= *since)
        .map(|(_, len)| len)
        .sum()
}

fn read_pointers<R>(reader: &mut R, count: usize) -> Result<Vec<u32>, ReadError>
where
    R: Read,
{
    let mut pointers = vec![0; count];
    reader.read_u32_into::<LE>(&mut pointers)?;
    Ok(pointers)
}

fn count(len: usize, what: &'static str) -> Result<u16, WriteError> {
    u16::try_from(len).map_err(|_| WriteError::TooManyEntries {
        what,
        count: len,
        max: u16::MAX as usize,
    })
}

/// The assets at `indices`, leaving out the ones that don't exist or can't be referred to
fn pick<T>(assets: &[T], indices: BTreeSet<usize>, max: usize, what: &str) -> Vec<(usize, T)>
where
    T: Clone,
{
    indices
        .into_iter()
        .filter_map(|index| match assets.get(index) {
            Some(asset) if index <= max => Some((index, asset.clone())),
            _ => {
                warn!(index, what, "Leaving out an asset the instrument can't take along");
                None
            }
        })
        .collect()
}

fn asset_list<T>(assets: &[(usize, T)]) -> AssetList {
    AssetList {
        indices: assets.iter().map(|(index, _)| *index as u8).collect(),
        pointers: vec![0; assets.len()],
    }
}

/// Errors that might be returned from [`Module::from_path()`]
#[derive(Debug, Error)]
pub enum FromPathError {
    /// Opening the file itself failed
    #[error("Opening the file failed")]
    FileOpen(#[from] io::Error),

    /// Deserialization failed
    #[error("Reading the module from file failed")]
    Read(#[from] ReadError),
}
