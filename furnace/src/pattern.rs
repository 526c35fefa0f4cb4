//! Pattern data: the rows of notes and effects for one channel

use crate::serde::{
    BlockWriter, LE, ReadError, WriteError, expect_tag, read_string, skip, write_string,
    write_zeros,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::debug;

/// The note column of a [`Row`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Note {
    /// Nothing happens on this row
    #[default]
    Empty,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
    C,
    /// Cut the note
    Off,
    /// Cut the note and release the macros
    OffRelease,
    /// Release the macros only
    Release,
}

impl Note {
    /// Decode the on-disk note value
    pub fn from_u16(value: u16) -> Result<Self, ReadError> {
        use Note::*;

        Ok(match value {
            0 => Empty,
            1 => CSharp,
            2 => D,
            3 => DSharp,
            4 => E,
            5 => F,
            6 => FSharp,
            7 => G,
            8 => GSharp,
            9 => A,
            10 => ASharp,
            11 => B,
            12 => C,
            100 => Off,
            101 => OffRelease,
            102 => Release,
            value => return Err(ReadError::UnknownNote(value)),
        })
    }

    /// The on-disk note value
    pub fn to_u16(self) -> u16 {
        use Note::*;

        match self {
            Empty => 0,
            CSharp => 1,
            D => 2,
            DSharp => 3,
            E => 4,
            F => 5,
            FSharp => 6,
            G => 7,
            GSharp => 8,
            A => 9,
            ASharp => 10,
            B => 11,
            C => 12,
            Off => 100,
            OffRelease => 101,
            Release => 102,
        }
    }
}

/// A single effect column entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    /// The effect command, or -1
    pub code: i16,

    /// The effect parameter, or -1
    pub value: i16,
}

impl Effect {
    /// An empty effect column
    pub const NONE: Self = Self { code: -1, value: -1 };
}

impl Default for Effect {
    fn default() -> Self {
        Self::NONE
    }
}

/// A single row of a [`Pattern`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub note: Note,
    pub octave: i16,

    /// Index into the module's instruments, or -1
    pub instrument: i16,

    /// The note volume, or -1
    pub volume: i16,

    /// One entry per effect column of the channel
    pub effects: Vec<Effect>,
}

impl Row {
    /// A row without any data, for a channel with the given number of effect columns
    pub fn empty(effect_columns: usize) -> Self {
        Self {
            note: Note::Empty,
            octave: 0,
            instrument: -1,
            volume: -1,
            effects: vec![Effect::NONE; effect_columns],
        }
    }
}

/// The shape of the patterns in a module, which the pattern blocks don't store themselves
#[derive(Debug, Clone, Copy)]
pub struct PatternLayout<'a> {
    /// The number of rows in every pattern
    pub rows: u16,

    /// The number of effect columns of each channel
    pub effect_columns: &'a [u8],
}

/// The rows one channel plays for a specific order index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pattern {
    /// The channel the pattern belongs to
    pub channel: u16,

    /// The index the order list of the channel refers to the pattern with
    pub index: u16,

    pub name: String,
    pub rows: Vec<Row>,
}

impl Pattern {
    /// Decode a `PATR` block
    pub fn from_reader<R>(reader: &mut R, layout: PatternLayout) -> Result<Self, ReadError>
    where
        R: Read + Seek + ?Sized,
    {
        expect_tag(reader, b"PATR")?;
        skip(reader, 4)?;

        let channel = reader.read_u16::<LE>()?;
        let index = reader.read_u16::<LE>()?;
        skip(reader, 4)?;

        let effect_columns = *layout
            .effect_columns
            .get(channel as usize)
            .ok_or(ReadError::ChannelOutOfRange(channel))?;

        let mut rows = Vec::with_capacity(layout.rows as usize);
        for _ in 0..layout.rows {
            let note = Note::from_u16(reader.read_u16::<LE>()?)?;

            // The C of an octave is stored as the note 12 of the octave below it
            let mut octave = reader.read_i16::<LE>()?;
            if note == Note::C {
                octave = octave.wrapping_add(1);
            }

            let instrument = reader.read_i16::<LE>()?;
            let volume = reader.read_i16::<LE>()?;

            let effects = (0..effect_columns)
                .map(|_| {
                    Ok(Effect {
                        code: reader.read_i16::<LE>()?,
                        value: reader.read_i16::<LE>()?,
                    })
                })
                .collect::<Result<_, ReadError>>()?;

            rows.push(Row {
                note,
                octave,
                instrument,
                volume,
                effects,
            });
        }

        let name = read_string(reader)?;
        debug!(channel, index, "Read pattern");

        Ok(Self {
            channel,
            index,
            name,
            rows,
        })
    }

    /// Encode the pattern as a `PATR` block
    ///
    /// The rows have to match the layout exactly: one row per pattern row, and one effect per
    /// effect column of the channel.
    pub fn to_writer<W>(&self, writer: &mut W, layout: PatternLayout) -> Result<(), WriteError>
    where
        W: Write + Seek + ?Sized,
    {
        self.check_shape(layout)?;

        let block = BlockWriter::begin(writer, b"PATR")?;
        writer.write_u16::<LE>(self.channel)?;
        writer.write_u16::<LE>(self.index)?;
        write_zeros(writer, 4)?;

        for row in &self.rows {
            writer.write_u16::<LE>(row.note.to_u16())?;

            let octave = if row.note == Note::C {
                row.octave.wrapping_sub(1)
            } else {
                row.octave
            };
            writer.write_i16::<LE>(octave)?;

            writer.write_i16::<LE>(row.instrument)?;
            writer.write_i16::<LE>(row.volume)?;

            for effect in &row.effects {
                writer.write_i16::<LE>(effect.code)?;
                writer.write_i16::<LE>(effect.value)?;
            }
        }

        write_string(writer, &self.name)?;
        block.finish(writer)?;

        Ok(())
    }

    fn check_shape(&self, layout: PatternLayout) -> Result<(), WriteError> {
        let error = |reason: String| WriteError::PatternShape {
            channel: self.channel,
            index: self.index,
            reason,
        };

        let Some(columns) = layout.effect_columns.get(self.channel as usize) else {
            return Err(error(format!(
                "the module only has {} channels",
                layout.effect_columns.len()
            )));
        };

        if self.rows.len() != layout.rows as usize {
            return Err(error(format!(
                "{} rows, but the pattern length is {}",
                self.rows.len(),
                layout.rows
            )));
        }

        if let Some((row, effects)) = self
            .rows
            .iter()
            .map(|row| row.effects.len())
            .enumerate()
            .find(|(_, effects)| *effects != *columns as usize)
        {
            return Err(error(format!(
                "row {row} has {effects} effects, but the channel has {columns} effect columns"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LAYOUT: PatternLayout = PatternLayout {
        rows: 4,
        effect_columns: &[1, 1, 2, 1],
    };

    fn scenario() -> Pattern {
        let mut rows = vec![Row::empty(1); 4];
        rows[0].note = Note::Off;
        rows[2] = Row {
            note: Note::C,
            octave: 4,
            instrument: 0,
            ..Row::empty(1)
        };

        Pattern {
            channel: 1,
            index: 3,
            name: String::new(),
            rows,
        }
    }

    #[test]
    fn layout() {
        let mut writer = Cursor::new(Vec::new());
        scenario().to_writer(&mut writer, LAYOUT).unwrap();
        let bytes = writer.into_inner();

        assert_eq!(&bytes[0..4], b"PATR");
        assert_eq!(&bytes[4..8], &((bytes.len() - 8) as u32).to_le_bytes());
        assert_eq!(&bytes[8..12], [1, 0, 3, 0]);

        // Third row, octave stored one lower for C
        let row = 16 + 2 * 12;
        assert_eq!(
            &bytes[row..row + 12],
            [12, 0, 3, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );

        assert_eq!(bytes.last(), Some(&0));
    }

    #[test]
    fn game_boy_scenario() {
        let pattern = scenario();

        let mut writer = Cursor::new(Vec::new());
        pattern.to_writer(&mut writer, LAYOUT).unwrap();
        writer.set_position(0);

        let decoded = Pattern::from_reader(&mut writer, LAYOUT).unwrap();
        assert_eq!(decoded, pattern);

        assert_eq!(decoded.rows[0].note, Note::Off);
        assert_eq!(decoded.rows[1], Row::empty(1));
        assert_eq!(decoded.rows[1].instrument, -1);
        assert_eq!(decoded.rows[1].volume, -1);
        assert_eq!(decoded.rows[1].effects, [Effect { code: -1, value: -1 }]);
        assert_eq!(decoded.rows[2].note, Note::C);
        assert_eq!(decoded.rows[2].octave, 4);
        assert_eq!(decoded.rows[2].instrument, 0);
        assert_eq!(decoded.rows[3], Row::empty(1));
    }

    #[test]
    fn natural_c_octave() {
        let mut bytes = b"PATR\0\0\0\0\0\0\0\0\0\0\0\0".to_vec();
        bytes.extend_from_slice(&[12, 0, 3, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        bytes.extend_from_slice(&[1, 0, 3, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        bytes.push(0);

        let layout = PatternLayout {
            rows: 2,
            effect_columns: &[1],
        };
        let pattern = Pattern::from_reader(&mut Cursor::new(bytes), layout).unwrap();

        assert_eq!(pattern.rows[0].note, Note::C);
        assert_eq!(pattern.rows[0].octave, 4);
        assert_eq!(pattern.rows[1].note, Note::CSharp);
        assert_eq!(pattern.rows[1].octave, 3);
    }

    #[test]
    fn channel_out_of_range() {
        let bytes = b"PATR\0\0\0\0\x04\0\0\0\0\0\0\0";
        assert!(matches!(
            Pattern::from_reader(&mut Cursor::new(bytes), LAYOUT),
            Err(ReadError::ChannelOutOfRange(4))
        ));
    }

    #[test]
    fn unknown_note() {
        let mut bytes = b"PATR\0\0\0\0\0\0\0\0\0\0\0\0".to_vec();
        bytes.extend_from_slice(&[50, 0]);

        assert!(matches!(
            Pattern::from_reader(&mut Cursor::new(bytes), LAYOUT),
            Err(ReadError::UnknownNote(50))
        ));
    }

    #[test]
    fn shape_is_checked() {
        let mut pattern = scenario();
        pattern.rows.pop();
        assert!(matches!(
            pattern.to_writer(&mut Cursor::new(Vec::new()), LAYOUT),
            Err(WriteError::PatternShape { channel: 1, index: 3, .. })
        ));

        let mut pattern = scenario();
        pattern.rows[1].effects.push(Effect::NONE);
        assert!(matches!(
            pattern.to_writer(&mut Cursor::new(Vec::new()), LAYOUT),
            Err(WriteError::PatternShape { .. })
        ));

        let mut pattern = scenario();
        pattern.channel = 9;
        assert!(pattern.to_writer(&mut Cursor::new(Vec::new()), LAYOUT).is_err());
    }
}
