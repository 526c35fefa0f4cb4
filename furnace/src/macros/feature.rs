//! The self-describing macro groups of feature-block instruments
//!
//! A group starts with the size of a macro header, followed by one header plus element array per
//! macro, and ends with a [`STOP`] code:
//!
//! | offset | field                                                                |
//! |--------|----------------------------------------------------------------------|
//! | 0      | macro code ([`STOP`] ends the group)                                 |
//! | 1      | length                                                               |
//! | 2      | loop index (255 for none)                                            |
//! | 3      | release index (255 for none)                                         |
//! | 4      | mode                                                                 |
//! | 5      | bit 0 open, bits 1-2 [`MacroKind`], bits 6-7 element word size      |
//! | 6      | delay                                                                |
//! | 7      | speed                                                                |

use super::{Macro, MacroError, MacroKind, MacroMap, MacroName};
use crate::serde::{LE, ReadError, WriteError, skip};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use tracing::{trace, warn};

/// The macro code that ends a group
pub const STOP: u8 = 255;

/// Loop and release index value meaning "no marker"
const ABSENT: u8 = 255;

/// The size of the per-macro header we write
const HEADER_LEN: u16 = 8;

/// The width of the elements of a single macro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordSize {
    U8,
    I8,
    I16,
    I32,
}

impl WordSize {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::U8,
            1 => Self::I8,
            2 => Self::I16,
            _ => Self::I32,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::U8 => 0,
            Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 => 3,
        }
    }

    /// The narrowest word size that holds every value
    fn narrowest(values: &[i32]) -> Self {
        let fits = |min: i32, max: i32| values.iter().all(|v| (min..=max).contains(v));

        if fits(u8::MIN as i32, u8::MAX as i32) {
            Self::U8
        } else if fits(i8::MIN as i32, i8::MAX as i32) {
            Self::I8
        } else if fits(i16::MIN as i32, i16::MAX as i32) {
            Self::I16
        } else {
            Self::I32
        }
    }

    fn read<R>(self, reader: &mut R) -> Result<i32, ReadError>
    where
        R: Read + ?Sized,
    {
        Ok(match self {
            Self::U8 => reader.read_u8()? as i32,
            Self::I8 => reader.read_i8()? as i32,
            Self::I16 => reader.read_i16::<LE>()? as i32,
            Self::I32 => reader.read_i32::<LE>()?,
        })
    }

    fn write<W>(self, writer: &mut W, value: i32) -> std::io::Result<()>
    where
        W: Write + ?Sized,
    {
        match self {
            Self::U8 => writer.write_u8(value as u8),
            Self::I8 => writer.write_i8(value as i8),
            Self::I16 => writer.write_i16::<LE>(value as i16),
            Self::I32 => writer.write_i32::<LE>(value),
        }
    }
}

/// Read a macro group, resolving codes to names with `name_of`
///
/// Macros with a code `name_of` doesn't recognize are skipped.
pub fn read_group<R, F>(reader: &mut R, name_of: F) -> Result<MacroMap, ReadError>
where
    R: Read + ?Sized,
    F: Fn(u8) -> Option<MacroName>,
{
    let header_len = reader.read_u16::<LE>()?;
    let mut macros = MacroMap::new();

    loop {
        let code = reader.read_u8()?;
        if code == STOP {
            break;
        }

        let len = reader.read_u8()?;
        let loop_index = reader.read_u8()?;
        let release_index = reader.read_u8()?;
        let mode = reader.read_u8()?;
        let packed = reader.read_u8()?;
        let delay = reader.read_u8()?;
        let speed = reader.read_u8()?;

        if header_len > HEADER_LEN {
            skip(reader, (header_len - HEADER_LEN) as u64)?;
        }

        let word_size = WordSize::from_bits(packed >> 6);
        let values = (0..len)
            .map(|_| word_size.read(reader))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(name) = name_of(code) else {
            warn!(code, "Skipping macro with unknown code");
            continue;
        };

        trace!(%name, len, ?word_size, "Read macro");

        let kind = MacroKind::from_bits(packed >> 1);
        let (loop_index, release_index) = match kind {
            MacroKind::Sequence => (marker_index(loop_index), marker_index(release_index)),
            _ => (-1, -1),
        };

        let m = Macro {
            open: packed & 1 != 0,
            kind,
            mode,
            delay,
            speed,
            ..Macro::from_parts(&values, loop_index, release_index)
        };

        if m != Macro::default() {
            macros.insert(name, m);
        }
    }

    Ok(macros)
}

fn marker_index(index: u8) -> i32 {
    match index {
        ABSENT => -1,
        index => index as i32,
    }
}

/// Write a macro group, assigning codes with `code_of`
///
/// Macros for which `code_of` returns `None` don't belong in this group and are left out.
pub fn write_group<W, F>(writer: &mut W, macros: &MacroMap, code_of: F) -> Result<(), WriteError>
where
    W: Write + ?Sized,
    F: Fn(MacroName) -> Option<u8>,
{
    writer.write_u16::<LE>(HEADER_LEN)?;

    for (name, m) in macros {
        let Some(code) = code_of(*name) else {
            warn!(%name, "Macro doesn't belong in this group, leaving it out");
            continue;
        };

        let invalid = |source| WriteError::InvalidMacro {
            name: name.to_string(),
            source,
        };

        let parts = m.to_parts().map_err(invalid)?;
        let max = u8::MAX as usize;
        if parts.values.len() > max {
            return Err(invalid(MacroError::TooLong {
                len: parts.values.len(),
                max,
            }));
        }

        let (loop_index, release_index) = match m.kind {
            MacroKind::Sequence => (
                stored_index(parts.loop_index).map_err(invalid)?,
                stored_index(parts.release_index).map_err(invalid)?,
            ),
            _ => (ABSENT, ABSENT),
        };

        let word_size = WordSize::narrowest(&parts.values);
        let packed = m.open as u8 | (m.kind.bits() << 1) | (word_size.bits() << 6);

        writer.write_u8(code)?;
        writer.write_u8(parts.values.len() as u8)?;
        writer.write_u8(loop_index)?;
        writer.write_u8(release_index)?;
        writer.write_u8(m.mode)?;
        writer.write_u8(packed)?;
        writer.write_u8(m.delay)?;
        writer.write_u8(m.speed)?;

        for value in parts.values {
            word_size.write(writer, value)?;
        }
    }

    writer.write_u8(STOP)?;
    Ok(())
}

fn stored_index(index: i32) -> Result<u8, MacroError> {
    match index {
        -1 => Ok(ABSENT),
        0..=254 => Ok(index as u8),
        _ => Err(MacroError::TooLong {
            len: index as usize,
            max: 254,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::{MacroItem, OperatorParam};
    use std::io::Cursor;
    use ux::u2;

    fn standard(macros: &MacroMap) -> Vec<u8> {
        let mut dest = Vec::new();
        write_group(&mut dest, macros, MacroName::code).unwrap();
        dest
    }

    #[test]
    fn single_macro_layout() {
        let mut macros = MacroMap::new();
        macros.insert(MacroName::Volume, Macro::from_parts(&[15, 7, 0], 1, 2));

        assert_eq!(
            standard(&macros),
            [
                8, 0, // header length
                0, 3, 1, 2, 0, 0, 0, 1, // volume, u8 elements
                15, 7, 0, //
                STOP
            ]
        );
    }

    #[test]
    fn narrowest_word_size() {
        assert_eq!(WordSize::narrowest(&[]), WordSize::U8);
        assert_eq!(WordSize::narrowest(&[0, 255]), WordSize::U8);
        assert_eq!(WordSize::narrowest(&[-1, 127]), WordSize::I8);
        assert_eq!(WordSize::narrowest(&[-1, 128]), WordSize::I16);
        assert_eq!(WordSize::narrowest(&[70000]), WordSize::I32);

        let mut macros = MacroMap::new();
        macros.insert(MacroName::Arpeggio, Macro::from_values([-12, 300]));
        let bytes = standard(&macros);
        assert_eq!(bytes[7] >> 6, 2);
        assert_eq!(&bytes[10..14], [0xF4, 0xFF, 0x2C, 0x01]);
    }

    #[test]
    fn round_trip() {
        let mut macros = MacroMap::new();
        macros.insert(MacroName::Volume, Macro::from_parts(&[15, 14, 13], 0, 3));
        macros.insert(
            MacroName::Pitch,
            Macro {
                open: true,
                mode: 1,
                delay: 2,
                speed: 3,
                ..Macro::from_values([-200, 100])
            },
        );
        macros.insert(
            MacroName::Ex4,
            Macro {
                kind: MacroKind::Lfo,
                ..Macro::from_values([1, 2, 3, 4])
            },
        );

        let bytes = standard(&macros);
        let decoded = read_group(&mut Cursor::new(bytes), MacroName::from_code).unwrap();
        assert_eq!(decoded, macros);
    }

    #[test]
    fn markers_only_for_sequences() {
        let mut macros = MacroMap::new();
        macros.insert(
            MacroName::Duty,
            Macro {
                kind: MacroKind::Adsr,
                ..Macro::from_parts(&[1, 2], 0, 1)
            },
        );

        let bytes = standard(&macros);
        assert_eq!(&bytes[4..6], [ABSENT, ABSENT]);

        let decoded = read_group(&mut Cursor::new(bytes), MacroName::from_code).unwrap();
        assert_eq!(
            decoded[&MacroName::Duty].items,
            [MacroItem::Value(1), MacroItem::Value(2)]
        );
    }

    #[test]
    fn operator_group() {
        let op = u2::new(3);
        let mut macros = MacroMap::new();
        macros.insert(
            MacroName::Operator(op, OperatorParam::Ksr),
            Macro::from_values([1, 0]),
        );

        let code_of = |name| match name {
            MacroName::Operator(o, param) if o == op => Some(param.code()),
            _ => None,
        };

        let mut bytes = Vec::new();
        write_group(&mut bytes, &macros, code_of).unwrap();
        assert_eq!(bytes[2], 19);

        let name_of = |code| OperatorParam::from_code(code).map(|p| MacroName::Operator(op, p));
        let decoded = read_group(&mut Cursor::new(bytes), name_of).unwrap();
        assert_eq!(decoded, macros);
    }

    #[test]
    fn longer_headers_and_unknown_codes() {
        let bytes = [
            10, 0, // header length
            99, 1, 255, 255, 0, 0, 0, 1, 0xAA, 0xBB, 7, // unknown code
            0, 1, 255, 255, 0, 0, 0, 1, 0xAA, 0xBB, 9, // volume
            STOP,
        ];

        let decoded = read_group(&mut Cursor::new(bytes), MacroName::from_code).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[&MacroName::Volume].items, [MacroItem::Value(9)]);
    }

    #[test]
    fn too_long() {
        let mut macros = MacroMap::new();
        macros.insert(MacroName::Wave, Macro::from_values(0..256));

        assert!(matches!(
            write_group(&mut Vec::new(), &macros, MacroName::code),
            Err(WriteError::InvalidMacro {
                source: MacroError::TooLong { len: 256, .. },
                ..
            })
        ));
    }

    #[test]
    fn missing_stop() {
        let bytes = [8, 0, 0, 0, 255, 255, 0, 0, 0, 1];
        assert!(matches!(
            read_group(&mut Cursor::new(bytes), MacroName::from_code),
            Err(ReadError::TruncatedStream)
        ));
    }
}
