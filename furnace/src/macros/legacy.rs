//! The fixed macro field groups of legacy instruments
//!
//! A legacy group lists, for a fixed set of macro names, all lengths first, then all loop
//! indices, sometimes release indices and "open" flags, and only then the value arrays in the
//! same name order. The instrument codec decides which of these are present for which version;
//! this module only provides the pieces.

use super::{Macro, MacroError, MacroMap, MacroName, MacroParts};
use crate::serde::{LE, ReadError, WriteError, read_bool, write_bool};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use tracing::warn;

/// The element width of the value arrays of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Width {
    /// Operator macros store their values as signed bytes
    I8,

    /// Instrument-wide macros store their values as 32-bit signed integers
    I32,
}

/// Read `count` 32-bit lengths or marker indices
pub(crate) fn read_indices<R>(reader: &mut R, count: usize) -> Result<Vec<i32>, ReadError>
where
    R: Read + ?Sized,
{
    (0..count).map(|_| Ok(reader.read_i32::<LE>()?)).collect()
}

/// Read `count` "open in editor" flags
pub(crate) fn read_open<R>(reader: &mut R, count: usize) -> Result<Vec<bool>, ReadError>
where
    R: Read + ?Sized,
{
    (0..count).map(|_| read_bool(reader)).collect()
}

/// Read the value array of a single macro
pub(crate) fn read_values<R>(reader: &mut R, len: i32, width: Width) -> Result<Vec<i32>, ReadError>
where
    R: Read + ?Sized,
{
    if len < 0 {
        warn!(len, "Negative macro length, reading it as empty");
    }

    let mut values = Vec::new();
    for _ in 0..len.max(0) {
        let value = match width {
            Width::I8 => reader.read_i8()? as i32,
            Width::I32 => reader.read_i32::<LE>()?,
        };
        values.push(value);
    }

    Ok(values)
}

/// Splice a decoded macro together and store it, unless it's entirely default
pub(crate) fn insert(
    macros: &mut MacroMap,
    name: MacroName,
    values: &[i32],
    loop_index: i32,
    release_index: i32,
    open: bool,
) {
    let mut m = Macro::from_parts(values, loop_index, release_index);
    m.open = open;

    if m != Macro::default() {
        macros.insert(name, m);
    }
}

/// Splice in a release point that arrived after the macro itself
pub(crate) fn apply_release(macros: &mut MacroMap, name: MacroName, release_index: i32) {
    if release_index >= 0 {
        macros
            .entry(name)
            .or_default()
            .set_release_index(release_index);
    }
}

/// The on-disk representation of one macro of a group
#[derive(Debug)]
pub(crate) struct Split {
    pub name: MacroName,
    pub parts: MacroParts,
    pub open: bool,
}

impl Split {
    fn error(&self, source: MacroError) -> WriteError {
        WriteError::InvalidMacro {
            name: self.name.to_string(),
            source,
        }
    }

    /// The number of values, as stored in the length field
    pub fn len(&self) -> Result<i32, WriteError> {
        i32::try_from(self.parts.values.len()).map_err(|_| {
            self.error(MacroError::TooLong {
                len: self.parts.values.len(),
                max: i32::MAX as usize,
            })
        })
    }
}

/// Split every macro of a group into its on-disk parts
///
/// Macros missing from the map are written as empty ones.
pub(crate) fn split(macros: &MacroMap, names: &[MacroName]) -> Result<Vec<Split>, WriteError> {
    names
        .iter()
        .map(|name| {
            let Some(m) = macros.get(name) else {
                return Ok(Split {
                    name: *name,
                    parts: MacroParts {
                        values: Vec::new(),
                        loop_index: -1,
                        release_index: -1,
                    },
                    open: false,
                });
            };

            let parts = m.to_parts().map_err(|source| WriteError::InvalidMacro {
                name: name.to_string(),
                source,
            })?;

            Ok(Split {
                name: *name,
                parts,
                open: m.open,
            })
        })
        .collect()
}

/// Write the length of every macro of a group
pub(crate) fn write_lengths<W>(writer: &mut W, group: &[Split]) -> Result<(), WriteError>
where
    W: Write + ?Sized,
{
    for split in group {
        writer.write_i32::<LE>(split.len()?)?;
    }
    Ok(())
}

/// Write the loop index of every macro of a group
pub(crate) fn write_loops<W>(writer: &mut W, group: &[Split]) -> Result<(), WriteError>
where
    W: Write + ?Sized,
{
    for split in group {
        writer.write_i32::<LE>(split.parts.loop_index)?;
    }
    Ok(())
}

/// Write the release index of every macro of a group
pub(crate) fn write_releases<W>(writer: &mut W, group: &[Split]) -> Result<(), WriteError>
where
    W: Write + ?Sized,
{
    for split in group {
        writer.write_i32::<LE>(split.parts.release_index)?;
    }
    Ok(())
}

/// Write the "open in editor" flag of every macro of a group
pub(crate) fn write_open<W>(writer: &mut W, group: &[Split]) -> Result<(), WriteError>
where
    W: Write + ?Sized,
{
    for split in group {
        write_bool(writer, split.open)?;
    }
    Ok(())
}

/// Write the value array of a single macro
pub(crate) fn write_values<W>(writer: &mut W, split: &Split, width: Width) -> Result<(), WriteError>
where
    W: Write + ?Sized,
{
    for value in &split.parts.values {
        match width {
            Width::I8 => {
                let byte = i8::try_from(*value)
                    .map_err(|_| split.error(MacroError::ValueOutOfRange { value: *value }))?;
                writer.write_i8(byte)?;
            }
            Width::I32 => writer.write_i32::<LE>(*value)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::{MacroItem, OperatorParam};
    use std::io::Cursor;
    use ux::u2;

    #[test]
    fn group_layout() {
        let mut macros = MacroMap::new();
        macros.insert(MacroName::Volume, Macro::from_parts(&[15, 10, 5], 1, -1));
        macros.insert(MacroName::Duty, Macro::from_values([2]));

        let names = [MacroName::Volume, MacroName::Arpeggio, MacroName::Duty];
        let group = split(&macros, &names).unwrap();

        let mut dest = Vec::new();
        write_lengths(&mut dest, &group).unwrap();
        write_loops(&mut dest, &group).unwrap();
        for split in &group {
            write_values(&mut dest, split, Width::I32).unwrap();
        }

        let mut reader = Cursor::new(dest);
        let lengths = read_indices(&mut reader, 3).unwrap();
        assert_eq!(lengths, [3, 0, 1]);
        let loops = read_indices(&mut reader, 3).unwrap();
        assert_eq!(loops, [1, -1, -1]);

        let mut decoded = MacroMap::new();
        for (index, name) in names.iter().enumerate() {
            let values = read_values(&mut reader, lengths[index], Width::I32).unwrap();
            insert(&mut decoded, *name, &values, loops[index], -1, false);
        }

        assert_eq!(decoded, macros);
        assert!(!decoded.contains_key(&MacroName::Arpeggio));
    }

    #[test]
    fn byte_width() {
        let name = MacroName::Operator(u2::new(1), OperatorParam::Tl);
        let mut macros = MacroMap::new();
        macros.insert(name, Macro::from_values([-3, 127]));

        let group = split(&macros, &[name]).unwrap();
        let mut dest = Vec::new();
        write_values(&mut dest, &group[0], Width::I8).unwrap();
        assert_eq!(dest, [0xFD, 0x7F]);

        let mut reader = Cursor::new(dest);
        assert_eq!(read_values(&mut reader, 2, Width::I8).unwrap(), [-3, 127]);

        macros.insert(name, Macro::from_values([128]));
        let group = split(&macros, &[name]).unwrap();
        assert!(matches!(
            write_values(&mut Vec::new(), &group[0], Width::I8),
            Err(WriteError::InvalidMacro {
                source: MacroError::ValueOutOfRange { value: 128 },
                ..
            })
        ));
    }

    #[test]
    fn late_release() {
        let mut macros = MacroMap::new();
        insert(&mut macros, MacroName::Pitch, &[1, 2], 0, -1, true);
        apply_release(&mut macros, MacroName::Pitch, 1);
        apply_release(&mut macros, MacroName::Wave, -1);
        apply_release(&mut macros, MacroName::Ex1, 0);

        assert_eq!(
            macros[&MacroName::Pitch].items,
            [
                MacroItem::Loop,
                MacroItem::Value(1),
                MacroItem::Release,
                MacroItem::Value(2)
            ]
        );
        assert!(macros[&MacroName::Pitch].open);
        assert!(!macros.contains_key(&MacroName::Wave));
        assert_eq!(macros[&MacroName::Ex1].items, [MacroItem::Release]);
    }

    #[test]
    fn duplicate_marker_is_rejected() {
        let mut macros = MacroMap::new();
        macros.insert(
            MacroName::Arpeggio,
            Macro {
                items: vec![MacroItem::Release, MacroItem::Release],
                ..Macro::default()
            },
        );

        assert!(matches!(
            split(&macros, &[MacroName::Arpeggio]),
            Err(WriteError::InvalidMacro {
                source: MacroError::DuplicateRelease,
                ..
            })
        ));
    }
}
