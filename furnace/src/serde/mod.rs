//! Reading and writing the primitives every Furnace block is made of
//!
//! All multi-byte values in Furnace files are little-endian, regardless of the host. Strings are
//! null-terminated. Blocks start with a four byte tag followed by a four byte size, and refer to
//! each other through absolute pointers (see [`frame`]).

pub mod frame;
mod primitive;

pub use frame::{BlockWriter, PointerTable};
pub use primitive::{
    LE, expect_tag, peek_tag, read_bool, read_string, read_tag, seek_to, skip, stream_len,
    write_bool, write_string, write_zeros,
};

use crate::macros::MacroError;
use std::io;
use thiserror::Error;

/// Errors that might be returned while decoding any Furnace block
#[derive(Debug, Error)]
pub enum ReadError {
    /// A block or file did not start with the tag it was expected to start with
    #[error("Expected the tag \"{expected}\", found \"{found}\"")]
    BadMagic { expected: String, found: String },

    /// The stream ended before a field could be read completely, or a pointer pointed past its end
    #[error("The stream ended unexpectedly")]
    TruncatedStream,

    /// The format version has no known decoding
    #[error("Format version {0} is not supported")]
    UnsupportedVersion(u16),

    /// A chip id that isn't in the chip table (and so has no known channel count)
    #[error("Unknown chip id {0:#04X}")]
    UnknownChip(u8),

    /// A note value outside of the note enumeration
    #[error("Unknown note value {0}")]
    UnknownNote(u16),

    /// A sample depth outside of the depth enumeration
    #[error("Unknown sample depth {0}")]
    UnknownSampleDepth(u8),

    /// A pattern refers to a channel the module doesn't have
    #[error("Pattern refers to channel {0}, which doesn't exist")]
    ChannelOutOfRange(u16),

    /// Any other failure that has to do with I/O
    #[error("Something failed with I/O")]
    Io(#[source] io::Error),
}

impl From<io::Error> for ReadError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Self::TruncatedStream,
            _ => Self::Io(error),
        }
    }
}

/// Errors that might be returned while encoding any Furnace block
#[derive(Debug, Error)]
pub enum WriteError {
    /// A macro can't be represented on disk
    #[error("Invalid macro {name}")]
    InvalidMacro {
        name: String,
        #[source]
        source: MacroError,
    },

    /// The per-channel arrays of a module disagree with its chip list
    #[error("The chips provide {expected} channels, but {field} has {found} entries")]
    ChannelMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A pattern's rows don't fit the module's pattern length or effect columns
    #[error("Pattern {index} on channel {channel} doesn't match the module layout: {reason}")]
    PatternShape {
        channel: u16,
        index: u16,
        reason: String,
    },

    /// More entries than the on-disk count field can hold
    #[error("Too many {what}: {count} (at most {max})")]
    TooManyEntries {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// A fixed-size field was given the wrong number of entries
    #[error("{field} needs {expected} entries, found {found}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A value doesn't fit the width of its on-disk field
    #[error("{field} value {value} doesn't fit its field")]
    OutOfRange { field: &'static str, value: i64 },

    /// Any failure that has to do with I/O
    #[error("Something failed with I/O")]
    Io(#[from] io::Error),
}
