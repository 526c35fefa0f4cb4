//! Instrument macros: per-tick parameter sequences with loop and release points
//!
//! On disk a macro is a flat array of values plus a loop index and a release index (-1 when
//! absent). In memory the loop and release points are markers spliced into the sequence itself,
//! which is how trackers display and edit them. [`Macro::from_parts()`] and [`Macro::to_parts()`]
//! convert between the two.
//!
//! Two on-disk shapes exist: the fixed field groups of the legacy instrument format
//! ([`legacy`]), and the self-describing macro blocks of the feature-block format ([`feature`]).

pub mod feature;
pub mod legacy;

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;
use ux::u2;

/// The macros of an instrument, by name
///
/// Macros that are entirely default (no values, no markers, default settings) are left out.
pub type MacroMap = BTreeMap<MacroName, Macro>;

/// A single entry in a [`Macro`] sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroItem {
    /// The parameter value for one tick
    Value(i32),

    /// Playback jumps back here after reaching the end (or the release point)
    Loop,

    /// Playback halts here until the note is released
    Release,
}

/// How the values of a macro are to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MacroKind {
    /// A plain sequence of values, one per tick
    #[default]
    Sequence,

    /// The values are attack/decay/sustain/release envelope parameters
    Adsr,

    /// The values are low frequency oscillator parameters
    Lfo,
}

impl MacroKind {
    /// Decode the two kind bits of a feature-block macro header
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Sequence,
            1 => Self::Adsr,
            2 => Self::Lfo,
            bits => {
                warn!(bits, "Unknown macro kind, treating it as a sequence");
                Self::Sequence
            }
        }
    }

    pub(crate) fn bits(self) -> u8 {
        match self {
            Self::Sequence => 0,
            Self::Adsr => 1,
            Self::Lfo => 2,
        }
    }
}

/// A time-varying instrument parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// The values, with at most one [`MacroItem::Loop`] and one [`MacroItem::Release`] spliced in
    pub items: Vec<MacroItem>,

    /// Is the macro expanded in the tracker's instrument editor?
    pub open: bool,

    /// How the values are interpreted (feature-block instruments only)
    pub kind: MacroKind,

    /// Chip-specific macro mode (feature-block instruments only)
    pub mode: u8,

    /// Ticks to wait before the macro starts (feature-block instruments only)
    pub delay: u8,

    /// Ticks per macro step (feature-block instruments only)
    pub speed: u8,
}

impl Macro {
    /// Construct a plain sequence macro from its values, without loop or release
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        Self {
            items: values.into_iter().map(MacroItem::Value).collect(),
            ..Self::default()
        }
    }

    /// Construct a macro from its on-disk representation
    ///
    /// A marker index `i` is placed right before value `i`. An index equal to the number of
    /// values places the marker at the very end. When loop and release share an index, the loop
    /// marker comes first. Negative indices mean the marker is absent.
    pub fn from_parts(values: &[i32], loop_index: i32, release_index: i32) -> Self {
        Self {
            items: splice(values, loop_index, release_index),
            ..Self::default()
        }
    }

    /// Split the macro into its on-disk representation
    ///
    /// This fails if there is more than one loop or release marker in the sequence.
    pub fn to_parts(&self) -> Result<MacroParts, MacroError> {
        let mut parts = MacroParts {
            values: Vec::with_capacity(self.items.len()),
            loop_index: -1,
            release_index: -1,
        };

        for item in &self.items {
            match *item {
                MacroItem::Value(value) => parts.values.push(value),
                MacroItem::Loop if parts.loop_index >= 0 => return Err(MacroError::DuplicateLoop),
                MacroItem::Loop => parts.loop_index = parts.values.len() as i32,
                MacroItem::Release if parts.release_index >= 0 => {
                    return Err(MacroError::DuplicateRelease);
                }
                MacroItem::Release => parts.release_index = parts.values.len() as i32,
            }
        }

        Ok(parts)
    }

    /// The values of the macro, without markers
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.items.iter().filter_map(|item| match item {
            MacroItem::Value(value) => Some(*value),
            _ => None,
        })
    }

    /// The number of values in the macro (markers not counted)
    pub fn len(&self) -> usize {
        self.values().count()
    }

    /// Does the macro have no values at all?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move (or remove, with a negative index) the release marker
    ///
    /// The legacy format stores release points in a separate pass, after the values and loop
    /// points have already been read. Any release markers already in the sequence are dropped.
    pub fn set_release_index(&mut self, release_index: i32) {
        let mut values = Vec::with_capacity(self.items.len());
        let mut loop_index = -1;

        for item in &self.items {
            match *item {
                MacroItem::Value(value) => values.push(value),
                MacroItem::Loop if loop_index < 0 => loop_index = values.len() as i32,
                _ => {}
            }
        }

        self.items = splice(&values, loop_index, release_index);
    }
}

impl Default for Macro {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            open: false,
            kind: MacroKind::Sequence,
            mode: 0,
            delay: 0,
            speed: 1,
        }
    }
}

/// The on-disk representation of a [`Macro`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MacroParts {
    /// The raw values
    pub values: Vec<i32>,

    /// Index of the value the loop starts at, or -1
    pub loop_index: i32,

    /// Index of the value the release starts at, or -1
    pub release_index: i32,
}

fn splice(values: &[i32], loop_index: i32, release_index: i32) -> Vec<MacroItem> {
    let len = values.len();
    let position = |index: i32, what: &str| -> Option<usize> {
        let index = usize::try_from(index).ok()?;
        if index > len {
            warn!(index, len, "Macro {what} point lies past the end, moving it to the end");
            Some(len)
        } else {
            Some(index)
        }
    };

    let loop_at = position(loop_index, "loop");
    let release_at = position(release_index, "release");

    let mut items = Vec::with_capacity(len + 2);
    for index in 0..=len {
        if loop_at == Some(index) {
            items.push(MacroItem::Loop);
        }
        if release_at == Some(index) {
            items.push(MacroItem::Release);
        }
        if let Some(value) = values.get(index) {
            items.push(MacroItem::Value(*value));
        }
    }

    items
}

/// Errors describing why a [`Macro`] can't be written
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MacroError {
    /// Only one loop point is representable on disk
    #[error("The macro has more than one loop marker")]
    DuplicateLoop,

    /// Only one release point is representable on disk
    #[error("The macro has more than one release marker")]
    DuplicateRelease,

    /// The format stores the length in a field that's too small
    #[error("The macro has {len} values, but at most {max} fit")]
    TooLong { len: usize, max: usize },

    /// A value doesn't fit the element width of the macro group
    #[error("Value {value} doesn't fit the macro's element width")]
    ValueOutOfRange { value: i32 },
}

/// The parameters of a single FM operator that can be driven by a macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatorParam {
    Am,
    Ar,
    Dr,
    Mult,
    Rr,
    Sl,
    Tl,
    Dt2,
    Rs,
    Dt,
    D2r,
    SsgEnv,
    Dam,
    Dvb,
    Egt,
    Ksl,
    Sus,
    Vib,
    Ws,
    Ksr,
}

impl OperatorParam {
    /// Every operator parameter, in the order of their feature-block macro codes
    pub const ALL: [Self; 20] = [
        Self::Am,
        Self::Ar,
        Self::Dr,
        Self::Mult,
        Self::Rr,
        Self::Sl,
        Self::Tl,
        Self::Dt2,
        Self::Rs,
        Self::Dt,
        Self::D2r,
        Self::SsgEnv,
        Self::Dam,
        Self::Dvb,
        Self::Egt,
        Self::Ksl,
        Self::Sus,
        Self::Vib,
        Self::Ws,
        Self::Ksr,
    ];

    /// The macro code used in operator macro feature blocks
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a parameter by its operator macro feature block code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

/// The name of an instrument macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MacroName {
    Volume,
    Arpeggio,
    Duty,
    Wave,
    Pitch,
    Ex1,
    Ex2,
    Ex3,
    Algorithm,
    Feedback,
    Fms,
    Ams,
    PanLeft,
    PanRight,
    PhaseReset,
    Ex4,
    Ex5,
    Ex6,
    Ex7,
    Ex8,

    /// A macro driving a parameter of one of the four FM operators
    Operator(u2, OperatorParam),
}

impl MacroName {
    /// Every instrument-wide macro, in the order of their feature-block macro codes
    pub const STANDARD: [Self; 20] = [
        Self::Volume,
        Self::Arpeggio,
        Self::Duty,
        Self::Wave,
        Self::Pitch,
        Self::Ex1,
        Self::Ex2,
        Self::Ex3,
        Self::Algorithm,
        Self::Feedback,
        Self::Fms,
        Self::Ams,
        Self::PanLeft,
        Self::PanRight,
        Self::PhaseReset,
        Self::Ex4,
        Self::Ex5,
        Self::Ex6,
        Self::Ex7,
        Self::Ex8,
    ];

    /// Look up an instrument-wide macro by its feature-block code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::STANDARD.get(code as usize).copied()
    }

    /// The feature-block code of an instrument-wide macro
    pub fn code(self) -> Option<u8> {
        Self::STANDARD
            .iter()
            .position(|name| *name == self)
            .map(|index| index as u8)
    }
}

impl fmt::Display for MacroName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Operator(op, param) => write!(f, "op{} {param:?}", u8::from(*op) + 1),
            name => write!(f, "{name:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MacroItem::{Loop, Release, Value};

    #[test]
    fn splice_loop_and_release() {
        let m = Macro::from_parts(&[10, 20, 30, 40], 1, 3);
        assert_eq!(
            m.items,
            [Value(10), Loop, Value(20), Value(30), Release, Value(40)]
        );

        let parts = m.to_parts().unwrap();
        assert_eq!(parts.values, [10, 20, 30, 40]);
        assert_eq!(parts.loop_index, 1);
        assert_eq!(parts.release_index, 3);
    }

    #[test]
    fn splice_absent_markers() {
        let m = Macro::from_parts(&[1, 2], -1, -1);
        assert_eq!(m.items, [Value(1), Value(2)]);

        let parts = m.to_parts().unwrap();
        assert_eq!(parts.loop_index, -1);
        assert_eq!(parts.release_index, -1);
    }

    #[test]
    fn splice_shared_and_trailing_index() {
        let m = Macro::from_parts(&[5, 6], 2, 2);
        assert_eq!(m.items, [Value(5), Value(6), Loop, Release]);
        assert_eq!(
            m.to_parts().unwrap(),
            MacroParts {
                values: vec![5, 6],
                loop_index: 2,
                release_index: 2
            }
        );

        let m = Macro::from_parts(&[], 0, -1);
        assert_eq!(m.items, [Loop]);
        assert!(m.is_empty());
    }

    #[test]
    fn splice_round_trip() {
        let values = [3, -1, 4, 1, -5];
        for loop_index in -1..=5 {
            for release_index in -1..=5 {
                let parts = Macro::from_parts(&values, loop_index, release_index)
                    .to_parts()
                    .unwrap();
                assert_eq!(parts.values, values);
                assert_eq!(parts.loop_index, loop_index);
                assert_eq!(parts.release_index, release_index);
            }
        }
    }

    #[test]
    fn index_past_end_is_clamped() {
        let m = Macro::from_parts(&[1], 7, -1);
        assert_eq!(m.items, [Value(1), Loop]);
    }

    #[test]
    fn duplicate_markers() {
        let m = Macro {
            items: vec![Loop, Value(1), Loop],
            ..Macro::default()
        };
        assert_eq!(m.to_parts(), Err(MacroError::DuplicateLoop));

        let m = Macro {
            items: vec![Release, Release],
            ..Macro::default()
        };
        assert_eq!(m.to_parts(), Err(MacroError::DuplicateRelease));
    }

    #[test]
    fn release_after_the_fact() {
        let mut m = Macro::from_parts(&[1, 2, 3], 0, -1);
        m.set_release_index(2);
        assert_eq!(m.items, [Loop, Value(1), Value(2), Release, Value(3)]);

        m.set_release_index(1);
        assert_eq!(m.items, [Loop, Value(1), Release, Value(2), Value(3)]);

        m.set_release_index(-1);
        assert_eq!(m.items, [Loop, Value(1), Value(2), Value(3)]);
    }

    #[test]
    fn names() {
        assert_eq!(MacroName::from_code(1), Some(MacroName::Arpeggio));
        assert_eq!(MacroName::from_code(20), None);
        assert_eq!(MacroName::PhaseReset.code(), Some(14));
        assert_eq!(MacroName::Operator(u2::new(0), OperatorParam::Tl).code(), None);

        assert_eq!(OperatorParam::from_code(11), Some(OperatorParam::SsgEnv));
        assert_eq!(OperatorParam::Ksr.code(), 19);

        let name = MacroName::Operator(u2::new(2), OperatorParam::Ar);
        assert_eq!(name.to_string(), "op3 Ar");
    }
}
