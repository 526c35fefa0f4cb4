//! Instruments, in both of their on-disk formats
//!
//! Older Furnace versions store instruments as `INST` blocks: a fixed sequence of fields, with
//! more fields appended at certain format versions (see [`legacy`]). Newer versions store
//! `INS2` blocks: a list of self-describing feature blocks (see [`feature`]). Both decode to an
//! [`Instrument`], and expose the same logical view through its accessors.

pub mod feature;
pub mod file;
pub mod legacy;
pub mod params;

pub use feature::Feature;
pub use file::InstrumentFile;
pub use legacy::LegacyBody;
pub use params::*;

use crate::macros::{Macro, MacroName};
use crate::serde::{ReadError, WriteError, peek_tag};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Seek, Write};
use system_interface::io::Peek;

/// What kind of chip an instrument is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InstrumentKind {
    #[default]
    Standard,
    Fm4Op,
    GameBoy,
    C64,
    Amiga,
    PcEngine,
    Ssg,
    Ay8930,
    Tia,
    Saa1099,
    Vic,
    Pet,
    Vrc6,
    FmOpll,
    FmOpl,
    Fds,
    VirtualBoy,
    N163,
    KonamiScc,
    FmOpz,
    Pokey,
    PcBeeper,
    WonderSwan,
    Lynx,
    Vera,
    X1010,

    /// A kind introduced by a newer Furnace version
    Other(u16),
}

impl InstrumentKind {
    const NAMED: [Self; 26] = [
        Self::Standard,
        Self::Fm4Op,
        Self::GameBoy,
        Self::C64,
        Self::Amiga,
        Self::PcEngine,
        Self::Ssg,
        Self::Ay8930,
        Self::Tia,
        Self::Saa1099,
        Self::Vic,
        Self::Pet,
        Self::Vrc6,
        Self::FmOpll,
        Self::FmOpl,
        Self::Fds,
        Self::VirtualBoy,
        Self::N163,
        Self::KonamiScc,
        Self::FmOpz,
        Self::Pokey,
        Self::PcBeeper,
        Self::WonderSwan,
        Self::Lynx,
        Self::Vera,
        Self::X1010,
    ];

    /// The on-disk kind id
    pub fn id(self) -> u16 {
        match self {
            Self::Other(id) => id,
            kind => Self::NAMED
                .iter()
                .position(|named| *named == kind)
                .map_or(0, |index| index as u16),
        }
    }
}

impl From<u16> for InstrumentKind {
    fn from(id: u16) -> Self {
        Self::NAMED
            .get(id as usize)
            .copied()
            .unwrap_or(Self::Other(id))
    }
}

/// The format-specific part of an [`Instrument`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrumentBody {
    /// An `INST` block
    Legacy(LegacyBody),

    /// An `INS2` block
    Features(Vec<Feature>),
}

/// A single instrument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// The format version the instrument was written with
    pub version: u16,

    pub kind: InstrumentKind,
    pub body: InstrumentBody,
}

impl Instrument {
    /// The version new feature-block instruments are given
    pub const FEATURE_VERSION: u16 = 127;

    /// Create an empty feature-block instrument
    pub fn new(kind: InstrumentKind, name: &str) -> Self {
        Self {
            version: Self::FEATURE_VERSION,
            kind,
            body: InstrumentBody::Features(vec![Feature::Name(name.to_string())]),
        }
    }

    /// Decode an instrument, in whichever format it's stored
    ///
    /// The format is determined by peeking at the block tag, so the reader is left untouched
    /// up until the actual decoding.
    pub fn from_reader<R>(reader: &mut R) -> Result<Self, ReadError>
    where
        R: Read + Seek + Peek,
    {
        match peek_tag(reader)? {
            Some(tag) if &tag == legacy::TAG => legacy::from_reader(reader),
            Some(tag) if &tag == feature::TAG => feature::from_reader(reader),
            Some(tag) => Err(ReadError::BadMagic {
                expected: "INST or INS2".to_string(),
                found: tag.escape_ascii().to_string(),
            }),
            None => Err(ReadError::TruncatedStream),
        }
    }

    /// Encode the instrument in the format of its body
    pub fn to_writer<W>(&self, writer: &mut W) -> Result<(), WriteError>
    where
        W: Write + Seek,
    {
        match &self.body {
            InstrumentBody::Legacy(body) => {
                legacy::to_writer(writer, self.version, self.kind, body)
            }
            InstrumentBody::Features(features) => {
                feature::to_writer(writer, self.version, self.kind, features)
            }
        }
    }

    /// The display name of the instrument
    pub fn name(&self) -> &str {
        match &self.body {
            InstrumentBody::Legacy(body) => &body.name,
            InstrumentBody::Features(features) => features
                .iter()
                .find_map(|feature| match feature {
                    Feature::Name(name) => Some(name.as_str()),
                    _ => None,
                })
                .unwrap_or_default(),
        }
    }

    /// Every macro of the instrument, by name
    ///
    /// Only macros the body can store survive encoding. A macro equal to [`Macro::default()`]
    /// is not written. Neither is a name that has no slot in its body at the instrument's
    /// version, such as operator macros before version 29 in a legacy body, or an operator macro
    /// placed in the standard `MA` group of a feature body. Such a map decodes back smaller.
    pub fn macros(&self) -> BTreeMap<MacroName, &Macro> {
        match &self.body {
            InstrumentBody::Legacy(body) => body.macros.iter().map(|(n, m)| (*n, m)).collect(),
            InstrumentBody::Features(features) => features
                .iter()
                .filter_map(|feature| match feature {
                    Feature::Macros(macros) | Feature::OperatorMacros(_, macros) => Some(macros),
                    _ => None,
                })
                .flat_map(|macros| macros.iter().map(|(n, m)| (*n, m)))
                .collect(),
        }
    }

    /// FM parameters
    pub fn fm(&self) -> Option<&FmParams> {
        match &self.body {
            InstrumentBody::Legacy(body) => Some(&body.fm),
            InstrumentBody::Features(features) => features.iter().find_map(|f| match f {
                Feature::Fm(fm) => Some(fm),
                _ => None,
            }),
        }
    }

    /// Game Boy envelope parameters
    pub fn game_boy(&self) -> Option<&GameBoyParams> {
        match &self.body {
            InstrumentBody::Legacy(body) => Some(&body.game_boy),
            InstrumentBody::Features(features) => features.iter().find_map(|f| match f {
                Feature::GameBoy(gb) => Some(gb),
                _ => None,
            }),
        }
    }

    /// Namco 163 parameters
    pub fn n163(&self) -> Option<&N163Params> {
        match &self.body {
            InstrumentBody::Legacy(body) => (self.version >= 73).then_some(&body.n163),
            InstrumentBody::Features(features) => features.iter().find_map(|f| match f {
                Feature::N163(n163) => Some(n163),
                _ => None,
            }),
        }
    }

    /// OPL drum frequencies
    pub fn opl_drums(&self) -> Option<&OplDrums> {
        match &self.body {
            InstrumentBody::Legacy(body) => (self.version >= 63).then_some(&body.opl_drums),
            InstrumentBody::Features(features) => features.iter().find_map(|f| match f {
                Feature::OplDrums(drums) => Some(drums),
                _ => None,
            }),
        }
    }

    /// FDS modulation parameters
    pub fn fds(&self) -> Option<&FdsParams> {
        match &self.body {
            InstrumentBody::Legacy(body) => (self.version >= 76).then_some(&body.fds),
            InstrumentBody::Features(features) => features.iter().find_map(|f| match f {
                Feature::Fds(fds) => Some(fds),
                _ => None,
            }),
        }
    }

    /// Wavetable synthesizer parameters
    pub fn wave_synth(&self) -> Option<&WaveSynthParams> {
        match &self.body {
            InstrumentBody::Legacy(body) => (self.version >= 79).then_some(&body.wave_synth),
            InstrumentBody::Features(features) => features.iter().find_map(|f| match f {
                Feature::WaveSynth(ws) => Some(ws),
                _ => None,
            }),
        }
    }

    /// Indices of the module wavetables the instrument plays
    ///
    /// These come from the wave macro, the wavetable synthesizer and the bundled wavetable list.
    pub fn wavetable_indices(&self) -> BTreeSet<usize> {
        let mut indices: BTreeSet<usize> = self
            .macros()
            .get(&MacroName::Wave)
            .map(|m| m.values().filter_map(|v| usize::try_from(v).ok()).collect())
            .unwrap_or_default();

        if let Some(ws) = self.wave_synth().filter(|ws| ws.enabled) {
            indices.extend([ws.wave1, ws.wave2].map(usize::try_from).into_iter().flatten());
        }

        if let InstrumentBody::Features(features) = &self.body {
            for feature in features {
                if let Feature::WavetableList(list) = feature {
                    indices.extend(list.indices.iter().map(|index| *index as usize));
                }
            }
        }

        indices
    }

    /// Indices of the module samples the instrument plays
    pub fn sample_indices(&self) -> BTreeSet<usize> {
        let mut indices = BTreeSet::new();

        match &self.body {
            InstrumentBody::Legacy(body) => {
                if self.kind == InstrumentKind::Amiga {
                    indices.insert(body.amiga.sample as usize);
                }
                for entry in body.sample_map.iter().flatten() {
                    indices.extend(usize::try_from(entry.sample));
                }
            }
            InstrumentBody::Features(features) => {
                for feature in features {
                    if let Feature::SampleList(list) = feature {
                        indices.extend(list.indices.iter().map(|index| *index as usize));
                    }
                }
            }
        }

        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::{MacroMap, OperatorParam};
    use std::io::Cursor;
    use ux::u2;

    fn round_trip(instrument: &Instrument) -> Instrument {
        let mut writer = Cursor::new(Vec::new());
        instrument.to_writer(&mut writer).unwrap();
        writer.set_position(0);
        Instrument::from_reader(&mut writer).unwrap()
    }

    #[test]
    fn kinds() {
        assert_eq!(InstrumentKind::from(2), InstrumentKind::GameBoy);
        assert_eq!(InstrumentKind::from(25), InstrumentKind::X1010);
        assert_eq!(InstrumentKind::from(40), InstrumentKind::Other(40));
        assert_eq!(InstrumentKind::FmOpz.id(), 19);
        assert_eq!(InstrumentKind::Other(40).id(), 40);
    }

    #[test]
    fn dispatch() {
        let legacy = Instrument {
            version: 83,
            kind: InstrumentKind::GameBoy,
            body: InstrumentBody::Legacy(LegacyBody {
                name: "LEGACY".to_string(),
                ..LegacyBody::default()
            }),
        };
        let feature = Instrument::new(InstrumentKind::C64, "FEATURE");

        for instrument in [legacy, feature] {
            let mut writer = Cursor::new(Vec::new());
            instrument.to_writer(&mut writer).unwrap();

            writer.set_position(0);
            let decoded = Instrument::from_reader(&mut writer).unwrap();
            assert_eq!(decoded, instrument);
        }
    }

    #[test]
    fn not_an_instrument() {
        let mut reader = Cursor::new(b"PATR\0\0\0\0".to_vec());
        assert!(matches!(
            Instrument::from_reader(&mut reader),
            Err(ReadError::BadMagic { .. })
        ));

        let mut reader = Cursor::new(b"IN".to_vec());
        assert!(matches!(
            Instrument::from_reader(&mut reader),
            Err(ReadError::TruncatedStream)
        ));
    }

    #[test]
    fn logical_view() {
        let op = MacroName::Operator(u2::new(0), OperatorParam::Tl);

        let mut standard = MacroMap::new();
        standard.insert(MacroName::Volume, Macro::from_values([15, 0]));
        let mut operator = MacroMap::new();
        operator.insert(op, Macro::from_values([127]));

        let instrument = Instrument {
            version: Instrument::FEATURE_VERSION,
            kind: InstrumentKind::Fm4Op,
            body: InstrumentBody::Features(vec![
                Feature::Name("BASS".to_string()),
                Feature::Fm(FmParams::default()),
                Feature::Macros(standard),
                Feature::OperatorMacros(u2::new(0), operator),
            ]),
        };

        assert_eq!(instrument.name(), "BASS");
        assert_eq!(instrument.fm().unwrap().op_count, 4);
        assert!(instrument.game_boy().is_none());

        let macros = instrument.macros();
        assert_eq!(macros.len(), 2);
        assert_eq!(macros[&MacroName::Volume].len(), 2);
        assert_eq!(macros[&op].values().collect::<Vec<_>>(), [127]);
    }

    #[test]
    fn macros_without_a_slot_are_left_out() {
        let op = MacroName::Operator(u2::new(1), OperatorParam::Tl);

        let mut macros = MacroMap::new();
        macros.insert(MacroName::Volume, Macro::from_values([15, 8]));
        macros.insert(MacroName::Duty, Macro::default());
        macros.insert(op, Macro::from_values([127]));

        let instrument = Instrument {
            version: 28,
            kind: InstrumentKind::Fm4Op,
            body: InstrumentBody::Legacy(LegacyBody {
                macros: macros.clone(),
                ..LegacyBody::default()
            }),
        };
        let decoded = round_trip(&instrument);
        assert_eq!(decoded.macros().keys().collect::<Vec<_>>(), [&MacroName::Volume]);

        let mut standard = macros;
        standard.remove(&MacroName::Duty);
        let instrument = Instrument {
            version: Instrument::FEATURE_VERSION,
            kind: InstrumentKind::Fm4Op,
            body: InstrumentBody::Features(vec![Feature::Macros(standard)]),
        };
        let decoded = round_trip(&instrument);
        assert_eq!(decoded.macros().keys().collect::<Vec<_>>(), [&MacroName::Volume]);
    }

    #[test]
    fn legacy_view_follows_version() {
        let instrument = Instrument {
            version: 70,
            kind: InstrumentKind::N163,
            body: InstrumentBody::Legacy(LegacyBody::default()),
        };

        assert!(instrument.n163().is_none());
        assert!(instrument.fds().is_none());
        assert!(instrument.wave_synth().is_none());
        assert!(instrument.opl_drums().is_some());
    }
}
