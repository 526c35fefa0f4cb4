//! The sound chips a module can be made for

use crate::serde::ReadError;
use std::fmt;

macro_rules! chips {
    ($($(#[$meta:meta])* $name:ident = ($id:literal, $channels:literal),)*) => {
        /// A sound chip (or chip combination) a module can target
        ///
        /// Every chip has a fixed id in the module file and a fixed number of channels it
        /// contributes to the module.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Chip {
            $($(#[$meta])* $name,)*
        }

        impl Chip {
            /// Every known chip, in id order
            pub const ALL: &'static [Self] = &[$(Self::$name,)*];

            /// Look up a chip by its id in the module file
            pub fn from_id(id: u8) -> Result<Self, ReadError> {
                match id {
                    $($id => Ok(Self::$name),)*
                    _ => Err(ReadError::UnknownChip(id)),
                }
            }

            /// The id of the chip in the module file
            pub fn id(self) -> u8 {
                match self {
                    $(Self::$name => $id,)*
                }
            }

            /// The number of channels the chip contributes to a module
            pub fn channel_count(self) -> usize {
                match self {
                    $(Self::$name => $channels,)*
                }
            }
        }
    };
}

chips! {
    Ymu759 = (0x01, 17),
    /// YM2612 + SN76489
    Genesis = (0x02, 10),
    /// SN76489
    Sms = (0x03, 4),
    GameBoy = (0x04, 4),
    /// HuC6280
    PcEngine = (0x05, 6),
    /// RP2A03
    Nes = (0x06, 5),
    /// SID revision 8580
    C64_8580 = (0x07, 4),
    /// YM2151 + SegaPCM
    SegaArcade = (0x08, 13),
    NeoGeoCd = (0x09, 13),
    /// YM2612 with extended channel 3 + SN76489
    GenesisExt = (0x42, 13),
    /// SN76489 + YM2413
    SmsJapan = (0x43, 13),
    /// RP2A03 + YM2413
    NesVrc7 = (0x46, 11),
    /// SID revision 6581
    C64_6581 = (0x47, 3),
    NeoGeoCdExt = (0x49, 16),
    Ay38910 = (0x80, 3),
    /// Paula
    Amiga = (0x81, 4),
    Ym2151 = (0x82, 8),
    Ym2612 = (0x83, 6),
    Tia = (0x84, 2),
    Vic20 = (0x85, 4),
    Pet = (0x86, 1),
    /// SPC700
    Snes = (0x87, 8),
    Vrc6 = (0x88, 3),
    /// YM2413
    Opll = (0x89, 9),
    Fds = (0x8A, 1),
    Mmc5 = (0x8B, 3),
    N163 = (0x8C, 8),
    /// YM2203
    Opn = (0x8D, 6),
    /// YM2608
    Pc98 = (0x8E, 16),
    /// YM3526
    Opl = (0x8F, 9),
    /// YM3812
    Opl2 = (0x90, 9),
    /// YMF262
    Opl3 = (0x91, 18),
    MultiPcm = (0x92, 24),
    /// Intel 8253
    PcSpeaker = (0x93, 1),
    Pokey = (0x94, 4),
    Rf5c68 = (0x95, 8),
    WonderSwan = (0x96, 4),
    Saa1099 = (0x97, 6),
    Opz = (0x98, 8),
    PokemonMini = (0x99, 1),
    Ay8930 = (0x9A, 3),
    SegaPcm = (0x9B, 16),
    VirtualBoy = (0x9C, 6),
    Vrc7 = (0x9D, 6),
    Ym2610b = (0x9E, 16),
    ZxBeeper = (0x9F, 6),
    Ym2612Ext = (0xA0, 9),
    Scc = (0xA1, 5),
    OplDrums = (0xA2, 11),
    Opl2Drums = (0xA3, 11),
    Opl3Drums = (0xA4, 20),
    NeoGeo = (0xA5, 14),
    NeoGeoExt = (0xA6, 17),
    OpllDrums = (0xA7, 11),
    Lynx = (0xA8, 4),
    /// SegaPCM as set up by older DefleMask modules
    SegaPcmDmf = (0xA9, 5),
    Msm6295 = (0xAA, 4),
    Msm6258 = (0xAB, 1),
    /// VERA
    CommanderX16 = (0xAC, 17),
    BubbleSystemWsg = (0xAD, 2),
    Seta = (0xAE, 16),
    Ym2610bExt = (0xAF, 19),
    QSound = (0xE0, 19),
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        assert_eq!(Chip::from_id(0x04).unwrap(), Chip::GameBoy);
        assert_eq!(Chip::GameBoy.channel_count(), 4);
        assert_eq!(Chip::from_id(0xE0).unwrap().channel_count(), 19);
        assert_eq!(Chip::Genesis.id(), 0x02);

        assert!(matches!(Chip::from_id(0), Err(ReadError::UnknownChip(0))));
        assert!(matches!(Chip::from_id(0xFF), Err(ReadError::UnknownChip(0xFF))));
    }

    #[test]
    fn ids_are_unique() {
        for chip in Chip::ALL {
            assert_eq!(Chip::from_id(chip.id()).unwrap(), *chip);
        }
    }
}
