//! Chip-specific instrument parameters
//!
//! Both instrument formats store the same parameters, just laid out differently, so these
//! structures are shared between the legacy body and the feature blocks.

use ux::{u3, u4};

/// The parameters of a single FM operator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FmOperator {
    pub am: u8,
    pub ar: u8,
    pub dr: u8,
    pub mult: u8,
    pub rr: u8,
    pub sl: u8,
    pub tl: u8,
    pub dt2: u8,
    pub rs: u8,
    pub dt: u8,
    pub d2r: u8,
    pub ssg_env: u8,
    pub dam: u8,
    pub dvb: u8,
    pub egt: u8,
    pub ksl: u8,
    pub sus: u8,
    pub vib: u8,
    pub ws: u8,
    pub ksr: u8,

    /// Key velocity sensitivity (feature-block instruments only)
    pub kvs: u8,
}

impl FmOperator {
    /// Construct an operator from the 20 bytes the legacy format stores it as
    pub(crate) fn from_legacy_fields(fields: [u8; 20]) -> Self {
        let [
            am, ar, dr, mult, rr, sl, tl, dt2, rs, dt, d2r, ssg_env, dam, dvb, egt, ksl, sus, vib, ws,
            ksr,
        ] = fields;

        Self {
            am,
            ar,
            dr,
            mult,
            rr,
            sl,
            tl,
            dt2,
            rs,
            dt,
            d2r,
            ssg_env,
            dam,
            dvb,
            egt,
            ksl,
            sus,
            vib,
            ws,
            ksr,
            kvs: 0,
        }
    }

    /// The 20 bytes the legacy format stores an operator as
    pub(crate) fn legacy_fields(&self) -> [u8; 20] {
        [
            self.am,
            self.ar,
            self.dr,
            self.mult,
            self.rr,
            self.sl,
            self.tl,
            self.dt2,
            self.rs,
            self.dt,
            self.d2r,
            self.ssg_env,
            self.dam,
            self.dvb,
            self.egt,
            self.ksl,
            self.sus,
            self.vib,
            self.ws,
            self.ksr,
        ]
    }
}

/// FM synthesis parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmParams {
    /// Algorithm
    pub alg: u8,

    /// Feedback
    pub fb: u8,

    pub fms: u8,
    pub ams: u8,

    /// Second LFO sensitivities (OPZ only)
    pub fms2: u8,
    pub ams2: u8,

    /// The number of operators in use (2 or 4)
    pub op_count: u8,

    /// OPLL patch preset, 0 for a custom patch
    pub opll_preset: u8,

    /// Play OPLL drums at their fixed frequencies (feature-block instruments only)
    pub fixed_drums: bool,

    /// Per-operator enable flags (feature-block instruments only)
    pub enabled: [bool; 4],

    pub operators: [FmOperator; 4],
}

impl Default for FmParams {
    fn default() -> Self {
        Self {
            alg: 0,
            fb: 0,
            fms: 0,
            ams: 0,
            fms2: 0,
            ams2: 0,
            op_count: 4,
            opll_preset: 0,
            fixed_drums: false,
            enabled: [true; 4],
            operators: Default::default(),
        }
    }
}

/// Game Boy envelope and hardware sequence settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameBoyParams {
    /// Initial envelope volume
    pub volume: u4,

    /// Does the envelope go up (`true`) or down?
    pub direction: bool,

    /// Envelope step length
    pub length: u3,

    pub sound_length: u8,

    /// Drive the envelope from the volume macro instead of the hardware
    pub software_envelope: bool,

    /// Re-initialize the envelope on every note
    pub always_init: bool,

    /// Play wavetables at double length (feature-block instruments only)
    pub double_wave: bool,

    /// Raw hardware sequence commands (feature-block instruments only)
    pub hardware_sequence: Vec<[u8; 3]>,
}

/// Commodore 64 SID settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct C64Params {
    pub triangle: bool,
    pub saw: bool,
    pub pulse: bool,
    pub noise: bool,
    pub attack: u8,
    pub decay: u8,
    pub sustain: u8,
    pub release: u8,
    pub duty: u16,
    pub ring_mod: bool,
    pub osc_sync: bool,
    pub to_filter: bool,
    pub init_filter: bool,
    pub volume_is_cutoff: bool,
    pub resonance: u8,
    pub low_pass: bool,
    pub band_pass: bool,
    pub high_pass: bool,
    pub channel_3_off: bool,
    pub cutoff: u16,
    pub absolute_duty_macro: bool,
    pub absolute_filter_macro: bool,
}

/// Sample playback settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AmigaParams {
    /// Index into the module's samples
    pub sample: u16,

    pub mode: u8,
    pub wave_length: u8,
}

/// Fixed frequencies for the OPL rhythm mode drums
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OplDrums {
    pub fixed_frequency: bool,
    pub kick: u16,
    pub snare_hat: u16,
    pub tom_top: u16,
}

/// One note of a [`SampleMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleMapEntry {
    pub frequency: i32,
    pub sample: i16,
}

/// A per-note sample and frequency assignment
pub type SampleMap = Vec<SampleMapEntry>;

/// The number of notes in a [`SampleMap`]
pub const SAMPLE_MAP_LEN: usize = 120;

/// Namco 163 wave loading settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct N163Params {
    pub wave_init: i32,
    pub wave_pos: u8,
    pub wave_len: u8,
    pub wave_mode: u8,
}

/// Famicom Disk System modulation settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FdsParams {
    pub mod_speed: i32,
    pub mod_depth: i32,

    /// Initialize the modulation table with the first wave
    pub init_table: bool,

    pub mod_table: [i8; 32],
}

/// Wavetable synthesizer settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaveSynthParams {
    pub wave1: i32,
    pub wave2: i32,
    pub rate_divider: u8,
    pub effect: u8,
    pub enabled: bool,
    pub global: bool,
    pub speed: u8,
    pub params: [u8; 4],
}

/// The samples or wavetables an instrument file bundles, with their offsets in that file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetList {
    /// Indices into the module the instrument was exported from
    pub indices: Vec<u8>,

    /// Offsets of the assets in the instrument file
    pub pointers: Vec<u32>,
}
