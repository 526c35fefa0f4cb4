//! Legacy `INST` instrument blocks
//!
//! The body of a legacy instrument is a fixed sequence of fields, with new fields appended at
//! later format versions. That sequence is expressed as the [`STEPS`] table: every step is read
//! and written only when the instrument version is at least the version it was introduced in.

use super::params::*;
use super::{Instrument, InstrumentBody, InstrumentKind};
use crate::macros::legacy::{
    Width, apply_release, insert, read_indices, read_open, read_values, split, write_lengths,
    write_loops, write_open, write_releases, write_values,
};
use crate::macros::{MacroMap, MacroName, OperatorParam};
use crate::serde::{
    BlockWriter, LE, ReadError, WriteError, expect_tag, read_bool, read_string, skip, write_bool,
    write_string, write_zeros,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, Write};
use tracing::{debug, trace};
use ux::{u2, u3, u4};

pub(crate) const TAG: &[u8; 4] = b"INST";

/// The contents of a legacy instrument
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyBody {
    pub name: String,
    pub fm: FmParams,
    pub game_boy: GameBoyParams,
    pub c64: C64Params,
    pub amiga: AmigaParams,

    /// How the arpeggio macro is interpreted (absolute or fixed)
    pub arpeggio_mode: u8,

    /// Display heights of the volume, duty and wave macros (versions 15 and 16 only)
    pub macro_heights: [u8; 3],

    pub macros: MacroMap,
    pub opl_drums: OplDrums,
    pub sample_map: Option<SampleMap>,
    pub n163: N163Params,
    pub fds: FdsParams,
    pub wave_synth: WaveSynthParams,

    /// Fields of newer versions that come after the last known step, kept as-is
    pub trailing: Vec<u8>,
}

type ReadStep = fn(&mut dyn Read, &mut LegacyBody, u16) -> Result<(), ReadError>;
type WriteStep = fn(&mut dyn Write, &LegacyBody, u16) -> Result<(), WriteError>;

/// A part of the legacy instrument body
pub(crate) struct Step {
    /// What the step reads and writes, for logging
    pub name: &'static str,

    /// The version the step was introduced in
    pub since: u16,

    pub read: ReadStep,
    pub write: WriteStep,
}

/// Every part of the legacy instrument body, in file order
#[rustfmt::skip]
pub(crate) const STEPS: &[Step] = &[
    Step { name: "fm", since: 0, read: read_fm, write: write_fm },
    Step { name: "game boy", since: 0, read: read_game_boy, write: write_game_boy },
    Step { name: "c64", since: 0, read: read_c64, write: write_c64 },
    Step { name: "amiga", since: 0, read: read_amiga, write: write_amiga },
    Step { name: "standard macros", since: 0, read: read_standard_macros, write: write_standard_macros },
    Step { name: "operator macros", since: 29, read: read_operator_macros, write: write_operator_macros },
    Step { name: "release points", since: 44, read: read_release_points, write: write_release_points },
    Step { name: "operator release points", since: 44, read: read_operator_release_points, write: write_operator_release_points },
    Step { name: "extended operator macros", since: 61, read: read_extended_operator_macros, write: write_extended_operator_macros },
    Step { name: "opl drums", since: 63, read: read_opl_drums, write: write_opl_drums },
    Step { name: "sample map", since: 67, read: read_sample_map, write: write_sample_map },
    Step { name: "n163", since: 73, read: read_n163, write: write_n163 },
    Step { name: "extended macros", since: 76, read: read_extended_macros, write: write_extended_macros },
    Step { name: "fds", since: 76, read: read_fds, write: write_fds },
    Step { name: "opz", since: 77, read: read_opz, write: write_opz },
    Step { name: "wave synth", since: 79, read: read_wave_synth, write: write_wave_synth },
];

/// Decode an `INST` block
pub(crate) fn from_reader<R>(reader: &mut R) -> Result<Instrument, ReadError>
where
    R: Read + Seek,
{
    expect_tag(reader, TAG)?;
    let size = reader.read_u32::<LE>()? as u64;
    let end = reader.stream_position()? + size;

    let version = reader.read_u16::<LE>()?;
    let kind = InstrumentKind::from(reader.read_u8()? as u16);
    skip(reader, 1)?;

    let mut body = LegacyBody {
        name: read_string(reader)?,
        ..LegacyBody::default()
    };

    for step in STEPS.iter().filter(|step| version >= step.since) {
        trace!(step = step.name, version, "Reading legacy instrument step");
        (step.read)(reader, &mut body, version)?;
    }

    let position = reader.stream_position()?;
    if position < end {
        debug!(count = end - position, version, "Keeping unknown legacy instrument fields");
        Read::take(&mut *reader, end - position).read_to_end(&mut body.trailing)?;
        if (body.trailing.len() as u64) < end - position {
            return Err(ReadError::TruncatedStream);
        }
    }

    debug!(name = %body.name, version, ?kind, "Read legacy instrument");

    Ok(Instrument {
        version,
        kind,
        body: InstrumentBody::Legacy(body),
    })
}

/// Encode an `INST` block
pub(crate) fn to_writer<W>(
    writer: &mut W,
    version: u16,
    kind: InstrumentKind,
    body: &LegacyBody,
) -> Result<(), WriteError>
where
    W: Write + Seek,
{
    let kind = u8::try_from(kind.id()).map_err(|_| WriteError::OutOfRange {
        field: "legacy instrument kind",
        value: kind.id() as i64,
    })?;

    let block = BlockWriter::begin(writer, TAG)?;
    writer.write_u16::<LE>(version)?;
    writer.write_u8(kind)?;
    write_zeros(writer, 1)?;
    write_string(writer, &body.name)?;

    for step in STEPS.iter().filter(|step| version >= step.since) {
        trace!(step = step.name, version, "Writing legacy instrument step");
        (step.write)(writer, body, version)?;
    }
    writer.write_all(&body.trailing)?;

    block.finish(writer)?;
    Ok(())
}

const FM_OPERATOR_RESERVED: usize = 12;

fn read_fm(r: &mut dyn Read, body: &mut LegacyBody, version: u16) -> Result<(), ReadError> {
    let fm = &mut body.fm;
    fm.alg = r.read_u8()?;
    fm.fb = r.read_u8()?;
    fm.fms = r.read_u8()?;
    fm.ams = r.read_u8()?;
    fm.op_count = r.read_u8()?;
    if version >= 60 {
        fm.opll_preset = r.read_u8()?;
    } else {
        skip(r, 1)?;
    }
    skip(r, 2)?;

    for op in &mut fm.operators {
        let mut fields = [0; 20];
        r.read_exact(&mut fields)?;
        *op = FmOperator::from_legacy_fields(fields);
        skip(r, FM_OPERATOR_RESERVED as u64)?;
    }

    Ok(())
}

fn write_fm(w: &mut dyn Write, body: &LegacyBody, version: u16) -> Result<(), WriteError> {
    let fm = &body.fm;
    w.write_all(&[fm.alg, fm.fb, fm.fms, fm.ams, fm.op_count])?;
    w.write_u8(if version >= 60 { fm.opll_preset } else { 0 })?;
    write_zeros(w, 2)?;

    for op in &fm.operators {
        w.write_all(&op.legacy_fields())?;
        write_zeros(w, FM_OPERATOR_RESERVED)?;
    }

    Ok(())
}

fn read_game_boy(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let gb = &mut body.game_boy;
    gb.volume = u4::new(r.read_u8()? & 0xF);
    gb.direction = read_bool(r)?;
    gb.length = u3::new(r.read_u8()? & 0x7);
    gb.sound_length = r.read_u8()?;
    Ok(())
}

fn write_game_boy(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let gb = &body.game_boy;
    w.write_u8(u8::from(gb.volume))?;
    write_bool(w, gb.direction)?;
    w.write_u8(u8::from(gb.length))?;
    w.write_u8(gb.sound_length)?;
    Ok(())
}

fn read_c64(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let c64 = &mut body.c64;
    c64.triangle = read_bool(r)?;
    c64.saw = read_bool(r)?;
    c64.pulse = read_bool(r)?;
    c64.noise = read_bool(r)?;
    c64.attack = r.read_u8()?;
    c64.decay = r.read_u8()?;
    c64.sustain = r.read_u8()?;
    c64.release = r.read_u8()?;
    c64.duty = r.read_u16::<LE>()?;
    c64.ring_mod = read_bool(r)?;
    c64.osc_sync = read_bool(r)?;
    c64.to_filter = read_bool(r)?;
    c64.init_filter = read_bool(r)?;
    c64.volume_is_cutoff = read_bool(r)?;
    c64.resonance = r.read_u8()?;
    c64.low_pass = read_bool(r)?;
    c64.band_pass = read_bool(r)?;
    c64.high_pass = read_bool(r)?;
    c64.channel_3_off = read_bool(r)?;
    c64.cutoff = r.read_u16::<LE>()?;
    c64.absolute_duty_macro = read_bool(r)?;
    c64.absolute_filter_macro = read_bool(r)?;
    Ok(())
}

fn write_c64(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let c64 = &body.c64;
    for flag in [c64.triangle, c64.saw, c64.pulse, c64.noise] {
        write_bool(w, flag)?;
    }
    w.write_all(&[c64.attack, c64.decay, c64.sustain, c64.release])?;
    w.write_u16::<LE>(c64.duty)?;
    for flag in [
        c64.ring_mod,
        c64.osc_sync,
        c64.to_filter,
        c64.init_filter,
        c64.volume_is_cutoff,
    ] {
        write_bool(w, flag)?;
    }
    w.write_u8(c64.resonance)?;
    for flag in [c64.low_pass, c64.band_pass, c64.high_pass, c64.channel_3_off] {
        write_bool(w, flag)?;
    }
    w.write_u16::<LE>(c64.cutoff)?;
    write_bool(w, c64.absolute_duty_macro)?;
    write_bool(w, c64.absolute_filter_macro)?;
    Ok(())
}

// TODO: confirm the version the amiga mode and wave length were added in against real files
const AMIGA_MODE_VERSION: u16 = 82;

fn read_amiga(r: &mut dyn Read, body: &mut LegacyBody, version: u16) -> Result<(), ReadError> {
    body.amiga.sample = r.read_u16::<LE>()?;
    if version >= AMIGA_MODE_VERSION {
        body.amiga.mode = r.read_u8()?;
        body.amiga.wave_length = r.read_u8()?;
        skip(r, 12)?;
    } else {
        skip(r, 14)?;
    }
    Ok(())
}

fn write_amiga(w: &mut dyn Write, body: &LegacyBody, version: u16) -> Result<(), WriteError> {
    w.write_u16::<LE>(body.amiga.sample)?;
    if version >= AMIGA_MODE_VERSION {
        w.write_u8(body.amiga.mode)?;
        w.write_u8(body.amiga.wave_length)?;
        write_zeros(w, 12)?;
    } else {
        write_zeros(w, 14)?;
    }
    Ok(())
}

/// Arpeggio values used to be stored with an offset of 12 semitones
const ARPEGGIO_BIAS_VERSION: u16 = 31;
const ARPEGGIO_BIAS: i32 = 12;

static MACRO_NAMES: [MacroName; 20] = MacroName::STANDARD;
static OPERATOR_PARAMS: [OperatorParam; 20] = OperatorParam::ALL;

/// The standard macros, which grew from four to eight in version 17
fn standard_names(version: u16) -> &'static [MacroName] {
    if version >= 17 {
        &MACRO_NAMES[..8]
    } else {
        &MACRO_NAMES[..4]
    }
}

/// The FM macros that follow the standard macros from version 29 on
fn fm_names() -> &'static [MacroName] {
    &MACRO_NAMES[8..12]
}

/// The macros that receive release points from version 44 on
fn release_names() -> &'static [MacroName] {
    &MACRO_NAMES[..12]
}

/// The instrument-wide macros added in version 76
fn extended_names() -> &'static [MacroName] {
    &MACRO_NAMES[12..]
}

/// The operator parameters with macros from version 29 on
fn operator_params() -> &'static [OperatorParam] {
    &OPERATOR_PARAMS[..12]
}

/// The operator parameters with macros from version 61 on
fn extended_operator_params() -> &'static [OperatorParam] {
    &OPERATOR_PARAMS[12..]
}

fn read_standard_macros(
    r: &mut dyn Read,
    body: &mut LegacyBody,
    version: u16,
) -> Result<(), ReadError> {
    let names = standard_names(version);
    let lengths = read_indices(r, names.len())?;
    let loops = read_indices(r, names.len())?;
    body.arpeggio_mode = r.read_u8()?;
    r.read_exact(&mut body.macro_heights)?;

    for (index, name) in names.iter().enumerate() {
        let mut values = read_values(r, lengths[index], Width::I32)?;
        if *name == MacroName::Arpeggio && version < ARPEGGIO_BIAS_VERSION {
            for value in &mut values {
                *value = value.wrapping_sub(ARPEGGIO_BIAS);
            }
        }
        insert(&mut body.macros, *name, &values, loops[index], -1, false);
    }

    if version < 29 {
        return Ok(());
    }

    let lengths = read_indices(r, fm_names().len())?;
    let loops = read_indices(r, fm_names().len())?;
    let open = read_open(r, names.len() + fm_names().len())?;

    for (index, name) in fm_names().iter().enumerate() {
        let values = read_values(r, lengths[index], Width::I32)?;
        insert(&mut body.macros, *name, &values, loops[index], -1, false);
    }

    for (name, open) in names.iter().chain(fm_names()).zip(open) {
        if open {
            body.macros.entry(*name).or_default().open = true;
        }
    }

    Ok(())
}

fn write_standard_macros(
    w: &mut dyn Write,
    body: &LegacyBody,
    version: u16,
) -> Result<(), WriteError> {
    let mut group = split(&body.macros, standard_names(version))?;
    if version < ARPEGGIO_BIAS_VERSION {
        for split in group.iter_mut().filter(|s| s.name == MacroName::Arpeggio) {
            for value in &mut split.parts.values {
                *value = value.wrapping_add(ARPEGGIO_BIAS);
            }
        }
    }

    write_lengths(w, &group)?;
    write_loops(w, &group)?;
    w.write_u8(body.arpeggio_mode)?;
    w.write_all(&body.macro_heights)?;
    for split in &group {
        write_values(w, split, Width::I32)?;
    }

    if version < 29 {
        return Ok(());
    }

    let fm_group = split(&body.macros, fm_names())?;
    write_lengths(w, &fm_group)?;
    write_loops(w, &fm_group)?;
    write_open(w, &group)?;
    write_open(w, &fm_group)?;
    for split in &fm_group {
        write_values(w, split, Width::I32)?;
    }

    Ok(())
}

fn operator_names(op: usize, params: &[OperatorParam]) -> Vec<MacroName> {
    params
        .iter()
        .map(|param| MacroName::Operator(u2::new(op as u8), *param))
        .collect()
}

fn read_operator_macros(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let count = operator_params().len();
    let mut headers = Vec::with_capacity(4);
    for _ in 0..4 {
        let lengths = read_indices(r, count)?;
        let loops = read_indices(r, count)?;
        let open = read_open(r, count)?;
        headers.push((lengths, loops, open));
    }

    for (op, (lengths, loops, open)) in headers.iter().enumerate() {
        for (index, name) in operator_names(op, operator_params()).into_iter().enumerate() {
            let values = read_values(r, lengths[index], Width::I8)?;
            insert(&mut body.macros, name, &values, loops[index], -1, open[index]);
        }
    }

    Ok(())
}

fn write_operator_macros(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let groups = (0..4)
        .map(|op| split(&body.macros, &operator_names(op, operator_params())))
        .collect::<Result<Vec<_>, _>>()?;

    for group in &groups {
        write_lengths(w, group)?;
        write_loops(w, group)?;
        write_open(w, group)?;
    }

    for split in groups.iter().flatten() {
        write_values(w, split, Width::I8)?;
    }

    Ok(())
}

fn read_release_points(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let releases = read_indices(r, release_names().len())?;
    for (name, release) in release_names().iter().zip(releases) {
        apply_release(&mut body.macros, *name, release);
    }
    Ok(())
}

fn write_release_points(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    write_releases(w, &split(&body.macros, release_names())?)
}

fn read_operator_release_points(
    r: &mut dyn Read,
    body: &mut LegacyBody,
    _: u16,
) -> Result<(), ReadError> {
    for op in 0..4 {
        let names = operator_names(op, operator_params());
        let releases = read_indices(r, names.len())?;
        for (name, release) in names.into_iter().zip(releases) {
            apply_release(&mut body.macros, name, release);
        }
    }
    Ok(())
}

fn write_operator_release_points(
    w: &mut dyn Write,
    body: &LegacyBody,
    _: u16,
) -> Result<(), WriteError> {
    for op in 0..4 {
        write_releases(w, &split(&body.macros, &operator_names(op, operator_params()))?)?;
    }
    Ok(())
}

fn read_extended_operator_macros(
    r: &mut dyn Read,
    body: &mut LegacyBody,
    _: u16,
) -> Result<(), ReadError> {
    let count = extended_operator_params().len();
    let mut headers = Vec::with_capacity(4);
    for _ in 0..4 {
        let lengths = read_indices(r, count)?;
        let loops = read_indices(r, count)?;
        let releases = read_indices(r, count)?;
        let open = read_open(r, count)?;
        headers.push((lengths, loops, releases, open));
    }

    for (op, (lengths, loops, releases, open)) in headers.iter().enumerate() {
        let names = operator_names(op, extended_operator_params());
        for (index, name) in names.into_iter().enumerate() {
            let values = read_values(r, lengths[index], Width::I8)?;
            insert(&mut body.macros, name, &values, loops[index], releases[index], open[index]);
        }
    }

    Ok(())
}

fn write_extended_operator_macros(
    w: &mut dyn Write,
    body: &LegacyBody,
    _: u16,
) -> Result<(), WriteError> {
    let groups = (0..4)
        .map(|op| split(&body.macros, &operator_names(op, extended_operator_params())))
        .collect::<Result<Vec<_>, _>>()?;

    for group in &groups {
        write_lengths(w, group)?;
        write_loops(w, group)?;
        write_releases(w, group)?;
        write_open(w, group)?;
    }

    for split in groups.iter().flatten() {
        write_values(w, split, Width::I8)?;
    }

    Ok(())
}

fn read_opl_drums(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let drums = &mut body.opl_drums;
    drums.fixed_frequency = read_bool(r)?;
    skip(r, 1)?;
    drums.kick = r.read_u16::<LE>()?;
    drums.snare_hat = r.read_u16::<LE>()?;
    drums.tom_top = r.read_u16::<LE>()?;
    Ok(())
}

fn write_opl_drums(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let drums = &body.opl_drums;
    write_bool(w, drums.fixed_frequency)?;
    write_zeros(w, 1)?;
    w.write_u16::<LE>(drums.kick)?;
    w.write_u16::<LE>(drums.snare_hat)?;
    w.write_u16::<LE>(drums.tom_top)?;
    Ok(())
}

fn read_sample_map(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    if !read_bool(r)? {
        body.sample_map = None;
        return Ok(());
    }

    let frequencies = read_indices(r, SAMPLE_MAP_LEN)?;
    let mut map = Vec::with_capacity(SAMPLE_MAP_LEN);
    for frequency in frequencies {
        map.push(SampleMapEntry {
            frequency,
            sample: r.read_i16::<LE>()?,
        });
    }

    body.sample_map = Some(map);
    Ok(())
}

fn write_sample_map(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let Some(map) = &body.sample_map else {
        return Ok(write_bool(w, false)?);
    };

    if map.len() != SAMPLE_MAP_LEN {
        return Err(WriteError::FieldLength {
            field: "sample map",
            expected: SAMPLE_MAP_LEN,
            found: map.len(),
        });
    }

    write_bool(w, true)?;
    for entry in map {
        w.write_i32::<LE>(entry.frequency)?;
    }
    for entry in map {
        w.write_i16::<LE>(entry.sample)?;
    }
    Ok(())
}

fn read_n163(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let n163 = &mut body.n163;
    n163.wave_init = r.read_i32::<LE>()?;
    n163.wave_pos = r.read_u8()?;
    n163.wave_len = r.read_u8()?;
    n163.wave_mode = r.read_u8()?;
    skip(r, 1)?;
    Ok(())
}

fn write_n163(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let n163 = &body.n163;
    w.write_i32::<LE>(n163.wave_init)?;
    w.write_all(&[n163.wave_pos, n163.wave_len, n163.wave_mode])?;
    write_zeros(w, 1)?;
    Ok(())
}

fn read_extended_macros(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let count = extended_names().len();
    let lengths = read_indices(r, count)?;
    let loops = read_indices(r, count)?;
    let releases = read_indices(r, count)?;
    let open = read_open(r, count)?;

    for (index, name) in extended_names().iter().enumerate() {
        let values = read_values(r, lengths[index], Width::I32)?;
        insert(&mut body.macros, *name, &values, loops[index], releases[index], open[index]);
    }

    Ok(())
}

fn write_extended_macros(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let group = split(&body.macros, extended_names())?;
    write_lengths(w, &group)?;
    write_loops(w, &group)?;
    write_releases(w, &group)?;
    write_open(w, &group)?;
    for split in &group {
        write_values(w, split, Width::I32)?;
    }
    Ok(())
}

fn read_fds(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let fds = &mut body.fds;
    fds.mod_speed = r.read_i32::<LE>()?;
    fds.mod_depth = r.read_i32::<LE>()?;
    fds.init_table = read_bool(r)?;
    skip(r, 3)?;
    r.read_i8_into(&mut fds.mod_table)?;
    Ok(())
}

fn write_fds(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let fds = &body.fds;
    w.write_i32::<LE>(fds.mod_speed)?;
    w.write_i32::<LE>(fds.mod_depth)?;
    write_bool(w, fds.init_table)?;
    write_zeros(w, 3)?;
    for value in fds.mod_table {
        w.write_i8(value)?;
    }
    Ok(())
}

fn read_opz(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    body.fm.fms2 = r.read_u8()?;
    body.fm.ams2 = r.read_u8()?;
    Ok(())
}

fn write_opz(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    w.write_all(&[body.fm.fms2, body.fm.ams2])?;
    Ok(())
}

fn read_wave_synth(r: &mut dyn Read, body: &mut LegacyBody, _: u16) -> Result<(), ReadError> {
    let ws = &mut body.wave_synth;
    ws.wave1 = r.read_i32::<LE>()?;
    ws.wave2 = r.read_i32::<LE>()?;
    ws.rate_divider = r.read_u8()?;
    ws.effect = r.read_u8()?;
    ws.enabled = read_bool(r)?;
    ws.global = read_bool(r)?;
    ws.speed = r.read_u8()?;
    r.read_exact(&mut ws.params)?;
    Ok(())
}

fn write_wave_synth(w: &mut dyn Write, body: &LegacyBody, _: u16) -> Result<(), WriteError> {
    let ws = &body.wave_synth;
    w.write_i32::<LE>(ws.wave1)?;
    w.write_i32::<LE>(ws.wave2)?;
    w.write_u8(ws.rate_divider)?;
    w.write_u8(ws.effect)?;
    write_bool(w, ws.enabled)?;
    write_bool(w, ws.global)?;
    w.write_u8(ws.speed)?;
    w.write_all(&ws.params)?;
    Ok(())
}
