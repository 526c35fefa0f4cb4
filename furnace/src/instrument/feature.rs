//! Feature-block `INS2` instruments
//!
//! After a short header, the body of an `INS2` block is a list of features. Each feature starts
//! with a two character code and a 16-bit length, so features we don't know about can be
//! skipped over and kept as they are. The list ends with the bare code `EN`, or at the end of
//! the block.

use super::params::*;
use super::{Instrument, InstrumentBody, InstrumentKind};
use crate::macros::feature::{read_group, write_group};
use crate::macros::{MacroMap, MacroName, OperatorParam};
use crate::serde::{
    BlockWriter, LE, ReadError, WriteError, expect_tag, read_bool, read_string, write_bool,
    write_string,
};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Seek, Write};
use tracing::{debug, warn};
use ux::{u2, u3, u4};

pub(crate) const TAG: &[u8; 4] = b"INS2";

const END: [u8; 2] = *b"EN";

/// A single feature of a feature-block instrument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    /// `NA`: the instrument name
    Name(String),

    /// `FM`: FM parameters
    Fm(FmParams),

    /// `MA`: the instrument-wide macros
    Macros(MacroMap),

    /// `O1`..`O4`: the macros of one FM operator
    OperatorMacros(u2, MacroMap),

    /// `GB`: Game Boy envelope and hardware sequence
    GameBoy(GameBoyParams),

    /// `LD`: OPL drum frequencies
    OplDrums(OplDrums),

    /// `N1`: Namco 163 wave settings
    N163(N163Params),

    /// `FD`: FDS modulation
    Fds(FdsParams),

    /// `WS`: wavetable synthesizer
    WaveSynth(WaveSynthParams),

    /// `SL`: the samples bundled with an instrument file
    SampleList(AssetList),

    /// `WL`: the wavetables bundled with an instrument file
    WavetableList(AssetList),

    /// A feature we don't know how to interpret, kept byte for byte
    Unknown { code: [u8; 2], data: Vec<u8> },
}

impl Feature {
    /// The two character code the feature is stored under
    pub fn code(&self) -> [u8; 2] {
        match self {
            Self::Name(_) => *b"NA",
            Self::Fm(_) => *b"FM",
            Self::Macros(_) => *b"MA",
            Self::OperatorMacros(op, _) => [b'O', b'1' + u8::from(*op)],
            Self::GameBoy(_) => *b"GB",
            Self::OplDrums(_) => *b"LD",
            Self::N163(_) => *b"N1",
            Self::Fds(_) => *b"FD",
            Self::WaveSynth(_) => *b"WS",
            Self::SampleList(_) => *b"SL",
            Self::WavetableList(_) => *b"WL",
            Self::Unknown { code, .. } => *code,
        }
    }

    /// Interpret the payload of a feature
    ///
    /// Payloads of recognized codes with data left over after interpreting them are kept as
    /// [`Feature::Unknown`], so nothing gets lost when writing them back.
    fn from_payload(code: [u8; 2], data: Vec<u8>) -> Result<Self, ReadError> {
        let mut reader = Cursor::new(data.as_slice());

        let feature = match &code {
            b"NA" => Self::Name(read_string(&mut reader)?),
            b"FM" => Self::Fm(read_fm(&mut reader)?),
            b"MA" => Self::Macros(read_group(&mut reader, MacroName::from_code)?),
            [b'O', n @ b'1'..=b'4'] => {
                let op = u2::new(n - b'1');
                let name_of =
                    |code| OperatorParam::from_code(code).map(|p| MacroName::Operator(op, p));
                Self::OperatorMacros(op, read_group(&mut reader, name_of)?)
            }
            b"GB" => Self::GameBoy(read_game_boy(&mut reader)?),
            b"LD" => Self::OplDrums(read_opl_drums(&mut reader)?),
            b"N1" => Self::N163(read_n163(&mut reader)?),
            b"FD" => Self::Fds(read_fds(&mut reader)?),
            b"WS" => Self::WaveSynth(read_wave_synth(&mut reader)?),
            b"SL" => Self::SampleList(read_asset_list(&mut reader)?),
            b"WL" => Self::WavetableList(read_asset_list(&mut reader)?),
            _ => {
                debug!(code = %code.escape_ascii(), len = data.len(), "Keeping unknown feature");
                return Ok(Self::Unknown { code, data });
            }
        };

        if reader.position() as usize != data.len() {
            warn!(
                code = %code.escape_ascii(),
                len = data.len(),
                used = reader.position(),
                "Feature has more data than expected, keeping it as is"
            );
            return Ok(Self::Unknown { code, data });
        }

        Ok(feature)
    }

    /// Serialize the payload of a feature
    fn to_payload(&self) -> Result<Vec<u8>, WriteError> {
        let mut w = Vec::new();

        match self {
            Self::Name(name) => write_string(&mut w, name)?,
            Self::Fm(fm) => write_fm(&mut w, fm)?,
            Self::Macros(macros) => write_group(&mut w, macros, MacroName::code)?,
            Self::OperatorMacros(op, macros) => {
                let code_of = |name| match name {
                    MacroName::Operator(o, param) if o == *op => Some(param.code()),
                    _ => None,
                };
                write_group(&mut w, macros, code_of)?
            }
            Self::GameBoy(gb) => write_game_boy(&mut w, gb)?,
            Self::OplDrums(drums) => write_opl_drums(&mut w, drums)?,
            Self::N163(n163) => write_n163(&mut w, n163)?,
            Self::Fds(fds) => write_fds(&mut w, fds)?,
            Self::WaveSynth(ws) => write_wave_synth(&mut w, ws)?,
            Self::SampleList(list) | Self::WavetableList(list) => write_asset_list(&mut w, list)?,
            Self::Unknown { data, .. } => w.extend_from_slice(data),
        }

        Ok(w)
    }
}

/// Decode an `INS2` block
pub(crate) fn from_reader<R>(reader: &mut R) -> Result<Instrument, ReadError>
where
    R: Read + Seek,
{
    expect_tag(reader, TAG)?;
    let size = reader.read_u32::<LE>()? as u64;

    let mut body = Vec::new();
    Read::take(&mut *reader, size).read_to_end(&mut body)?;
    if (body.len() as u64) < size {
        return Err(ReadError::TruncatedStream);
    }

    let mut reader = Cursor::new(body.as_slice());
    let version = reader.read_u16::<LE>()?;
    let kind = InstrumentKind::from(reader.read_u16::<LE>()?);

    let mut features = Vec::new();
    while (reader.position() as usize) < body.len() {
        let mut code = [0; 2];
        reader.read_exact(&mut code)?;
        if code == END {
            break;
        }

        let len = reader.read_u16::<LE>()? as u64;
        let mut data = Vec::new();
        Read::take(&mut reader, len).read_to_end(&mut data)?;
        if (data.len() as u64) < len {
            return Err(ReadError::TruncatedStream);
        }

        features.push(Feature::from_payload(code, data)?);
    }

    debug!(version, ?kind, features = features.len(), "Read feature-block instrument");

    Ok(Instrument {
        version,
        kind,
        body: InstrumentBody::Features(features),
    })
}

/// Encode an `INS2` block
pub(crate) fn to_writer<W>(
    writer: &mut W,
    version: u16,
    kind: InstrumentKind,
    features: &[Feature],
) -> Result<(), WriteError>
where
    W: Write + Seek,
{
    let block = BlockWriter::begin(writer, TAG)?;
    writer.write_u16::<LE>(version)?;
    writer.write_u16::<LE>(kind.id())?;

    for feature in features {
        let payload = feature.to_payload()?;
        let len = u16::try_from(payload.len()).map_err(|_| WriteError::OutOfRange {
            field: "feature length",
            value: payload.len() as i64,
        })?;

        writer.write_all(&feature.code())?;
        writer.write_u16::<LE>(len)?;
        writer.write_all(&payload)?;
    }

    writer.write_all(&END)?;
    block.finish(writer)?;

    Ok(())
}

fn read_fm<R>(r: &mut R) -> Result<FmParams, ReadError>
where
    R: Read,
{
    let [ops, alg_fb, lfo, lfo2] = {
        let mut header = [0; 4];
        r.read_exact(&mut header)?;
        header
    };

    let mut fm = FmParams {
        op_count: ops & 0xF,
        enabled: [0, 1, 2, 3].map(|op| ops & (0x10 << op) != 0),
        alg: (alg_fb >> 4) & 0x7,
        fb: alg_fb & 0x7,
        fms2: lfo >> 5,
        ams: (lfo >> 3) & 0x3,
        fms: lfo & 0x7,
        ams2: lfo2 >> 6,
        opll_preset: lfo2 & 0x1F,
        fixed_drums: lfo2 & 0x20 != 0,
        ..FmParams::default()
    };

    for op in fm.operators.iter_mut().take(fm.op_count as usize) {
        let mut b = [0; 8];
        r.read_exact(&mut b)?;

        *op = FmOperator {
            ksr: b[0] >> 7,
            dt: (b[0] >> 4) & 0x7,
            mult: b[0] & 0xF,
            sus: b[1] >> 7,
            tl: b[1] & 0x7F,
            rs: b[2] >> 6,
            vib: (b[2] >> 5) & 0x1,
            ar: b[2] & 0x1F,
            am: b[3] >> 7,
            ksl: (b[3] >> 5) & 0x3,
            dr: b[3] & 0x1F,
            egt: b[4] >> 7,
            kvs: (b[4] >> 5) & 0x3,
            d2r: b[4] & 0x1F,
            sl: b[5] >> 4,
            rr: b[5] & 0xF,
            dvb: b[6] >> 4,
            ssg_env: b[6] & 0xF,
            dam: b[7] >> 5,
            dt2: (b[7] >> 3) & 0x3,
            ws: b[7] & 0x7,
        };
    }

    Ok(fm)
}

fn write_fm<W>(w: &mut W, fm: &FmParams) -> Result<(), WriteError>
where
    W: Write,
{
    let op_count = fm.op_count.min(4);
    let enabled = fm
        .enabled
        .iter()
        .enumerate()
        .fold(0, |bits, (op, on)| bits | ((*on as u8) << (4 + op)));

    w.write_all(&[
        (op_count & 0xF) | enabled,
        ((fm.alg & 0x7) << 4) | (fm.fb & 0x7),
        ((fm.fms2 & 0x7) << 5) | ((fm.ams & 0x3) << 3) | (fm.fms & 0x7),
        ((fm.ams2 & 0x3) << 6) | ((fm.fixed_drums as u8) << 5) | (fm.opll_preset & 0x1F),
    ])?;

    for op in fm.operators.iter().take(op_count as usize) {
        w.write_all(&[
            ((op.ksr & 0x1) << 7) | ((op.dt & 0x7) << 4) | (op.mult & 0xF),
            ((op.sus & 0x1) << 7) | (op.tl & 0x7F),
            ((op.rs & 0x3) << 6) | ((op.vib & 0x1) << 5) | (op.ar & 0x1F),
            ((op.am & 0x1) << 7) | ((op.ksl & 0x3) << 5) | (op.dr & 0x1F),
            ((op.egt & 0x1) << 7) | ((op.kvs & 0x3) << 5) | (op.d2r & 0x1F),
            ((op.sl & 0xF) << 4) | (op.rr & 0xF),
            ((op.dvb & 0xF) << 4) | (op.ssg_env & 0xF),
            ((op.dam & 0x7) << 5) | ((op.dt2 & 0x3) << 3) | (op.ws & 0x7),
        ])?;
    }

    Ok(())
}

fn read_game_boy<R>(r: &mut R) -> Result<GameBoyParams, ReadError>
where
    R: Read,
{
    let envelope = r.read_u8()?;
    let sound_length = r.read_u8()?;
    let flags = r.read_u8()?;
    let count = r.read_u8()?;

    let mut hardware_sequence = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut command = [0; 3];
        r.read_exact(&mut command)?;
        hardware_sequence.push(command);
    }

    Ok(GameBoyParams {
        volume: u4::new(envelope & 0xF),
        direction: envelope & 0x10 != 0,
        length: u3::new(envelope >> 5),
        sound_length,
        software_envelope: flags & 0x1 != 0,
        always_init: flags & 0x2 != 0,
        double_wave: flags & 0x4 != 0,
        hardware_sequence,
    })
}

fn write_game_boy<W>(w: &mut W, gb: &GameBoyParams) -> Result<(), WriteError>
where
    W: Write,
{
    let count = u8::try_from(gb.hardware_sequence.len()).map_err(|_| {
        WriteError::TooManyEntries {
            what: "hardware sequence commands",
            count: gb.hardware_sequence.len(),
            max: u8::MAX as usize,
        }
    })?;

    w.write_u8(u8::from(gb.volume) | ((gb.direction as u8) << 4) | (u8::from(gb.length) << 5))?;
    w.write_u8(gb.sound_length)?;
    w.write_u8(
        gb.software_envelope as u8 | ((gb.always_init as u8) << 1) | ((gb.double_wave as u8) << 2),
    )?;
    w.write_u8(count)?;
    for command in &gb.hardware_sequence {
        w.write_all(command)?;
    }

    Ok(())
}

fn read_opl_drums<R>(r: &mut R) -> Result<OplDrums, ReadError>
where
    R: Read,
{
    Ok(OplDrums {
        fixed_frequency: read_bool(r)?,
        kick: r.read_u16::<LE>()?,
        snare_hat: r.read_u16::<LE>()?,
        tom_top: r.read_u16::<LE>()?,
    })
}

fn write_opl_drums<W>(w: &mut W, drums: &OplDrums) -> Result<(), WriteError>
where
    W: Write,
{
    write_bool(w, drums.fixed_frequency)?;
    w.write_u16::<LE>(drums.kick)?;
    w.write_u16::<LE>(drums.snare_hat)?;
    w.write_u16::<LE>(drums.tom_top)?;
    Ok(())
}

fn read_n163<R>(r: &mut R) -> Result<N163Params, ReadError>
where
    R: Read,
{
    Ok(N163Params {
        wave_init: r.read_i32::<LE>()?,
        wave_pos: r.read_u8()?,
        wave_len: r.read_u8()?,
        wave_mode: r.read_u8()?,
    })
}

fn write_n163<W>(w: &mut W, n163: &N163Params) -> Result<(), WriteError>
where
    W: Write,
{
    w.write_i32::<LE>(n163.wave_init)?;
    w.write_all(&[n163.wave_pos, n163.wave_len, n163.wave_mode])?;
    Ok(())
}

fn read_fds<R>(r: &mut R) -> Result<FdsParams, ReadError>
where
    R: Read,
{
    let mut fds = FdsParams {
        mod_speed: r.read_i32::<LE>()?,
        mod_depth: r.read_i32::<LE>()?,
        init_table: read_bool(r)?,
        ..FdsParams::default()
    };
    r.read_i8_into(&mut fds.mod_table)?;
    Ok(fds)
}

fn write_fds<W>(w: &mut W, fds: &FdsParams) -> Result<(), WriteError>
where
    W: Write,
{
    w.write_i32::<LE>(fds.mod_speed)?;
    w.write_i32::<LE>(fds.mod_depth)?;
    write_bool(w, fds.init_table)?;
    for value in fds.mod_table {
        w.write_i8(value)?;
    }
    Ok(())
}

fn read_wave_synth<R>(r: &mut R) -> Result<WaveSynthParams, ReadError>
where
    R: Read,
{
    let mut ws = WaveSynthParams {
        wave1: r.read_i32::<LE>()?,
        wave2: r.read_i32::<LE>()?,
        rate_divider: r.read_u8()?,
        effect: r.read_u8()?,
        enabled: read_bool(r)?,
        global: read_bool(r)?,
        speed: r.read_u8()?,
        params: [0; 4],
    };
    r.read_exact(&mut ws.params)?;
    Ok(ws)
}

fn write_wave_synth<W>(w: &mut W, ws: &WaveSynthParams) -> Result<(), WriteError>
where
    W: Write,
{
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

fn read_asset_list<R>(r: &mut R) -> Result<AssetList, ReadError>
where
    R: Read,
{
    let count = r.read_u8()? as usize;

    let mut indices = vec![0; count];
    r.read_exact(&mut indices)?;

    let mut pointers = vec![0; count];
    r.read_u32_into::<LE>(&mut pointers)?;

    Ok(AssetList { indices, pointers })
}

fn write_asset_list<W>(w: &mut W, list: &AssetList) -> Result<(), WriteError>
where
    W: Write,
{
    if list.indices.len() != list.pointers.len() {
        return Err(WriteError::FieldLength {
            field: "asset pointers",
            expected: list.indices.len(),
            found: list.pointers.len(),
        });
    }

    let count = u8::try_from(list.indices.len()).map_err(|_| WriteError::TooManyEntries {
        what: "bundled assets",
        count: list.indices.len(),
        max: u8::MAX as usize,
    })?;

    w.write_u8(count)?;
    w.write_all(&list.indices)?;
    for pointer in &list.pointers {
        w.write_u32::<LE>(*pointer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::Macro;

    fn encode(instrument: &Instrument) -> Vec<u8> {
        let mut writer = Cursor::new(Vec::new());
        instrument.to_writer(&mut writer).unwrap();
        writer.into_inner()
    }

    fn decode(bytes: &[u8]) -> Instrument {
        Instrument::from_reader(&mut Cursor::new(bytes)).unwrap()
    }

    fn with_features(features: Vec<Feature>) -> Instrument {
        Instrument {
            version: Instrument::FEATURE_VERSION,
            kind: InstrumentKind::Fm4Op,
            body: InstrumentBody::Features(features),
        }
    }

    #[test]
    fn header() {
        let bytes = encode(&Instrument::new(InstrumentKind::GameBoy, "WAH"));

        assert_eq!(&bytes[0..4], b"INS2");
        assert_eq!(&bytes[4..8], &((bytes.len() - 8) as u32).to_le_bytes());
        assert_eq!(&bytes[8..12], [127, 0, 2, 0]);
        assert_eq!(&bytes[12..20], b"NA\x04\0WAH\0");
        assert_eq!(&bytes[20..], b"EN");
    }

    #[test]
    fn unknown_feature_pass_through() {
        let mut bytes = b"INS2\0\0\0\0\x7F\0\x01\0".to_vec();
        bytes.extend_from_slice(b"NA\x05\0LEAD\0");
        bytes.extend_from_slice(b"ZZ\x03\0\x01\x02\x03");
        bytes.extend_from_slice(b"EN");
        let size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&size.to_le_bytes());

        let instrument = decode(&bytes);
        assert_eq!(instrument.name(), "LEAD");
        assert_eq!(
            instrument.body,
            InstrumentBody::Features(vec![
                Feature::Name("LEAD".to_string()),
                Feature::Unknown {
                    code: *b"ZZ",
                    data: vec![1, 2, 3]
                },
            ])
        );

        assert_eq!(encode(&instrument), bytes);
    }

    #[test]
    fn ends_without_end_code() {
        let mut bytes = b"INS2\x0B\0\0\0\x7F\0\x00\0".to_vec();
        bytes.extend_from_slice(b"NA\x03\0AB\0");

        let instrument = decode(&bytes);
        assert_eq!(instrument.name(), "AB");
    }

    #[test]
    fn truncated_feature() {
        let mut bytes = b"INS2\x0B\0\0\0\x7F\0\x00\0".to_vec();
        bytes.extend_from_slice(b"NA\x09\0AB\0");

        assert!(matches!(
            Instrument::from_reader(&mut Cursor::new(bytes)),
            Err(ReadError::TruncatedStream)
        ));
    }

    #[test]
    fn oversized_known_feature_is_kept() {
        let mut bytes = b"INS2\0\0\0\0\x7F\0\x00\0".to_vec();
        bytes.extend_from_slice(b"LD\x09\0\x01\x02\0\x03\0\x04\0\xAA\xBB");
        bytes.extend_from_slice(b"EN");
        let size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&size.to_le_bytes());

        let instrument = decode(&bytes);
        assert!(matches!(
            &instrument.body,
            InstrumentBody::Features(features) if matches!(
                features[0],
                Feature::Unknown { code, .. } if &code == b"LD"
            )
        ));
        assert_eq!(encode(&instrument), bytes);
    }

    #[test]
    fn fm_packing() {
        let mut fm = FmParams {
            alg: 5,
            fb: 6,
            fms: 3,
            ams: 2,
            fms2: 7,
            ams2: 1,
            op_count: 2,
            opll_preset: 17,
            enabled: [true, false, true, false],
            ..FmParams::default()
        };
        fm.operators[0] = FmOperator {
            am: 1,
            ar: 31,
            dr: 15,
            mult: 9,
            rr: 7,
            sl: 12,
            tl: 100,
            dt2: 2,
            rs: 3,
            dt: 5,
            d2r: 20,
            ssg_env: 11,
            dam: 6,
            dvb: 4,
            egt: 1,
            ksl: 2,
            sus: 1,
            vib: 1,
            ws: 5,
            ksr: 1,
            kvs: 3,
        };
        fm.operators[1].tl = 0x7F;

        let mut bytes = Vec::new();
        write_fm(&mut bytes, &fm).unwrap();
        assert_eq!(bytes.len(), 4 + 2 * 8);
        assert_eq!(&bytes[0..4], [0x52, 0x56, 0xF3, 0x51]);
        assert_eq!(&bytes[4..12], [0xD9, 0xE4, 0xFF, 0xCF, 0xF4, 0xC7, 0x4B, 0xD5]);

        let decoded = read_fm(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(decoded, fm);
    }

    #[test]
    fn fm_flags_survive() {
        let mut bytes = b"INS2\0\0\0\0\x7F\0\x01\0".to_vec();
        bytes.extend_from_slice(b"FM\x04\0\0\0\0\x20");
        bytes.extend_from_slice(b"GB\x04\0\0\0\x04\0");
        bytes.extend_from_slice(b"EN");
        let size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&size.to_le_bytes());

        let instrument = decode(&bytes);
        let InstrumentBody::Features(features) = &instrument.body else {
            panic!("decoded a legacy instrument");
        };
        assert!(matches!(&features[0], Feature::Fm(fm) if fm.fixed_drums));
        assert!(matches!(&features[1], Feature::GameBoy(gb) if gb.double_wave));

        assert_eq!(encode(&instrument), bytes);
    }

    #[test]
    fn game_boy_packing() {
        let gb = GameBoyParams {
            volume: u4::new(15),
            direction: true,
            length: u3::new(2),
            sound_length: 64,
            software_envelope: false,
            always_init: true,
            double_wave: true,
            hardware_sequence: vec![[1, 2, 3]],
        };

        let mut bytes = Vec::new();
        write_game_boy(&mut bytes, &gb).unwrap();
        assert_eq!(bytes, [0x5F, 64, 0x6, 1, 1, 2, 3]);
        assert_eq!(read_game_boy(&mut Cursor::new(&bytes)).unwrap(), gb);
    }

    #[test]
    fn round_trip() {
        let mut standard = MacroMap::new();
        standard.insert(MacroName::Volume, Macro::from_parts(&[15, 12, 8], 1, 2));
        standard.insert(MacroName::Arpeggio, Macro::from_values([0, -12, 24]));

        let op = u2::new(1);
        let mut operator = MacroMap::new();
        operator.insert(
            MacroName::Operator(op, OperatorParam::Tl),
            Macro::from_parts(&[0, 10, 20], 0, -1),
        );

        let mut fds = FdsParams {
            mod_speed: 3,
            mod_depth: -2,
            init_table: true,
            ..FdsParams::default()
        };
        fds.mod_table[0] = -3;

        let instrument = with_features(vec![
            Feature::Name("EVERYTHING".to_string()),
            Feature::Fm(FmParams::default()),
            Feature::Macros(standard),
            Feature::OperatorMacros(op, operator),
            Feature::GameBoy(GameBoyParams::default()),
            Feature::OplDrums(OplDrums {
                fixed_frequency: true,
                kick: 1,
                snare_hat: 2,
                tom_top: 3,
            }),
            Feature::N163(N163Params {
                wave_init: 5,
                wave_pos: 6,
                wave_len: 7,
                wave_mode: 8,
            }),
            Feature::Fds(fds),
            Feature::WaveSynth(WaveSynthParams {
                enabled: true,
                params: [4, 3, 2, 1],
                ..WaveSynthParams::default()
            }),
            Feature::SampleList(AssetList {
                indices: vec![0, 4],
                pointers: vec![0x100, 0x200],
            }),
            Feature::WavetableList(AssetList::default()),
        ]);

        let bytes = encode(&instrument);
        assert_eq!(decode(&bytes), instrument);

        let feature_sizes = [("LD", 7), ("N1", 7), ("FD", 41), ("WS", 17)];
        for (code, size) in feature_sizes {
            let position = bytes
                .windows(2)
                .position(|window| window == code.as_bytes())
                .unwrap();
            assert_eq!(bytes[position + 2], size, "size of {code}");
        }
    }

    #[test]
    fn asset_list_mismatch() {
        let instrument = with_features(vec![Feature::SampleList(AssetList {
            indices: vec![1],
            pointers: vec![],
        })]);

        assert!(matches!(
            instrument.to_writer(&mut Cursor::new(Vec::new())),
            Err(WriteError::FieldLength { .. })
        ));
    }
}
