use super::ReadError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};
use system_interface::io::Peek;

/// The byte order of every multi-byte field in a Furnace file
pub type LE = LittleEndian;

/// Read a null-terminated string
///
/// The terminating zero is consumed, but not part of the result. Furnace writes UTF-8, but older
/// versions didn't always, so invalid sequences are replaced rather than rejected.
pub fn read_string<R>(reader: &mut R) -> Result<String, ReadError>
where
    R: Read + ?Sized,
{
    let mut bytes = Vec::new();
    loop {
        match reader.read_u8()? {
            0 => break,
            byte => bytes.push(byte),
        }
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a string followed by exactly one zero byte
pub fn write_string<W>(writer: &mut W, string: &str) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writer.write_all(string.as_bytes())?;
    writer.write_u8(0)
}

/// Read a single byte as a boolean (anything but zero is `true`)
pub fn read_bool<R>(reader: &mut R) -> Result<bool, ReadError>
where
    R: Read + ?Sized,
{
    Ok(reader.read_u8()? != 0)
}

/// Write a boolean as a single byte
pub fn write_bool<W>(writer: &mut W, value: bool) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writer.write_u8(value as u8)
}

/// Read a fixed-length tag (block ids, magic strings)
pub fn read_tag<R, const N: usize>(reader: &mut R) -> Result<[u8; N], ReadError>
where
    R: Read + ?Sized,
{
    let mut tag = [0; N];
    reader.read_exact(&mut tag)?;
    Ok(tag)
}

/// Read a fixed-length tag and check it against what we expect to find
pub fn expect_tag<R, const N: usize>(reader: &mut R, expected: &[u8; N]) -> Result<(), ReadError>
where
    R: Read + ?Sized,
{
    let found = read_tag::<_, N>(reader)?;
    if &found == expected {
        Ok(())
    } else {
        Err(ReadError::BadMagic {
            expected: expected.escape_ascii().to_string(),
            found: found.escape_ascii().to_string(),
        })
    }
}

/// Look at the next four bytes without consuming them
///
/// Returns `None` if fewer than four bytes are left.
pub fn peek_tag<R>(reader: &mut R) -> io::Result<Option<[u8; 4]>>
where
    R: Peek + ?Sized,
{
    let mut tag = [0; 4];
    if reader.peek(&mut tag)? == tag.len() {
        Ok(Some(tag))
    } else {
        Ok(None)
    }
}

/// Skip over a number of (reserved) bytes
pub fn skip<R>(reader: &mut R, count: u64) -> Result<(), ReadError>
where
    R: Read + ?Sized,
{
    let skipped = io::copy(&mut Read::take(reader, count), &mut io::sink())?;
    if skipped == count {
        Ok(())
    } else {
        Err(ReadError::TruncatedStream)
    }
}

/// Write a number of zero (reserved) bytes
pub fn write_zeros<W>(writer: &mut W, count: usize) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writer.write_all(&vec![0; count])
}

/// The total length of a seekable stream, leaving its position untouched
pub fn stream_len<S>(seeker: &mut S) -> io::Result<u64>
where
    S: Seek + ?Sized,
{
    let pos = seeker.stream_position()?;
    let end = seeker.seek(SeekFrom::End(0))?;
    seeker.seek(SeekFrom::Start(pos))?;
    Ok(end)
}

/// Seek to an absolute offset, failing if it lies beyond the end of the stream
pub fn seek_to<S>(seeker: &mut S, offset: u64) -> Result<(), ReadError>
where
    S: Seek + ?Sized,
{
    if offset > stream_len(seeker)? {
        return Err(ReadError::TruncatedStream);
    }

    seeker.seek(SeekFrom::Start(offset))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn little_endian() {
        let mut reader = Cursor::new([0x34, 0x12, 0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(reader.read_u16::<LE>().unwrap(), 0x1234);
        assert_eq!(reader.read_f32::<LE>().unwrap(), 1.0);
        assert!(matches!(
            reader.read_u32::<LE>().map_err(ReadError::from),
            Err(ReadError::TruncatedStream)
        ));
    }

    #[test]
    fn strings() {
        let mut reader = Cursor::new(b"HELLO\0WORLD\0\0".as_slice());
        assert_eq!(read_string(&mut reader).unwrap(), "HELLO");
        assert_eq!(read_string(&mut reader).unwrap(), "WORLD");
        assert_eq!(read_string(&mut reader).unwrap(), "");
        assert!(matches!(
            read_string(&mut reader),
            Err(ReadError::TruncatedStream)
        ));

        let mut dest = Vec::new();
        write_string(&mut dest, "ABC").unwrap();
        write_string(&mut dest, "").unwrap();
        assert_eq!(dest, b"ABC\0\0");
    }

    #[test]
    fn unterminated_string() {
        let mut reader = Cursor::new(b"NO END".as_slice());
        assert!(matches!(
            read_string(&mut reader),
            Err(ReadError::TruncatedStream)
        ));
    }

    #[test]
    fn tags() {
        let mut reader = Cursor::new(b"INSTINS2".as_slice());
        assert_eq!(peek_tag(&mut reader).unwrap(), Some(*b"INST"));
        assert!(expect_tag(&mut reader, b"INST").is_ok());

        match expect_tag(&mut reader, b"PATR") {
            Err(ReadError::BadMagic { expected, found }) => {
                assert_eq!(expected, "PATR");
                assert_eq!(found, "INS2");
            }
            other => panic!("unexpected result {other:?}"),
        }

        assert_eq!(peek_tag(&mut reader).unwrap(), None);
    }

    #[test]
    fn seeking() {
        let mut reader = Cursor::new([0u8; 8]);
        assert_eq!(stream_len(&mut reader).unwrap(), 8);
        assert!(seek_to(&mut reader, 8).is_ok());
        assert!(matches!(
            seek_to(&mut reader, 9),
            Err(ReadError::TruncatedStream)
        ));

        reader.set_position(2);
        assert!(skip(&mut reader, 4).is_ok());
        assert_eq!(reader.position(), 6);
        assert!(matches!(skip(&mut reader, 4), Err(ReadError::TruncatedStream)));
    }
}
