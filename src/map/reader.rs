use std::io::Cursor;

use byteorder::{LE, ReadBytesExt};
use serde::Serialize;

use super::Section;
use super::error::{DecodeErrorKind, Result, ResultExt};

/// Forward-only reader of the primitive types that make up a MAP file. Every
/// read either consumes exactly the bytes of the field or fails with
/// `TruncatedInput` without moving.
pub struct MapReader<'a> {
    buf: Cursor<&'a [u8]>,
}

impl<'a> MapReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { buf: Cursor::new(bytes) }
    }

    /// Byte offset of the next read
    pub fn position(&self) -> usize {
        self.buf.position() as usize
    }

    pub fn len(&self) -> usize {
        self.buf.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    pub fn at_end(&self) -> bool {
        self.remaining() == 0
    }

    fn require(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(DecodeErrorKind::TruncatedInput {
                offset: self.position(),
                needed,
                remaining,
            }
            .into());
        }
        Ok(())
    }

    fn truncated(&self, needed: usize) -> DecodeErrorKind {
        DecodeErrorKind::TruncatedInput {
            offset: self.position(),
            needed,
            remaining: self.remaining(),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        Ok(self.buf.read_u8().map_err(|_| self.truncated(1))?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        Ok(self.buf.read_u16::<LE>().map_err(|_| self.truncated(2))?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        Ok(self.buf.read_u32::<LE>().map_err(|_| self.truncated(4))?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.require(4)?;
        Ok(self.buf.read_f32::<LE>().map_err(|_| self.truncated(4))?)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? == 1)
    }

    /// Borrow the next `len` bytes of the buffer
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.require(len)?;
        let start = self.position();
        let bytes: &'a [u8] = *self.buf.get_ref();
        self.buf.set_position((start + len) as u64);
        Ok(&bytes[start..start + len])
    }

    pub fn read_u16_array<const N: usize>(&mut self) -> Result<[u16; N]> {
        self.require(N * 2)?;
        let mut array = [0u16; N];
        for x in array.iter_mut() {
            *x = self.read_u16()?;
        }
        Ok(array)
    }

    pub fn read_u32_array<const N: usize>(&mut self) -> Result<[u32; N]> {
        self.require(N * 4)?;
        let mut array = [0u32; N];
        for x in array.iter_mut() {
            *x = self.read_u32()?;
        }
        Ok(array)
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        self.require(N * 4)?;
        let mut array = [0f32; N];
        for x in array.iter_mut() {
            *x = self.read_f32()?;
        }
        Ok(array)
    }

    /// Length-prefixed string. The length includes the NUL terminator, which
    /// is not returned.
    pub fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let offset = self.position();
        let len = self.read_u32()? as usize;
        if len == 0 {
            return Err(DecodeErrorKind::InvalidString { offset }.into());
        }
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|&c| c == 0).unwrap_or(len);
        Ok(&bytes[..end])
    }

    /// Length-prefixed string converted from Latin1
    pub fn read_string(&mut self) -> Result<String> {
        Ok(latin1_to_utf8(self.read_cstring()?))
    }

    /// Read a string that must equal `expected` exactly
    pub fn expect_marker(&mut self, expected: &'static str) -> Result<String> {
        let offset = self.position();
        let found = self.read_string()?;
        if found != expected {
            return Err(DecodeErrorKind::MarkerMismatch { offset, expected, found }.into());
        }
        Ok(found)
    }

    /// Read a `u32` count followed by that many entries. `what` names an
    /// entry in error messages.
    pub fn read_list<T, F>(&mut self, what: &'static str, mut read: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let n = self.read_u32().with_context(|| format!("{what} count"))? as usize;
        self.read_counted(what, n, |r, _| read(r))
    }

    /// Read `n` entries whose count was declared elsewhere in the record
    pub fn read_counted<T, F>(
        &mut self,
        what: &'static str,
        n: usize,
        mut read: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self, usize) -> Result<T>,
    {
        let mut entries = Vec::with_capacity(self.preallocation::<T>(n));
        for i in 0..n {
            entries.push(read(self, i).with_context(|| format!("{what} {i} of {n}"))?);
        }
        Ok(entries)
    }

    /// Entries to reserve for a list of `n`. A corrupt count must not turn
    /// into an allocation larger than the bytes left to decode.
    fn preallocation<T>(&self, n: usize) -> usize {
        n.min(self.remaining() / std::mem::size_of::<T>().max(1))
    }
}

/// Common prefix of most records: `u32 size`, `u32 id` and a name. A name of
/// "Version" is followed by a version number and the real name; this appears
/// to be a convention of the exporter.
#[derive(Clone, Debug, Serialize)]
pub struct RecordHeader {
    /// Size in bytes of the whole record, counted from the start of this
    /// field. `None` for records written without one.
    pub size: Option<u32>,
    pub id: u32,
    pub version: Option<u32>,
    pub name: String,
}

impl RecordHeader {
    pub fn read(r: &mut MapReader) -> Result<Self> {
        let size = r.read_u32().context("record size")?;
        let mut header = Self::read_short(r)?;
        header.size = Some(size);
        Ok(header)
    }

    /// A record header without the leading size
    pub fn read_short(r: &mut MapReader) -> Result<Self> {
        let id = r.read_u32().context("record id")?;
        let mut name = r.read_cstring().context("record name")?;
        let mut version = None;
        if name == b"Version" {
            version = Some(r.read_u32().context("version number")?);
            name = r.read_cstring().context("record name after version")?;
        }
        Ok(Self {
            size: None,
            id,
            version,
            name: latin1_to_utf8(name),
        })
    }

    /// Read the header that opens a section and check its marker
    pub fn read_section(r: &mut MapReader, section: Section) -> Result<Self> {
        let start = r.position();
        let header = Self::read(r).context("section header")?;
        if header.name != section.marker() {
            // The name follows the size and id fields
            return Err(DecodeErrorKind::MarkerMismatch {
                offset: start + 8,
                expected: section.marker(),
                found: header.name,
            }
            .into());
        }
        Ok(header)
    }

    /// Bytes of the record left after `start` when the reader is at
    /// `position`. `None` when the record has no size or is already overrun.
    pub fn trailing_len(&self, start: usize, position: usize) -> Option<usize> {
        let consumed = position.checked_sub(start)?;
        (self.size? as usize).checked_sub(consumed)
    }
}

/// Strings are ISO-8859-1 (Latin1) and must be converted properly. For example,
/// "intérieur" 7th byte is 0xE9 in Latin1 (and in MAP files) but this is
/// 0xC3 0xA9 byte sequence in UTF-8.
pub fn latin1_to_utf8(s: &[u8]) -> String {
    s.iter().map(|&c| c as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cstring(s: &[u8]) -> Vec<u8> {
        let mut out = ((s.len() + 1) as u32).to_le_bytes().to_vec();
        out.extend_from_slice(s);
        out.push(0);
        out
    }

    #[test]
    fn reads_advance_by_field_size() {
        let mut bytes = vec![0x7f];
        bytes.extend_from_slice(&0xbeefu16.to_le_bytes());
        bytes.extend_from_slice(&42u32.to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());

        let mut r = MapReader::new(&bytes);
        assert_eq!(r.read_u8().unwrap(), 0x7f);
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u16().unwrap(), 0xbeef);
        assert_eq!(r.position(), 3);
        assert_eq!(r.read_u32().unwrap(), 42);
        assert_eq!(r.remaining(), 4);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert!(r.at_end());
    }

    #[test]
    fn truncated_read_reports_offset_and_does_not_move() {
        let bytes = [1, 2, 3];
        let mut r = MapReader::new(&bytes);
        r.read_u8().unwrap();

        let err = r.read_u32().unwrap_err();
        match err.kind {
            DecodeErrorKind::TruncatedInput { offset, needed, remaining } => {
                assert_eq!((offset, needed, remaining), (1, 4, 2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn cstring_drops_terminator_and_converts_latin1() {
        let bytes = cstring(b"int\xe9rieur");
        let mut r = MapReader::new(&bytes);
        assert_eq!(r.read_string().unwrap(), "intérieur");
        assert!(r.at_end());
    }

    #[test]
    fn zero_length_string_is_rejected() {
        let bytes = 0u32.to_le_bytes();
        let err = MapReader::new(&bytes).read_cstring().unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::InvalidString { offset: 0 }));
    }

    #[test]
    fn marker_mismatch_names_both_strings() {
        let bytes = cstring(b"EndMop");
        let err = MapReader::new(&bytes).expect_marker("EndMap").unwrap_err();
        match err.kind {
            DecodeErrorKind::MarkerMismatch { offset, expected, found } => {
                assert_eq!(offset, 0);
                assert_eq!(expected, "EndMap");
                assert_eq!(found, "EndMop");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn record_header_with_version() {
        let mut bytes = 99u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend(cstring(b"Version"));
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend(cstring(b"WI_plain5"));

        let mut r = MapReader::new(&bytes);
        let header = RecordHeader::read(&mut r).unwrap();
        assert_eq!(header.size, Some(99));
        assert_eq!(header.id, 7);
        assert_eq!(header.version, Some(1));
        assert_eq!(header.name, "WI_plain5");
        assert_eq!(header.trailing_len(0, r.position()), Some(99 - bytes.len()));
    }

    #[test]
    fn corrupt_count_reserves_at_most_the_remaining_bytes() {
        let bytes = [0u8; 100];
        let r = MapReader::new(&bytes);
        assert_eq!(r.preallocation::<[u8; 40]>(u32::MAX as usize), 2);
        assert_eq!(r.preallocation::<u16>(3), 3);
        assert_eq!(r.preallocation::<()>(7), 7);
    }

    #[test]
    fn read_list_stops_at_first_bad_entry() {
        let mut bytes = 3u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0, 2, 0]);

        let err = MapReader::new(&bytes)
            .read_list("index", |r| r.read_u16())
            .unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::TruncatedInput { offset: 8, .. }));
        assert_eq!(err.context, ["index 2 of 3"]);
    }
}
