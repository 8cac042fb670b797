//! Binary encode/decode for packet records and the file header.
//!
//! All integers are network byte order. Text header fields are
//! fixed-width, NUL-padded, and truncated on write. The packet timestamp
//! is split into two 32-bit words (high word first) so the layout stays
//! friendly to 32-bit integer pipelines.

use std::io::{ErrorKind, Read, Write};

use reel_core::{Micros, MsgCode, Packet, PacketMode, PacketView, MAX_MESSAGE_LEN};

use crate::error::FormatError;
use crate::types::FileHeader;
use crate::{
    APP_VERSION_LEN, CALLSIGN_LEN, CONTACT_LEN, CONTENT_HASH_LEN, FILE_HEADER_LEN, FORMAT_VERSION,
    MAGIC, PROTOCOL_VERSION_LEN,
};

// ── Primitive writers ───────────────────────────────────────────

/// Write a network-byte-order u16.
pub fn write_u16(w: &mut dyn Write, v: u16) -> Result<(), FormatError> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

/// Write a network-byte-order u32.
pub fn write_u32(w: &mut dyn Write, v: u32) -> Result<(), FormatError> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

/// Write a network-byte-order f32.
pub fn write_f32(w: &mut dyn Write, v: f32) -> Result<(), FormatError> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

/// Write a 64-bit timestamp as two u32 words, high word first.
pub fn write_timestamp(w: &mut dyn Write, t: Micros) -> Result<(), FormatError> {
    let bits = t.0 as u64;
    write_u32(w, (bits >> 32) as u32)?;
    write_u32(w, (bits & 0xFFFF_FFFF) as u32)
}

/// Write a fixed-width, NUL-padded text field, truncating on a char
/// boundary if the string is too long.
pub fn write_fixed_str(w: &mut dyn Write, s: &str, width: usize) -> Result<(), FormatError> {
    let mut end = s.len().min(width);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let bytes = &s.as_bytes()[..end];
    w.write_all(bytes)?;
    for _ in bytes.len()..width {
        w.write_all(&[0])?;
    }
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a network-byte-order u16.
pub fn read_u16(r: &mut dyn Read) -> Result<u16, FormatError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a network-byte-order u32.
pub fn read_u32(r: &mut dyn Read) -> Result<u32, FormatError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a network-byte-order f32.
pub fn read_f32(r: &mut dyn Read) -> Result<f32, FormatError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_be_bytes(buf))
}

/// Read a timestamp written by [`write_timestamp`].
pub fn read_timestamp(r: &mut dyn Read) -> Result<Micros, FormatError> {
    let high = read_u32(r)? as u64;
    let low = read_u32(r)? as u64;
    Ok(Micros(((high << 32) | low) as i64))
}

/// Read a fixed-width text field, trimming NUL padding.
pub fn read_fixed_str(r: &mut dyn Read, width: usize) -> Result<String, FormatError> {
    let mut buf = vec![0u8; width];
    r.read_exact(&mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(width);
    buf.truncate(end);
    String::from_utf8(buf).map_err(|e| FormatError::Malformed {
        detail: format!("header text field is not UTF-8: {e}"),
    })
}

// ── Packet records ──────────────────────────────────────────────

/// Encode one packet record: mode, code, length, previous length, split
/// timestamp, then the raw payload bytes.
pub fn encode_packet_record(
    w: &mut dyn Write,
    p: PacketView<'_>,
    prev_len: u32,
) -> Result<(), FormatError> {
    write_u16(w, p.mode.wire_tag())?;
    write_u16(w, p.code.0)?;
    write_u32(w, p.payload.len() as u32)?;
    write_u32(w, prev_len)?;
    write_timestamp(w, p.timestamp)?;
    w.write_all(p.payload)?;
    Ok(())
}

/// Decode one packet record.
///
/// Returns `Ok(None)` on clean EOF (zero bytes before the record),
/// `Ok(Some(packet))` on success. A record whose declared length exceeds
/// [`MAX_MESSAGE_LEN`] is rejected with
/// [`OversizedPacket`](FormatError::OversizedPacket); the stream cannot be
/// trusted past it and the caller must abort the load.
pub fn decode_packet_record(r: &mut dyn Read) -> Result<Option<Packet>, FormatError> {
    // Fill the fixed record header byte-by-byte so clean EOF (zero bytes)
    // is distinguishable from truncation mid-header.
    let mut head = [0u8; 20];
    let mut filled = 0;
    while filled < head.len() {
        match r.read(&mut head[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(FormatError::Truncated {
                    detail: format!("record header: got {filled} of {} bytes", head.len()),
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FormatError::Io(e)),
        }
    }

    let mut cursor = &head[..];
    let mode_tag = read_u16(&mut cursor)?;
    let code = read_u16(&mut cursor)?;
    let len = read_u32(&mut cursor)?;
    let prev_len = read_u32(&mut cursor)?;
    let timestamp = read_timestamp(&mut cursor)?;

    let mode = PacketMode::from_wire(mode_tag).ok_or(FormatError::UnknownMode { tag: mode_tag })?;
    if len as usize > MAX_MESSAGE_LEN {
        return Err(FormatError::OversizedPacket { len });
    }

    let mut payload = vec![0u8; len as usize];
    r.read_exact(&mut payload).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            FormatError::Truncated {
                detail: format!("record payload: wanted {len} bytes"),
            }
        } else {
            FormatError::Io(e)
        }
    })?;

    Ok(Some(Packet {
        mode,
        code: MsgCode(code),
        payload,
        timestamp,
        prev_len,
    }))
}

// ── File header ─────────────────────────────────────────────────

/// Encode the file header: magic, version, sizes, fixed text fields, then
/// the catalog and world blobs as raw byte ranges.
pub fn encode_file_header(w: &mut dyn Write, h: &FileHeader) -> Result<(), FormatError> {
    write_u32(w, MAGIC)?;
    write_u32(w, FORMAT_VERSION)?;
    write_u32(w, h.total_len() as u32)?;
    write_u32(w, h.seconds)?;
    write_u32(w, h.participant)?;
    write_u32(w, h.catalog.len() as u32)?;
    write_u32(w, h.world.len() as u32)?;
    write_fixed_str(w, &h.callsign, CALLSIGN_LEN)?;
    write_fixed_str(w, &h.contact, CONTACT_LEN)?;
    write_fixed_str(w, &h.protocol_version, PROTOCOL_VERSION_LEN)?;
    write_fixed_str(w, &h.app_version, APP_VERSION_LEN)?;
    write_fixed_str(w, &h.content_hash, CONTENT_HASH_LEN)?;
    w.write_all(&h.catalog)?;
    w.write_all(&h.world)?;
    Ok(())
}

/// Decode and validate the file header.
///
/// Rejects a wrong magic or version before anything else is read, and a
/// total-size field that disagrees with the declared blob sizes.
pub fn decode_file_header(r: &mut dyn Read) -> Result<FileHeader, FormatError> {
    let magic = read_u32(r)?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic { found: magic });
    }
    let version = read_u32(r)?;
    if version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion { found: version });
    }

    let total = read_u32(r)? as usize;
    let seconds = read_u32(r)?;
    let participant = read_u32(r)?;
    let catalog_len = read_u32(r)? as usize;
    let world_len = read_u32(r)? as usize;

    if total != FILE_HEADER_LEN + catalog_len + world_len {
        return Err(FormatError::Malformed {
            detail: format!(
                "header size field {total} disagrees with blob sizes {catalog_len}+{world_len}"
            ),
        });
    }

    let callsign = read_fixed_str(r, CALLSIGN_LEN)?;
    let contact = read_fixed_str(r, CONTACT_LEN)?;
    let protocol_version = read_fixed_str(r, PROTOCOL_VERSION_LEN)?;
    let app_version = read_fixed_str(r, APP_VERSION_LEN)?;
    let content_hash = read_fixed_str(r, CONTENT_HASH_LEN)?;

    let mut catalog = vec![0u8; catalog_len];
    r.read_exact(&mut catalog).map_err(|e| truncated(e, "catalog blob"))?;
    let mut world = vec![0u8; world_len];
    r.read_exact(&mut world).map_err(|e| truncated(e, "world blob"))?;

    Ok(FileHeader {
        seconds,
        participant,
        callsign,
        contact,
        protocol_version,
        app_version,
        content_hash,
        catalog,
        world,
    })
}

fn truncated(e: std::io::Error, what: &str) -> FormatError {
    if e.kind() == ErrorKind::UnexpectedEof {
        FormatError::Truncated {
            detail: what.to_string(),
        }
    } else {
        FormatError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reel_core::PACKET_RECORD_OVERHEAD;

    fn header() -> FileHeader {
        FileHeader {
            seconds: 0,
            participant: 3,
            callsign: "watcher".into(),
            contact: "watcher@example.net".into(),
            protocol_version: "RP01".into(),
            app_version: "reel 0.1.0".into(),
            content_hash: "00ff".into(),
            catalog: vec![1, 2, 3],
            world: vec![9, 8, 7, 6],
        }
    }

    proptest! {
        #[test]
        fn roundtrip_u16(v in any::<u16>()) {
            let mut buf = Vec::new();
            write_u16(&mut buf, v).unwrap();
            prop_assert_eq!(read_u16(&mut buf.as_slice()).unwrap(), v);
        }

        #[test]
        fn roundtrip_u32(v in any::<u32>()) {
            let mut buf = Vec::new();
            write_u32(&mut buf, v).unwrap();
            prop_assert_eq!(read_u32(&mut buf.as_slice()).unwrap(), v);
        }

        #[test]
        fn roundtrip_f32(bits in any::<u32>()) {
            let v = f32::from_bits(bits);
            let mut buf = Vec::new();
            write_f32(&mut buf, v).unwrap();
            prop_assert_eq!(read_f32(&mut buf.as_slice()).unwrap().to_bits(), bits);
        }

        #[test]
        fn roundtrip_timestamp(v in any::<i64>()) {
            let mut buf = Vec::new();
            write_timestamp(&mut buf, Micros(v)).unwrap();
            prop_assert_eq!(read_timestamp(&mut buf.as_slice()).unwrap(), Micros(v));
        }

        #[test]
        fn roundtrip_fixed_str(s in "[a-zA-Z0-9 @.]{0,32}") {
            let mut buf = Vec::new();
            write_fixed_str(&mut buf, &s, 32).unwrap();
            prop_assert_eq!(buf.len(), 32);
            prop_assert_eq!(read_fixed_str(&mut buf.as_slice(), 32).unwrap(), s);
        }
    }

    #[test]
    fn timestamp_is_split_high_word_first() {
        let mut buf = Vec::new();
        write_timestamp(&mut buf, Micros(0x1122_3344_5566_7788)).unwrap();
        assert_eq!(buf, [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    }

    #[test]
    fn roundtrip_packet_record() {
        let p = Packet {
            mode: PacketMode::State,
            code: MsgCode::TEAM_UPDATE,
            payload: vec![5; 48],
            timestamp: Micros(123_456_789),
            prev_len: 0,
        };
        let mut buf = Vec::new();
        encode_packet_record(&mut buf, p.view(), 77).unwrap();
        assert_eq!(buf.len(), p.record_len());
        assert_eq!(buf.len(), 48 + PACKET_RECORD_OVERHEAD);

        let got = decode_packet_record(&mut buf.as_slice()).unwrap().unwrap();
        assert_eq!(got.mode, p.mode);
        assert_eq!(got.code, p.code);
        assert_eq!(got.payload, p.payload);
        assert_eq!(got.timestamp, p.timestamp);
        assert_eq!(got.prev_len, 77);
    }

    #[test]
    fn clean_eof_is_none() {
        let buf: Vec<u8> = Vec::new();
        assert!(decode_packet_record(&mut buf.as_slice()).unwrap().is_none());
    }

    #[test]
    fn partial_record_header_is_truncation() {
        for partial in 1..20 {
            let buf = vec![0u8; partial];
            let err = decode_packet_record(&mut buf.as_slice()).unwrap_err();
            assert!(
                matches!(err, FormatError::Truncated { .. }),
                "expected Truncated for {partial}-byte header, got {err}"
            );
        }
    }

    #[test]
    fn oversized_declared_length_is_rejected() {
        let p = Packet::new(PacketMode::Live, MsgCode::CHAT, vec![0; 4], Micros(0));
        let mut buf = Vec::new();
        encode_packet_record(&mut buf, p.view(), 0).unwrap();
        // Corrupt the length field (offset 4) to exceed the maximum.
        buf[4..8].copy_from_slice(&(MAX_MESSAGE_LEN as u32 + 1).to_be_bytes());
        let err = decode_packet_record(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, FormatError::OversizedPacket { .. }));
    }

    #[test]
    fn unknown_mode_tag_is_rejected() {
        let p = Packet::new(PacketMode::Live, MsgCode::CHAT, vec![], Micros(0));
        let mut buf = Vec::new();
        encode_packet_record(&mut buf, p.view(), 0).unwrap();
        buf[0..2].copy_from_slice(&9u16.to_be_bytes());
        let err = decode_packet_record(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, FormatError::UnknownMode { tag: 9 }));
    }

    #[test]
    fn roundtrip_file_header() {
        let h = header();
        let mut buf = Vec::new();
        encode_file_header(&mut buf, &h).unwrap();
        assert_eq!(buf.len(), h.total_len());
        let got = decode_file_header(&mut buf.as_slice()).unwrap();
        assert_eq!(got, h);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut buf = Vec::new();
        encode_file_header(&mut buf, &header()).unwrap();
        buf[0] = b'X';
        let err = decode_file_header(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, FormatError::BadMagic { .. }));
    }

    #[test]
    fn bad_version_rejected() {
        let mut buf = Vec::new();
        encode_file_header(&mut buf, &header()).unwrap();
        buf[4..8].copy_from_slice(&99u32.to_be_bytes());
        let err = decode_file_header(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedVersion { found: 99 }));
    }

    #[test]
    fn disagreeing_size_fields_rejected() {
        let mut buf = Vec::new();
        encode_file_header(&mut buf, &header()).unwrap();
        // total-size field is at offset 8
        buf[8..12].copy_from_slice(&1u32.to_be_bytes());
        let err = decode_file_header(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, FormatError::Malformed { .. }));
    }
}
