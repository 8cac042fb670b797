//! Streaming recording reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use reel_core::Packet;

use crate::codec::{decode_packet_record, decode_file_header, read_u32};
use crate::error::FormatError;
use crate::types::FileHeader;
use crate::MAGIC;

/// Streams a recording from any `Read` source.
///
/// [`RecordingReader::open`] validates the file header up front; packet
/// records are then pulled one at a time with
/// [`next_packet`](RecordingReader::next_packet), which distinguishes a
/// clean end of stream (`Ok(None)`) from truncation and corruption.
pub struct RecordingReader<R: Read> {
    source: R,
    header: FileHeader,
    packets_read: usize,
}

impl<R: Read> RecordingReader<R> {
    /// Validate the file header and return a reader positioned at the
    /// first packet record.
    pub fn open(mut source: R) -> Result<RecordingReader<R>, FormatError> {
        let header = decode_file_header(&mut source)?;
        log::debug!(
            "opened recording: callsign={} hash={} catalog={}B world={}B",
            header.callsign,
            header.content_hash,
            header.catalog.len(),
            header.world.len()
        );
        Ok(RecordingReader {
            source,
            header,
            packets_read: 0,
        })
    }

    /// The validated file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Read the next packet record, or `Ok(None)` at clean end of stream.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, FormatError> {
        let packet = decode_packet_record(&mut self.source)?;
        if packet.is_some() {
            self.packets_read += 1;
        }
        Ok(packet)
    }

    /// Packet records read so far.
    pub fn packets_read(&self) -> usize {
        self.packets_read
    }

    /// Consume the reader, iterating over the remaining packet records.
    pub fn packets(self) -> PacketIter<R> {
        PacketIter {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over the packet records of a [`RecordingReader`].
///
/// Yields `Err` at most once; iteration stops after the first failure
/// since the stream position can no longer be trusted.
pub struct PacketIter<R: Read> {
    reader: RecordingReader<R>,
    failed: bool,
}

impl<R: Read> Iterator for PacketIter<R> {
    type Item = Result<Packet, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Check whether the file at `path` starts with the recording magic.
///
/// Only the first four bytes are inspected; an unreadable or short file
/// is simply not a recording.
pub fn is_recording_file(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    match read_u32(&mut file) {
        Ok(magic) => magic == MAGIC,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::RecordingWriter;
    use reel_core::{Micros, MsgCode, Packet, PacketMode};

    fn header() -> FileHeader {
        FileHeader {
            seconds: 0,
            participant: 1,
            callsign: "srv".into(),
            contact: String::new(),
            protocol_version: "RP01".into(),
            app_version: "test".into(),
            content_hash: "abcd".into(),
            catalog: vec![1, 2],
            world: vec![3, 4, 5],
        }
    }

    fn sample(n: usize) -> Vec<Packet> {
        (0..n)
            .map(|i| {
                Packet::new(
                    PacketMode::Live,
                    MsgCode::CHAT,
                    vec![i as u8; i + 1],
                    Micros(i as i64 * 1_000),
                )
            })
            .collect()
    }

    fn record(packets: &[Packet]) -> Vec<u8> {
        let mut w = RecordingWriter::new(Vec::new(), &header()).unwrap();
        for p in packets {
            w.write(p.view()).unwrap();
        }
        w.into_inner().unwrap()
    }

    #[test]
    fn reads_back_what_was_written() {
        let packets = sample(5);
        let bytes = record(&packets);

        let mut r = RecordingReader::open(bytes.as_slice()).unwrap();
        assert_eq!(r.header().callsign, "srv");
        assert_eq!(r.header().world, vec![3, 4, 5]);

        for expected in &packets {
            let got = r.next_packet().unwrap().unwrap();
            assert_eq!(got.code, expected.code);
            assert_eq!(got.payload, expected.payload);
            assert_eq!(got.timestamp, expected.timestamp);
        }
        assert!(r.next_packet().unwrap().is_none());
        assert_eq!(r.packets_read(), 5);
    }

    #[test]
    fn iterator_stops_after_first_error() {
        let packets = sample(3);
        let mut bytes = record(&packets);
        bytes.truncate(bytes.len() - 1);

        let r = RecordingReader::open(bytes.as_slice()).unwrap();
        let results: Vec<_> = r.packets().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(FormatError::Truncated { .. })));
    }

    #[test]
    fn truncated_mid_header_fails_to_open() {
        let bytes = record(&sample(1));
        match RecordingReader::open(&bytes[..40]) {
            Ok(_) => panic!("open succeeded on a truncated header"),
            Err(e) => {
                assert!(matches!(e, FormatError::Truncated { .. } | FormatError::Io(_)))
            }
        }
    }

    #[test]
    fn magic_sniffing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.rec");
        let bad = dir.path().join("bad.rec");
        std::fs::write(&good, record(&sample(1))).unwrap();
        std::fs::write(&bad, b"not a recording").unwrap();

        assert!(is_recording_file(&good));
        assert!(!is_recording_file(&bad));
        assert!(!is_recording_file(&dir.path().join("missing.rec")));
    }
}
