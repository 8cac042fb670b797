//! Streaming recording writer.

use std::io::Write;

use reel_core::PacketView;

use crate::codec::{encode_file_header, encode_packet_record};
use crate::error::FormatError;
use crate::types::FileHeader;

/// Streams a recording to any `Write` sink.
///
/// The file header is written up front by [`RecordingWriter::new`]; each
/// subsequent [`write`](RecordingWriter::write) appends one packet record.
/// The writer tracks the previous record's length so records form a
/// backward-walkable chain.
pub struct RecordingWriter<W: Write> {
    sink: W,
    prev_len: u32,
    bytes_written: usize,
    packets_written: usize,
}

impl<W: Write> RecordingWriter<W> {
    /// Write the file header and return a writer ready for packet records.
    pub fn new(mut sink: W, header: &FileHeader) -> Result<RecordingWriter<W>, FormatError> {
        encode_file_header(&mut sink, header)?;
        Ok(RecordingWriter {
            sink,
            prev_len: 0,
            bytes_written: header.total_len(),
            packets_written: 0,
        })
    }

    /// Append one packet record.
    pub fn write(&mut self, packet: PacketView<'_>) -> Result<(), FormatError> {
        encode_packet_record(&mut self.sink, packet, self.prev_len)?;
        let len = packet.record_len();
        self.prev_len = len as u32;
        self.bytes_written += len;
        self.packets_written += 1;
        log::trace!(
            "wrote record {} ({} {}, {} bytes)",
            self.packets_written,
            packet.mode,
            packet.code,
            len
        );
        Ok(())
    }

    /// Total bytes written so far, header included.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Packet records written so far.
    pub fn packets_written(&self) -> usize {
        self.packets_written
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<(), FormatError> {
        self.sink.flush()?;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W, FormatError> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_core::{Micros, MsgCode, Packet, PacketMode};

    fn header() -> FileHeader {
        FileHeader {
            seconds: 0,
            participant: 0,
            callsign: "srv".into(),
            contact: String::new(),
            protocol_version: "RP01".into(),
            app_version: "test".into(),
            content_hash: "0".into(),
            catalog: Vec::new(),
            world: Vec::new(),
        }
    }

    #[test]
    fn tracks_sizes_and_chain() {
        let h = header();
        let mut w = RecordingWriter::new(Vec::new(), &h).unwrap();
        assert_eq!(w.bytes_written(), h.total_len());

        let a = Packet::new(PacketMode::Live, MsgCode::CHAT, vec![0; 10], Micros(1));
        let b = Packet::new(PacketMode::Live, MsgCode::CHAT, vec![0; 20], Micros(2));
        w.write(a.view()).unwrap();
        w.write(b.view()).unwrap();

        assert_eq!(w.packets_written(), 2);
        assert_eq!(w.bytes_written(), h.total_len() + a.record_len() + b.record_len());

        let bytes = w.into_inner().unwrap();
        assert_eq!(bytes.len(), h.total_len() + a.record_len() + b.record_len());

        // The second record's prev-length field points at the first.
        let mut r = &bytes[h.total_len()..];
        let first = crate::codec::decode_packet_record(&mut r).unwrap().unwrap();
        let second = crate::codec::decode_packet_record(&mut r).unwrap().unwrap();
        assert_eq!(first.prev_len, 0);
        assert_eq!(second.prev_len, a.record_len() as u32);
    }
}
