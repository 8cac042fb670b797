//! The captured-packet model and protocol limits.

use std::fmt;

use crate::msg::MsgCode;
use crate::time::Micros;

/// Maximum byte length of a single protocol message payload.
pub const MAX_MESSAGE_LEN: usize = 1024;

/// Wire size of one packet-record header: mode, code (`u16` each), length,
/// previous length (`u32` each), and the timestamp split into two `u32`
/// words. The store's byte accounting includes this overhead so that the
/// in-memory byte budget matches the on-disk size of a saved buffer.
pub const PACKET_RECORD_OVERHEAD: usize = 2 + 2 + 4 + 4 + 4 + 4;

/// How a captured packet participates in playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketMode {
    /// Ordinary live traffic, replayed to stateful observers.
    Live,
    /// Captured for bookkeeping only; never forwarded to observers.
    Hidden,
    /// Part of a synthetic full-state snapshot.
    State,
}

impl PacketMode {
    /// Wire tag for this mode.
    pub fn wire_tag(self) -> u16 {
        match self {
            Self::Live => 0,
            Self::Hidden => 1,
            Self::State => 2,
        }
    }

    /// Decode a wire tag; unknown tags are rejected by the codec.
    pub fn from_wire(tag: u16) -> Option<PacketMode> {
        match tag {
            0 => Some(Self::Live),
            1 => Some(Self::Hidden),
            2 => Some(Self::State),
            _ => None,
        }
    }
}

impl fmt::Display for PacketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Live => "live",
            Self::Hidden => "hidden",
            Self::State => "state",
        };
        f.write_str(name)
    }
}

/// Who an outgoing server message was meant for.
///
/// The message feed reports this alongside each message; sender-only
/// traffic is captured [`Hidden`](PacketMode::Hidden) so playback never
/// forwards it to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Sent to every connected client.
    Broadcast,
    /// Sent only to the originating participant.
    SenderOnly,
}

impl Visibility {
    /// The capture mode for a live message of this visibility.
    pub fn capture_mode(self) -> PacketMode {
        match self {
            Self::Broadcast => PacketMode::Live,
            Self::SenderOnly => PacketMode::Hidden,
        }
    }
}

/// One captured or replayed protocol message, owning its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Playback mode tag.
    pub mode: PacketMode,
    /// Message-type identifier.
    pub code: MsgCode,
    /// Opaque serialized message body.
    pub payload: Vec<u8>,
    /// Capture time (monotonic microseconds, arbitrary epoch).
    pub timestamp: Micros,
    /// Byte length of the preceding packet in the same stream. Stored
    /// redundantly for validation and diagnostics; maintained by the
    /// file writer, not by the store.
    pub prev_len: u32,
}

impl Packet {
    /// Build a packet with `prev_len` left at zero (the writer fills it in
    /// when the packet is serialized).
    pub fn new(mode: PacketMode, code: MsgCode, payload: Vec<u8>, timestamp: Micros) -> Packet {
        Packet {
            mode,
            code,
            payload,
            timestamp,
            prev_len: 0,
        }
    }

    /// Bytes this packet occupies in a stream or in the store's budget:
    /// payload plus record header.
    pub fn record_len(&self) -> usize {
        self.payload.len() + PACKET_RECORD_OVERHEAD
    }

    /// Whether this packet is a snapshot-boundary packet: the full-roster
    /// marker that opens a snapshot block. The only safe alignment point
    /// for buffer eviction, save start points, and seek targets.
    pub fn is_boundary(&self) -> bool {
        self.mode == PacketMode::State && self.code == MsgCode::TEAM_UPDATE
    }

    /// A borrowed view of this packet for serialization.
    pub fn view(&self) -> PacketView<'_> {
        PacketView {
            mode: self.mode,
            code: self.code,
            payload: &self.payload,
            timestamp: self.timestamp,
        }
    }
}

/// A borrowed packet: the payload belongs to the caller for the duration
/// of the call.
///
/// Streaming capture serializes messages straight to the output file, so
/// there is no owned [`Packet`] to point at. This view type replaces the
/// original implementation's pointer-aliasing shortcut with an explicit
/// owns-versus-borrows distinction.
#[derive(Clone, Copy, Debug)]
pub struct PacketView<'a> {
    /// Playback mode tag.
    pub mode: PacketMode,
    /// Message-type identifier.
    pub code: MsgCode,
    /// Borrowed message body.
    pub payload: &'a [u8],
    /// Capture time.
    pub timestamp: Micros,
}

impl PacketView<'_> {
    /// Bytes this packet occupies in a stream: payload plus record header.
    pub fn record_len(&self) -> usize {
        self.payload.len() + PACKET_RECORD_OVERHEAD
    }

    /// Copy into an owning [`Packet`].
    pub fn to_owned(&self) -> Packet {
        Packet::new(self.mode, self.code, self.payload.to_vec(), self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_tags_round_trip() {
        for mode in [PacketMode::Live, PacketMode::Hidden, PacketMode::State] {
            assert_eq!(PacketMode::from_wire(mode.wire_tag()), Some(mode));
        }
        assert_eq!(PacketMode::from_wire(3), None);
    }

    #[test]
    fn boundary_requires_state_mode() {
        let state = Packet::new(
            PacketMode::State,
            MsgCode::TEAM_UPDATE,
            vec![0; 4],
            Micros(1),
        );
        let live = Packet::new(
            PacketMode::Live,
            MsgCode::TEAM_UPDATE,
            vec![0; 4],
            Micros(1),
        );
        assert!(state.is_boundary());
        assert!(!live.is_boundary());
    }

    #[test]
    fn record_len_includes_overhead() {
        let p = Packet::new(PacketMode::Live, MsgCode::CHAT, vec![0; 10], Micros(0));
        assert_eq!(p.record_len(), 10 + PACKET_RECORD_OVERHEAD);
        assert_eq!(p.view().record_len(), p.record_len());
    }

    #[test]
    fn sender_only_maps_to_hidden() {
        assert_eq!(Visibility::Broadcast.capture_mode(), PacketMode::Live);
        assert_eq!(Visibility::SenderOnly.capture_mode(), PacketMode::Hidden);
    }
}
