//! Protocol message-type codes.

use std::fmt;

/// A protocol message-type identifier.
///
/// Codes are two ASCII characters packed big-endian into a `u16`, matching
/// how they appear on the wire. The subsystem only interprets the handful
/// of codes listed below; everything else passes through opaquely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MsgCode(pub u16);

/// Pack two ASCII characters into a wire code.
const fn code(a: u8, b: u8) -> u16 {
    ((a as u16) << 8) | (b as u16)
}

impl MsgCode {
    /// Full team/score roster. This is the snapshot-boundary marker: a
    /// `State`-mode packet with this code opens every snapshot block and is
    /// the only safe alignment point for eviction, save starts, and seeks.
    pub const TEAM_UPDATE: MsgCode = MsgCode(code(b'T', b'U'));
    /// Positions and status of active collectible objects.
    pub const OBJECT_UPDATE: MsgCode = MsgCode(code(b'O', b'U'));
    /// Rotating-turn-order designation.
    pub const TURN_DESIGNATE: MsgCode = MsgCode(code(b'T', b'D'));
    /// A participant joining (or, in a snapshot, its join-equivalent
    /// descriptor).
    pub const ADD_PARTICIPANT: MsgCode = MsgCode(code(b'A', b'P'));
    /// A participant leaving.
    pub const REMOVE_PARTICIPANT: MsgCode = MsgCode(code(b'R', b'P'));
    /// Transport-level participant details; recorded hidden, never replayed
    /// to observers.
    pub const ADMIN_INFO: MsgCode = MsgCode(code(b'A', b'I'));
    /// A batch of configuration-variable assignments.
    pub const SET_VARIABLE: MsgCode = MsgCode(code(b'S', b'V'));
    /// Instructs observer clients to drop replayed state.
    pub const REPLAY_RESET: MsgCode = MsgCode(code(b'R', b'R'));
    /// Chat traffic.
    pub const CHAT: MsgCode = MsgCode(code(b'C', b'H'));

    /// Debug name for the codes this subsystem interprets.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::TEAM_UPDATE => Some("TeamUpdate"),
            Self::OBJECT_UPDATE => Some("ObjectUpdate"),
            Self::TURN_DESIGNATE => Some("TurnDesignate"),
            Self::ADD_PARTICIPANT => Some("AddParticipant"),
            Self::REMOVE_PARTICIPANT => Some("RemoveParticipant"),
            Self::ADMIN_INFO => Some("AdminInfo"),
            Self::SET_VARIABLE => Some("SetVariable"),
            Self::REPLAY_RESET => Some("ReplayReset"),
            Self::CHAT => Some("Chat"),
            _ => None,
        }
    }
}

impl fmt::Display for MsgCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Msg(0x{:04X})", self.0),
        }
    }
}

impl From<u16> for MsgCode {
    fn from(v: u16) -> Self {
        Self(v)
    }
}
