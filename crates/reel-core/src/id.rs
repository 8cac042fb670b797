//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a connected replay observer.
///
/// Observers are the connections that receive replayed traffic. The id is
/// assigned by the transport layer and treated as opaque here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u32);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObserverId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a participant (player slot) in the recorded session.
///
/// Participant ids appear inside snapshot payloads, so the width is fixed
/// by the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub u8);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ParticipantId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

/// Identifies a team in the score roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub u8);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for TeamId {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

/// Identifies a collectible object in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u16);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ObjectId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}
