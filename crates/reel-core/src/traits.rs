//! Trait seams to the rest of the server.
//!
//! The recording subsystem never touches sockets, the simulation, or the
//! configuration database directly. It sees them through these traits:
//! [`Deliver`] pushes one message to one observer connection, [`VarStore`]
//! is the external key/value configuration store, and [`StateSource`]
//! exposes the authoritative game state the snapshot generator flattens
//! into packets.

use crate::id::{ObjectId, ObserverId, ParticipantId, TeamId};
use crate::msg::MsgCode;

/// Outbound delivery primitive.
///
/// Must not block; the tick loop calls it while draining due packets.
pub trait Deliver {
    /// Push one message to one connected observer.
    fn deliver(&mut self, observer: ObserverId, code: MsgCode, payload: &[u8]);
}

/// External configuration-variable store.
pub trait VarStore {
    /// Visit every variable as a key/value pair.
    fn for_each(&self, visit: &mut dyn FnMut(&str, &str));

    /// Assign a variable. Called during playback when an embedded
    /// variable snapshot is applied.
    fn set(&mut self, key: &str, value: &str);
}

/// One team's roster entry in the score table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeamStanding {
    /// Team identifier.
    pub team: TeamId,
    /// Number of participants on the team.
    pub size: u16,
    /// Rounds won.
    pub won: u16,
    /// Rounds lost.
    pub lost: u16,
}

/// State of one active collectible object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectState {
    /// Object identifier.
    pub id: ObjectId,
    /// Object type from the catalog.
    pub kind: u16,
    /// Protocol status word.
    pub status: u16,
    /// Participant currently holding the object, if any.
    pub holder: Option<ParticipantId>,
    /// World position.
    pub position: [f32; 3],
}

/// A connected participant's join-equivalent descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantEntry {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Team assignment.
    pub team: TeamId,
    /// Display callsign.
    pub callsign: String,
    /// Transport address, recorded hidden for diagnostics.
    pub address: String,
}

/// Authoritative game state, read during snapshot generation.
///
/// A snapshot built from these answers must make an empty client converge
/// to the current server state without replaying history.
pub trait StateSource {
    /// Current team roster and scores.
    fn teams(&self) -> Vec<TeamStanding>;

    /// All active collectible objects.
    fn objects(&self) -> Vec<ObjectState>;

    /// Holder of the rotating turn order, if the game mode has one.
    fn turn_holder(&self) -> Option<ParticipantId>;

    /// Every connected participant.
    fn participants(&self) -> Vec<ParticipantEntry>;
}
