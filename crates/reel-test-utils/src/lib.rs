//! Test utilities and mock types for Reel development.
//!
//! Provides mock implementations of the core trait seams ([`Deliver`],
//! [`VarStore`], [`StateSource`], [`Clock`]) so recording and playback
//! can be exercised without a real server behind them.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexMap;

use reel_core::{
    Clock, Deliver, Micros, MsgCode, ObjectState, ObserverId, ParticipantEntry, ParticipantId,
    StateSource, TeamId, TeamStanding, VarStore,
};

/// Mock implementation of [`Deliver`] that logs every delivered message.
///
/// Inspect [`sent`](MockDeliver::sent) after running code under test, or
/// filter with [`sent_to`](MockDeliver::sent_to).
#[derive(Default)]
pub struct MockDeliver {
    pub sent: Vec<(ObserverId, MsgCode, Vec<u8>)>,
}

impl MockDeliver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered to one observer, in delivery order.
    pub fn sent_to(&self, observer: ObserverId) -> Vec<(MsgCode, Vec<u8>)> {
        self.sent
            .iter()
            .filter(|(o, _, _)| *o == observer)
            .map(|(_, c, p)| (*c, p.clone()))
            .collect()
    }

    /// Count of messages delivered to one observer with the given code.
    pub fn count_of(&self, observer: ObserverId, code: MsgCode) -> usize {
        self.sent
            .iter()
            .filter(|(o, c, _)| *o == observer && *c == code)
            .count()
    }
}

impl Deliver for MockDeliver {
    fn deliver(&mut self, observer: ObserverId, code: MsgCode, payload: &[u8]) {
        self.sent.push((observer, code, payload.to_vec()));
    }
}

/// Mock implementation of [`VarStore`].
///
/// Backed by an `IndexMap` so iteration order matches insertion order,
/// keeping variable snapshots deterministic across runs.
#[derive(Default)]
pub struct MockVarStore {
    vars: IndexMap<String, String>,
}

impl MockVarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a variable before running code under test.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Read back a variable for test assertions.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl VarStore for MockVarStore {
    fn for_each(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (k, v) in &self.vars {
            visit(k, v);
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }
}

/// Mock implementation of [`StateSource`] with settable state.
#[derive(Default)]
pub struct MockState {
    pub teams: Vec<TeamStanding>,
    pub objects: Vec<ObjectState>,
    pub turn_holder: Option<ParticipantId>,
    pub participants: Vec<ParticipantEntry>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small fixture: two teams, two participants, one held object.
    pub fn fixture() -> Self {
        MockState {
            teams: vec![
                TeamStanding {
                    team: TeamId(0),
                    size: 1,
                    won: 2,
                    lost: 1,
                },
                TeamStanding {
                    team: TeamId(1),
                    size: 1,
                    won: 1,
                    lost: 2,
                },
            ],
            objects: vec![ObjectState {
                id: reel_core::ObjectId(4),
                kind: 7,
                status: 1,
                holder: Some(ParticipantId(2)),
                position: [1.0, -2.0, 0.5],
            }],
            turn_holder: None,
            participants: vec![
                ParticipantEntry {
                    id: ParticipantId(2),
                    team: TeamId(0),
                    callsign: "alpha".into(),
                    address: "10.0.0.2:5154".into(),
                },
                ParticipantEntry {
                    id: ParticipantId(3),
                    team: TeamId(1),
                    callsign: "bravo".into(),
                    address: "10.0.0.3:5154".into(),
                },
            ],
        }
    }
}

impl StateSource for MockState {
    fn teams(&self) -> Vec<TeamStanding> {
        self.teams.clone()
    }

    fn objects(&self) -> Vec<ObjectState> {
        self.objects.clone()
    }

    fn turn_holder(&self) -> Option<ParticipantId> {
        self.turn_holder
    }

    fn participants(&self) -> Vec<ParticipantEntry> {
        self.participants.clone()
    }
}

/// A [`Clock`] that only moves when told to.
pub struct ManualClock {
    now: Micros,
}

impl ManualClock {
    pub fn new(start: Micros) -> Self {
        ManualClock { now: start }
    }

    /// Move the clock forward.
    pub fn advance(&mut self, by: Micros) {
        self.now = self.now + by;
    }

    pub fn set(&mut self, now: Micros) {
        self.now = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Micros {
        self.now
    }
}
