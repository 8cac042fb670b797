//! The replay session state machine.
//!
//! A loaded recording becomes an in-memory packet store, a virtual-time
//! cursor, and a computed virtual-to-wall-clock offset. Each connected
//! observer walks a three-state handshake that guarantees it receives a
//! complete state bootstrap before any live traffic.

use indexmap::IndexMap;
use smallvec::SmallVec;

use reel_core::{Deliver, Micros, MsgCode, ObserverId, PacketMode, VarStore, WorldContent};
use reel_format::{content_hash, RecordingReader};
use reel_store::{PacketId, PacketStore};

use crate::config::RecorderConfig;
use crate::error::SessionError;
use crate::files;
use crate::snapshot;

/// Virtual-timestamp gap that triggers an inactivity notice.
const INACTIVITY_GAP: Micros = Micros(10 * Micros::PER_SEC);

/// Sentinel returned by [`ReplaySession::next_due`] when nothing is
/// playing, large enough that any scheduler treats it as "not soon".
const IDLE_SENTINEL_SECS: f64 = 1000.0;

/// Per-observer bootstrap progress during playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeState {
    /// Has received nothing yet; waiting for a snapshot boundary.
    NoState,
    /// Receiving the state bootstrap.
    Receiving,
    /// Fully caught up; receives live traffic.
    Stateful,
}

struct ObserverEntry {
    handshake: HandshakeState,
    shadow: bool,
}

/// Out-of-band events surfaced by a delivery tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayNotice {
    /// The cursor ran off the end; playback stopped and the cursor was
    /// reset to the start.
    Finished,
    /// The next packet's virtual timestamp is far ahead of the one just
    /// delivered.
    InactivityAhead {
        /// Size of the gap in whole seconds.
        seconds: i64,
    },
}

/// What a successful load found.
#[derive(Clone, Debug)]
pub struct LoadReport {
    /// Packets preloaded into memory.
    pub packets: usize,
    /// Bytes preloaded, wire overhead included.
    pub bytes: usize,
    /// Configuration variables applied from the leading snapshot.
    pub variables: usize,
    /// Whether the server's active content was hot-swapped to match the
    /// recording.
    pub content_swapped: bool,
    /// Callsign of the participant that saved the recording.
    pub callsign: String,
}

/// What a skip actually did.
#[derive(Clone, Copy, Debug)]
pub struct SkipReport {
    /// Seconds that were asked for.
    pub requested_secs: i64,
    /// Seconds the cursor actually moved in virtual time, after boundary
    /// alignment and clamping.
    pub actual_secs: f64,
    /// Whether the cursor moved at all.
    pub moved: bool,
}

/// The replay session.
///
/// Like [`RecordSession`](crate::record::RecordSession), every
/// time-dependent operation takes `now` explicitly.
pub struct ReplaySession {
    config: RecorderConfig,
    store: PacketStore,
    cursor: Option<PacketId>,
    offset: Micros,
    loaded: bool,
    playing: bool,
    observers: IndexMap<ObserverId, ObserverEntry>,
}

impl ReplaySession {
    /// Create a session with nothing loaded.
    pub fn new(config: RecorderConfig) -> ReplaySession {
        ReplaySession {
            config,
            store: PacketStore::new(),
            cursor: None,
            offset: Micros::ZERO,
            loaded: false,
            playing: false,
            observers: IndexMap::new(),
        }
    }

    /// Whether a recording is loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether playback is running.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Packets currently loaded.
    pub fn packet_count(&self) -> usize {
        self.store.packet_count()
    }

    /// Bytes currently loaded, wire overhead included.
    pub fn byte_count(&self) -> usize {
        self.store.byte_count()
    }

    /// Virtual timestamp of the packet under the cursor.
    pub fn cursor_timestamp(&self) -> Option<Micros> {
        self.cursor
            .and_then(|id| self.store.get(id))
            .map(|p| p.timestamp)
    }

    /// Load a recording file.
    ///
    /// Preloads packets up to the configured byte budget, positions the
    /// cursor at the oldest packet, and applies the recording's leading
    /// variable snapshot so live configuration matches the recording
    /// before playback begins. If the file's embedded content differs
    /// from the server's, the active content is hot-swapped and the
    /// report says so. Any decode failure aborts the load and fully
    /// resets the session.
    pub fn load(
        &mut self,
        name: &str,
        world: &mut WorldContent,
        vars: &mut dyn VarStore,
    ) -> Result<LoadReport, SessionError> {
        self.reset();

        let source = files::open_read(&self.config.dir, name)?;
        let mut reader = RecordingReader::open(source)?;
        let header = reader.header().clone();

        let content_swapped = if world.matches(&header.catalog, &header.world) {
            false
        } else {
            let hash = content_hash(&header.catalog, &header.world);
            log::warn!(
                "recording content differs from the active content; hot-swapping (hash {hash})"
            );
            world.swap(header.catalog.clone(), header.world.clone(), hash);
            true
        };

        loop {
            match reader.next_packet() {
                Ok(Some(packet)) => {
                    if !self.store.is_empty()
                        && self.store.byte_count() + packet.record_len() > self.config.max_bytes
                    {
                        log::debug!(
                            "preload window full at {} packets",
                            self.store.packet_count()
                        );
                        break;
                    }
                    self.store.append(packet);
                }
                Ok(None) => break,
                Err(e) => {
                    self.reset();
                    return Err(e.into());
                }
            }
        }

        if self.store.is_empty() {
            self.reset();
            return Err(SessionError::NotFound {
                detail: format!("recording {name} has no packets"),
            });
        }

        self.cursor = self.store.tail();
        let variables = self.preload_variables(vars);
        if variables == 0 {
            self.reset();
            return Err(SessionError::NotFound {
                detail: format!("recording {name} has no leading variable snapshot"),
            });
        }

        self.loaded = true;
        self.reset_handshakes();
        log::debug!(
            "loaded {name}: {} packets, {} bytes",
            self.store.packet_count(),
            self.store.byte_count()
        );
        Ok(LoadReport {
            packets: self.store.packet_count(),
            bytes: self.store.byte_count(),
            variables,
            content_swapped,
            callsign: header.callsign,
        })
    }

    /// Start playback.
    ///
    /// Anchors the cursor's recorded timestamp to `now` and resets every
    /// observer's handshake. Fails if nothing is loaded.
    pub fn play(&mut self, now: Micros) -> Result<(), SessionError> {
        let cursor = self.require_loaded()?;
        if let Some(packet) = self.store.get(cursor) {
            self.offset = now - packet.timestamp;
        }
        self.reset_handshakes();
        self.playing = true;
        log::debug!("playback started (offset {})", self.offset);
        Ok(())
    }

    /// Seek by a signed number of seconds of virtual time.
    ///
    /// Always lands on a snapshot-boundary packet, or clamps to the
    /// newest (forward) or oldest (backward) loaded packet when no
    /// boundary matches. A cursor move resets every observer's handshake,
    /// since a jump invalidates partially-received state.
    pub fn skip(&mut self, now: Micros, delta_secs: i64) -> Result<SkipReport, SessionError> {
        let cursor = self.require_loaded()?;
        let cursor_ts = self
            .store
            .get(cursor)
            .map_or(Micros::ZERO, |p| p.timestamp);

        let current = if self.playing { now - self.offset } else { cursor_ts };
        let target = current + Micros::from_secs(delta_secs);

        let new_cursor = if delta_secs >= 0 {
            self.store
                .iter_from(cursor)
                .find(|(id, p)| p.timestamp >= target && (*id == cursor || p.is_boundary()))
                .map(|(id, _)| id)
                .or_else(|| self.store.head())
        } else {
            let mut at = Some(cursor);
            let mut found = None;
            while let Some(id) = at {
                if let Some(p) = self.store.get(id) {
                    if p.timestamp <= target && p.is_boundary() {
                        found = Some(id);
                        break;
                    }
                }
                at = self.store.prev(id);
            }
            found.or_else(|| self.store.tail())
        }
        .unwrap_or(cursor);

        let new_ts = self
            .store
            .get(new_cursor)
            .map_or(cursor_ts, |p| p.timestamp);
        let moved = new_cursor != cursor;
        self.cursor = Some(new_cursor);
        self.offset = now - new_ts;
        if moved {
            self.reset_handshakes();
        }
        log::debug!(
            "skip {delta_secs}s: cursor {} -> {} ({moved})",
            cursor,
            new_cursor
        );
        Ok(SkipReport {
            requested_secs: delta_secs,
            actual_secs: (new_ts - current).as_secs_f64(),
            moved,
        })
    }

    /// Deliver every due packet to every eligible observer.
    ///
    /// Hidden packets advance configuration bookkeeping but are never
    /// forwarded. Returns out-of-band notices; the caller decides how to
    /// present them.
    pub fn deliver_due(
        &mut self,
        now: Micros,
        out: &mut dyn Deliver,
        vars: &mut dyn VarStore,
    ) -> SmallVec<[ReplayNotice; 2]> {
        let mut notices = SmallVec::new();
        if !self.playing {
            return notices;
        }

        loop {
            let Some(cursor) = self.cursor else {
                self.finish(&mut notices);
                break;
            };
            let Some(packet) = self.store.get(cursor) else {
                self.finish(&mut notices);
                break;
            };
            if packet.timestamp + self.offset > now {
                break;
            }

            match packet.mode {
                PacketMode::Hidden => {
                    if packet.code == MsgCode::SET_VARIABLE {
                        snapshot::apply_variables(&packet.payload, vars);
                    }
                }
                mode => {
                    let state_packet = mode == PacketMode::State;
                    let boundary = packet.is_boundary();
                    for (observer, entry) in self.observers.iter_mut() {
                        if entry.shadow {
                            continue;
                        }
                        if state_packet {
                            if boundary {
                                entry.handshake = match entry.handshake {
                                    HandshakeState::NoState => HandshakeState::Receiving,
                                    _ => HandshakeState::Stateful,
                                };
                            }
                            if entry.handshake == HandshakeState::Receiving {
                                out.deliver(*observer, packet.code, &packet.payload);
                            }
                        } else {
                            if entry.handshake == HandshakeState::Receiving {
                                entry.handshake = HandshakeState::Stateful;
                            }
                            if entry.handshake == HandshakeState::Stateful {
                                out.deliver(*observer, packet.code, &packet.payload);
                            }
                        }
                    }
                }
            }

            let next = self.store.next(cursor);
            if let Some(next_id) = next {
                if let Some(next_packet) = self.store.get(next_id) {
                    let gap = next_packet.timestamp - packet.timestamp;
                    if gap > INACTIVITY_GAP {
                        notices.push(ReplayNotice::InactivityAhead {
                            seconds: gap.0 / Micros::PER_SEC,
                        });
                    }
                }
                self.cursor = next;
            } else {
                self.finish(&mut notices);
                break;
            }
        }
        notices
    }

    /// Seconds until the cursor's next packet is due, or a large sentinel
    /// when not playing. Lets the tick loop decide whether to call
    /// [`deliver_due`](ReplaySession::deliver_due) this tick.
    pub fn next_due(&self, now: Micros) -> f64 {
        if !self.playing {
            return IDLE_SENTINEL_SECS;
        }
        match self.cursor.and_then(|id| self.store.get(id)) {
            Some(packet) => ((packet.timestamp + self.offset) - now).as_secs_f64(),
            None => IDLE_SENTINEL_SECS,
        }
    }

    /// Change the preload byte budget. Takes effect on the next load.
    pub fn set_budget(&mut self, max_bytes: usize) {
        self.config.max_bytes = max_bytes;
    }

    /// Register a connected observer. Shadow observers are tracked but
    /// never delivered to.
    pub fn observer_joined(&mut self, id: ObserverId, shadow: bool) {
        self.observers.insert(
            id,
            ObserverEntry {
                handshake: HandshakeState::NoState,
                shadow,
            },
        );
    }

    /// Drop a disconnected observer.
    pub fn observer_left(&mut self, id: ObserverId) {
        self.observers.shift_remove(&id);
    }

    /// Connected observers, shadows included.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Unload everything. The observer roster survives; handshake state
    /// does not.
    pub fn reset(&mut self) {
        self.store.clear();
        self.cursor = None;
        self.offset = Micros::ZERO;
        self.loaded = false;
        self.playing = false;
        self.reset_handshakes();
    }

    fn require_loaded(&self) -> Result<PacketId, SessionError> {
        match self.cursor {
            Some(cursor) if self.loaded => Ok(cursor),
            _ => Err(SessionError::StateConflict {
                detail: "no recording loaded".to_string(),
            }),
        }
    }

    fn reset_handshakes(&mut self) {
        for entry in self.observers.values_mut() {
            entry.handshake = HandshakeState::NoState;
        }
    }

    /// End of stream: stop playback, park the cursor back at the start.
    fn finish(&mut self, notices: &mut SmallVec<[ReplayNotice; 2]>) {
        self.playing = false;
        self.cursor = self.store.tail();
        self.reset_handshakes();
        notices.push(ReplayNotice::Finished);
        log::debug!("playback finished; cursor reset");
    }

    /// Apply the variable snapshot at the head of the stream.
    ///
    /// Scans forward for the first State-mode `SET_VARIABLE` packet and
    /// applies only that contiguous run, stopping at the first packet
    /// that breaks it. Later variable updates in the recording are left
    /// for playback to apply when the cursor reaches them. Returns the
    /// number of variables applied.
    fn preload_variables(&self, vars: &mut dyn VarStore) -> usize {
        let mut applied = 0;
        let mut in_run = false;
        for (_, packet) in self.store.iter() {
            let snapshot_var =
                packet.mode == PacketMode::State && packet.code == MsgCode::SET_VARIABLE;
            if snapshot_var {
                in_run = true;
                applied += snapshot::apply_variables(&packet.payload, vars);
            } else if in_run {
                break;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoVars;

    impl VarStore for NoVars {
        fn for_each(&self, _visit: &mut dyn FnMut(&str, &str)) {}
        fn set(&mut self, _key: &str, _value: &str) {}
    }

    struct NoDeliver;

    impl Deliver for NoDeliver {
        fn deliver(&mut self, _observer: ObserverId, _code: MsgCode, _payload: &[u8]) {}
    }

    #[test]
    fn commands_require_a_loaded_recording() {
        let mut session = ReplaySession::new(RecorderConfig::default());
        assert!(matches!(
            session.play(Micros(0)),
            Err(SessionError::StateConflict { .. })
        ));
        assert!(matches!(
            session.skip(Micros(0), 5),
            Err(SessionError::StateConflict { .. })
        ));
    }

    #[test]
    fn idle_session_reports_sentinel_and_delivers_nothing() {
        let mut session = ReplaySession::new(RecorderConfig::default());
        assert_eq!(session.next_due(Micros(0)), IDLE_SENTINEL_SECS);
        let notices = session.deliver_due(Micros(0), &mut NoDeliver, &mut NoVars);
        assert!(notices.is_empty());
    }

    #[test]
    fn observer_roster() {
        let mut session = ReplaySession::new(RecorderConfig::default());
        session.observer_joined(ObserverId(1), false);
        session.observer_joined(ObserverId(2), true);
        assert_eq!(session.observer_count(), 2);
        session.observer_left(ObserverId(1));
        assert_eq!(session.observer_count(), 1);
    }
}
