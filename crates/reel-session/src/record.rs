//! The recording session state machine.
//!
//! Two capture modes share one session: buffered recording retains
//! packets in a byte-budgeted in-memory store, streaming recording
//! serializes straight to an open file. Periodic full-state snapshots
//! keep either stream self-contained from any snapshot boundary forward.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use reel_core::{Micros, MsgCode, Packet, StateSource, VarStore, Visibility, WorldContent};
use reel_format::{FileHeader, RecordingWriter};
use reel_store::PacketStore;

use crate::config::RecorderConfig;
use crate::error::SessionError;
use crate::files;
use crate::snapshot;

/// Identity fields written into a recording's file header.
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    /// Participant saving the recording.
    pub participant: u32,
    /// That participant's callsign.
    pub callsign: String,
    /// Contact details.
    pub contact: String,
    /// Server protocol version string.
    pub protocol_version: String,
    /// Server application version string.
    pub app_version: String,
}

/// Point-in-time counters for the status command.
#[derive(Clone, Debug)]
pub struct RecordStats {
    /// Whether a recording is active.
    pub recording: bool,
    /// Whether packets stream straight to a file.
    pub streaming: bool,
    /// Packets held in the buffer, or written to the file.
    pub packets: usize,
    /// Bytes held in the buffer, or written to the file.
    pub bytes: usize,
    /// Configured byte budget.
    pub max_bytes: usize,
    /// Configured snapshot period.
    pub snapshot_period: Micros,
}

enum RecordState {
    Idle,
    Buffered,
    Streaming {
        writer: RecordingWriter<BufWriter<File>>,
        path: PathBuf,
    },
}

/// The recording session.
///
/// Owns the in-memory packet store and, while streaming, the open output
/// file. All time-dependent operations take `now` explicitly; the session
/// never reads a clock.
pub struct RecordSession {
    config: RecorderConfig,
    state: RecordState,
    store: PacketStore,
    last_snapshot: Micros,
}

impl RecordSession {
    /// Create an idle session with the given configuration.
    pub fn new(config: RecorderConfig) -> RecordSession {
        RecordSession {
            config,
            state: RecordState::Idle,
            store: PacketStore::new(),
            last_snapshot: Micros::ZERO,
        }
    }

    /// Whether a buffered or streaming recording is active.
    pub fn is_recording(&self) -> bool {
        !matches!(self.state, RecordState::Idle)
    }

    /// Start buffered recording.
    ///
    /// Clears any stale buffer and immediately emits a full snapshot so
    /// the buffer is self-contained from the first instant. Fails if a
    /// recording is already active.
    pub fn start(
        &mut self,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<(), SessionError> {
        if self.is_recording() {
            return Err(SessionError::StateConflict {
                detail: "already recording".to_string(),
            });
        }
        self.store.clear();
        self.state = RecordState::Buffered;
        self.emit_snapshot(now, state, vars)?;
        log::debug!("buffered recording started at {now}");
        Ok(())
    }

    /// Start streaming recording straight to a file.
    ///
    /// Writes the file header up front, then a full snapshot. Fails if a
    /// recording is already active or the file cannot be created.
    pub fn record_to_file(
        &mut self,
        name: &str,
        info: &HeaderInfo,
        world: &WorldContent,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<(), SessionError> {
        if self.is_recording() {
            return Err(SessionError::StateConflict {
                detail: "already recording".to_string(),
            });
        }
        let sink = files::open_write(&self.config.dir, name)?;
        let writer = RecordingWriter::new(sink, &file_header(info, world))?;
        self.state = RecordState::Streaming {
            writer,
            path: self.config.dir.join(name),
        };
        self.emit_snapshot(now, state, vars)?;
        log::debug!("streaming recording started: {name}");
        Ok(())
    }

    /// Stop recording.
    ///
    /// A buffered session keeps its buffer for a later
    /// [`save_buffer`](RecordSession::save_buffer); a streaming session
    /// flushes and closes the file. Fails if not recording.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        match std::mem::replace(&mut self.state, RecordState::Idle) {
            RecordState::Idle => Err(SessionError::StateConflict {
                detail: "not recording".to_string(),
            }),
            RecordState::Buffered => Ok(()),
            RecordState::Streaming { writer, path } => {
                let packets = writer.packets_written();
                writer.into_inner()?;
                log::debug!("closed {} ({packets} packets)", path.display());
                Ok(())
            }
        }
    }

    /// Capture one outgoing protocol message.
    ///
    /// No-op while idle. Participant-join messages are appended before
    /// any due periodic snapshot so join notifications precede the state
    /// that describes the joined participant.
    pub fn notify_message(
        &mut self,
        code: MsgCode,
        payload: &[u8],
        visibility: Visibility,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<(), SessionError> {
        if !self.is_recording() {
            return Ok(());
        }
        let packet = Packet::new(visibility.capture_mode(), code, payload.to_vec(), now);

        if code == MsgCode::ADD_PARTICIPANT {
            self.route(packet, state, vars)?;
            self.maybe_snapshot(now, state, vars)?;
            return Ok(());
        }
        self.maybe_snapshot(now, state, vars)?;
        self.route(packet, state, vars)
    }

    /// Save the in-memory buffer to a file.
    ///
    /// With a nonzero lookback, starts at the earliest snapshot boundary
    /// that still covers the requested window; otherwise at the oldest
    /// boundary. The live buffer is left untouched, so this also works
    /// after [`stop`](RecordSession::stop). Returns packets written.
    pub fn save_buffer(
        &self,
        name: &str,
        lookback_secs: i64,
        info: &HeaderInfo,
        world: &WorldContent,
    ) -> Result<usize, SessionError> {
        if matches!(self.state, RecordState::Streaming { .. }) {
            return Err(SessionError::StateConflict {
                detail: "cannot save the buffer while streaming to a file".to_string(),
            });
        }
        let boundaries: Vec<_> = self
            .store
            .iter()
            .filter(|(_, p)| p.is_boundary())
            .map(|(id, p)| (id, p.timestamp))
            .collect();
        let Some(&(oldest, _)) = boundaries.first() else {
            return Err(SessionError::NotFound {
                detail: "no buffered data to save".to_string(),
            });
        };

        let start = if lookback_secs > 0 {
            // Walk back from the newest boundary until the window is
            // covered, or the oldest boundary is reached.
            let end_ts = self
                .store
                .head()
                .and_then(|id| self.store.get(id))
                .map_or(Micros::ZERO, |p| p.timestamp);
            let window = Micros::from_secs(lookback_secs);
            let mut start = oldest;
            for &(id, ts) in boundaries.iter().rev() {
                start = id;
                if end_ts - ts >= window {
                    break;
                }
            }
            start
        } else {
            oldest
        };

        let sink = files::open_write(&self.config.dir, name)?;
        let mut writer = RecordingWriter::new(sink, &file_header(info, world))?;
        for (_, packet) in self.store.iter_from(start) {
            writer.write(packet.view())?;
        }
        let packets = writer.packets_written();
        writer.into_inner()?;
        log::debug!("saved {packets} buffered packets to {name}");
        Ok(packets)
    }

    /// Current counters for the status command.
    pub fn stats(&self) -> RecordStats {
        let (packets, bytes, streaming) = match &self.state {
            RecordState::Streaming { writer, .. } => {
                (writer.packets_written(), writer.bytes_written(), true)
            }
            _ => (self.store.packet_count(), self.store.byte_count(), false),
        };
        RecordStats {
            recording: self.is_recording(),
            streaming,
            packets,
            bytes,
            max_bytes: self.config.max_bytes,
            snapshot_period: self.config.snapshot_period,
        }
    }

    /// Change the byte budget. Takes effect on the next capture.
    pub fn set_budget(&mut self, max_bytes: usize) {
        self.config.max_bytes = max_bytes;
    }

    /// Change the periodic snapshot interval.
    pub fn set_snapshot_period(&mut self, period: Micros) {
        self.config.snapshot_period = period;
    }

    /// Drop all recording state, including the retained buffer.
    pub fn reset(&mut self) {
        self.state = RecordState::Idle;
        self.store.clear();
        self.last_snapshot = Micros::ZERO;
    }

    /// The retained buffer, for inspection.
    pub fn store(&self) -> &PacketStore {
        &self.store
    }

    fn maybe_snapshot(
        &mut self,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<(), SessionError> {
        if now - self.last_snapshot > self.config.snapshot_period {
            self.emit_snapshot(now, state, vars)?;
        }
        Ok(())
    }

    fn emit_snapshot(
        &mut self,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<(), SessionError> {
        for packet in snapshot::generate(state, vars, now) {
            self.route(packet, state, vars)?;
        }
        self.last_snapshot = now;
        Ok(())
    }

    fn route(
        &mut self,
        packet: Packet,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<(), SessionError> {
        match &mut self.state {
            RecordState::Idle => Ok(()),
            RecordState::Streaming { writer, .. } => {
                writer.write(packet.view())?;
                Ok(())
            }
            RecordState::Buffered => {
                self.store.append(packet);
                self.trim(state, vars);
                Ok(())
            }
        }
    }

    /// Bring the buffer back under budget.
    ///
    /// Evicts whole snapshot-aligned prefixes: the tail advances to the
    /// next boundary packet while over budget, so the buffer never starts
    /// mid-snapshot. If no later boundary exists the buffer is rebuilt
    /// around a fresh snapshot, keeping the packet that triggered the
    /// trim as the newest entry.
    fn trim(&mut self, state: &dyn StateSource, vars: &dyn VarStore) {
        while self.store.byte_count() > self.config.max_bytes {
            let mut next_boundary = None;
            if let Some(tail) = self.store.tail() {
                next_boundary = self
                    .store
                    .iter_from(tail)
                    .skip(1)
                    .find(|(_, p)| p.is_boundary())
                    .map(|(id, _)| id);
            }

            match next_boundary {
                Some(boundary) => {
                    while self.store.tail() != Some(boundary) {
                        if self.store.evict_oldest().is_none() {
                            break;
                        }
                    }
                }
                None => {
                    let trigger = self.store.pop_newest();
                    let evicted = self.store.packet_count();
                    self.store.clear();
                    let ts = trigger.as_ref().map_or(self.last_snapshot, |p| p.timestamp);
                    for packet in snapshot::generate(state, vars, ts) {
                        self.store.append(packet);
                    }
                    if let Some(trigger) = trigger {
                        self.store.append(trigger);
                    }
                    self.last_snapshot = ts;
                    log::debug!(
                        "buffer rebuilt around a fresh snapshot ({evicted} packets evicted)"
                    );
                    if self.store.byte_count() > self.config.max_bytes {
                        log::warn!(
                            "snapshot alone exceeds the byte budget ({} > {})",
                            self.store.byte_count(),
                            self.config.max_bytes
                        );
                    }
                    break;
                }
            }
        }
    }
}

fn file_header(info: &HeaderInfo, world: &WorldContent) -> FileHeader {
    FileHeader {
        seconds: 0,
        participant: info.participant,
        callsign: info.callsign.clone(),
        contact: info.contact.clone(),
        protocol_version: info.protocol_version.clone(),
        app_version: info.app_version.clone(),
        content_hash: world.content_hash().to_string(),
        catalog: world.catalog().to_vec(),
        world: world.world().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_core::{ParticipantEntry, ParticipantId, TeamId, TeamStanding};

    struct TinyState;

    impl StateSource for TinyState {
        fn teams(&self) -> Vec<TeamStanding> {
            vec![TeamStanding {
                team: TeamId(0),
                size: 1,
                won: 0,
                lost: 0,
            }]
        }
        fn objects(&self) -> Vec<reel_core::ObjectState> {
            Vec::new()
        }
        fn turn_holder(&self) -> Option<ParticipantId> {
            None
        }
        fn participants(&self) -> Vec<ParticipantEntry> {
            Vec::new()
        }
    }

    struct NoVars;

    impl VarStore for NoVars {
        fn for_each(&self, _visit: &mut dyn FnMut(&str, &str)) {}
        fn set(&mut self, _key: &str, _value: &str) {}
    }

    fn session(max_bytes: usize) -> RecordSession {
        RecordSession::new(RecorderConfig {
            max_bytes,
            ..RecorderConfig::default()
        })
    }

    #[test]
    fn start_emits_boundary_first() {
        let mut s = session(1 << 20);
        s.start(Micros(0), &TinyState, &NoVars).unwrap();
        let tail = s.store().tail().unwrap();
        assert!(s.store().get(tail).unwrap().is_boundary());
    }

    #[test]
    fn double_start_conflicts() {
        let mut s = session(1 << 20);
        s.start(Micros(0), &TinyState, &NoVars).unwrap();
        assert!(matches!(
            s.start(Micros(1), &TinyState, &NoVars),
            Err(SessionError::StateConflict { .. })
        ));
    }

    #[test]
    fn stop_while_idle_conflicts() {
        let mut s = session(1 << 20);
        assert!(matches!(
            s.stop(),
            Err(SessionError::StateConflict { .. })
        ));
    }

    #[test]
    fn idle_capture_is_noop() {
        let mut s = session(1 << 20);
        s.notify_message(
            MsgCode::CHAT,
            b"hi",
            Visibility::Broadcast,
            Micros(0),
            &TinyState,
            &NoVars,
        )
        .unwrap();
        assert!(s.store().is_empty());
    }

    #[test]
    fn tail_is_boundary_after_budget_eviction() {
        let mut s = session(2048);
        s.start(Micros(0), &TinyState, &NoVars).unwrap();
        for i in 0..200 {
            s.notify_message(
                MsgCode::CHAT,
                &[0u8; 100],
                Visibility::Broadcast,
                Micros(i * 1_000),
                &TinyState,
                &NoVars,
            )
            .unwrap();
        }
        assert!(s.store().byte_count() <= 2048);
        let tail = s.store().tail().unwrap();
        assert!(s.store().get(tail).unwrap().is_boundary());
    }

    #[test]
    fn stop_retains_buffer() {
        let mut s = session(1 << 20);
        s.start(Micros(0), &TinyState, &NoVars).unwrap();
        let count = s.store().packet_count();
        s.stop().unwrap();
        assert!(!s.is_recording());
        assert_eq!(s.store().packet_count(), count);
    }
}
