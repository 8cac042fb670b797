//! The administrative command surface.
//!
//! One [`SessionHub`] owns the process's single [`RecordSession`] and
//! [`ReplaySession`] and enforces their mutual exclusion: recording
//! cannot start while a replay is loaded, and a replay cannot load while
//! a recording is active. Each command returns a human-readable status
//! line on success; the tick loop reaches the sessions directly through
//! the `_mut` accessors.

use reel_core::{Micros, StateSource, VarStore, WorldContent};

use crate::config::RecorderConfig;
use crate::error::SessionError;
use crate::files;
use crate::record::{HeaderInfo, RecordSession};
use crate::replay::ReplaySession;

/// Owner of the recording and replay sessions.
pub struct SessionHub {
    config: RecorderConfig,
    record: RecordSession,
    replay: ReplaySession,
}

impl SessionHub {
    /// Create a hub with both sessions idle.
    pub fn new(config: RecorderConfig) -> SessionHub {
        SessionHub {
            record: RecordSession::new(config.clone()),
            replay: ReplaySession::new(config.clone()),
            config,
        }
    }

    /// The record session, for the tick loop's capture call.
    pub fn record_mut(&mut self) -> &mut RecordSession {
        &mut self.record
    }

    /// The replay session, for the tick loop's delivery call.
    pub fn replay_mut(&mut self) -> &mut ReplaySession {
        &mut self.replay
    }

    /// The record session, read-only.
    pub fn record(&self) -> &RecordSession {
        &self.record
    }

    /// The replay session, read-only.
    pub fn replay(&self) -> &ReplaySession {
        &self.replay
    }

    // ── Recording commands ──────────────────────────────────────

    /// Start buffered recording.
    pub fn record_start(
        &mut self,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<String, SessionError> {
        if self.replay.is_loaded() {
            return Err(SessionError::StateConflict {
                detail: "cannot record while a replay is loaded".to_string(),
            });
        }
        self.record.start(now, state, vars)?;
        Ok("recording started".to_string())
    }

    /// Stop recording.
    pub fn record_stop(&mut self) -> Result<String, SessionError> {
        self.record.stop()?;
        Ok("recording stopped".to_string())
    }

    /// Record straight to a file.
    pub fn record_to_file(
        &mut self,
        name: &str,
        info: &HeaderInfo,
        world: &WorldContent,
        now: Micros,
        state: &dyn StateSource,
        vars: &dyn VarStore,
    ) -> Result<String, SessionError> {
        if self.replay.is_loaded() {
            return Err(SessionError::StateConflict {
                detail: "cannot record while a replay is loaded".to_string(),
            });
        }
        self.record
            .record_to_file(name, info, world, now, state, vars)?;
        Ok(format!("recording to {name}"))
    }

    /// Save the in-memory buffer to a file. A zero lookback saves the
    /// whole buffer.
    pub fn record_save(
        &mut self,
        name: &str,
        lookback_secs: i64,
        info: &HeaderInfo,
        world: &WorldContent,
    ) -> Result<String, SessionError> {
        let packets = self.record.save_buffer(name, lookback_secs, info, world)?;
        Ok(format!("saved {packets} packets to {name}"))
    }

    /// Change the byte budget for the buffer and the preload window.
    pub fn record_set_budget(&mut self, max_bytes: usize) -> Result<String, SessionError> {
        if max_bytes == 0 {
            return Err(SessionError::Config {
                detail: "byte budget must be nonzero".to_string(),
            });
        }
        self.config.max_bytes = max_bytes;
        self.record.set_budget(max_bytes);
        self.replay.set_budget(max_bytes);
        Ok(format!("byte budget set to {max_bytes}"))
    }

    /// Change the periodic snapshot interval.
    pub fn record_set_snapshot_period(&mut self, secs: i64) -> Result<String, SessionError> {
        if secs <= 0 {
            return Err(SessionError::Config {
                detail: "snapshot period must be positive".to_string(),
            });
        }
        let period = Micros::from_secs(secs);
        self.config.snapshot_period = period;
        self.record.set_snapshot_period(period);
        Ok(format!("snapshot period set to {secs}s"))
    }

    /// Human-readable recording status.
    pub fn record_status(&self) -> Result<String, SessionError> {
        let stats = self.record.stats();
        let state = match (stats.recording, stats.streaming) {
            (false, _) => "idle",
            (true, false) => "buffering",
            (true, true) => "streaming",
        };
        Ok(format!(
            "recording {state}: {} packets, {} of {} bytes",
            stats.packets, stats.bytes, stats.max_bytes
        ))
    }

    // ── Replay commands ─────────────────────────────────────────

    /// List the recording files available for loading.
    pub fn replay_list(&self) -> Result<String, SessionError> {
        let names = files::list_recordings(&self.config.dir)?;
        if names.is_empty() {
            Ok("no recordings available".to_string())
        } else {
            Ok(names.join("\n"))
        }
    }

    /// Load a recording. Drops any retained recording buffer: recording
    /// and replay are mutually exclusive.
    pub fn replay_load(
        &mut self,
        name: &str,
        world: &mut WorldContent,
        vars: &mut dyn VarStore,
    ) -> Result<String, SessionError> {
        if self.record.is_recording() {
            return Err(SessionError::StateConflict {
                detail: "cannot load a replay while recording".to_string(),
            });
        }
        self.record.reset();
        let report = self.replay.load(name, world, vars)?;
        let swap = if report.content_swapped {
            " (content hot-swapped)"
        } else {
            ""
        };
        Ok(format!(
            "loaded {name}: {} packets from {}{swap}",
            report.packets, report.callsign
        ))
    }

    /// Start playback.
    pub fn replay_play(&mut self, now: Micros) -> Result<String, SessionError> {
        self.replay.play(now)?;
        Ok("playback started".to_string())
    }

    /// Seek by a signed number of seconds.
    pub fn replay_skip(&mut self, now: Micros, secs: i64) -> Result<String, SessionError> {
        let report = self.replay.skip(now, secs)?;
        Ok(format!("skipped {:+.1}s", report.actual_secs))
    }
}
