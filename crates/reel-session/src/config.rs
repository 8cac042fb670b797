//! Session configuration.

use std::path::PathBuf;

use reel_core::Micros;

/// Recording configuration shared by the record and replay sessions.
///
/// The byte budget bounds both the live recording buffer and the replay
/// preload window. Defaults match the original server's recorder.
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    /// Directory holding recording files.
    ///
    /// Default: `recordings`.
    pub dir: PathBuf,

    /// Byte budget for the in-memory packet store.
    ///
    /// Default: 16 MiB.
    pub max_bytes: usize,

    /// Interval between periodic full-state snapshots while recording.
    ///
    /// Default: 10 seconds.
    pub snapshot_period: Micros,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig {
            dir: PathBuf::from("recordings"),
            max_bytes: 16 * 1024 * 1024,
            snapshot_period: Micros::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = RecorderConfig::default();
        assert_eq!(c.max_bytes, 16 * 1024 * 1024);
        assert_eq!(c.snapshot_period, Micros::from_secs(10));
    }
}
