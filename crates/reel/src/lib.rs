//! Reel: session recording and replay for tick-driven game servers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Reel sub-crates. For most users, adding `reel` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use reel::prelude::*;
//!
//! let hub = SessionHub::new(RecorderConfig::default());
//! assert!(!hub.record().is_recording());
//! assert!(!hub.replay().is_loaded());
//! ```
//!
//! A real server wires the hub into its tick loop: every outgoing
//! message goes to `hub.record_mut().notify_message(..)`, and while a
//! replay is playing the loop drains `hub.replay_mut().deliver_due(..)`.
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `reel-core` | Packets, message codes, time, collaborator traits |
//! | [`store`] | `reel-store` | The ordered packet store |
//! | [`format`] | `reel-format` | The recording file format, reader and writer |
//! | [`session`] | `reel-session` | Record/replay sessions and the command surface |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Packet model, message codes, time, and collaborator traits
/// (`reel-core`).
pub use reel_core as types;

/// The ordered, byte-accounted packet store (`reel-store`).
pub use reel_store as store;

/// The versioned binary recording format (`reel-format`).
///
/// Stream recordings out with [`format::RecordingWriter`] and back in
/// with [`format::RecordingReader`].
pub use reel_format as format;

/// Recording and replay sessions (`reel-session`).
///
/// The [`session::SessionHub`] owns both sessions and the
/// administrative command surface.
pub use reel_session as session;

/// Common imports for typical Reel usage.
///
/// ```rust
/// use reel::prelude::*;
/// ```
pub mod prelude {
    pub use reel_core::{
        Clock, Deliver, Micros, MsgCode, ObserverId, Packet, PacketMode, ParticipantId,
        StateSource, SystemClock, VarStore, Visibility, WorldContent,
    };
    pub use reel_format::{RecordingReader, RecordingWriter};
    pub use reel_session::{
        HeaderInfo, RecordSession, RecorderConfig, ReplayNotice, ReplaySession, SessionError,
        SessionHub,
    };
}
