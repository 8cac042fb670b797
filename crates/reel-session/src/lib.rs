//! Recording and replay sessions.
//!
//! The server's tick loop feeds every outgoing authoritative message to
//! the [`RecordSession`] and drains due packets from the
//! [`ReplaySession`]; administrative commands go through the
//! [`SessionHub`], which owns both and keeps them mutually exclusive.
//! Everything is single-threaded and synchronous: no locks, no clocks,
//! no suspension. Time enters through explicit `now` arguments.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod files;
pub mod hub;
pub mod record;
pub mod replay;
pub mod snapshot;

pub use config::RecorderConfig;
pub use error::SessionError;
pub use hub::SessionHub;
pub use record::{HeaderInfo, RecordSession, RecordStats};
pub use replay::{HandshakeState, LoadReport, ReplayNotice, ReplaySession, SkipReport};
