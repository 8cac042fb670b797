//! Core types and traits for the Reel session recording subsystem.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! packet model shared by the store, the binary format, and the sessions,
//! together with the trait seams through which the subsystem talks to the
//! rest of the server: message delivery, the configuration-variable store,
//! and the authoritative game state used for snapshot generation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod msg;
pub mod packet;
pub mod time;
pub mod traits;
pub mod world;

pub use id::{ObjectId, ObserverId, ParticipantId, TeamId};
pub use msg::MsgCode;
pub use packet::{
    Packet, PacketMode, PacketView, Visibility, MAX_MESSAGE_LEN, PACKET_RECORD_OVERHEAD,
};
pub use time::{Clock, Micros, SystemClock};
pub use traits::{Deliver, ObjectState, ParticipantEntry, StateSource, TeamStanding, VarStore};
pub use world::WorldContent;
