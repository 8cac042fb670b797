//! Ordered packet store with byte-budget accounting.
//!
//! [`PacketStore`] holds captured packets in arrival order: newest at the
//! head, oldest at the tail. Append links at the head and eviction unlinks
//! at the tail, both O(1), with running byte and packet counters that a
//! record session checks against its budget.
//!
//! The store is an arena of slots addressed by stable [`PacketId`] indices
//! rather than an intrusive pointer list: links are slot indices, so there
//! are no raw pointers to maintain and no use-after-evict hazards. Ids stay
//! valid until the packet they name is evicted or the store is cleared.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod store;

pub use store::{Iter, PacketId, PacketStore};
