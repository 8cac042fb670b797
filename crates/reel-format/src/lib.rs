//! Versioned binary recording format.
//!
//! All integers are network byte order, all field widths are fixed, and
//! the 64-bit timestamp is split into two 32-bit words (high word first),
//! so the format never depends on platform word size or endianness.
//!
//! # Layout
//!
//! ```text
//! [MAGIC u32] [VERSION u32] [fixed header] [catalog blob] [world blob]
//! [packet record 1] [packet record 2] ... until EOF
//! ```
//!
//! - [`RecordingWriter`] streams packet records to any `Write` sink
//! - [`RecordingReader`] plays them back from any `Read` source
//! - [`codec`] holds the primitive and record encode/decode functions

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::FormatError;
pub use hash::{content_hash, fnv1a_64};
pub use reader::{is_recording_file, PacketIter, RecordingReader};
pub use types::FileHeader;
pub use writer::RecordingWriter;

/// Magic constant at offset 0 of every recording file ("RLrp").
pub const MAGIC: u32 = 0x524C_7270;

/// Current file format version.
pub const FORMAT_VERSION: u32 = 1;

/// Fixed width of the callsign header field.
pub const CALLSIGN_LEN: usize = 32;
/// Fixed width of the contact header field.
pub const CONTACT_LEN: usize = 128;
/// Fixed width of the protocol-version header field.
pub const PROTOCOL_VERSION_LEN: usize = 8;
/// Fixed width of the application-version header field.
pub const APP_VERSION_LEN: usize = 128;
/// Fixed width of the content-hash header field.
pub const CONTENT_HASH_LEN: usize = 64;

/// Size of the fixed portion of the file header: seven `u32` fields plus
/// the five fixed-width text fields.
pub const FILE_HEADER_LEN: usize = 7 * 4
    + CALLSIGN_LEN
    + CONTACT_LEN
    + PROTOCOL_VERSION_LEN
    + APP_VERSION_LEN
    + CONTENT_HASH_LEN;
