//! Data types for the recording file header.

/// The decoded recording file header.
///
/// Magic and version are validated during decode and not stored; the
/// remaining fields describe who saved the recording and carry the
/// embedded content the server needs to replay it: the object-type
/// catalog and the world/state blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHeader {
    /// Recorded duration in seconds. Written as a placeholder (zero) by
    /// this implementation; kept in the layout for compatibility.
    pub seconds: u32,
    /// Participant that saved the recording.
    pub participant: u32,
    /// That participant's callsign.
    pub callsign: String,
    /// Contact details (email or similar).
    pub contact: String,
    /// Server protocol version string.
    pub protocol_version: String,
    /// Server application version string.
    pub app_version: String,
    /// Hex content hash of the embedded catalog and world blobs.
    pub content_hash: String,
    /// Embedded object-type catalog.
    pub catalog: Vec<u8>,
    /// Embedded world/state blob.
    pub world: Vec<u8>,
}

impl FileHeader {
    /// Total encoded size of the header: the fixed portion plus the two
    /// variable-length blobs. This value is stored in the header itself
    /// and validated against the declared blob sizes on decode.
    pub fn total_len(&self) -> usize {
        crate::FILE_HEADER_LEN + self.catalog.len() + self.world.len()
    }
}
