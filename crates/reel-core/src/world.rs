//! The server's active world content: type catalog and world blob.

/// The content a client must hold to interpret recorded traffic: the
/// object-type catalog and the opaque world/state blob, plus the content
/// hash clients use to verify their copy.
///
/// Owned by the server's top-level context and passed by reference into
/// save and load operations. When a loaded recording embeds different
/// content, the replay session hot-swaps this value (see the session
/// crate) rather than failing the load: continuing with mismatched
/// fixed-capacity client structures risks client-side crashes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldContent {
    catalog: Vec<u8>,
    world: Vec<u8>,
    content_hash: String,
}

impl WorldContent {
    /// Bundle the active catalog, world blob, and their content hash.
    pub fn new(catalog: Vec<u8>, world: Vec<u8>, content_hash: String) -> WorldContent {
        WorldContent {
            catalog,
            world,
            content_hash,
        }
    }

    /// The object-type catalog blob.
    pub fn catalog(&self) -> &[u8] {
        &self.catalog
    }

    /// The world/state blob.
    pub fn world(&self) -> &[u8] {
        &self.world
    }

    /// Hex content hash of the current blobs.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Whether the given blobs match the active content byte-for-byte.
    pub fn matches(&self, catalog: &[u8], world: &[u8]) -> bool {
        self.catalog == catalog && self.world == world
    }

    /// Replace the active content wholesale. The caller supplies the
    /// recomputed hash so this crate stays free of hashing concerns.
    pub fn swap(&mut self, catalog: Vec<u8>, world: Vec<u8>, content_hash: String) {
        self.catalog = catalog;
        self.world = world;
        self.content_hash = content_hash;
    }
}
