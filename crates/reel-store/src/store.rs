//! The slot-arena packet store.

use std::fmt;

use reel_core::Packet;

/// Index of a live packet within a [`PacketStore`].
///
/// Ids are stable for the packet's lifetime but are invalidated by
/// [`evict_oldest`](PacketStore::evict_oldest),
/// [`pop_newest`](PacketStore::pop_newest), and
/// [`clear`](PacketStore::clear); slots are reused, so a stale id may name
/// a different packet. Holders (the replay cursor) must drop their ids
/// whenever they mutate the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PacketId(u32);

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Node {
    packet: Packet,
    /// Toward the tail (older).
    prev: Option<PacketId>,
    /// Toward the head (newer).
    next: Option<PacketId>,
}

/// Ordered collection of packets, oldest at the tail, newest at the head.
///
/// Counters always equal the live contents: `byte_count` is the sum of
/// [`Packet::record_len`] over live packets, `packet_count` their number.
/// The collection is never reordered except by append and removal.
#[derive(Default)]
pub struct PacketStore {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    head: Option<PacketId>,
    tail: Option<PacketId>,
    byte_count: usize,
    packet_count: usize,
}

impl PacketStore {
    /// Create an empty store.
    pub fn new() -> PacketStore {
        PacketStore::default()
    }

    /// Total bytes of live packets, record overhead included.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Number of live packets.
    pub fn packet_count(&self) -> usize {
        self.packet_count
    }

    /// Whether the store holds no packets.
    pub fn is_empty(&self) -> bool {
        self.packet_count == 0
    }

    /// Newest packet, if any.
    pub fn head(&self) -> Option<PacketId> {
        self.head
    }

    /// Oldest packet, if any.
    pub fn tail(&self) -> Option<PacketId> {
        self.tail
    }

    /// Look up a live packet.
    pub fn get(&self, id: PacketId) -> Option<&Packet> {
        self.node(id).map(|n| &n.packet)
    }

    /// The next-newer packet after `id`.
    pub fn next(&self, id: PacketId) -> Option<PacketId> {
        self.node(id).and_then(|n| n.next)
    }

    /// The next-older packet before `id`.
    pub fn prev(&self, id: PacketId) -> Option<PacketId> {
        self.node(id).and_then(|n| n.prev)
    }

    /// Link a packet as the new head. O(1).
    pub fn append(&mut self, packet: Packet) -> PacketId {
        self.byte_count += packet.record_len();
        self.packet_count += 1;

        let node = Node {
            packet,
            prev: self.head,
            next: None,
        };
        let id = self.insert(node);

        if let Some(prev_head) = self.head {
            if let Some(n) = self.node_mut(prev_head) {
                n.next = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        id
    }

    /// Detach and return the oldest packet. O(1). The caller owns the
    /// returned packet and its payload.
    pub fn evict_oldest(&mut self) -> Option<Packet> {
        let id = self.tail?;
        let node = self.remove(id)?;

        self.tail = node.next;
        match node.next {
            Some(next) => {
                if let Some(n) = self.node_mut(next) {
                    n.prev = None;
                }
            }
            None => self.head = None,
        }

        self.byte_count -= node.packet.record_len();
        self.packet_count -= 1;
        Some(node.packet)
    }

    /// Detach and return the newest packet. O(1). Counterpart of
    /// [`evict_oldest`](Self::evict_oldest), used when a buffered session
    /// rebuilds the buffer around a fresh snapshot.
    pub fn pop_newest(&mut self) -> Option<Packet> {
        let id = self.head?;
        let node = self.remove(id)?;

        self.head = node.prev;
        match node.prev {
            Some(prev) => {
                if let Some(n) = self.node_mut(prev) {
                    n.next = None;
                }
            }
            None => self.tail = None,
        }

        self.byte_count -= node.packet.record_len();
        self.packet_count -= 1;
        Some(node.packet)
    }

    /// Evict and drop every packet; counters return to zero.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.byte_count = 0;
        self.packet_count = 0;
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.tail,
            forward: true,
        }
    }

    /// Iterate newest to oldest.
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
            forward: false,
        }
    }

    /// Iterate oldest to newest starting at `id` (inclusive).
    pub fn iter_from(&self, id: PacketId) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.get(id).map(|_| id),
            forward: true,
        }
    }

    fn node(&self, id: PacketId) -> Option<&Node> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    fn node_mut(&mut self, id: PacketId) -> Option<&mut Node> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    fn insert(&mut self, node: Node) -> PacketId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(node);
                PacketId(idx)
            }
            None => {
                self.slots.push(Some(node));
                PacketId((self.slots.len() - 1) as u32)
            }
        }
    }

    fn remove(&mut self, id: PacketId) -> Option<Node> {
        let node = self.slots.get_mut(id.0 as usize).and_then(|s| s.take())?;
        self.free.push(id.0);
        Some(node)
    }
}

/// Iterator over `(PacketId, &Packet)` pairs in stream order.
pub struct Iter<'a> {
    store: &'a PacketStore,
    cursor: Option<PacketId>,
    forward: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (PacketId, &'a Packet);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let packet = self.store.get(id)?;
        self.cursor = if self.forward {
            self.store.next(id)
        } else {
            self.store.prev(id)
        };
        Some((id, packet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reel_core::{Micros, MsgCode, PacketMode, PACKET_RECORD_OVERHEAD};

    fn packet(len: usize, ts: i64) -> Packet {
        Packet::new(PacketMode::Live, MsgCode::CHAT, vec![0; len], Micros(ts))
    }

    #[test]
    fn append_then_evict_is_fifo() {
        let mut store = PacketStore::new();
        for ts in 0..5 {
            store.append(packet(8, ts));
        }
        for ts in 0..5 {
            let p = store.evict_oldest().unwrap();
            assert_eq!(p.timestamp, Micros(ts));
        }
        assert!(store.evict_oldest().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn counters_track_contents() {
        let mut store = PacketStore::new();
        store.append(packet(10, 0));
        store.append(packet(20, 1));
        assert_eq!(store.packet_count(), 2);
        assert_eq!(store.byte_count(), 30 + 2 * PACKET_RECORD_OVERHEAD);

        store.evict_oldest();
        assert_eq!(store.packet_count(), 1);
        assert_eq!(store.byte_count(), 20 + PACKET_RECORD_OVERHEAD);

        store.clear();
        assert_eq!(store.packet_count(), 0);
        assert_eq!(store.byte_count(), 0);
    }

    #[test]
    fn pop_newest_unlinks_head() {
        let mut store = PacketStore::new();
        store.append(packet(1, 0));
        store.append(packet(1, 1));
        let p = store.pop_newest().unwrap();
        assert_eq!(p.timestamp, Micros(1));
        assert_eq!(store.packet_count(), 1);
        assert_eq!(store.head(), store.tail());

        let p = store.pop_newest().unwrap();
        assert_eq!(p.timestamp, Micros(0));
        assert!(store.head().is_none());
        assert!(store.tail().is_none());
    }

    #[test]
    fn navigation_follows_stream_order() {
        let mut store = PacketStore::new();
        let a = store.append(packet(1, 0));
        let b = store.append(packet(1, 1));
        let c = store.append(packet(1, 2));

        assert_eq!(store.tail(), Some(a));
        assert_eq!(store.head(), Some(c));
        assert_eq!(store.next(a), Some(b));
        assert_eq!(store.next(b), Some(c));
        assert_eq!(store.next(c), None);
        assert_eq!(store.prev(c), Some(b));
        assert_eq!(store.prev(a), None);

        let forward: Vec<i64> = store.iter().map(|(_, p)| p.timestamp.0).collect();
        assert_eq!(forward, vec![0, 1, 2]);
        let backward: Vec<i64> = store.iter_rev().map(|(_, p)| p.timestamp.0).collect();
        assert_eq!(backward, vec![2, 1, 0]);
        let from_b: Vec<i64> = store.iter_from(b).map(|(_, p)| p.timestamp.0).collect();
        assert_eq!(from_b, vec![1, 2]);
    }

    #[test]
    fn slots_are_reused_after_eviction() {
        let mut store = PacketStore::new();
        for ts in 0..4 {
            store.append(packet(4, ts));
        }
        store.evict_oldest();
        store.evict_oldest();
        store.append(packet(4, 10));
        store.append(packet(4, 11));
        // No slot growth beyond the high-water mark.
        assert_eq!(store.slots.len(), 4);
        let order: Vec<i64> = store.iter().map(|(_, p)| p.timestamp.0).collect();
        assert_eq!(order, vec![2, 3, 10, 11]);
    }

    proptest! {
        // For all append/evict sequences, the counters equal the
        // sum/count of packets not yet evicted.
        #[test]
        fn accounting_invariant(ops in prop::collection::vec(
            prop_oneof![
                (1usize..64).prop_map(Some),
                Just(None),
            ],
            0..64,
        )) {
            let mut store = PacketStore::new();
            let mut live: Vec<usize> = Vec::new();
            for (i, op) in ops.into_iter().enumerate() {
                match op {
                    Some(len) => {
                        store.append(packet(len, i as i64));
                        live.push(len);
                    }
                    None => {
                        let evicted = store.evict_oldest();
                        prop_assert_eq!(evicted.is_some(), !live.is_empty());
                        if !live.is_empty() {
                            live.remove(0);
                        }
                    }
                }
                let expected: usize = live.iter()
                    .map(|len| len + PACKET_RECORD_OVERHEAD)
                    .sum();
                prop_assert_eq!(store.byte_count(), expected);
                prop_assert_eq!(store.packet_count(), live.len());
            }
        }
    }
}
