//! Full-state snapshot generation.
//!
//! Produces the synthetic packet sequence that makes an empty client
//! converge to current authoritative state: team standings first (the
//! snapshot-boundary marker), then object states, the turn-order
//! designation, participant join descriptors, hidden admin details, and
//! finally the configuration-variable table. Categories whose encoding
//! would exceed [`MAX_MESSAGE_LEN`] are split across packets.

use reel_core::{Micros, MsgCode, Packet, PacketMode, StateSource, VarStore, MAX_MESSAGE_LEN};

// ── Encoding helpers ────────────────────────────────────────────

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_str8(buf: &mut Vec<u8>, s: &str) {
    let mut end = s.len().min(255);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    buf.push(end as u8);
    buf.extend_from_slice(&s.as_bytes()[..end]);
}

/// Pack length-prefixed entries into as few packets as fit, each with a
/// leading u16 entry count.
fn chunk_counted(entries: Vec<Vec<u8>>, mode: PacketMode, code: MsgCode, now: Micros) -> Vec<Packet> {
    let mut packets = Vec::new();
    let mut payload: Vec<u8> = vec![0, 0];
    let mut count: u16 = 0;

    for entry in entries {
        if payload.len() + entry.len() > MAX_MESSAGE_LEN && count > 0 {
            payload[0..2].copy_from_slice(&count.to_be_bytes());
            packets.push(Packet::new(mode, code, payload, now));
            payload = vec![0, 0];
            count = 0;
        }
        payload.extend_from_slice(&entry);
        count += 1;
    }
    if count > 0 {
        payload[0..2].copy_from_slice(&count.to_be_bytes());
        packets.push(Packet::new(mode, code, payload, now));
    }
    packets
}

// ── Generator ───────────────────────────────────────────────────

/// Generate one complete state snapshot as a packet sequence.
///
/// The first packet is always the team-standings boundary marker; the
/// sequence is self-consistent and safe to append atomically.
pub fn generate(state: &dyn StateSource, vars: &dyn VarStore, now: Micros) -> Vec<Packet> {
    let mut packets = Vec::new();

    // Team standings. One packet, the boundary marker. The marker must
    // stay a single packet (consecutive boundaries would end an
    // observer's bootstrap early), so an oversized roster is capped
    // rather than split.
    let mut teams = state.teams();
    let max_teams = (MAX_MESSAGE_LEN - 2) / 7;
    if teams.len() > max_teams {
        log::warn!(
            "team roster truncated from {} to {max_teams} entries in the snapshot",
            teams.len()
        );
        teams.truncate(max_teams);
    }
    let mut payload = Vec::with_capacity(2 + teams.len() * 7);
    put_u16(&mut payload, teams.len() as u16);
    for t in &teams {
        payload.push(t.team.0);
        put_u16(&mut payload, t.size);
        put_u16(&mut payload, t.won);
        put_u16(&mut payload, t.lost);
    }
    packets.push(Packet::new(
        PacketMode::State,
        MsgCode::TEAM_UPDATE,
        payload,
        now,
    ));

    // Object states, split across packets as needed.
    let objects = state.objects();
    if !objects.is_empty() {
        let entries = objects
            .iter()
            .map(|o| {
                let mut e = Vec::with_capacity(19);
                put_u16(&mut e, o.id.0);
                put_u16(&mut e, o.kind);
                put_u16(&mut e, o.status);
                e.push(o.holder.map_or(0xFF, |p| p.0));
                for c in o.position {
                    put_f32(&mut e, c);
                }
                e
            })
            .collect();
        packets.extend(chunk_counted(
            entries,
            PacketMode::State,
            MsgCode::OBJECT_UPDATE,
            now,
        ));
    }

    // Rotating turn order, if the game mode has one.
    if let Some(holder) = state.turn_holder() {
        packets.push(Packet::new(
            PacketMode::State,
            MsgCode::TURN_DESIGNATE,
            vec![holder.0],
            now,
        ));
    }

    // Participant join descriptors, one packet each.
    let participants = state.participants();
    for p in &participants {
        let mut payload = Vec::new();
        payload.push(p.id.0);
        payload.push(p.team.0);
        put_str8(&mut payload, &p.callsign);
        packets.push(Packet::new(
            PacketMode::State,
            MsgCode::ADD_PARTICIPANT,
            payload,
            now,
        ));
    }

    // Transport details, hidden: recorded but never forwarded.
    if !participants.is_empty() {
        let entries = participants
            .iter()
            .map(|p| {
                let mut e = Vec::new();
                e.push(p.id.0);
                put_str8(&mut e, &p.address);
                e
            })
            .collect();
        packets.extend(chunk_counted(
            entries,
            PacketMode::Hidden,
            MsgCode::ADMIN_INFO,
            now,
        ));
    }

    // Configuration variables, split across packets as needed.
    let mut entries = Vec::new();
    vars.for_each(&mut |key, value| {
        let mut e = Vec::new();
        put_str8(&mut e, key);
        put_str8(&mut e, value);
        entries.push(e);
    });
    packets.extend(chunk_counted(
        entries,
        PacketMode::State,
        MsgCode::SET_VARIABLE,
        now,
    ));

    log::debug!("generated snapshot: {} packets", packets.len());
    packets
}

/// Apply one variable-snapshot payload to the live store.
///
/// Parsing is lenient: a short or garbled payload applies what it can and
/// stops. Returns the number of variables applied.
pub fn apply_variables(payload: &[u8], vars: &mut dyn VarStore) -> usize {
    let mut applied = 0;
    if payload.len() < 2 {
        return 0;
    }
    let count = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    let mut rest = &payload[2..];

    for _ in 0..count {
        let Some((key, after_key)) = take_str8(rest) else {
            log::warn!("garbled variable snapshot after {applied} entries");
            break;
        };
        let Some((value, after_value)) = take_str8(after_key) else {
            log::warn!("garbled variable snapshot after {applied} entries");
            break;
        };
        vars.set(&key, &value);
        applied += 1;
        rest = after_value;
    }
    applied
}

fn take_str8(buf: &[u8]) -> Option<(String, &[u8])> {
    let len = *buf.first()? as usize;
    if buf.len() < 1 + len {
        return None;
    }
    let s = String::from_utf8_lossy(&buf[1..1 + len]).into_owned();
    Some((s, &buf[1 + len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_core::{ObjectId, ObjectState, ParticipantId, TeamId, TeamStanding};

    struct Fixture {
        teams: Vec<TeamStanding>,
        objects: Vec<ObjectState>,
        participants: Vec<reel_core::ParticipantEntry>,
    }

    impl StateSource for Fixture {
        fn teams(&self) -> Vec<TeamStanding> {
            self.teams.clone()
        }
        fn objects(&self) -> Vec<ObjectState> {
            self.objects.clone()
        }
        fn turn_holder(&self) -> Option<ParticipantId> {
            None
        }
        fn participants(&self) -> Vec<reel_core::ParticipantEntry> {
            self.participants.clone()
        }
    }

    struct Vars(Vec<(String, String)>);

    impl VarStore for Vars {
        fn for_each(&self, visit: &mut dyn FnMut(&str, &str)) {
            for (k, v) in &self.0 {
                visit(k, v);
            }
        }
        fn set(&mut self, key: &str, value: &str) {
            self.0.push((key.to_string(), value.to_string()));
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            teams: vec![TeamStanding {
                team: TeamId(0),
                size: 2,
                won: 3,
                lost: 1,
            }],
            objects: vec![ObjectState {
                id: ObjectId(1),
                kind: 2,
                status: 0,
                holder: None,
                position: [0.0, 1.0, 2.0],
            }],
            participants: Vec::new(),
        }
    }

    #[test]
    fn first_packet_is_boundary() {
        let packets = generate(&fixture(), &Vars(Vec::new()), Micros(5));
        assert!(packets[0].is_boundary());
        assert!(packets.iter().all(|p| p.timestamp == Micros(5)));
    }

    #[test]
    fn huge_team_roster_stays_one_bounded_boundary_packet() {
        let mut state = fixture();
        state.teams = (0..=255u8)
            .map(|t| TeamStanding {
                team: TeamId(t),
                size: 1,
                won: 0,
                lost: 0,
            })
            .collect();
        let packets = generate(&state, &Vars(Vec::new()), Micros(0));

        let boundaries: Vec<_> = packets.iter().filter(|p| p.is_boundary()).collect();
        assert_eq!(boundaries.len(), 1);
        assert!(boundaries[0].payload.len() <= MAX_MESSAGE_LEN);
        let count = u16::from_be_bytes([boundaries[0].payload[0], boundaries[0].payload[1]]);
        assert_eq!(count as usize, (MAX_MESSAGE_LEN - 2) / 7);
    }

    #[test]
    fn oversized_categories_split() {
        let vars = Vars(
            (0..200)
                .map(|i| (format!("var_{i:03}"), "x".repeat(40)))
                .collect(),
        );
        let packets = generate(&fixture(), &vars, Micros(0));
        let var_packets: Vec<_> = packets
            .iter()
            .filter(|p| p.code == MsgCode::SET_VARIABLE)
            .collect();
        assert!(var_packets.len() > 1);
        assert!(var_packets.iter().all(|p| p.payload.len() <= MAX_MESSAGE_LEN));

        let total: usize = var_packets
            .iter()
            .map(|p| u16::from_be_bytes([p.payload[0], p.payload[1]]) as usize)
            .sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn variables_roundtrip() {
        let source = Vars(vec![
            ("speed".into(), "25.0".into()),
            ("gravity".into(), "-9.8".into()),
        ]);
        let packets = generate(&fixture(), &source, Micros(0));
        let var_packet = packets
            .iter()
            .find(|p| p.code == MsgCode::SET_VARIABLE)
            .unwrap();

        let mut sink = Vars(Vec::new());
        let applied = apply_variables(&var_packet.payload, &mut sink);
        assert_eq!(applied, 2);
        assert_eq!(sink.0[0], ("speed".to_string(), "25.0".to_string()));
        assert_eq!(sink.0[1], ("gravity".to_string(), "-9.8".to_string()));
    }

    #[test]
    fn garbled_variables_stop_cleanly() {
        let mut sink = Vars(Vec::new());
        assert_eq!(apply_variables(&[0, 5, 3, b'a'], &mut sink), 0);
        assert_eq!(apply_variables(&[], &mut sink), 0);
    }
}
