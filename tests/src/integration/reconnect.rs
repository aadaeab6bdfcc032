//! # Reconnect Flows
//!
//! A node that fell behind discards its state and resumes from a snapshot
//! taken by a peer.
//!
//! ## Flows Tested:
//!
//! 1. **Ancient after snapshot**: events below the snapshot's ancient
//!    threshold are dropped
//! 2. **Lost parents**: events whose non-ancient parents were lost in the
//!    reset are discarded without failing the engine
//! 3. **Resume**: a node restarted from a peer's round snapshot continues the
//!    consensus order where the peer's snapshot left it

#[cfg(test)]
mod tests {
    use hg_02_consensus::ConsensusEngineApi;
    use shared_types::{
        ConsensusSnapshot, Hash, MinimumJudgeInfo, NodeId, PlatformEvent, Timestamp,
    };

    use crate::fixtures::{engine, Gossip, Node};
    use crate::init_test_logging;

    fn snapshot(round: u64, threshold: u64) -> ConsensusSnapshot {
        ConsensusSnapshot {
            round,
            judge_hashes: vec![Hash::digest(b"peer judge")],
            minimum_judge_info_list: vec![MinimumJudgeInfo {
                round,
                minimum_judge_ancient_threshold: threshold,
            }],
            next_consensus_number: 1_000,
            consensus_timestamp: Timestamp(9_000_000),
        }
    }

    /// Test: snapshot {round 20, threshold 10} makes a birth-round-3 event ancient
    #[test]
    fn test_event_below_snapshot_threshold_dropped() -> anyhow::Result<()> {
        init_test_logging();
        let mut engine = engine(4);
        engine.out_of_band_snapshot_update(snapshot(20, 10))?;

        let window = engine.current_event_window();
        assert_eq!(window.latest_consensus_round(), 20);
        assert_eq!(window.ancient_threshold(), 10);

        let event = PlatformEvent::new(NodeId(2), None, None, 3, Timestamp(1), vec![]);
        let hash = event.hash;
        assert!(engine.add_event(event)?.is_empty());
        assert_eq!(engine.round_of(&hash), None);
        Ok(())
    }

    /// Test: after snapshot {round 50, threshold 45}, an event born in 48 whose
    /// parent is unknown is discarded and the engine keeps working
    #[test]
    fn test_event_with_lost_parent_discarded() -> anyhow::Result<()> {
        init_test_logging();
        let mut engine = engine(4);
        engine.out_of_band_snapshot_update(snapshot(50, 45))?;

        let lost_parent = PlatformEvent::new(NodeId(3), None, None, 46, Timestamp(10), vec![]);
        let event = PlatformEvent::new(
            NodeId(3),
            Some(lost_parent.descriptor()),
            None,
            48,
            Timestamp(20),
            vec![],
        );
        let hash = event.hash;

        assert!(engine.add_event(event)?.is_empty());
        assert_eq!(engine.round_of(&hash), None);

        // A fresh event without parents is still accepted
        let fresh = PlatformEvent::new(NodeId(0), None, None, 50, Timestamp(30), vec![]);
        let fresh_hash = fresh.hash;
        assert!(engine.add_event(fresh)?.is_empty());
        assert!(engine.round_of(&fresh_hash).is_some());
        Ok(())
    }

    /// Test: a node restarted from a peer's round snapshot continues the order
    #[test]
    fn test_resume_from_peer_snapshot() -> anyhow::Result<()> {
        init_test_logging();
        let events = Gossip::new(4, 21).events(800);

        let mut peer = Node::new(engine(4));
        let peer_rounds = peer.receive_all(events.clone())?;
        assert!(peer_rounds.len() > 6);
        let snapshot = peer_rounds[4].snapshot().clone();

        let mut restarted = Node::new(engine(4));
        restarted.engine.out_of_band_snapshot_update(snapshot.clone())?;
        restarted
            .buffer
            .set_event_window(restarted.engine.current_event_window())?;
        let rounds = restarted.receive_all(events)?;

        assert!(!rounds.is_empty());
        assert_eq!(rounds[0].round_number(), snapshot.round + 1);
        let mut expected_order = snapshot.next_consensus_number;
        for event in rounds.iter().flat_map(|r| r.consensus_events()) {
            assert_eq!(event.consensus_order, expected_order);
            assert!(event.consensus_timestamp > snapshot.consensus_timestamp);
            expected_order += 1;
        }
        Ok(())
    }

    /// Test: an invalid snapshot is rejected and leaves the engine untouched
    #[test]
    fn test_invalid_snapshot_leaves_state() -> anyhow::Result<()> {
        let mut engine = engine(4);
        let before = engine.current_event_window();

        let mut gap = snapshot(30, 20);
        gap.minimum_judge_info_list.insert(
            0,
            MinimumJudgeInfo {
                round: 27,
                minimum_judge_ancient_threshold: 18,
            },
        );

        assert!(engine.out_of_band_snapshot_update(gap).is_err());
        assert_eq!(engine.current_event_window(), before);
        Ok(())
    }
}
