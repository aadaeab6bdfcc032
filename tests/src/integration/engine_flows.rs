//! # Engine Flows
//!
//! Gossip → orphan buffer → consensus engine, driven synchronously.
//!
//! ## Flows Tested:
//!
//! 1. **Genesis**: four equally weighted nodes decide rounds 1 and 2
//! 2. **Determinism**: arrival order does not change the consensus output
//! 3. **Window feedback**: windows advance monotonically while birth rounds
//!    follow the latest window
//! 4. **Lock step**: rounds 1 and 2 of four nodes gossiping one event per
//!    tick hold exactly the expected events
//! 5. **Generation mode**: generation thresholds drive the window and
//!    parents are ordered before children

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use std::collections::HashMap;
    use std::sync::Arc;

    use hg_02_consensus::adapters::NeverFreeze;
    use hg_02_consensus::{ConsensusConfig, ConsensusEngineApi};
    use shared_types::{AncientMode, Hash, Timestamp, FIRST_GENERATION, ROUND_FIRST};

    use crate::fixtures::{engine, engine_with, lockstep, summarize, Gossip, Node};
    use crate::init_test_logging;

    /// Test: four nodes with equal weight emit rounds 1 then 2
    #[test]
    fn test_four_nodes_emit_first_rounds() -> anyhow::Result<()> {
        init_test_logging();
        let mut node = Node::new(engine(4));

        let rounds = node.receive_all(Gossip::new(4, 11).events(400))?;

        assert!(rounds.len() >= 2);
        assert_eq!(rounds[0].round_number(), ROUND_FIRST);
        assert_eq!(rounds[1].round_number(), ROUND_FIRST + 1);
        assert!(rounds.iter().all(|r| r.consensus_roster().len() == 4));
        Ok(())
    }

    /// Test: two nodes receiving the same events in different orders agree
    #[test]
    fn test_nodes_agree_regardless_of_arrival_order() -> anyhow::Result<()> {
        init_test_logging();
        let events = Gossip::new(4, 12).events(600);

        let mut in_order = Node::new(engine(4));
        let expected = in_order.receive_all(events.clone())?;

        let mut shuffled = events;
        shuffled.shuffle(&mut StdRng::seed_from_u64(7));
        let mut out_of_order = Node::new(engine(4));
        let actual = out_of_order.receive_all(shuffled)?;

        let decided = expected.len().min(actual.len());
        assert!(decided >= 3);
        assert_eq!(
            summarize(&expected[..decided]),
            summarize(&actual[..decided])
        );
        for (a, b) in expected.iter().zip(actual.iter()) {
            assert_eq!(a.event_window(), b.event_window());
            assert_eq!(a.snapshot(), b.snapshot());
        }
        Ok(())
    }

    /// Test: every event is ordered at most once and orders have no gaps
    #[test]
    fn test_consensus_order_has_no_gaps() -> anyhow::Result<()> {
        let mut node = Node::new(engine(5));
        let rounds = node.receive_all(Gossip::new(5, 13).events(700))?;

        let mut seen = std::collections::HashSet::new();
        let mut expected_order = 0;
        for event in rounds.iter().flat_map(|r| r.consensus_events()) {
            assert!(seen.insert(event.hash()));
            assert_eq!(event.consensus_order, expected_order);
            expected_order += 1;
        }
        assert!(expected_order > 0);
        Ok(())
    }

    /// Test: windows move forward as events are born in later rounds
    #[test]
    fn test_windows_advance_with_birth_rounds() -> anyhow::Result<()> {
        let config = ConsensusConfig::default().with_rounds(4, 8);
        let mut node = Node::new(engine_with(4, config, Arc::new(NeverFreeze)));
        let mut gossip = Gossip::new(4, 14);

        let mut rounds = Vec::new();
        for _ in 0..1_000 {
            let birth_round = node.engine.current_event_window().new_event_birth_round();
            rounds.extend(node.receive(gossip.next_event(birth_round))?);
        }

        assert!(rounds.len() > 8);
        for pair in rounds.windows(2) {
            assert_eq!(pair[1].round_number(), pair[0].round_number() + 1);
            assert!(
                pair[1].event_window().ancient_threshold()
                    >= pair[0].event_window().ancient_threshold()
            );
            assert!(
                pair[1].event_window().expired_threshold()
                    >= pair[0].event_window().expired_threshold()
            );
        }
        let last = rounds.last().map(|r| *r.event_window());
        assert!(last.is_some_and(|w| w.ancient_threshold() > ROUND_FIRST));
        assert_eq!(node.buffer.event_window(), &node.engine.current_event_window());
        Ok(())
    }

    /// Test: shuffled lock-step gossip decides an empty round 1 and a round 2
    /// holding exactly ticks 0 and 1
    #[test]
    fn test_lockstep_rounds_exact_contents() -> anyhow::Result<()> {
        init_test_logging();
        let ticks = lockstep(4, 13);
        let mut events: Vec<_> = ticks.iter().flatten().cloned().collect();
        events.shuffle(&mut StdRng::seed_from_u64(8));

        let mut node = Node::new(engine(4));
        let rounds = node.receive_all(events)?;

        let numbers: Vec<u64> = rounds.iter().map(|r| r.round_number()).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(rounds[0].is_empty());

        // (tick, node, received at seconds) in consensus order
        let expected: Vec<(Hash, u64, Timestamp)> = [
            (0, 2, 9),
            (0, 3, 10),
            (0, 0, 11),
            (0, 1, 12),
            (1, 2, 13),
            (1, 3, 14),
            (1, 0, 15),
            (1, 1, 16),
        ]
        .iter()
        .enumerate()
        .map(|(order, &(tick, creator, secs))| {
            (
                ticks[tick][creator].hash,
                order as u64,
                Timestamp(secs * 1_000_000_000),
            )
        })
        .collect();
        assert_eq!(summarize(&rounds[1..]), vec![(2, expected)]);
        Ok(())
    }

    /// Test: an engine in generation mode advances generation windows and
    /// never orders a child before its parent
    #[test]
    fn test_generation_mode_orders_parents_first() -> anyhow::Result<()> {
        let config = ConsensusConfig::default()
            .with_ancient_mode(AncientMode::GenerationThreshold)
            .with_rounds(4, 8);
        let mut node = Node::new(engine_with(4, config, Arc::new(NeverFreeze)));
        let rounds = node.receive_all(Gossip::new(4, 15).events(1_000))?;

        assert!(rounds.len() > 8);
        let orders: HashMap<Hash, u64> = rounds
            .iter()
            .flat_map(|r| r.consensus_events())
            .map(|e| (e.hash(), e.consensus_order))
            .collect();
        for event in rounds.iter().flat_map(|r| r.consensus_events()) {
            for parent in event.event.parents() {
                if let Some(parent_order) = orders.get(&parent.hash) {
                    assert!(*parent_order < event.consensus_order);
                }
            }
        }

        let window = node.engine.current_event_window();
        assert_eq!(window.ancient_mode(), AncientMode::GenerationThreshold);
        assert!(window.ancient_threshold() > FIRST_GENERATION);
        assert_eq!(node.buffer.event_window(), &window);
        Ok(())
    }

    /// Test: configuration loads from JSON with defaults for missing fields
    #[test]
    fn test_config_from_json() -> anyhow::Result<()> {
        let config: ConsensusConfig =
            serde_json::from_str(r#"{"rounds_non_ancient": 4, "rounds_expired": 8}"#)?;
        assert_eq!(config.rounds_non_ancient, 4);
        assert_eq!(config.coin_freq, ConsensusConfig::default().coin_freq);
        config.validate()?;
        Ok(())
    }
}
