//! # Freeze Flows
//!
//! A scheduled freeze stops round output at the same round on every node.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hg_02_consensus::adapters::FreezeAt;
    use hg_02_consensus::ConsensusConfig;

    use crate::fixtures::{engine, engine_with, Gossip, Node};
    use crate::init_test_logging;

    /// Test: output stops at the first round reaching the freeze time, and
    /// later events are ignored
    #[test]
    fn test_freeze_truncates_at_freeze_round() -> anyhow::Result<()> {
        init_test_logging();
        let events = Gossip::new(4, 31).events(600);

        let mut reference = Node::new(engine(4));
        let all_rounds = reference.receive_all(events.clone())?;
        assert!(all_rounds.len() > 4);
        let freeze_time = all_rounds[2].reached_consensus_timestamp();

        let mut frozen = Node::new(engine_with(
            4,
            ConsensusConfig::default(),
            Arc::new(FreezeAt::new(freeze_time)),
        ));
        let rounds = frozen.receive_all(events)?;

        let numbers: Vec<u64> = rounds.iter().map(|r| r.round_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(frozen.engine.is_frozen());

        let freeze_round = &rounds[2];
        assert_eq!(
            freeze_round.event_window().new_event_birth_round(),
            freeze_round.round_number()
        );
        assert_eq!(freeze_round.consensus_events(), all_rounds[2].consensus_events());

        let mut more = Gossip::new(4, 32);
        assert!(frozen.receive_all(more.events(50))?.is_empty());
        Ok(())
    }
}
