//! # Pipeline Flows
//!
//! The asynchronous pipeline produces the same rounds as the synchronous
//! engine, and forwards snapshots and status changes in order.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hg_01_event_intake::{IntakeConfig, OrphanBuffer};
    use hg_02_consensus::{spawn_pipeline, IntakeMessage, PipelineConfig};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use shared_types::PlatformStatus;
    use tokio::time::timeout;

    use crate::fixtures::{engine, summarize, Gossip, Node};
    use crate::init_test_logging;

    fn small_queues() -> PipelineConfig {
        PipelineConfig {
            intake_capacity: 16,
            engine_capacity: 16,
            output_capacity: 256,
        }
    }

    /// Test: shuffled gossip through the pipeline matches the synchronous node
    #[tokio::test]
    async fn test_pipeline_matches_synchronous_node() -> anyhow::Result<()> {
        init_test_logging();
        let events = Gossip::new(4, 41).events(500);
        let expected = Node::new(engine(4)).receive_all(events.clone())?;

        let mut shuffled = events;
        shuffled.shuffle(&mut StdRng::seed_from_u64(3));

        let handle = spawn_pipeline(
            OrphanBuffer::new(IntakeConfig::default()),
            engine(4),
            small_queues(),
        )?;
        let producer = handle.sender();
        let feeder = tokio::spawn(async move {
            for event in shuffled {
                if producer.send(IntakeMessage::Event(event)).await.is_err() {
                    break;
                }
            }
        });
        feeder.await?;

        let actual = timeout(Duration::from_secs(30), handle.shutdown()).await??;
        let decided = expected.len().min(actual.len());
        assert!(decided >= 2);
        assert_eq!(
            summarize(&expected[..decided]),
            summarize(&actual[..decided])
        );
        Ok(())
    }

    /// Test: a status message before the events tags every round as replayed
    #[tokio::test]
    async fn test_pipeline_forwards_status() -> anyhow::Result<()> {
        let handle = spawn_pipeline(
            OrphanBuffer::new(IntakeConfig::default()),
            engine(4),
            small_queues(),
        )?;

        handle
            .submit(IntakeMessage::Status(PlatformStatus::ReplayingEvents))
            .await?;
        let mut gossip = Gossip::new(4, 42);
        for event in gossip.events(200) {
            handle.submit(IntakeMessage::Event(event)).await?;
        }

        let rounds = timeout(Duration::from_secs(30), handle.shutdown()).await??;
        assert!(!rounds.is_empty());
        assert!(rounds.iter().all(|r| r.is_pces_round()));
        Ok(())
    }

    /// Test: a snapshot message resets the pipeline to the snapshot round
    #[tokio::test]
    async fn test_pipeline_applies_snapshot() -> anyhow::Result<()> {
        let events = Gossip::new(4, 43).events(700);
        let reference = Node::new(engine(4)).receive_all(events.clone())?;
        assert!(reference.len() > 6);
        let snapshot = reference[3].snapshot().clone();

        let handle = spawn_pipeline(
            OrphanBuffer::new(IntakeConfig::default()),
            engine(4),
            small_queues(),
        )?;
        handle
            .submit(IntakeMessage::Snapshot(snapshot.clone()))
            .await?;
        for event in events {
            handle.submit(IntakeMessage::Event(event)).await?;
        }

        let rounds = timeout(Duration::from_secs(30), handle.shutdown()).await??;
        assert!(!rounds.is_empty());
        assert_eq!(rounds[0].round_number(), snapshot.round + 1);
        let first_order = rounds
            .iter()
            .flat_map(|r| r.consensus_events())
            .map(|e| e.consensus_order)
            .next();
        assert_eq!(first_order, Some(snapshot.next_consensus_number));
        Ok(())
    }
}
