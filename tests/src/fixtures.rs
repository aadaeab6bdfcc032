//! Shared fixtures: a seeded gossip generator and engine builders.

use std::sync::Arc;

use hg_01_event_intake::{IntakeConfig, OrphanBuffer};
use hg_02_consensus::adapters::{NeverFreeze, StaticRosterProvider};
use hg_02_consensus::{
    ConsensusConfig, ConsensusDependencies, ConsensusEngine, ConsensusEngineApi, ConsensusResult,
    FreezeChecker,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{ConsensusRound, EventWindow, NodeId, PlatformEvent, Roster, Timestamp};

/// Random gossip among equally weighted creators.
///
/// Each event picks a random creator and a random other-parent creator, and
/// is born in whatever round the caller supplies.
pub struct Gossip {
    rng: StdRng,
    nodes: u64,
    latest: Vec<Option<PlatformEvent>>,
    clock: u64,
}

impl Gossip {
    pub fn new(nodes: u64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            nodes,
            latest: vec![None; nodes as usize],
            clock: 1_000_000,
        }
    }

    pub fn next_event(&mut self, birth_round: u64) -> PlatformEvent {
        let creator = self.rng.gen_range(0..self.nodes);
        let mut other = self.rng.gen_range(0..self.nodes - 1);
        if other >= creator {
            other += 1;
        }
        self.clock += self.rng.gen_range(1..5_000);

        let event = PlatformEvent::new(
            NodeId(creator),
            self.latest[creator as usize].as_ref().map(|e| e.descriptor()),
            self.latest[other as usize].as_ref().map(|e| e.descriptor()),
            birth_round,
            Timestamp(self.clock),
            vec![self.clock.to_le_bytes().to_vec()],
        );
        self.latest[creator as usize] = Some(event.clone());
        event
    }

    /// `count` events born in round 1.
    pub fn events(&mut self, count: usize) -> Vec<PlatformEvent> {
        (0..count).map(|_| self.next_event(1)).collect()
    }
}

/// Lock-step gossip: every node creates one event per tick, taking its
/// neighbour's event from the previous tick as other-parent.
///
/// Event `(node i, tick t)` is created at `nodes * t + i + 1` seconds.
pub fn lockstep(nodes: u64, ticks: u64) -> Vec<Vec<PlatformEvent>> {
    let mut history: Vec<Vec<PlatformEvent>> = Vec::new();
    for tick in 0..ticks {
        let previous = history.last();
        let parent = |n: u64| previous.map(|p| p[n as usize].descriptor());
        let events = (0..nodes)
            .map(|i| {
                PlatformEvent::new(
                    NodeId(i),
                    parent(i),
                    parent((i + 1) % nodes),
                    1,
                    Timestamp((nodes * tick + i + 1) * 1_000_000_000),
                    vec![],
                )
            })
            .collect();
        history.push(events);
    }
    history
}

pub fn roster(nodes: u64) -> Roster {
    Roster::equal_weight(nodes, 1)
}

pub fn engine(nodes: u64) -> ConsensusEngine {
    engine_with(nodes, ConsensusConfig::default(), Arc::new(NeverFreeze))
}

pub fn engine_with(
    nodes: u64,
    config: ConsensusConfig,
    freeze_checker: Arc<dyn FreezeChecker>,
) -> ConsensusEngine {
    ConsensusEngine::new(
        config,
        ConsensusDependencies {
            roster_provider: Arc::new(StaticRosterProvider::new(roster(nodes))),
            freeze_checker,
        },
    )
    .expect("valid test configuration")
}

/// An orphan buffer in front of an engine, driven synchronously.
pub struct Node {
    pub buffer: OrphanBuffer,
    pub engine: ConsensusEngine,
}

impl Node {
    pub fn new(engine: ConsensusEngine) -> Self {
        let buffer = OrphanBuffer::new(
            IntakeConfig::default().with_ancient_mode(engine.config().ancient_mode),
        );
        Self { buffer, engine }
    }

    /// Submit one gossiped event; returns the rounds it completed.
    pub fn receive(&mut self, event: PlatformEvent) -> ConsensusResult<Vec<ConsensusRound>> {
        let mut rounds = Vec::new();
        let mut ready = self.buffer.handle_event(event);
        while !ready.is_empty() {
            let mut window_changed = false;
            for released in ready.drain(..) {
                let decided = self.engine.add_event(released)?;
                window_changed |= !decided.is_empty();
                rounds.extend(decided);
            }
            if window_changed {
                ready = self.apply_window(self.engine.current_event_window());
            }
        }
        Ok(rounds)
    }

    pub fn receive_all(
        &mut self,
        events: impl IntoIterator<Item = PlatformEvent>,
    ) -> ConsensusResult<Vec<ConsensusRound>> {
        let mut rounds = Vec::new();
        for event in events {
            rounds.extend(self.receive(event)?);
        }
        Ok(rounds)
    }

    fn apply_window(&mut self, window: EventWindow) -> Vec<PlatformEvent> {
        self.buffer
            .set_event_window(window)
            .expect("buffer and engine share an ancient mode")
    }
}

/// `(round, [(hash, order, timestamp)])` per round, for cross-node comparison.
pub fn summarize(rounds: &[ConsensusRound]) -> Vec<(u64, Vec<(shared_types::Hash, u64, Timestamp)>)> {
    rounds
        .iter()
        .map(|r| {
            (
                r.round_number(),
                r.consensus_events()
                    .iter()
                    .map(|e| (e.hash(), e.consensus_order, e.consensus_timestamp))
                    .collect(),
            )
        })
        .collect()
}
