//! # Hashgraph Consensus Core
//!
//! Virtual voting over the linked event DAG.
//!
//! ## Algorithm
//!
//! 1. **Rounds**: an event is in the round of its highest parent, plus one if
//!    it strongly sees witnesses of that round carrying more than 2/3 of the
//!    round's roster weight.
//! 2. **Witnesses**: the first event of a creator in a round.
//! 3. **Fame**: witnesses of later rounds vote on whether the witnesses of
//!    the lowest undecided round are famous. Every `coin_freq`-th voting
//!    round is a coin round that cannot decide.
//! 4. **Ordering**: once every known witness of a round is decided, its
//!    famous witnesses (the judges) determine which events are received in
//!    the round and their consensus timestamps.
//!
//! Events are stored in an arena keyed by a monotonically increasing
//! [`EventIdx`]; parent and last-seen references are arena keys, so removing
//! expired events never invalidates a live reference, it only makes the
//! lookup miss.

mod election;
mod node;
mod window;

pub use window::event_window_from_snapshot;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use shared_types::{
    ConsensusEvent, ConsensusRound, ConsensusSnapshot, EventWindow, Hash, MinimumJudgeInfo,
    NodeId, PlatformEvent, Roster, Timestamp, ROUND_FIRST, ROUND_NEGATIVE_INFINITY,
};
use tracing::{debug, error, info};

use crate::config::ConsensusConfig;
use crate::domain::error::{ConsensusError, ConsensusResult};
use crate::domain::linker::LinkedEvent;
use crate::metrics;
use crate::ports::RosterProvider;

use election::{coin, Election, Tally};
use node::{EventIdx, EventNode, SeenRef};
use window::{window_for_round, JudgeInfoHistory};

/// State carried over from the last loaded snapshot.
#[derive(Debug)]
struct LoadedSnapshot {
    round: u64,
    judges: HashSet<Hash>,
}

/// The virtual-voting state machine.
pub struct ConsensusCore {
    config: ConsensusConfig,
    roster_provider: Arc<dyn RosterProvider>,

    nodes: HashMap<EventIdx, EventNode>,
    by_hash: HashMap<Hash, EventIdx>,
    next_idx: u64,

    creators: Vec<NodeId>,
    creator_indices: HashMap<NodeId, usize>,

    /// Witnesses per round, in arrival order
    witnesses: BTreeMap<u64, Vec<EventIdx>>,
    election: Election,
    last_decided_round: u64,
    judge_history: JudgeInfoHistory,
    snapshot: Option<LoadedSnapshot>,

    next_consensus_number: u64,
    last_consensus_timestamp: Option<Timestamp>,
    event_window: EventWindow,
    pces_mode: bool,
}

impl ConsensusCore {
    pub fn new(config: ConsensusConfig, roster_provider: Arc<dyn RosterProvider>) -> Self {
        let event_window = EventWindow::genesis(config.ancient_mode);
        let judge_history = JudgeInfoHistory::new(config.rounds_expired as usize);
        Self {
            config,
            roster_provider,
            nodes: HashMap::new(),
            by_hash: HashMap::new(),
            next_idx: 0,
            creators: Vec::new(),
            creator_indices: HashMap::new(),
            witnesses: BTreeMap::new(),
            election: Election::new(ROUND_FIRST),
            last_decided_round: ROUND_NEGATIVE_INFINITY,
            judge_history,
            snapshot: None,
            next_consensus_number: 0,
            last_consensus_timestamp: None,
            event_window,
            pces_mode: false,
        }
    }

    // =========================================================================
    // PUBLIC API
    // =========================================================================

    /// Add a linked event. Parents must have been added before children.
    ///
    /// Returns the rounds that reached consensus, in increasing order.
    pub fn add_event(&mut self, linked: LinkedEvent) -> ConsensusResult<Vec<ConsensusRound>> {
        if self.by_hash.contains_key(&linked.hash()) {
            return Ok(Vec::new());
        }

        let idx = self.insert(linked)?;
        let node = self.node(idx)?;
        if !node.is_witness {
            return Ok(Vec::new());
        }

        let round = node.round;
        self.witnesses.entry(round).or_default().push(idx);

        if round <= self.last_decided_round {
            let node = self.node_mut(idx)?;
            if node.fame.is_none() {
                node.fame = Some(false);
            }
            return Ok(Vec::new());
        }

        if round == self.election.round() {
            // A new candidate: earlier voters have not voted on it yet
            self.run_elections(None)
        } else {
            self.run_elections(Some(idx))
        }
    }

    /// Discard all state and resume from `snapshot`.
    pub fn load_snapshot(&mut self, snapshot: &ConsensusSnapshot) -> ConsensusResult<()> {
        let window = event_window_from_snapshot(snapshot, &self.config)?;

        self.nodes.clear();
        self.by_hash.clear();
        self.creators.clear();
        self.creator_indices.clear();
        self.witnesses.clear();

        self.judge_history =
            JudgeInfoHistory::from_snapshot(snapshot, self.config.rounds_expired as usize);
        self.last_decided_round = snapshot.round;
        self.election = Election::new(snapshot.round + 1);
        self.snapshot = Some(LoadedSnapshot {
            round: snapshot.round,
            judges: snapshot.judge_hashes.iter().copied().collect(),
        });
        self.next_consensus_number = snapshot.next_consensus_number;
        self.last_consensus_timestamp = Some(snapshot.consensus_timestamp);
        self.event_window = window;

        info!(
            round = snapshot.round,
            judges = snapshot.judge_hashes.len(),
            %window,
            "Loaded consensus snapshot"
        );
        Ok(())
    }

    /// Rounds produced while set are tagged as replayed pre-consensus rounds.
    pub fn set_pces_mode(&mut self, pces_mode: bool) {
        self.pces_mode = pces_mode;
    }

    pub fn pces_mode(&self) -> bool {
        self.pces_mode
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    pub fn last_decided_round(&self) -> u64 {
        self.last_decided_round
    }

    /// Number of events held in memory.
    pub fn event_count(&self) -> usize {
        self.nodes.len()
    }

    /// Round created of an event, if it is still in memory.
    pub fn round_of(&self, hash: &Hash) -> Option<u64> {
        let idx = self.by_hash.get(hash)?;
        self.nodes.get(idx).map(|n| n.round)
    }

    pub fn is_judge(&self, hash: &Hash) -> bool {
        self.by_hash
            .get(hash)
            .and_then(|idx| self.nodes.get(idx))
            .is_some_and(|n| n.is_judge)
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    fn node(&self, idx: EventIdx) -> ConsensusResult<&EventNode> {
        self.nodes
            .get(&idx)
            .ok_or_else(|| ConsensusError::CorruptState(format!("missing arena node {:?}", idx)))
    }

    fn node_mut(&mut self, idx: EventIdx) -> ConsensusResult<&mut EventNode> {
        self.nodes
            .get_mut(&idx)
            .ok_or_else(|| ConsensusError::CorruptState(format!("missing arena node {:?}", idx)))
    }

    fn roster(&self, round: u64) -> Arc<Roster> {
        self.roster_provider.roster_for_round(round)
    }

    fn creator_index(&mut self, creator: NodeId) -> usize {
        if let Some(&index) = self.creator_indices.get(&creator) {
            return index;
        }
        let index = self.creators.len();
        self.creators.push(creator);
        self.creator_indices.insert(creator, index);
        index
    }

    fn insert(&mut self, linked: LinkedEvent) -> ConsensusResult<EventIdx> {
        let idx = EventIdx(self.next_idx);
        self.next_idx += 1;

        let creator_index = self.creator_index(linked.event.creator);
        let self_parent = self.arena_index(linked.self_parent.as_deref());
        let other_parent = self.arena_index(linked.other_parent.as_deref());

        let mut last_see: Vec<Option<SeenRef>> = vec![None; self.creators.len()];
        for parent in self_parent.into_iter().chain(other_parent) {
            let Some(parent) = self.nodes.get(&parent) else {
                continue;
            };
            for (i, seen) in parent.last_see.iter().enumerate() {
                if let Some(seen) = seen {
                    if last_see[i].map_or(true, |cur| seen.generation > cur.generation) {
                        last_see[i] = Some(*seen);
                    }
                }
            }
        }
        last_see[creator_index] = Some(SeenRef {
            idx,
            generation: linked.event.generation,
        });

        let hash = linked.event.hash;
        self.nodes.insert(
            idx,
            EventNode {
                event: linked.event,
                creator_index,
                self_parent,
                other_parent,
                round: ROUND_NEGATIVE_INFINITY,
                is_witness: false,
                fame: None,
                is_judge: false,
                last_see,
                round_received: None,
            },
        );
        self.by_hash.insert(hash, idx);

        let is_snapshot_judge = self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.judges.contains(&hash));
        let round = self.compute_round(idx, is_snapshot_judge)?;
        let self_parent_round = match self_parent {
            Some(sp) => Some(self.node(sp)?.round),
            None => None,
        };

        let node = self.node_mut(idx)?;
        node.round = round;
        node.is_witness = round != ROUND_NEGATIVE_INFINITY
            && (is_snapshot_judge || self_parent_round.map_or(true, |r| round > r));
        if is_snapshot_judge {
            node.fame = Some(true);
            node.is_judge = true;
        }

        debug!(
            hash = %hash,
            round,
            witness = node.is_witness,
            "Event added to hashgraph"
        );
        Ok(idx)
    }

    fn arena_index(&self, parent: Option<&PlatformEvent>) -> Option<EventIdx> {
        let idx = self.by_hash.get(&parent?.hash)?;
        self.nodes.contains_key(idx).then_some(*idx)
    }

    fn compute_round(&self, idx: EventIdx, is_snapshot_judge: bool) -> ConsensusResult<u64> {
        if is_snapshot_judge {
            if let Some(snapshot) = &self.snapshot {
                return Ok(snapshot.round);
            }
        }

        let node = self.node(idx)?;
        let parent_round = node
            .parents()
            .filter_map(|p| self.nodes.get(&p))
            .map(|p| p.round)
            .max();

        let r = match parent_round {
            // No relevant parents: genesis, or history from before the snapshot
            None if self.snapshot.is_some() => return Ok(ROUND_NEGATIVE_INFINITY),
            None => return Ok(ROUND_FIRST),
            Some(ROUND_NEGATIVE_INFINITY) => return Ok(ROUND_NEGATIVE_INFINITY),
            Some(r) => r,
        };

        let roster = self.roster(r);
        let mut creators_seen: HashSet<usize> = HashSet::new();
        let mut weight = 0u64;
        for witness in self.witnesses.get(&r).into_iter().flatten() {
            let Some(witness) = self.nodes.get(witness) else {
                continue;
            };
            if !creators_seen.contains(&witness.creator_index)
                && self.strongly_sees(node, witness, &roster)
            {
                creators_seen.insert(witness.creator_index);
                weight += roster.weight_of(&witness.event.creator);
            }
        }

        Ok(if roster.is_supermajority(weight) { r + 1 } else { r })
    }

    /// `seer` strongly sees `target` if the creators through whose latest
    /// events it sees `target` carry a supermajority of weight.
    fn strongly_sees(&self, seer: &EventNode, target: &EventNode, roster: &Roster) -> bool {
        let weight: u64 = seer
            .last_see
            .iter()
            .enumerate()
            .filter_map(|(creator_index, seen)| {
                let intermediate = self.nodes.get(&(*seen)?.idx)?;
                intermediate
                    .sees(target)
                    .then(|| roster.weight_of(&self.creators[creator_index]))
            })
            .sum();
        roster.is_supermajority(weight)
    }

    // =========================================================================
    // ELECTIONS
    // =========================================================================

    /// Cast votes and decide rounds until the current election stalls.
    ///
    /// With `new_voter` only that witness votes; otherwise all votes of the
    /// current election are recounted.
    fn run_elections(
        &mut self,
        mut new_voter: Option<EventIdx>,
    ) -> ConsensusResult<Vec<ConsensusRound>> {
        let mut rounds = Vec::new();
        let mut recount = new_voter.is_none();

        loop {
            if recount {
                let election_round = self.election.round();
                self.election.reset(election_round);
                let voters: Vec<EventIdx> = self
                    .witnesses
                    .range(election_round + 1..)
                    .flat_map(|(_, ws)| ws.iter().copied())
                    .collect();
                for voter in voters {
                    self.cast_votes(voter)?;
                }
            } else if let Some(voter) = new_voter.take() {
                self.cast_votes(voter)?;
            }

            if !self.election_complete() {
                break;
            }
            rounds.push(self.decide_round()?);
            recount = true;
        }

        Ok(rounds)
    }

    fn cast_votes(&mut self, voter_idx: EventIdx) -> ConsensusResult<()> {
        let election_round = self.election.round();
        let voter = self.node(voter_idx)?;
        if voter.round <= election_round {
            return Ok(());
        }
        let distance = voter.round - election_round;
        let candidates: Vec<EventIdx> = self
            .witnesses
            .get(&election_round)
            .cloned()
            .unwrap_or_default();

        if distance == 1 {
            let votes: Vec<(EventIdx, bool)> = candidates
                .iter()
                .filter_map(|c| self.nodes.get(c).map(|cand| (*c, voter.sees(cand))))
                .collect();
            for (candidate, vote) in votes {
                self.election.record(voter_idx, candidate, vote);
            }
            return Ok(());
        }

        let previous_round = voter.round - 1;
        let roster = self.roster(previous_round);
        let mut creators_seen: HashSet<usize> = HashSet::new();
        let mut strongly_seen: Vec<(EventIdx, u64)> = Vec::new();
        for w in self.witnesses.get(&previous_round).into_iter().flatten() {
            let Some(witness) = self.nodes.get(w) else {
                continue;
            };
            if !creators_seen.contains(&witness.creator_index)
                && self.strongly_sees(voter, witness, &roster)
            {
                creators_seen.insert(witness.creator_index);
                strongly_seen.push((*w, roster.weight_of(&witness.event.creator)));
            }
        }

        let is_coin_round = distance % self.config.coin_freq == 0;
        let coin_vote = coin(&voter.event);

        let mut votes: Vec<(EventIdx, bool)> = Vec::with_capacity(candidates.len());
        let mut decisions: Vec<(EventIdx, bool)> = Vec::new();
        for candidate in candidates {
            let Some(cand) = self.nodes.get(&candidate) else {
                continue;
            };
            if let Some(fame) = cand.fame {
                votes.push((candidate, fame));
                continue;
            }

            let mut tally = Tally::default();
            for (w, weight) in &strongly_seen {
                if let Some(vote) = self.election.vote_of(*w, candidate) {
                    tally.add(vote, *weight);
                }
            }
            let majority = tally.majority();
            let supermajority = roster.is_supermajority(tally.majority_weight());

            if is_coin_round {
                votes.push((candidate, if supermajority { majority } else { coin_vote }));
            } else {
                if supermajority {
                    decisions.push((candidate, majority));
                }
                votes.push((candidate, majority));
            }
        }

        for (candidate, vote) in votes {
            self.election.record(voter_idx, candidate, vote);
        }
        for (candidate, fame) in decisions {
            debug!(round = election_round, famous = fame, "Witness fame decided");
            self.node_mut(candidate)?.fame = Some(fame);
        }
        Ok(())
    }

    fn election_complete(&self) -> bool {
        let Some(candidates) = self.witnesses.get(&self.election.round()) else {
            return false;
        };
        let mut live = candidates.iter().filter_map(|c| self.nodes.get(c)).peekable();
        live.peek().is_some() && live.all(|c| c.fame.is_some())
    }

    // =========================================================================
    // ROUND DECISION
    // =========================================================================

    fn decide_round(&mut self) -> ConsensusResult<ConsensusRound> {
        let round = self.election.round();
        let expected = self.last_decided_round + 1;
        if round != expected {
            error!(expected, round, "Consensus round out of sequence");
            return Err(ConsensusError::RoundRegression {
                expected,
                actual: round,
            });
        }

        let judges = self.select_judges(round)?;
        let mode = self.config.ancient_mode;
        let minimum_judge_ancient_threshold = judges
            .iter()
            .filter_map(|j| self.nodes.get(j))
            .map(|j| j.event.ancient_indicator(mode))
            .min()
            .ok_or_else(|| {
                ConsensusError::CorruptState(format!("round {} has no judges", round))
            })?;
        self.judge_history.push(MinimumJudgeInfo {
            round,
            minimum_judge_ancient_threshold,
        })?;

        let judge_times: Vec<Timestamp> = judges
            .iter()
            .filter_map(|j| self.nodes.get(j))
            .map(EventNode::time_created)
            .collect();
        let consensus_events = self.order_events(round, &judges)?;

        let reached_consensus_timestamp =
            match (consensus_events.last(), self.last_consensus_timestamp) {
                (Some(last), _) => last.consensus_timestamp,
                (None, Some(previous)) => previous.saturating_add_nanos(1),
                (None, None) => median(judge_times),
            };
        self.last_consensus_timestamp = Some(reached_consensus_timestamp);

        self.last_decided_round = round;
        self.election.reset(round + 1);
        let event_window = self.advance_window(round)?;

        let judge_hashes: Vec<Hash> = judges
            .iter()
            .filter_map(|j| self.nodes.get(j))
            .map(|j| j.event.hash)
            .collect();
        let snapshot = ConsensusSnapshot {
            round,
            judge_hashes,
            minimum_judge_info_list: self.judge_history.latest(self.config.rounds_non_ancient),
            next_consensus_number: self.next_consensus_number,
            consensus_timestamp: reached_consensus_timestamp,
        };

        info!(
            round,
            events = consensus_events.len(),
            judges = judges.len(),
            ancient_threshold = event_window.ancient_threshold(),
            "Round reached consensus"
        );
        metrics::record_round_emitted(round);

        let consensus_round = ConsensusRound::new(
            round,
            self.roster(round),
            consensus_events,
            event_window,
            snapshot,
            self.pces_mode,
            reached_consensus_timestamp,
        );

        self.expire(round);
        Ok(consensus_round)
    }

    /// Famous witnesses of `round`, one per creator (lowest hash on a fork).
    fn select_judges(&mut self, round: u64) -> ConsensusResult<Vec<EventIdx>> {
        let mut by_creator: BTreeMap<NodeId, (Hash, EventIdx)> = BTreeMap::new();
        for w in self.witnesses.get(&round).into_iter().flatten() {
            let Some(witness) = self.nodes.get(w) else {
                continue;
            };
            if witness.fame != Some(true) {
                continue;
            }
            let entry = by_creator
                .entry(witness.event.creator)
                .or_insert((witness.event.hash, *w));
            if witness.event.hash < entry.0 {
                *entry = (witness.event.hash, *w);
            }
        }

        let judges: Vec<EventIdx> = by_creator.into_values().map(|(_, idx)| idx).collect();
        for judge in &judges {
            self.node_mut(*judge)?.is_judge = true;
        }
        Ok(judges)
    }

    /// Events received in `round`: the not-yet-ordered ancestors of the
    /// judges that every judge sees, in consensus order.
    fn order_events(
        &mut self,
        round: u64,
        judges: &[EventIdx],
    ) -> ConsensusResult<Vec<ConsensusEvent>> {
        let judge_nodes: Vec<&EventNode> =
            judges.iter().filter_map(|j| self.nodes.get(j)).collect();
        let Some(first_judge) = judges.first() else {
            return Ok(Vec::new());
        };
        let snapshot_judges: Vec<&EventNode> = self
            .snapshot
            .iter()
            .flat_map(|s| s.judges.iter())
            .filter_map(|h| self.by_hash.get(h))
            .filter_map(|idx| self.nodes.get(idx))
            .collect();

        let mut received: Vec<(Timestamp, u64, Hash, EventIdx)> = Vec::new();
        let mut visited: HashSet<EventIdx> = HashSet::new();
        let mut stack = vec![*first_judge];

        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            let Some(node) = self.nodes.get(&idx) else {
                continue;
            };
            if node.round_received.is_some() || self.ordered_before_snapshot(node, &snapshot_judges)
            {
                continue;
            }
            if judge_nodes.iter().all(|j| j.sees(node)) {
                let times: Vec<Timestamp> = judge_nodes
                    .iter()
                    .map(|j| self.first_self_ancestor_seeing(j, node))
                    .collect();
                received.push((median(times), node.event.generation, node.event.hash, idx));
            }
            stack.extend(node.parents());
        }

        received.sort();

        let mut events = Vec::with_capacity(received.len());
        for (timestamp, _, _, idx) in received {
            let consensus_timestamp = match self.last_consensus_timestamp {
                Some(last) if timestamp <= last => last.saturating_add_nanos(1),
                _ => timestamp,
            };
            self.last_consensus_timestamp = Some(consensus_timestamp);

            let consensus_order = self.next_consensus_number;
            self.next_consensus_number += 1;

            let node = self.node_mut(idx)?;
            node.round_received = Some(round);
            events.push(ConsensusEvent {
                event: Arc::clone(&node.event),
                round_received: round,
                consensus_timestamp,
                consensus_order,
            });
        }
        Ok(events)
    }

    /// Pre-snapshot events that every snapshot judge in memory sees were
    /// ordered before the snapshot was taken.
    fn ordered_before_snapshot(&self, node: &EventNode, snapshot_judges: &[&EventNode]) -> bool {
        match &self.snapshot {
            Some(snapshot) => {
                node.round <= snapshot.round && snapshot_judges.iter().all(|j| j.sees(node))
            }
            None => false,
        }
    }

    /// Creation time of the earliest self-ancestor of `judge` that sees `target`.
    fn first_self_ancestor_seeing(&self, judge: &EventNode, target: &EventNode) -> Timestamp {
        let mut current = judge;
        while let Some(parent) = current.self_parent.and_then(|sp| self.nodes.get(&sp)) {
            if !parent.sees(target) {
                break;
            }
            current = parent;
        }
        current.time_created()
    }

    // =========================================================================
    // WINDOW & MEMORY
    // =========================================================================

    fn advance_window(&mut self, round: u64) -> ConsensusResult<EventWindow> {
        let computed = window_for_round(&self.judge_history, round, &self.config)?;
        let previous = self.event_window;

        let ancient = computed.ancient_threshold().max(previous.ancient_threshold());
        let expired = computed
            .expired_threshold()
            .max(previous.expired_threshold())
            .min(ancient);

        let window = EventWindow::new(
            round,
            computed.new_event_birth_round(),
            ancient,
            expired,
            self.config.ancient_mode,
        )?;
        self.event_window = window;
        Ok(window)
    }

    /// Forget events below the expired threshold and old witness lists.
    fn expire(&mut self, round: u64) {
        let window = self.event_window;
        let mode = self.config.ancient_mode;

        let expired: Vec<(EventIdx, Hash)> = self
            .nodes
            .iter()
            .filter(|(_, n)| window.is_expired_indicator(n.event.ancient_indicator(mode)))
            .map(|(idx, n)| (*idx, n.event.hash))
            .collect();
        for (idx, hash) in &expired {
            self.nodes.remove(idx);
            self.by_hash.remove(hash);
        }

        let oldest_kept = round.saturating_sub(self.config.rounds_expired);
        self.witnesses = self.witnesses.split_off(&oldest_kept);

        if !expired.is_empty() {
            debug!(expired = expired.len(), remaining = self.nodes.len(), "Expired events");
        }
    }
}

/// Element at index `len / 2` of the sorted values.
fn median(mut values: Vec<Timestamp>) -> Timestamp {
    values.sort();
    values.get(values.len() / 2).copied().unwrap_or_default()
}
