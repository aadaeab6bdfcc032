//! # Event Ordering Pipeline
//!
//! Runs the orphan buffer and the consensus engine as two tokio tasks joined
//! by bounded channels.
//!
//! ```text
//! submit ──IntakeMessage──→ [Intake Task] ──released──→ [Engine Task] ──ConsensusRound──→ next_round
//!                                ▲                            │
//!                                └──── watch<EventWindow> ────┘
//! ```
//!
//! The window travels back through a `watch` channel rather than a bounded
//! queue, so the engine never blocks on the intake task. The intake task
//! always applies a pending window before taking the next message.

use hg_01_event_intake::{EventIntakeApi, IntakeError};
use shared_types::{
    ConsensusRound, ConsensusSnapshot, EventWindow, PlatformEvent, PlatformStatus,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::PipelineConfig;
use crate::domain::{ConsensusError, ConsensusResult};
use crate::ports::ConsensusEngineApi;

/// Input accepted by the pipeline.
#[derive(Debug, Clone)]
pub enum IntakeMessage {
    /// A validated event from gossip
    Event(PlatformEvent),
    /// Discard all state and resume from a snapshot (reconnect)
    Snapshot(ConsensusSnapshot),
    /// Platform status change
    Status(PlatformStatus),
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Consensus failed: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("Event intake failed: {0}")]
    Intake(#[from] IntakeError),

    #[error("Pipeline input is closed")]
    Closed,

    #[error("Pipeline task panicked: {0}")]
    Join(String),
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    input: mpsc::Sender<IntakeMessage>,
    output: mpsc::Receiver<ConsensusRound>,
    intake_task: JoinHandle<Result<(), IntakeError>>,
    engine_task: JoinHandle<ConsensusResult<()>>,
}

/// Spawn the intake and engine tasks on the current runtime.
pub fn spawn_pipeline<B, E>(
    buffer: B,
    engine: E,
    config: PipelineConfig,
) -> ConsensusResult<PipelineHandle>
where
    B: EventIntakeApi + 'static,
    E: ConsensusEngineApi + 'static,
{
    config.validate()?;

    let (input_tx, input_rx) = mpsc::channel(config.intake_capacity);
    let (engine_tx, engine_rx) = mpsc::channel(config.engine_capacity);
    let (output_tx, output_rx) = mpsc::channel(config.output_capacity);
    let (window_tx, window_rx) = watch::channel(engine.current_event_window());

    let intake_task = tokio::spawn(run_intake(buffer, input_rx, window_rx, engine_tx));
    let engine_task = tokio::spawn(run_engine(engine, engine_rx, window_tx, output_tx));

    info!(
        intake_capacity = config.intake_capacity,
        engine_capacity = config.engine_capacity,
        output_capacity = config.output_capacity,
        "Event ordering pipeline started"
    );

    Ok(PipelineHandle {
        input: input_tx,
        output: output_rx,
        intake_task,
        engine_task,
    })
}

impl PipelineHandle {
    /// Submit a message, waiting for queue capacity.
    pub async fn submit(&self, message: IntakeMessage) -> Result<(), PipelineError> {
        self.input
            .send(message)
            .await
            .map_err(|_| PipelineError::Closed)
    }

    /// A cloned input sender. All clones must be dropped before
    /// [`PipelineHandle::shutdown`] can complete.
    pub fn sender(&self) -> mpsc::Sender<IntakeMessage> {
        self.input.clone()
    }

    /// The next round to reach consensus, `None` once the pipeline stopped.
    pub async fn next_round(&mut self) -> Option<ConsensusRound> {
        self.output.recv().await
    }

    /// Close the input, drain every remaining round and wait for both tasks.
    pub async fn shutdown(self) -> Result<Vec<ConsensusRound>, PipelineError> {
        let Self {
            input,
            mut output,
            intake_task,
            engine_task,
        } = self;
        drop(input);

        let mut rounds = Vec::new();
        while let Some(round) = output.recv().await {
            rounds.push(round);
        }

        engine_task
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))??;
        intake_task
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))??;

        info!(drained = rounds.len(), "Event ordering pipeline stopped");
        Ok(rounds)
    }
}

async fn run_intake<B: EventIntakeApi>(
    mut buffer: B,
    mut input: mpsc::Receiver<IntakeMessage>,
    mut window_rx: watch::Receiver<EventWindow>,
    engine_tx: mpsc::Sender<IntakeMessage>,
) -> Result<(), IntakeError> {
    loop {
        let released = tokio::select! {
            biased;

            changed = window_rx.changed() => {
                if changed.is_err() {
                    debug!("Engine stopped, closing intake");
                    break;
                }
                let window = *window_rx.borrow_and_update();
                buffer.set_event_window(window)?
            }
            message = input.recv() => match message {
                None => break,
                Some(IntakeMessage::Event(event)) => buffer.handle_event(event),
                Some(IntakeMessage::Snapshot(snapshot)) => {
                    buffer.clear();
                    if engine_tx.send(IntakeMessage::Snapshot(snapshot)).await.is_err() {
                        break;
                    }
                    Vec::new()
                }
                Some(IntakeMessage::Status(status)) => {
                    if engine_tx.send(IntakeMessage::Status(status)).await.is_err() {
                        break;
                    }
                    Vec::new()
                }
            },
        };

        for event in released {
            if engine_tx.send(IntakeMessage::Event(event)).await.is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}

async fn run_engine<E: ConsensusEngineApi>(
    mut engine: E,
    mut input: mpsc::Receiver<IntakeMessage>,
    window_tx: watch::Sender<EventWindow>,
    output: mpsc::Sender<ConsensusRound>,
) -> ConsensusResult<()> {
    while let Some(message) = input.recv().await {
        match message {
            IntakeMessage::Event(event) => {
                let rounds = engine.add_event(event).map_err(|e| {
                    error!(error = %e, "Consensus engine failed");
                    e
                })?;
                if rounds.is_empty() {
                    continue;
                }
                window_tx.send_replace(engine.current_event_window());
                for round in rounds {
                    if output.send(round).await.is_err() {
                        debug!("Round consumer gone, stopping engine");
                        return Ok(());
                    }
                }
            }
            IntakeMessage::Snapshot(snapshot) => {
                engine.out_of_band_snapshot_update(snapshot)?;
                window_tx.send_replace(engine.current_event_window());
            }
            IntakeMessage::Status(status) => engine.update_platform_status(status),
        }
    }
    Ok(())
}
