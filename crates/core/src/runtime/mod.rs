mod scheduler;
mod shutdown;

pub use scheduler::{Job, Scheduler};
pub use shutdown::ShutdownGuard;

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::io::input::{self, InboundEvent, InputReceiver, InputSender};
use crate::io::output::{self, OutboundMessage, OutputSender, OutputReceiver};
use crate::router::ResponseRouter;

const INPUT_BUFFER: usize = 256;
const OUTPUT_BUFFER: usize = 64;

/// Drives the router: one inbound event at a time, scheduled jobs in between.
pub struct Runtime {
    router: ResponseRouter,
    scheduler: Scheduler,
    shutdown: ShutdownGuard,
    /// Inbound events from the transport.
    input_rx: InputReceiver,
    /// Replies and owner alerts for the transport.
    output_tx: OutputSender,
}

impl Runtime {
    /// Create a runtime. Returns (Runtime, input_sender, output_receiver).
    pub fn new(router: ResponseRouter) -> (Self, InputSender, OutputReceiver) {
        let (input_tx, input_rx) = input::channel(INPUT_BUFFER);
        let (output_tx, output_rx) = output::channel(OUTPUT_BUFFER);
        let scheduler = Scheduler::new(router.cfg(), Instant::now());
        let runtime = Self { router, scheduler, shutdown: ShutdownGuard::new(), input_rx, output_tx };
        (runtime, input_tx, output_rx)
    }

    /// Returns the cancellation token for spawning child tasks.
    pub fn token(&self) -> CancellationToken {
        self.shutdown.token()
    }

    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Start the signal listener and process events until shutdown or until
    /// every input sender is dropped.
    pub async fn run(&mut self) {
        self.shutdown.spawn_signal_listener();
        let token = self.shutdown.token();
        tracing::info!("resbot runtime started");

        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("shutdown signal received, exiting event loop");
                    break;
                }
                event = self.input_rx.recv() => {
                    let Some(event) = event else {
                        tracing::info!("input channel closed");
                        break;
                    };
                    self.handle_event(event).await;
                }
                _ = sleep_until(deadline) => {
                    self.run_due_jobs(Instant::now()).await;
                }
            }
        }
        tracing::info!("resbot runtime stopped");
    }

    /// Route every message of one event, in order, and forward the replies.
    pub async fn handle_event(&mut self, event: InboundEvent) {
        for message in &event.messages {
            if let Some(reply) = self.router.route_message(message).await {
                self.send(reply.into()).await;
            }
        }
    }

    /// Run the jobs due at `now`. Failures are logged; the loop keeps going.
    pub async fn run_due_jobs(&mut self, now: Instant) -> Vec<Job> {
        let due = self.scheduler.due(now);
        for job in &due {
            tracing::debug!(job = job.as_str(), "running scheduled job");
            match job {
                Job::Cleanup => {
                    self.router.cleanup(now);
                }
                Job::Backup => {
                    if let Err(e) = self.router.backup().await {
                        tracing::warn!(error = %e, "scheduled backup failed");
                    }
                }
                Job::Monitoring => {
                    let alerts = self.router.health_check();
                    let Some(owner) = self.router.owner_chat() else { continue };
                    for alert in alerts {
                        self.send(OutboundMessage::new(owner.clone(), alert.message)).await;
                    }
                }
            }
        }
        due
    }

    async fn send(&self, message: OutboundMessage) {
        if self.output_tx.send(message).await.is_err() {
            tracing::warn!("output channel closed, reply dropped");
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at.into()).await,
        None => std::future::pending().await,
    }
}
