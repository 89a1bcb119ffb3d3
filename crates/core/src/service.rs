use crate::{adapter::ChainAdapter, engine::ReconciliationEngine};
use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A spawned background task together with the token that stops it
#[derive(Debug)]
pub struct ServiceHandle {
    pub name: String,
    pub handle: JoinHandle<()>,
    pub shutdown: CancellationToken,
}

impl ServiceHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn stop_and_join(self) {
        self.shutdown.cancel();
        self.join().await;
    }

    /// Waits for the task without signalling it
    pub async fn join(self) {
        match self.handle.await {
            Ok(()) => debug!("Service '{}' shut down successfully", self.name),
            Err(e) => tracing::error!("Service '{}' panicked: {}", self.name, e),
        }
    }
}

/// Ticks a [`ReconciliationEngine`] on a fixed interval until cancelled.
///
/// Ticks never overlap; a slow tick delays the next one instead of causing a
/// burst.
pub struct EngineService<A: ChainAdapter> {
    engine: ReconciliationEngine<A>,
    polling_rate: Duration,
    shutdown: CancellationToken,
}

impl<A: ChainAdapter> EngineService<A> {
    pub fn spawn(
        engine: ReconciliationEngine<A>,
        polling_rate: Duration,
        shutdown: CancellationToken,
    ) -> ServiceHandle {
        let name = format!("engine:{}", engine.name());
        let service = Self {
            engine,
            polling_rate,
            shutdown: shutdown.clone(),
        };
        let handle = tokio::spawn(service.start());

        ServiceHandle {
            name,
            handle,
            shutdown,
        }
    }

    async fn start(self) {
        info!(adapter = self.engine.name(), "starting reconciliation service");

        let mut interval = tokio::time::interval(self.polling_rate);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!(adapter = self.engine.name(), "Shutdown signal received");
                    break;
                }

                _ = interval.tick() => {
                    match self.engine.tick_with_cancellation(&self.shutdown).await {
                        Ok(Some(_)) => {}
                        Ok(None) => break,
                        Err(e) => warn!("Tick failed, keeping previous state: {}", e),
                    }
                }
            }
        }

        info!(adapter = self.engine.name(), "reconciliation service stopped");
    }
}
