use crate::{
    adapter::{with_deadline, ChainAdapter},
    error::AdapterError,
    types::{PendingItem, ResolvedItem, TxKey, TxLookup},
};
use backon::{ConstantBuilder, Retryable as _};
use chrono::{DateTime, Utc};
use std::{
    num::{NonZeroU32, NonZeroUsize},
    time::Duration,
};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Total attempts per batch, including the first one
    pub attempts: NonZeroU32,
    /// Pause between attempts; zero retries immediately
    pub backoff: Duration,
    /// Departed keys beyond this are split into independent batches
    pub max_batch_size: NonZeroUsize,
    /// Deadline applied to every `resolve_batch` call
    pub call_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            attempts: NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN),
            backoff: Duration::ZERO,
            max_batch_size: NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN),
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Classifies departed transactions through the adapter's batch lookup.
///
/// Never fails: a batch whose lookups keep erroring after every attempt is
/// recorded as [`crate::TxStatus::Unknown`] rather than guessed at.
#[derive(Debug, Clone)]
pub struct StatusResolver {
    config: ResolverConfig,
}

impl StatusResolver {
    pub const fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves `departed` in order, stamping every record with `resolved_at`
    #[instrument(skip_all, fields(adapter = adapter.name(), departed = departed.len()))]
    pub async fn resolve<A: ChainAdapter>(
        &self,
        adapter: &A,
        departed: Vec<PendingItem<A::Payload>>,
        resolved_at: DateTime<Utc>,
    ) -> Vec<ResolvedItem<A::Payload>> {
        let mut resolved = Vec::with_capacity(departed.len());
        let mut remaining = departed.into_iter().peekable();

        while remaining.peek().is_some() {
            let chunk: Vec<_> = remaining
                .by_ref()
                .take(self.config.max_batch_size.get())
                .collect();
            let keys: Vec<TxKey> = chunk.iter().map(|item| item.key.clone()).collect();

            match self.lookup_with_retry(adapter, &keys).await {
                Ok(lookups) => resolved.extend(
                    chunk
                        .into_iter()
                        .zip(lookups)
                        .map(|(item, lookup)| ResolvedItem::new(item, lookup, resolved_at)),
                ),
                Err(err) => {
                    warn!(
                        batch = keys.len(),
                        attempts = self.config.attempts.get(),
                        "Giving up on batch lookup, marking as unknown: {}",
                        err
                    );
                    resolved.extend(
                        chunk
                            .into_iter()
                            .map(|item| ResolvedItem::unknown(item, resolved_at)),
                    );
                }
            }
        }

        resolved
    }

    async fn lookup_with_retry<A: ChainAdapter>(
        &self,
        adapter: &A,
        keys: &[TxKey],
    ) -> Result<Vec<TxLookup>, AdapterError> {
        let retries = self.config.attempts.get().saturating_sub(1) as usize;
        let backoff = ConstantBuilder::default()
            .with_delay(self.config.backoff)
            .with_max_times(retries);

        (|| self.lookup_once(adapter, keys))
            .retry(backoff)
            .notify(|err: &AdapterError, delay: Duration| {
                warn!(
                    batch = keys.len(),
                    "Batch lookup failed, retrying in {:?}: {}", delay, err
                );
            })
            .await
    }

    async fn lookup_once<A: ChainAdapter>(
        &self,
        adapter: &A,
        keys: &[TxKey],
    ) -> Result<Vec<TxLookup>, AdapterError> {
        let lookups = with_deadline(self.config.call_timeout, adapter.resolve_batch(keys)).await?;
        if lookups.len() != keys.len() {
            return Err(AdapterError::LengthMismatch {
                expected: keys.len(),
                actual: lookups.len(),
            });
        }
        debug!(batch = keys.len(), "Batch lookup succeeded");
        Ok(lookups)
    }
}
