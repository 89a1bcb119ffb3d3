use crate::{
    error::AdapterError,
    types::{PendingSnapshot, TxKey, TxLookup},
};
use std::{future::Future, time::Duration};

/// Read access to one chain's pending pool and post-pool status.
///
/// `resolve_batch` must answer positionally: the lookup at index `i` belongs
/// to `keys[i]`. A missing transaction is reported as [`TxLookup::NotFound`];
/// an `Err` means the whole batch could not be answered.
#[async_trait::async_trait]
pub trait ChainAdapter: Send + Sync + 'static {
    type Payload: Clone + Send + Sync + 'static;

    fn name(&self) -> &str;

    async fn fetch_pending(
        &self,
        limit: usize,
    ) -> Result<PendingSnapshot<Self::Payload>, AdapterError>;

    async fn resolve_batch(&self, keys: &[TxKey]) -> Result<Vec<TxLookup>, AdapterError>;
}

/// Bounds an adapter call by `deadline`
pub(crate) async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, AdapterError>>,
) -> Result<T, AdapterError> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| AdapterError::Timeout(deadline))?
}
