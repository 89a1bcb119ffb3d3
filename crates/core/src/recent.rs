use std::{collections::VecDeque, num::NonZeroUsize, sync::Arc};
use tokio::sync::RwLock;

/// Bounded buffer of the most recently observed items, newest first.
///
/// Used by streaming sources that only ever insert; pushing beyond capacity
/// evicts the oldest entry. Clones share the same buffer.
#[derive(Debug)]
pub struct RecentBuffer<T> {
    items: Arc<RwLock<VecDeque<T>>>,
    capacity: NonZeroUsize,
}

impl<T> Clone for RecentBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            capacity: self.capacity,
        }
    }
}

impl<T: Clone> RecentBuffer<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            items: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.get()))),
            capacity,
        }
    }

    pub async fn push(&self, item: T) {
        let mut items = self.items.write().await;
        items.push_front(item);
        items.truncate(self.capacity.get());
    }

    /// Newest first
    pub async fn items(&self) -> Vec<T> {
        self.items.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn keeps_newest_within_capacity() {
        let buffer = RecentBuffer::new(NonZeroUsize::new(3).expect("non-zero"));
        for n in 1..=5 {
            buffer.push(n).await;
        }

        assert_eq!(buffer.items().await, vec![5, 4, 3]);
        assert_eq!(buffer.len().await, 3);
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let buffer = RecentBuffer::new(NonZeroUsize::new(2).expect("non-zero"));
        let writer = buffer.clone();
        writer.push("tx").await;

        assert_eq!(buffer.items().await, vec!["tx"]);
        assert!(!buffer.is_empty().await);
    }
}
