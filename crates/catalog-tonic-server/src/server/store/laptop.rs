//! Concurrency-safe store for laptop records.

use super::StoreError;
use crate::server::filter::is_qualified;
use catalog_tonic_core::proto::{Filter, Laptop};
use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tonic::async_trait;

/// Keyed storage for laptop records.
///
/// Implementations must be safe under unbounded concurrent callers. Records
/// cross the trait boundary by value: a saved record is copied in, a found
/// record is copied out, and no caller can reach the store's internal
/// representation through either.
#[async_trait]
pub trait LaptopStore: Send + Sync {
    /// Inserts a copy of the record, rejecting duplicates by id.
    async fn save(&self, laptop: &Laptop) -> Result<(), StoreError>;

    /// Returns a copy of the record with the given id. Absence is not an
    /// error.
    async fn find_by_id(&self, id: &str) -> Result<Option<Laptop>, StoreError>;

    /// Scans a point-in-time snapshot of the store, delivering every record
    /// that satisfies the filter through `found`.
    ///
    /// The scan observes `cancel` at each iteration boundary and stops
    /// promptly once it fires or once the receiving side of `found` is gone;
    /// neither is an error.
    async fn search(
        &self,
        cancel: CancellationToken,
        filter: Filter,
        found: mpsc::Sender<Laptop>,
    ) -> Result<(), StoreError>;
}

/// In-memory reference implementation backed by a reader/writer-locked map.
///
/// Reads proceed in parallel; a save excludes all other access for its
/// duration because the map itself is mutated.
#[derive(Default)]
pub struct InMemoryLaptopStore {
    data: RwLock<HashMap<String, Laptop>>,
}

impl InMemoryLaptopStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LaptopStore for InMemoryLaptopStore {
    async fn save(&self, laptop: &Laptop) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if data.contains_key(&laptop.id) {
            return Err(StoreError::Duplicate);
        }

        // Clone is a deep copy of the message: later mutation of the
        // caller's value cannot corrupt the stored one.
        data.insert(laptop.id.clone(), laptop.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Laptop>, StoreError> {
        let data = self.data.read().await;
        Ok(data.get(id).cloned())
    }

    async fn search(
        &self,
        cancel: CancellationToken,
        filter: Filter,
        found: mpsc::Sender<Laptop>,
    ) -> Result<(), StoreError> {
        // Snapshot under the read lock, then evaluate and send without it so
        // a slow consumer never blocks writers.
        let snapshot: Vec<Laptop> = {
            let data = self.data.read().await;
            data.values().cloned().collect()
        };

        for laptop in snapshot {
            if cancel.is_cancelled() {
                return Ok(());
            }

            if !is_qualified(&filter, &laptop) {
                continue;
            }

            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                res = found.send(laptop) => {
                    // The receiver is gone; the consumer stopped listening.
                    if res.is_err() {
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryLaptopStore, LaptopStore, StoreError};
    use crate::server::sample;
    use catalog_tonic_core::proto::{Filter, Memory, memory};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let store = InMemoryLaptopStore::new();
        let laptop = sample::new_laptop();

        store.save(&laptop).await.unwrap();
        let found = store.find_by_id(&laptop.id).await.unwrap();
        assert_eq!(found, Some(laptop));
    }

    #[tokio::test]
    async fn find_missing_id_is_not_an_error() {
        let store = InMemoryLaptopStore::new();
        assert_eq!(store.find_by_id("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_save_is_rejected_and_first_record_kept() {
        let store = InMemoryLaptopStore::new();
        let first = sample::new_laptop();

        let mut second = sample::new_laptop();
        second.id = first.id.clone();

        store.save(&first).await.unwrap();
        assert!(matches!(
            store.save(&second).await,
            Err(StoreError::Duplicate)
        ));

        let found = store.find_by_id(&first.id).await.unwrap();
        assert_eq!(found, Some(first));
    }

    #[tokio::test]
    async fn stored_record_is_isolated_from_caller_mutation() {
        let store = InMemoryLaptopStore::new();
        let mut laptop = sample::new_laptop();
        let original = laptop.clone();

        store.save(&laptop).await.unwrap();
        laptop.price_usd += 1000.0;
        laptop.brand = "Mutated".to_string();

        let found = store.find_by_id(&laptop.id).await.unwrap();
        assert_eq!(found, Some(original));
    }

    #[tokio::test]
    async fn concurrent_saves_all_land() {
        let store = Arc::new(InMemoryLaptopStore::new());
        let mut handles = Vec::new();
        let mut ids = Vec::new();

        for _ in 0..32 {
            let laptop = sample::new_laptop();
            ids.push(laptop.id.clone());
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(
                async move { store.save(&laptop).await },
            ));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for id in ids {
            assert!(store.find_by_id(&id).await.unwrap().is_some());
        }
    }

    fn match_all_filter() -> Filter {
        Filter {
            max_price_usd: f64::MAX,
            min_cpu_cores: 0,
            min_cpu_ghz: 0.0,
            min_ram: Some(Memory {
                value: 0,
                unit: memory::Unit::Gigabyte as i32,
            }),
        }
    }

    #[tokio::test]
    async fn search_delivers_exactly_the_matching_subset() {
        let store = InMemoryLaptopStore::new();
        let mut cheap_ids = Vec::new();

        for i in 0..6 {
            let mut laptop = sample::new_laptop();
            if i % 2 == 0 {
                laptop.price_usd = 900.0;
                cheap_ids.push(laptop.id.clone());
            } else {
                laptop.price_usd = 3000.0;
            }
            store.save(&laptop).await.unwrap();
        }

        let mut filter = match_all_filter();
        filter.max_price_usd = 1000.0;

        let (tx, mut rx) = mpsc::channel(16);
        store
            .search(CancellationToken::new(), filter, tx)
            .await
            .unwrap();

        let mut found_ids = Vec::new();
        while let Some(laptop) = rx.recv().await {
            found_ids.push(laptop.id);
        }

        cheap_ids.sort();
        found_ids.sort();
        assert_eq!(found_ids, cheap_ids);
    }

    #[tokio::test]
    async fn search_stops_when_cancelled() {
        let store = InMemoryLaptopStore::new();
        for _ in 0..8 {
            store.save(&sample::new_laptop()).await.unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, mut rx) = mpsc::channel(16);
        store
            .search(cancel, match_all_filter(), tx)
            .await
            .unwrap();

        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn search_stops_when_consumer_is_gone() {
        let store = InMemoryLaptopStore::new();
        for _ in 0..8 {
            store.save(&sample::new_laptop()).await.unwrap();
        }

        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        // Must return rather than hang on a closed channel.
        store
            .search(CancellationToken::new(), match_all_filter(), tx)
            .await
            .unwrap();
    }
}
