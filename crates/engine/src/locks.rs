//! Per-ship mutual exclusion.
//!
//! Every operation that mutates a ship's compliance record or bank entries
//! holds that ship's lock for its whole transaction. Operations touching
//! several ships (pools) take the locks in ship id order, so two overlapping
//! pools cannot deadlock.
//!
//! The registry only keeps ships whose lock is held or awaited: idle entries
//! are pruned whenever new handles are handed out.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub(crate) struct ShipLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Guards released together when dropped.
#[derive(Debug)]
pub(crate) struct ShipGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ShipLocks {
    fn handles<'a, I>(&self, ship_ids: I) -> Vec<Arc<AsyncMutex<()>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ordered: BTreeSet<&str> = ship_ids.into_iter().collect();
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // An entry referenced only by the map has no holder and no waiter.
        map.retain(|_, handle| Arc::strong_count(handle) > 1);
        ordered
            .into_iter()
            .map(|id| Arc::clone(map.entry(id.to_string()).or_default()))
            .collect()
    }

    pub(crate) async fn lock(&self, ship_id: &str) -> ShipGuards {
        self.lock_all([ship_id]).await
    }

    pub(crate) async fn lock_all<'a, I>(&self, ship_ids: I) -> ShipGuards
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut guards = Vec::new();
        for handle in self.handles(ship_ids) {
            guards.push(handle.lock_owned().await);
        }
        ShipGuards { _guards: guards }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_ship_is_serialized() {
        let locks = Arc::new(ShipLocks::default());
        let guard = locks.lock("IMO1").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("IMO1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_ships_do_not_block() {
        let locks = ShipLocks::default();
        let _a = locks.lock("IMO1").await;
        let _b = locks.lock("IMO2").await;
    }

    #[tokio::test]
    async fn released_ships_are_forgotten() {
        let locks = ShipLocks::default();
        for i in 0..100 {
            let _guard = locks.lock(&format!("IMO{i}")).await;
        }
        let _held = locks.lock("IMO-last").await;
        assert_eq!(locks.tracked(), 1);
    }

    #[tokio::test]
    async fn held_lock_survives_pruning() {
        let locks = Arc::new(ShipLocks::default());
        let guard = locks.lock("IMO1").await;
        let _other = locks.lock("IMO2").await;
        assert_eq!(locks.tracked(), 2);

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("IMO1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_ids_lock_once() {
        let locks = ShipLocks::default();
        let _guards = locks.lock_all(["IMO1", "IMO1", "IMO2"]).await;
    }
}
