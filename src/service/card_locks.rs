use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::lock::Mutex as AsyncMutex;

/// One async mutex per card id: swipes of the same card serialize, unrelated
/// cards never contend. Entries are never evicted; the map is bounded by the
/// roster size.
#[derive(Default)]
pub struct CardLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CardLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutex_for(&self, card_id: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().expect("card lock registry poisoned");
        map.entry(card_id.to_string()).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_card_gets_same_mutex() {
        let locks = CardLocks::new();
        let a = locks.mutex_for("CARD-1");
        let b = locks.mutex_for("CARD-1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_cards_get_independent_mutexes() {
        let locks = CardLocks::new();
        let a = locks.mutex_for("CARD-1");
        let b = locks.mutex_for("CARD-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[actix_web::test]
    async fn held_lock_blocks_only_its_own_card() {
        let locks = CardLocks::new();
        let same = locks.mutex_for("CARD-1");
        let guard = same.lock().await;

        // Another card proceeds immediately.
        let other = locks.mutex_for("CARD-2");
        assert!(other.try_lock().is_some());

        // The held card does not.
        assert!(locks.mutex_for("CARD-1").try_lock().is_none());
        drop(guard);
        assert!(locks.mutex_for("CARD-1").try_lock().is_some());
    }
}
