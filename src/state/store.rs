use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::slices::LibraryState;

type Listener = Arc<dyn Fn(&LibraryState) + Send + Sync>;

struct Inner {
    state: Mutex<LibraryState>,
    listeners: Mutex<BTreeMap<u64, Listener>>,
    next_id: AtomicU64,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, BTreeMap<u64, Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// クライアント状態のストア
///
/// グローバルには置かず、`Arc` 共有の明示的なオブジェクトとして渡す。
/// 状態が変わるたびに購読者へ変更後のスナップショットを通知する。
/// 通知はロックを解放してから行うため、購読者の中からストアを読んでもよい。
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(LibraryState::default())
    }

    pub fn with_state(state: LibraryState) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                listeners: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// 現在の状態の複製
    pub fn snapshot(&self) -> LibraryState {
        self.inner.state().clone()
    }

    /// 状態の一部を読み出す
    pub fn select<R>(&self, selector: impl FnOnce(&LibraryState) -> R) -> R {
        selector(&self.inner.state())
    }

    /// 状態を更新して購読者に通知する
    pub fn update(&self, reducer: impl FnOnce(&mut LibraryState)) {
        let snapshot = {
            let mut state = self.inner.state();
            reducer(&mut state);
            state.clone()
        };

        let listeners: Vec<Listener> = self.inner.listeners().values().cloned().collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    /// 状態の変化を購読する
    ///
    /// 返された `Subscription` を破棄するか `unsubscribe()` を呼ぶと購読が解除される。
    pub fn subscribe(&self, listener: impl Fn(&LibraryState) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().insert(id, Arc::new(listener));

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners().len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// 購読ハンドル
///
/// ストアより長く生きても問題ない（弱参照のみ保持する）。
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Dropで解除される
    }

    fn detach(&self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners().remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_listeners_receive_updated_state() {
        let store = Store::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = store.subscribe(move |state| {
            sink.lock().unwrap().push(state.books.search_query.clone());
        });

        store.update(|s| s.books.search_query = "romeo".to_string());
        store.update(|s| s.books.search_query = "juliet".to_string());

        assert_eq!(*seen.lock().unwrap(), vec!["romeo", "juliet"]);
    }

    #[test]
    fn test_dropping_subscription_stops_notifications() {
        let store = Store::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.update(|s| s.books.is_loading = true);
        drop(subscription);
        store.update(|s| s.books.is_loading = false);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_detaches_only_that_listener() {
        let store = Store::new();
        let first = store.subscribe(|_| {});
        let _second = store.subscribe(|_| {});
        assert_eq!(store.listener_count(), 2);

        first.unsubscribe();
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_listener_can_read_store() {
        let store = Store::new();
        let reader = store.clone();
        let observed = Arc::new(Mutex::new(None));
        let sink = observed.clone();
        let _subscription = store.subscribe(move |_| {
            *sink.lock().unwrap() = Some(reader.select(|s| s.books.search_query.clone()));
        });

        store.update(|s| s.books.search_query = "hamlet".to_string());

        assert_eq!(observed.lock().unwrap().as_deref(), Some("hamlet"));
    }

    #[test]
    fn test_subscription_outliving_store_is_harmless() {
        let store = Store::new();
        let subscription = store.subscribe(|_| {});
        drop(store);
        drop(subscription);
    }
}
