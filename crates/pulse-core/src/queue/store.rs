//! Toast store
//!
//! Wraps a [`ToastQueue`] with the removal timers and the change feed that
//! rendering consumers subscribe to. Every mutation goes through one lock, and
//! the new list is published while that lock is held, so subscribers observe
//! changes in the order they were issued.

use super::{QueueAction, QueueOutcome, ToastQueue};
use crate::entities::{Toast, ToastInput, ToastUpdate};
use crate::error::DomainError;
use crate::value_objects::{ToastId, ToastIdGenerator};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

/// Default number of visible toasts
pub const DEFAULT_TOAST_LIMIT: usize = 1;

/// Default delay between dismissal and removal
pub const DEFAULT_REMOVE_DELAY: Duration = Duration::from_secs(5);

/// Default buffer of the change feed
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastConfig {
    /// Maximum number of visible toasts
    pub limit: usize,
    /// How long a dismissed toast stays in the list before removal
    pub remove_delay: Duration,
    /// Buffered list snapshots per subscriber before it lags
    pub channel_capacity: usize,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOAST_LIMIT,
            remove_delay: DEFAULT_REMOVE_DELAY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ToastConfig {
    /// Check the configuration can back a store
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.limit == 0 {
            return Err(DomainError::InvalidConfig(
                "limit must be at least 1".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(DomainError::InvalidConfig(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pending timers, keyed by the toast they act on
#[derive(Debug, Default)]
struct TimerTable {
    removals: HashMap<ToastId, AbortHandle>,
    auto_dismiss: HashMap<ToastId, AbortHandle>,
}

impl TimerTable {
    fn abort_all(&mut self) {
        for (_, handle) in self.removals.drain().chain(self.auto_dismiss.drain()) {
            handle.abort();
        }
    }

    fn len(&self) -> usize {
        self.removals.len() + self.auto_dismiss.len()
    }
}

#[derive(Debug)]
struct StoreState {
    queue: ToastQueue,
    timers: TimerTable,
    closed: bool,
}

struct StoreInner {
    config: ToastConfig,
    ids: ToastIdGenerator,
    runtime: Handle,
    state: Mutex<StoreState>,
    changes: broadcast::Sender<Vec<Toast>>,
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        self.state.get_mut().timers.abort_all();
    }
}

/// In-memory toast notification store
///
/// Cheap to clone; clones share the same list. Dropping the last clone (or
/// calling [`ToastStore::shutdown`]) cancels every pending timer.
#[derive(Clone)]
pub struct ToastStore {
    inner: Arc<StoreInner>,
}

impl ToastStore {
    /// Create a store bound to the current tokio runtime
    pub fn new(config: ToastConfig) -> Result<Self, DomainError> {
        let runtime = Handle::try_current().map_err(|_| DomainError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Create a store whose timers run on `runtime`
    pub fn with_runtime(config: ToastConfig, runtime: Handle) -> Result<Self, DomainError> {
        config.validate()?;

        let (changes, _) = broadcast::channel(config.channel_capacity);
        let state = StoreState {
            queue: ToastQueue::new(config.limit),
            timers: TimerTable::default(),
            closed: false,
        };

        tracing::debug!(
            limit = config.limit,
            remove_delay_ms = config.remove_delay.as_millis() as u64,
            "Toast store created"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                ids: ToastIdGenerator::new(),
                runtime,
                state: Mutex::new(state),
                changes,
            }),
        })
    }

    /// Show a new toast and return a handle to control it
    pub fn show(&self, input: ToastInput) -> ToastHandle {
        let id = self.inner.ids.generate();
        let toast = Toast::new(id, input);
        let duration = toast.duration;

        let mut state = self.inner.state.lock();
        let outcome = self.apply_locked(&mut state, QueueAction::Add(toast));

        if let (Some(duration), false) = (duration, state.closed) {
            self.schedule_auto_dismiss(&mut state, id, duration);
        }

        tracing::debug!(
            toast_id = %id,
            evicted = outcome.evicted.len(),
            "Toast shown"
        );

        ToastHandle {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Merge `update` into the toast with `id`. Unknown IDs are ignored.
    pub fn update(&self, id: ToastId, update: ToastUpdate) {
        self.dispatch(QueueAction::Update { id, update });
    }

    /// Close one toast, or all toasts when `id` is `None`
    ///
    /// Each closed toast is removed after the configured delay. A toast that
    /// already has a removal pending keeps its original timer.
    pub fn dismiss(&self, id: Option<ToastId>) {
        self.dispatch(QueueAction::Dismiss(id));
    }

    /// Delete one toast, or all toasts when `id` is `None`, immediately
    pub fn remove(&self, id: Option<ToastId>) {
        self.dispatch(QueueAction::Remove(id));
    }

    /// Snapshot of the visible toasts, newest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.state.lock().queue.toasts().to_vec()
    }

    /// Look up a visible toast
    pub fn get(&self, id: ToastId) -> Option<Toast> {
        self.inner.state.lock().queue.get(id).cloned()
    }

    /// Receive the full toast list after every change
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Toast>> {
        self.inner.changes.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }

    /// Number of timers that have not fired yet
    pub fn pending_timers(&self) -> usize {
        self.inner.state.lock().timers.len()
    }

    pub fn config(&self) -> &ToastConfig {
        &self.inner.config
    }

    /// Cancel all timers and stop accepting mutations
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.timers.abort_all();

        tracing::debug!("Toast store shut down");
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.state.lock().closed
    }

    fn dispatch(&self, action: QueueAction) {
        let mut state = self.inner.state.lock();
        self.apply_locked(&mut state, action);
    }

    fn apply_locked(&self, state: &mut StoreState, action: QueueAction) -> QueueOutcome {
        if state.closed {
            return QueueOutcome::default();
        }

        let outcome = state.queue.apply(action);

        for id in &outcome.dismissed {
            if let Some(handle) = state.timers.auto_dismiss.remove(id) {
                handle.abort();
            }
            if !state.timers.removals.contains_key(id) {
                self.schedule_removal(state, *id);
            }
        }

        // Evicted toasts can no longer be dismissed; a pending removal keeps running
        for id in &outcome.evicted {
            if let Some(handle) = state.timers.auto_dismiss.remove(id) {
                handle.abort();
            }
        }

        if outcome.changed {
            // No receivers is fine
            let _ = self.inner.changes.send(state.queue.toasts().to_vec());
        }

        outcome
    }

    fn schedule_removal(&self, state: &mut StoreState, id: ToastId) {
        let delay = self.inner.config.remove_delay;
        let handle = self.spawn_timer(delay, move |store| store.fire_removal(id));
        state.timers.removals.insert(id, handle);

        tracing::trace!(toast_id = %id, delay_ms = delay.as_millis() as u64, "Removal scheduled");
    }

    fn schedule_auto_dismiss(&self, state: &mut StoreState, id: ToastId, after: Duration) {
        let handle = self.spawn_timer(after, move |store| store.fire_auto_dismiss(id));
        state.timers.auto_dismiss.insert(id, handle);
    }

    /// Run `fire` after `delay`, unless the store is gone by then
    fn spawn_timer<F>(&self, delay: Duration, fire: F) -> AbortHandle
    where
        F: FnOnce(ToastStore) + Send + 'static,
    {
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .runtime
            .spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(inner) = weak.upgrade() {
                    fire(ToastStore { inner });
                }
            })
            .abort_handle()
    }

    fn fire_removal(&self, id: ToastId) {
        let mut state = self.inner.state.lock();
        state.timers.removals.remove(&id);

        let outcome = self.apply_locked(&mut state, QueueAction::Remove(Some(id)));
        if outcome.changed {
            tracing::debug!(toast_id = %id, "Toast removed after delay");
        }
    }

    fn fire_auto_dismiss(&self, id: ToastId) {
        let mut state = self.inner.state.lock();
        state.timers.auto_dismiss.remove(&id);
        self.apply_locked(&mut state, QueueAction::Dismiss(Some(id)));
    }
}

impl std::fmt::Debug for ToastStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ToastStore")
            .field("toasts", &state.queue.len())
            .field("timers", &state.timers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Producer-side handle to a shown toast
///
/// Does not keep the store alive; calls after the store is dropped do nothing.
#[derive(Debug, Clone)]
pub struct ToastHandle {
    id: ToastId,
    store: Weak<StoreInner>,
}

impl ToastHandle {
    pub fn id(&self) -> ToastId {
        self.id
    }

    /// Close this toast
    pub fn dismiss(&self) {
        if let Some(inner) = self.store.upgrade() {
            ToastStore { inner }.dismiss(Some(self.id));
        }
    }

    /// Merge fields into this toast
    pub fn update(&self, update: ToastUpdate) {
        if let Some(inner) = self.store.upgrade() {
            ToastStore { inner }.update(self.id, update);
        }
    }
}
