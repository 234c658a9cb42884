//! Toast queue reducer
//!
//! Pure state transitions for the visible toast list. Timers and subscriber
//! notification live in [`super::ToastStore`]; this module only decides what
//! the list looks like after an action and which toasts need a removal timer.

use crate::entities::{Toast, ToastUpdate};
use crate::value_objects::ToastId;

/// A mutation of the toast list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAction {
    /// Insert at the front, evicting the oldest entries past the limit
    Add(Toast),
    /// Merge fields into an existing toast
    Update { id: ToastId, update: ToastUpdate },
    /// Close one toast, or every toast when `None`
    Dismiss(Option<ToastId>),
    /// Delete one toast, or every toast when `None`
    Remove(Option<ToastId>),
}

/// What an action did to the list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueOutcome {
    /// Whether the visible list changed
    pub changed: bool,
    /// Toasts targeted by a dismiss that are still in the list
    pub dismissed: Vec<ToastId>,
    /// Toasts pushed out by the limit
    pub evicted: Vec<ToastId>,
}

impl QueueOutcome {
    fn unchanged() -> Self {
        Self::default()
    }

    fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }
}

/// Ordered list of visible toasts, newest first
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    limit: usize,
}

impl ToastQueue {
    /// Create an empty queue holding at most `limit` toasts
    ///
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            toasts: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Apply an action and report what changed
    pub fn apply(&mut self, action: QueueAction) -> QueueOutcome {
        match action {
            QueueAction::Add(toast) => self.add(toast),
            QueueAction::Update { id, update } => self.update(id, update),
            QueueAction::Dismiss(id) => self.dismiss(id),
            QueueAction::Remove(id) => self.remove(id),
        }
    }

    fn add(&mut self, toast: Toast) -> QueueOutcome {
        self.toasts.insert(0, toast);

        let evicted = if self.toasts.len() > self.limit {
            self.toasts.split_off(self.limit).into_iter().map(|t| t.id).collect()
        } else {
            Vec::new()
        };

        QueueOutcome {
            evicted,
            ..QueueOutcome::changed()
        }
    }

    fn update(&mut self, id: ToastId, update: ToastUpdate) -> QueueOutcome {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.apply(update);
                QueueOutcome::changed()
            }
            None => QueueOutcome::unchanged(),
        }
    }

    fn dismiss(&mut self, id: Option<ToastId>) -> QueueOutcome {
        let mut outcome = QueueOutcome::unchanged();

        for toast in self
            .toasts
            .iter_mut()
            .filter(|t| id.is_none_or(|target| t.id == target))
        {
            if toast.open {
                toast.open = false;
                outcome.changed = true;
            }
            outcome.dismissed.push(toast.id);
        }

        outcome
    }

    fn remove(&mut self, id: Option<ToastId>) -> QueueOutcome {
        let before = self.toasts.len();

        match id {
            Some(target) => self.toasts.retain(|t| t.id != target),
            None => self.toasts.clear(),
        }

        if self.toasts.len() == before {
            QueueOutcome::unchanged()
        } else {
            QueueOutcome::changed()
        }
    }

    /// Visible toasts, newest first
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Look up a toast by ID
    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
