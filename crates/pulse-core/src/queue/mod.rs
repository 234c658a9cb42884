//! Toast notification queue
//!
//! [`ToastQueue`] holds the pure list transitions; [`ToastStore`] adds timed
//! removal and the change feed.

mod reducer;
mod store;

pub use reducer::{QueueAction, QueueOutcome, ToastQueue};
pub use store::{
    ToastConfig, ToastHandle, ToastStore, DEFAULT_CHANNEL_CAPACITY, DEFAULT_REMOVE_DELAY,
    DEFAULT_TOAST_LIMIT,
};
