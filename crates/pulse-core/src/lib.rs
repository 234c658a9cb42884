//! # pulse-core
//!
//! Toast notification queue: entities, ID generation, the pure queue reducer,
//! and the timed store that rendering consumers subscribe to.

pub mod entities;
pub mod error;
pub mod queue;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Toast, ToastAction, ToastInput, ToastUpdate, ToastVariant};
pub use error::DomainError;
pub use queue::{
    QueueAction, QueueOutcome, ToastConfig, ToastHandle, ToastQueue, ToastStore,
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_REMOVE_DELAY, DEFAULT_TOAST_LIMIT,
};
pub use value_objects::{ToastId, ToastIdGenerator, ToastIdParseError};
