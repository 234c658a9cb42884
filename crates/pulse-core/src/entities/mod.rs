//! Domain entities - core notification objects

mod toast;

pub use toast::{Toast, ToastAction, ToastInput, ToastUpdate, ToastVariant};
