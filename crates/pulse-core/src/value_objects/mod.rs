//! Value objects - immutable types that represent domain concepts

mod toast_id;

pub use toast_id::{ToastId, ToastIdGenerator, ToastIdParseError};
