//! Wire-level definitions
//!
//! Close codes and decoding of incoming payloads.

mod close_codes;
mod messages;

pub use close_codes::{CloseCode, CloseInfo};
pub use messages::{IncomingMessage, RawFrame};
