//! Toast ID - per-store monotonic notification identifier
//!
//! IDs are handed out by a [`ToastIdGenerator`] owned by a single store, so
//! two stores may produce the same numeric ID. Serialized as a string to match
//! what rendering consumers use as element keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a single toast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToastId(u64);

impl ToastId {
    /// Largest ID before the generator wraps back to 1.
    ///
    /// Matches the largest integer a JavaScript number holds exactly, so IDs
    /// stay lossless when forwarded to a browser.
    pub const MAX: u64 = (1 << 53) - 1;

    /// Create a new ToastId from a raw u64 value
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, ToastIdParseError> {
        s.parse::<u64>()
            .map(ToastId)
            .map_err(|_| ToastIdParseError::InvalidFormat)
    }
}

/// Error when parsing a ToastId from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ToastIdParseError {
    #[error("invalid toast id format")]
    InvalidFormat,
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ToastId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for ToastId {
    type Err = ToastIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToastId::parse(s)
    }
}

impl Serialize for ToastId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for ToastId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ToastIdVisitor;

        impl Visitor<'_> for ToastIdVisitor {
            type Value = ToastId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a toast ID")
            }

            fn visit_u64<E>(self, value: u64) -> Result<ToastId, E>
            where
                E: de::Error,
            {
                Ok(ToastId(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<ToastId, E>
            where
                E: de::Error,
            {
                ToastId::parse(value).map_err(|_| de::Error::custom("invalid toast id string"))
            }
        }

        deserializer.deserialize_any(ToastIdVisitor)
    }
}

/// Lock-free monotonic ToastId generator
///
/// The first generated ID is 1. After [`ToastId::MAX`] the counter wraps to 1
/// again, by which point every earlier toast is long gone.
#[derive(Debug, Default)]
pub struct ToastIdGenerator {
    counter: AtomicU64,
}

impl ToastIdGenerator {
    /// Create a new generator starting at zero
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Generate the next ToastId
    pub fn generate(&self) -> ToastId {
        let mut current = self.counter.load(Ordering::Relaxed);
        loop {
            let next = if current >= ToastId::MAX { 1 } else { current + 1 };
            match self.counter.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return ToastId(next),
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_toast_id_parse() {
        let id = ToastId::parse("42").unwrap();
        assert_eq!(id.into_inner(), 42);

        assert!(ToastId::parse("nope").is_err());
        assert!(ToastId::parse("-1").is_err());
    }

    #[test]
    fn test_toast_id_serializes_as_string() {
        let json = serde_json::to_string(&ToastId::new(7)).unwrap();
        assert_eq!(json, "\"7\"");
    }

    #[test]
    fn test_toast_id_deserialize_string_or_number() {
        let from_str: ToastId = serde_json::from_str("\"15\"").unwrap();
        let from_num: ToastId = serde_json::from_str("15").unwrap();
        assert_eq!(from_str, from_num);
    }

    #[test]
    fn test_generator_starts_at_one_and_increments() {
        let gen = ToastIdGenerator::new();
        assert_eq!(gen.generate(), ToastId::new(1));
        assert_eq!(gen.generate(), ToastId::new(2));
        assert_eq!(gen.generate(), ToastId::new(3));
    }

    #[test]
    fn test_generator_wraps_after_max() {
        let gen = ToastIdGenerator {
            counter: AtomicU64::new(ToastId::MAX - 1),
        };
        assert_eq!(gen.generate(), ToastId::new(ToastId::MAX));
        assert_eq!(gen.generate(), ToastId::new(1));
    }

    #[test]
    fn test_generator_thread_safety() {
        let gen = Arc::new(ToastIdGenerator::new());
        let ids = Arc::new(std::sync::Mutex::new(HashSet::new()));
        let mut handles = vec![];

        for _ in 0..4 {
            let gen = Arc::clone(&gen);
            let ids = Arc::clone(&ids);

            handles.push(thread::spawn(move || {
                let local: Vec<_> = (0..500).map(|_| gen.generate()).collect();
                ids.lock().unwrap().extend(local);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ids.lock().unwrap().len(), 2000, "All IDs should be unique");
    }
}
