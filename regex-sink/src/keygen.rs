use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::error::ConfigError;

/// Process-wide counter backing `KeyGenerator::Sequence`.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Strategies to produce a synthetic row key per event.
/// Selected once at configuration time by name, never per event.
/// Uniqueness is best-effort within the process; nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenerator {
    /// Millisecond wall clock. Coarse; fine for the sequential write path.
    Timestamp,
    /// Nanosecond wall clock.
    Nanotimestamp,
    /// Random v4 UUID.
    Uuid,
    /// Process-wide monotonically increasing counter.
    Sequence,
}

impl KeyGenerator {
    /// Produce a fresh key. Always non-empty, never derived from the event.
    pub fn generate(&self) -> String {
        match self {
            KeyGenerator::Timestamp => epoch().as_millis().to_string(),
            KeyGenerator::Nanotimestamp => epoch().as_nanos().to_string(),
            KeyGenerator::Uuid => Uuid::new_v4().to_string(),
            KeyGenerator::Sequence => SEQUENCE.fetch_add(1, Ordering::Relaxed).to_string(),
        }
    }
}

fn epoch() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Allow casting `KeyGenerator` from configuration strings.
impl FromStr for KeyGenerator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(KeyGenerator::Timestamp),
            "nanotimestamp" => Ok(KeyGenerator::Nanotimestamp),
            "uuid" | "random" => Ok(KeyGenerator::Uuid),
            "sequence" => Ok(KeyGenerator::Sequence),
            invalid => Err(ConfigError::UnknownKeyGenerator(invalid.to_owned())),
        }
    }
}

impl fmt::Display for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyGenerator::Timestamp => write!(f, "timestamp"),
            KeyGenerator::Nanotimestamp => write!(f, "nanotimestamp"),
            KeyGenerator::Uuid => write!(f, "uuid"),
            KeyGenerator::Sequence => write!(f, "sequence"),
        }
    }
}
