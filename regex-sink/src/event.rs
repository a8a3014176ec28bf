use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One record handed to the sink by the upstream delivery framework.
/// The payload is an opaque byte body; headers are unique name/value pairs.
/// Events are read-only for the sink and discarded after the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    payload: Vec<u8>,
    #[serde(default)]
    headers: HashMap<String, String>,
}

impl Event {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup() {
        let event = Event::new("body").with_header("host", "web-1");

        assert_eq!(event.payload(), b"body");
        assert_eq!(event.header("host"), Some("web-1"));
        assert_eq!(event.header("missing"), None);
    }

    #[test]
    fn test_deserializes_without_headers() {
        let event: Event = serde_json::from_str(r#"{"payload": [49, 44, 120]}"#).unwrap();

        assert_eq!(event.payload(), b"1,x");
        assert_eq!(event.header("host"), None);
    }
}
