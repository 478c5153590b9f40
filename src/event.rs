//! Outbound event representation.

use crate::error::EventError;
use serde_json::{Map, Value};

/// Lifecycle action reported by the host's change hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

impl Action {
    /// Event name suffix for types without a status field.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Action::Created => "created",
            Action::Updated => "updated",
            Action::Deleted => "deleted",
        }
    }
}

/// A fully assembled event, ready to hand to a [`Publisher`].
///
/// [`Publisher`]: crate::publisher::Publisher
#[derive(Debug, Clone)]
pub struct OutboundEvent {
    /// Derived event name, used as the message key.
    pub name: String,
    /// Ordered field→value payload mapping.
    pub payload: Map<String, Value>,
    /// Name of the service sending the event.
    pub service: String,
}

impl OutboundEvent {
    /// Topic the event is routed through, scoped per service.
    #[must_use]
    pub fn topic(&self) -> String {
        format!("{}.events", self.service)
    }

    /// Serialize the payload mapping to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(&self.payload).map_err(|e| EventError::SerializationFailed {
            what: self.name.clone(),
            cause: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_suffix() {
        assert_eq!(Action::Created.suffix(), "created");
        assert_eq!(Action::Updated.suffix(), "updated");
        assert_eq!(Action::Deleted.suffix(), "deleted");
    }

    #[test]
    fn test_topic_is_scoped_to_service() {
        let event = OutboundEvent {
            name: "model1__created".to_string(),
            payload: Map::new(),
            service: "test_service".to_string(),
        };

        assert_eq!(event.topic(), "test_service.events");
    }

    #[test]
    fn test_payload_json_bytes() {
        let mut payload = Map::new();
        payload.insert("id".to_string(), serde_json::json!(1));
        payload.insert("char_field".to_string(), serde_json::json!("test"));

        let event = OutboundEvent {
            name: "model1__created".to_string(),
            payload,
            service: "test_service".to_string(),
        };

        let bytes = event.to_json_bytes().unwrap();
        assert_eq!(bytes, br#"{"id":1,"char_field":"test"}"#);
    }
}
