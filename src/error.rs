//! Error types for the crud-events crate.

use thiserror::Error;

/// Errors that can occur while configuring or dispatching events.
#[derive(Debug, Error)]
pub enum EventError {
    // Configuration errors (permanent, no retry)
    /// Required configuration variable is missing.
    #[error("configuration missing: {var}")]
    ConfigMissing { var: String },

    /// Configuration value is invalid.
    #[error("configuration invalid for {var}: {reason}")]
    ConfigInvalid { var: String, reason: String },

    /// A model was watched twice.
    #[error("model {model} is already watched")]
    DuplicateWatch { model: String },

    /// A configured status field is not declared on the watched type.
    #[error("status field {field} is not declared on {model}")]
    UnknownStatusField { model: String, field: String },

    // Connection errors (transient, retry with backoff)
    /// Failed to connect to the broker.
    #[error("connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    // Publishing errors
    /// Failed to publish an event to its topic.
    #[error("failed to publish to topic {topic}: {cause}")]
    PublishFailed { topic: String, cause: String },

    /// Failed to serialize a record or payload.
    #[error("failed to serialize {what}: {cause}")]
    SerializationFailed { what: String, cause: String },

    // Internal Kafka errors
    /// Internal Kafka client error.
    #[cfg(feature = "kafka")]
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

impl EventError {
    /// Returns true if this error is transient and can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EventError::ConnectionFailed { .. } | EventError::PublishFailed { .. }
        )
    }

    /// Returns true if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EventError::ConfigMissing { .. }
                | EventError::ConfigInvalid { .. }
                | EventError::DuplicateWatch { .. }
                | EventError::UnknownStatusField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_transient() {
        let transient = EventError::ConnectionFailed {
            broker: "localhost:9092".to_string(),
            cause: "refused".to_string(),
        };
        assert!(transient.is_transient());

        let permanent = EventError::ConfigMissing {
            var: "TEST".to_string(),
        };
        assert!(!permanent.is_transient());
    }

    #[test]
    fn test_error_is_config_error() {
        let config_err = EventError::UnknownStatusField {
            model: "app.StatusModel".to_string(),
            field: "missing".to_string(),
        };
        assert!(config_err.is_config_error());

        let other_err = EventError::PublishFailed {
            topic: "svc.events".to_string(),
            cause: "timeout".to_string(),
        };
        assert!(!other_err.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = EventError::ConfigMissing {
            var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "configuration missing: KAFKA_BOOTSTRAP_SERVERS"
        );
    }
}
