//! Publisher seam and the Kafka implementation.

use crate::error::EventError;
use crate::event::OutboundEvent;

use async_trait::async_trait;

/// Trait for the transport that delivers outbound events.
///
/// The dispatcher is generic over this seam; tests substitute a recording
/// implementation.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver one event. Returns Ok for a missing destination as well;
    /// only real transport failures are errors.
    async fn publish(&self, event: &OutboundEvent) -> Result<(), EventError>;
}

#[cfg(feature = "kafka")]
pub use kafka::KafkaPublisher;

#[cfg(feature = "kafka")]
mod kafka {
    use super::Publisher;
    use crate::config::BrokerConfig;
    use crate::error::EventError;
    use crate::event::OutboundEvent;

    use async_trait::async_trait;
    use rdkafka::config::ClientConfig;
    use rdkafka::error::KafkaError;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::types::RDKafkaErrorCode;
    use tracing::{debug, info, instrument};

    /// Kafka publisher owning a long-lived producer.
    ///
    /// The producer pools its broker connections internally; retry and
    /// backoff are delegated to librdkafka, configured from the transport
    /// tuning. No retry loop lives here.
    pub struct KafkaPublisher {
        producer: FutureProducer,
        config: BrokerConfig,
    }

    impl KafkaPublisher {
        /// Create a new publisher from broker configuration.
        pub fn new(config: BrokerConfig) -> Result<Self, EventError> {
            let tuning = &config.tuning;
            let mut client_config = ClientConfig::new();

            client_config
                .set("bootstrap.servers", &config.bootstrap_servers)
                .set("client.id", &config.client_id)
                .set("security.protocol", config.security_protocol.as_str())
                .set("acks", if tuning.confirm_publish { "all" } else { "1" })
                .set(
                    "message.send.max.retries",
                    tuning.retry.max_retries.to_string(),
                )
                .set(
                    "retry.backoff.ms",
                    tuning.retry.interval_start.as_millis().to_string(),
                )
                .set(
                    "retry.backoff.max.ms",
                    tuning.retry.interval_max.as_millis().to_string(),
                )
                .set("socket.keepalive.enable", "true")
                .set("socket.timeout.ms", tuning.heartbeat.as_millis().to_string());

            // Add SASL configuration if present
            if let Some(sasl) = &config.sasl {
                client_config
                    .set("sasl.mechanism", sasl.mechanism.as_str())
                    .set("sasl.username", &sasl.username)
                    .set("sasl.password", &sasl.password);
            }

            let producer: FutureProducer =
                client_config
                    .create()
                    .map_err(|e| EventError::ConnectionFailed {
                        broker: config.bootstrap_servers.clone(),
                        cause: e.to_string(),
                    })?;

            info!(
                bootstrap_servers = %config.bootstrap_servers,
                client_id = %config.client_id,
                service_name = %config.service_name,
                "Kafka publisher created"
            );

            Ok(Self { producer, config })
        }

        /// The configuration this publisher was built from.
        pub fn config(&self) -> &BrokerConfig {
            &self.config
        }
    }

    /// True for delivery errors meaning the destination does not exist on
    /// the broker. The sender must not depend on consumer-side topology, so
    /// these are treated as success.
    fn missing_destination(err: &KafkaError) -> bool {
        matches!(
            err,
            KafkaError::MessageProduction(
                RDKafkaErrorCode::UnknownTopic | RDKafkaErrorCode::UnknownTopicOrPartition
            )
        )
    }

    #[async_trait]
    impl Publisher for KafkaPublisher {
        #[instrument(skip(self, event), fields(topic = %event.topic(), key = %event.name))]
        async fn publish(&self, event: &OutboundEvent) -> Result<(), EventError> {
            let topic = event.topic();
            let payload = event.to_json_bytes()?;

            debug!(payload_size = payload.len(), "Publishing event");

            let record = FutureRecord::to(&topic).key(&event.name).payload(&payload);

            // Enqueue waits are bounded; delivery retries run inside the
            // client per the configured policy.
            let queue_wait = self.config.tuning.retry.interval_max;
            match self.producer.send(record, queue_wait).await {
                Ok((partition, offset)) => {
                    debug!(partition, offset, "Event published");
                    Ok(())
                }
                Err((err, _)) if missing_destination(&err) => {
                    debug!(error = %err, "Destination missing on broker, event dropped");
                    Ok(())
                }
                Err((err, _)) => Err(EventError::PublishFailed {
                    topic,
                    cause: err.to_string(),
                }),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_publisher_creation_is_lazy() {
            let config = BrokerConfig::builder()
                .service_name("test_service")
                .bootstrap_servers("localhost:9092")
                .client_id("test")
                .build()
                .unwrap();

            // Connection is lazy, so creation succeeds without a broker.
            let result = KafkaPublisher::new(config);
            assert!(result.is_ok());
        }

        #[test]
        fn test_missing_destination_classification() {
            let missing =
                KafkaError::MessageProduction(RDKafkaErrorCode::UnknownTopicOrPartition);
            assert!(missing_destination(&missing));

            let other = KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut);
            assert!(!missing_destination(&other));
        }
    }
}
