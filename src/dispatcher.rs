//! Change listener and event dispatch.
//!
//! The host's persistence hooks call [`Dispatcher::record_created`],
//! [`Dispatcher::record_updated`] and [`Dispatcher::record_deleted`]
//! synchronously after each commit. Dispatch is best-effort: the write has
//! already committed, so a transport failure surfaces to the caller as a
//! lost event, never a rolled-back write.

use crate::error::EventError;
use crate::event::{Action, OutboundEvent};
use crate::naming;
use crate::publisher::Publisher;
use crate::record::{field_value, Record};
use crate::registry::Registry;
use crate::suppress;

use std::sync::Arc;
use tracing::debug;

/// Routes change notifications for watched types to the publisher.
pub struct Dispatcher {
    service_name: String,
    registry: Registry,
    publisher: Arc<dyn Publisher>,
}

impl Dispatcher {
    /// Create a dispatcher with an explicit publisher.
    ///
    /// This is the seam used by tests and alternate transports.
    pub fn with_publisher(
        registry: Registry,
        service_name: impl Into<String>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            registry,
            publisher,
        }
    }

    /// Create a dispatcher publishing to Kafka.
    ///
    /// Fails if the broker configuration is unusable; a missing broker
    /// target is a fatal configuration error, not something to swallow.
    #[cfg(feature = "kafka")]
    pub fn new(
        registry: Registry,
        config: crate::config::BrokerConfig,
    ) -> Result<Self, EventError> {
        let service_name = config.service_name.clone();
        let publisher = crate::publisher::KafkaPublisher::new(config)?;
        Ok(Self::with_publisher(
            registry,
            service_name,
            Arc::new(publisher),
        ))
    }

    /// Create a dispatcher from process environment configuration.
    #[cfg(feature = "kafka")]
    pub fn from_env(registry: Registry) -> Result<Self, EventError> {
        Self::new(registry, crate::config::BrokerConfig::from_env()?)
    }

    /// Notify that a record was created.
    pub async fn record_created<R: Record>(&self, record: &R) -> Result<(), EventError> {
        self.dispatch(record, Action::Created).await
    }

    /// Notify that a record was updated.
    pub async fn record_updated<R: Record>(&self, record: &R) -> Result<(), EventError> {
        self.dispatch(record, Action::Updated).await
    }

    /// Notify that a record was deleted. The payload is the snapshot at
    /// deletion time.
    pub async fn record_deleted<R: Record>(&self, record: &R) -> Result<(), EventError> {
        self.dispatch(record, Action::Deleted).await
    }

    /// Dispatch one change notification.
    ///
    /// Unwatched, unregistered and suppressed records are silent no-ops;
    /// only configured types produce events.
    pub async fn dispatch<R: Record>(&self, record: &R, action: Action) -> Result<(), EventError> {
        let Some(entry) = self.registry.entry(R::MODEL) else {
            return Ok(());
        };
        if !self.registry.is_active(R::MODEL) {
            return Ok(());
        }
        if suppress::is_suppressed(R::MODEL, &record.record_id()) {
            debug!(model = R::MODEL, "Dispatch suppressed");
            return Ok(());
        }

        let serializer =
            entry
                .serializer_for::<R>()
                .ok_or_else(|| EventError::ConfigInvalid {
                    var: R::MODEL.to_string(),
                    reason: "watched entry was registered for a different type".to_string(),
                })?;
        let payload = serializer(record)?;

        // The status value is read off the record itself, not the payload:
        // a custom serializer may omit the status field.
        let status = match (&entry.status_field, action) {
            (Some(field), Action::Created | Action::Updated) => {
                Some(field_value(record, field)?)
            }
            _ => None,
        };
        let name = naming::event_name(&entry.base_name, action, status.as_deref());

        let event = OutboundEvent {
            name,
            payload,
            service: self.service_name.clone(),
        };

        debug!(
            model = R::MODEL,
            event = %event.name,
            "Dispatching event"
        );
        self.publisher.publish(&event).await
    }

    /// Re-activate watched types: all, or only those in `models`.
    pub fn register(&self, models: Option<&[&str]>) {
        self.registry.register(models);
    }

    /// Deactivate watched types: all, or only those in `models`.
    pub fn unregister(&self, models: Option<&[&str]>) {
        self.registry.unregister(models);
    }

    /// The sender service name.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}
