//! # crud-events
//!
//! Publishes a domain event whenever a watched record type is created,
//! updated or deleted, so other services can react to state changes without
//! polling the datastore.
//!
//! The host's persistence layer calls the dispatcher from its change hooks;
//! the crate derives the event name, serializes the record and publishes the
//! payload keyed by the event name to the `"<service>.events"` topic.
//!
//! ## Cargo Features
//!
//! - `kafka`: Enable the Kafka publisher (requires librdkafka)
//! - `kafka-static`: Build librdkafka from source (requires cmake)
//!
//! ## Example
//!
//! ```rust,ignore
//! use crud_events::{BrokerConfig, Dispatcher, Record, Registry, Watch};
//! use serde::Serialize;
//!
//! #[derive(Debug, Serialize)]
//! struct StatusModel {
//!     id: i64,
//!     status: String,
//! }
//!
//! impl Record for StatusModel {
//!     const MODEL: &'static str = "app.StatusModel";
//!     const FIELDS: &'static [&'static str] = &["id", "status"];
//!
//!     fn record_id(&self) -> String {
//!         self.id.to_string()
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.watch::<StatusModel>(Watch::new().status_field("status"))?;
//!
//! let dispatcher = Dispatcher::new(registry, BrokerConfig::from_env()?)?;
//!
//! // From the save hook, after commit:
//! dispatcher.record_created(&record).await?;   // -> "status_model__<status>"
//! dispatcher.record_deleted(&record).await?;   // -> "status_model__deleted"
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod publisher;
pub mod record;
pub mod registry;
pub mod suppress;

mod naming;

// Re-exports for convenience
pub use config::{BrokerConfig, BrokerConfigBuilder, RetryPolicy, TransportTuning};
pub use dispatcher::Dispatcher;
pub use error::EventError;
pub use event::{Action, OutboundEvent};
pub use publisher::Publisher;
pub use record::{snapshot, Record};
pub use registry::{Registry, SerializerFn, Watch};
pub use suppress::{
    suppress_record, suppress_records, suppress_type, suppress_types, RecordSuppression,
    TypeSuppression,
};

#[cfg(feature = "kafka")]
pub use publisher::KafkaPublisher;
