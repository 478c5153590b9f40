//! Broker and sender configuration, loaded once at process start.

use crate::error::EventError;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Security protocol for the broker connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityProtocol {
    /// Plaintext connection (no encryption or auth).
    Plaintext,
    /// SSL encryption without SASL auth.
    Ssl,
    /// SASL authentication without encryption.
    SaslPlaintext,
    /// SASL authentication with SSL encryption.
    SaslSsl,
}

impl FromStr for SecurityProtocol {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PLAINTEXT" => Ok(Self::Plaintext),
            "SSL" => Ok(Self::Ssl),
            "SASL_PLAINTEXT" => Ok(Self::SaslPlaintext),
            "SASL_SSL" => Ok(Self::SaslSsl),
            _ => Err(EventError::ConfigInvalid {
                var: "KAFKA_SECURITY_PROTOCOL".to_string(),
                reason: format!("unknown protocol: {s}"),
            }),
        }
    }
}

impl SecurityProtocol {
    /// Convert to rdkafka string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        }
    }
}

/// SASL mechanism for authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
}

impl FromStr for SaslMechanism {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "PLAIN" => Ok(Self::Plain),
            "SCRAM_SHA_256" => Ok(Self::ScramSha256),
            "SCRAM_SHA_512" => Ok(Self::ScramSha512),
            _ => Err(EventError::ConfigInvalid {
                var: "KAFKA_SASL_MECHANISM".to_string(),
                reason: format!("unknown mechanism: {s}"),
            }),
        }
    }
}

impl SaslMechanism {
    /// Convert to rdkafka string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

/// SASL credentials for authentication.
#[derive(Debug, Clone)]
pub struct SaslCredentials {
    pub mechanism: SaslMechanism,
    pub username: String,
    pub password: String,
}

/// Bounded retry policy, delegated to the broker client.
///
/// The backoff interval grows from `interval_start` toward `interval_max`;
/// `interval_step` is the nominal growth per attempt (the client's own
/// backoff schedule stays within the same bounds).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub interval_start: Duration,
    pub interval_step: Duration,
    pub interval_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            interval_start: Duration::from_secs(2),
            interval_step: Duration::from_secs(1),
            interval_max: Duration::from_secs(5),
        }
    }
}

/// Transport tuning handed to the broker client.
#[derive(Debug, Clone)]
pub struct TransportTuning {
    /// Connection heartbeat interval.
    pub heartbeat: Duration,
    /// Wait for broker acknowledgement of every publish.
    pub confirm_publish: bool,
    /// Retry policy for failed publishes.
    pub retry: RetryPolicy,
}

impl Default for TransportTuning {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(60),
            confirm_publish: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Broker connection and sender identity configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Name of the service sending events; scopes the destination topic.
    pub service_name: String,
    /// Comma-separated list of broker addresses.
    pub bootstrap_servers: String,
    /// Security protocol.
    pub security_protocol: SecurityProtocol,
    /// SASL credentials (required if using SASL).
    pub sasl: Option<SaslCredentials>,
    /// Client identifier.
    pub client_id: String,
    /// Transport tuning.
    pub tuning: TransportTuning,
}

impl BrokerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `EVENTS_SERVICE_NAME`: Sender identity
    /// - `KAFKA_BOOTSTRAP_SERVERS`: Comma-separated broker list
    ///   (`KAFKA_BROKER_URL` is accepted as a deprecated fallback)
    ///
    /// Optional:
    /// - `KAFKA_SECURITY_PROTOCOL`: PLAINTEXT (default), SSL, `SASL_PLAINTEXT`, `SASL_SSL`
    /// - `KAFKA_CLIENT_ID`: Client identifier (default: "crud-events")
    /// - `KAFKA_SASL_MECHANISM`: PLAIN, SCRAM-SHA-256, SCRAM-SHA-512 (required if SASL)
    /// - `KAFKA_SASL_USERNAME`: SASL username (required if SASL)
    /// - `KAFKA_SASL_PASSWORD`: SASL password (required if SASL)
    pub fn from_env() -> Result<Self, EventError> {
        let service_name =
            env::var("EVENTS_SERVICE_NAME").map_err(|_| EventError::ConfigMissing {
                var: "EVENTS_SERVICE_NAME".to_string(),
            })?;

        let bootstrap_servers = match env::var("KAFKA_BOOTSTRAP_SERVERS") {
            Ok(v) => v,
            // Old deployments configured the broker under a single URL key.
            Err(_) => match env::var("KAFKA_BROKER_URL") {
                Ok(v) => {
                    warn!("KAFKA_BROKER_URL is deprecated, set KAFKA_BOOTSTRAP_SERVERS instead");
                    v
                }
                Err(_) => {
                    return Err(EventError::ConfigMissing {
                        var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
                    })
                }
            },
        };

        let security_protocol = match env::var("KAFKA_SECURITY_PROTOCOL") {
            Ok(v) => SecurityProtocol::from_str(&v)?,
            Err(_) => SecurityProtocol::Plaintext,
        };

        let client_id = env::var("KAFKA_CLIENT_ID").unwrap_or_else(|_| "crud-events".to_string());

        let sasl = if matches!(
            security_protocol,
            SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl
        ) {
            let mechanism_str =
                env::var("KAFKA_SASL_MECHANISM").map_err(|_| EventError::ConfigMissing {
                    var: "KAFKA_SASL_MECHANISM".to_string(),
                })?;

            let username =
                env::var("KAFKA_SASL_USERNAME").map_err(|_| EventError::ConfigMissing {
                    var: "KAFKA_SASL_USERNAME".to_string(),
                })?;

            let password =
                env::var("KAFKA_SASL_PASSWORD").map_err(|_| EventError::ConfigMissing {
                    var: "KAFKA_SASL_PASSWORD".to_string(),
                })?;

            Some(SaslCredentials {
                mechanism: SaslMechanism::from_str(&mechanism_str)?,
                username,
                password,
            })
        } else {
            None
        };

        Ok(Self {
            service_name,
            bootstrap_servers,
            security_protocol,
            sasl,
            client_id,
            tuning: TransportTuning::default(),
        })
    }

    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::new()
    }
}

/// Builder for [`BrokerConfig`].
#[derive(Debug, Default)]
pub struct BrokerConfigBuilder {
    service_name: Option<String>,
    bootstrap_servers: Option<String>,
    security_protocol: Option<SecurityProtocol>,
    sasl: Option<SaslCredentials>,
    client_id: Option<String>,
    tuning: Option<TransportTuning>,
}

impl BrokerConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender service name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set bootstrap servers.
    pub fn bootstrap_servers(mut self, servers: impl Into<String>) -> Self {
        self.bootstrap_servers = Some(servers.into());
        self
    }

    /// Set security protocol.
    #[must_use]
    pub fn security_protocol(mut self, protocol: SecurityProtocol) -> Self {
        self.security_protocol = Some(protocol);
        self
    }

    /// Set SASL credentials.
    #[must_use]
    pub fn sasl(mut self, mechanism: SaslMechanism, username: String, password: String) -> Self {
        self.sasl = Some(SaslCredentials {
            mechanism,
            username,
            password,
        });
        self
    }

    /// Set client ID.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Override transport tuning.
    #[must_use]
    pub fn tuning(mut self, tuning: TransportTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<BrokerConfig, EventError> {
        let service_name = self.service_name.ok_or(EventError::ConfigMissing {
            var: "service_name".to_string(),
        })?;

        let bootstrap_servers = self.bootstrap_servers.ok_or(EventError::ConfigMissing {
            var: "bootstrap_servers".to_string(),
        })?;

        let security_protocol = self
            .security_protocol
            .unwrap_or(SecurityProtocol::Plaintext);

        // Validate SASL is provided if required
        if matches!(
            security_protocol,
            SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl
        ) && self.sasl.is_none()
        {
            return Err(EventError::ConfigMissing {
                var: "sasl_credentials".to_string(),
            });
        }

        Ok(BrokerConfig {
            service_name,
            bootstrap_servers,
            security_protocol,
            sasl: self.sasl,
            client_id: self.client_id.unwrap_or_else(|| "crud-events".to_string()),
            tuning: self.tuning.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_protocol_from_str() {
        assert_eq!(
            "PLAINTEXT".parse::<SecurityProtocol>().unwrap(),
            SecurityProtocol::Plaintext
        );
        assert_eq!(
            "sasl_ssl".parse::<SecurityProtocol>().unwrap(),
            SecurityProtocol::SaslSsl
        );
        assert!("INVALID".parse::<SecurityProtocol>().is_err());
    }

    #[test]
    fn test_sasl_mechanism_from_str() {
        assert_eq!(
            "PLAIN".parse::<SaslMechanism>().unwrap(),
            SaslMechanism::Plain
        );
        assert_eq!(
            "SCRAM-SHA-256".parse::<SaslMechanism>().unwrap(),
            SaslMechanism::ScramSha256
        );
        assert!("INVALID".parse::<SaslMechanism>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = BrokerConfig::builder()
            .service_name("test_service")
            .bootstrap_servers("localhost:9092")
            .build()
            .unwrap();

        assert_eq!(config.service_name, "test_service");
        assert_eq!(config.security_protocol, SecurityProtocol::Plaintext);
        assert_eq!(config.client_id, "crud-events");
        assert!(config.sasl.is_none());
        assert_eq!(config.tuning.heartbeat, Duration::from_secs(60));
        assert!(config.tuning.confirm_publish);
        assert_eq!(config.tuning.retry.max_retries, 3);
        assert_eq!(config.tuning.retry.interval_start, Duration::from_secs(2));
        assert_eq!(config.tuning.retry.interval_max, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_sasl_ssl() {
        let config = BrokerConfig::builder()
            .service_name("test_service")
            .bootstrap_servers("broker.example.com:9093")
            .security_protocol(SecurityProtocol::SaslSsl)
            .sasl(
                SaslMechanism::ScramSha256,
                "user".to_string(),
                "pass".to_string(),
            )
            .build()
            .unwrap();

        assert_eq!(config.security_protocol, SecurityProtocol::SaslSsl);
        let sasl = config.sasl.unwrap();
        assert_eq!(sasl.mechanism, SaslMechanism::ScramSha256);
        assert_eq!(sasl.username, "user");
    }

    #[test]
    fn test_builder_missing_service_name() {
        let result = BrokerConfig::builder()
            .bootstrap_servers("localhost:9092")
            .build();

        assert!(result.is_err());
        if let Err(EventError::ConfigMissing { var }) = result {
            assert_eq!(var, "service_name");
        } else {
            panic!("expected ConfigMissing error");
        }
    }

    #[test]
    fn test_builder_sasl_without_credentials() {
        let result = BrokerConfig::builder()
            .service_name("test_service")
            .bootstrap_servers("localhost:9092")
            .security_protocol(SecurityProtocol::SaslSsl)
            .build();

        assert!(result.is_err());
        if let Err(EventError::ConfigMissing { var }) = result {
            assert_eq!(var, "sasl_credentials");
        } else {
            panic!("expected ConfigMissing error");
        }
    }

    #[test]
    fn test_from_env_missing_vars() {
        // Clear the vars if set
        env::remove_var("EVENTS_SERVICE_NAME");
        env::remove_var("KAFKA_BOOTSTRAP_SERVERS");
        env::remove_var("KAFKA_BROKER_URL");
        let result = BrokerConfig::from_env();
        assert!(result.is_err());
    }
}
