//! [`Config`]-related definitions.

use std::time;

use common::Currency;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use serde::Deserialize;
use service::domain::document::Prefix;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Document numbering configuration.
    pub numbering: Numbering,

    /// Business terms of the issued documents.
    pub terms: Terms,

    /// Currency new documents are priced in.
    pub currency: Currency,
}

impl TryFrom<Service> for service::Config {
    type Error = InvalidPrefix;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            numbering:
                Numbering {
                    invoice_prefix,
                    quotation_prefix,
                    max_attempts,
                },
            terms:
                Terms {
                    payment_term,
                    quotation_validity,
                },
            currency,
        } = value;

        let prefix = |p: String| Prefix::new(p.clone()).ok_or(InvalidPrefix(p));
        Ok(Self {
            numbering: service::Numbering {
                invoice_prefix: prefix(invoice_prefix)?,
                quotation_prefix: prefix(quotation_prefix)?,
                max_attempts: max_attempts.max(1),
            },
            terms: service::Terms {
                payment_term,
                quotation_validity,
            },
            currency,
        })
    }
}

/// Configured document number prefix is malformed.
#[derive(Clone, Debug, Display, Error)]
#[display("`{_0}` is not a valid document number prefix")]
pub struct InvalidPrefix(#[error(not(source))] String);

/// Document numbering configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Numbering {
    /// Prefix of invoice numbers.
    #[default("MZK".to_owned())]
    pub invoice_prefix: String,

    /// Prefix of quotation numbers.
    #[default("QUO".to_owned())]
    pub quotation_prefix: String,

    /// Maximum number of attempts to store a document under an automatically
    /// allocated number.
    #[default(2)]
    pub max_attempts: u8,
}

/// Business terms of the issued documents.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Terms {
    /// Period an invoice should be paid within.
    #[default(time::Duration::from_secs(30 * 24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub payment_term: time::Duration,

    /// Period a quotation stays valid for.
    #[default(time::Duration::from_secs(30 * 24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub quotation_validity: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
