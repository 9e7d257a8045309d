use crate::connector::Connector;
use crate::error::{ConfigSnafu, Error};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use surf::{Client, Url};
use tracing::{event, Level};

/// Settings needed to build a [Connector] without hand-constructing the transport.
///
/// ```
/// let config = connector::ConnectorConfig::from_json(
///     r#"{ "base_url": "https://api.example.com/v1/", "timeout_ms": 1500 }"#,
/// )
/// .unwrap();
/// assert_eq!(config.timeout, Some(std::time::Duration::from_millis(1500)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConnectorConfig {
    /// Prefix of every endpoint path; usually ends with `/`.
    pub base_url: String,
    /// Overall request timeout enforced by the transport, given in milliseconds. `None` keeps the
    /// transport default.
    #[serde(default, rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Option<Duration>,
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

impl ConnectorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|err| {
            ConfigSnafu {
                reason: err.to_string(),
            }
            .build()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check that the base URL is an absolute URL that endpoint paths can be appended to.
    pub fn validate(&self) -> Result<(), Error> {
        let url = Url::parse(&self.base_url).map_err(|err| {
            ConfigSnafu {
                reason: format!("base URL {} is invalid: {}", self.base_url, err),
            }
            .build()
        })?;
        if url.cannot_be_a_base() {
            return ConfigSnafu {
                reason: format!("base URL {} cannot be a base", self.base_url),
            }
            .fail();
        }
        if self.timeout == Some(Duration::ZERO) {
            return ConfigSnafu {
                reason: "timeout must not be zero",
            }
            .fail();
        }
        Ok(())
    }

    /// Build the transport and wrap it in a [Connector].
    pub fn connect(self) -> Result<Connector, Error> {
        self.validate()?;
        let client: Client = surf::Config::new()
            .set_timeout(self.timeout)
            .try_into()
            .map_err(|err| {
                ConfigSnafu {
                    reason: format!("cannot build HTTP client: {}", err),
                }
                .build()
            })?;
        event!(
            Level::INFO,
            "connecting to {} (timeout: {:?})",
            self.base_url,
            self.timeout
        );
        Ok(Connector::new(client, self.base_url))
    }
}
