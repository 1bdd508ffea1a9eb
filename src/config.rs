use crate::errors::{ClientError, ClientResult};
use reqwest::Url;
use std::{env, time::Duration};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// `None` leaves requests unbounded; a hung request then keeps the
    /// loading indicator up until the caller gives up.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url).map_err(|err| {
            ClientError::validation(format!("invalid base url `{base_url}`: {err}"))
        })?;
        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_env() -> ClientResult<Self> {
        let mut config = match env::var("LIFE_API_BASE_URL") {
            Ok(value) => Self::new(&value).or_else(|err| {
                warn!("ignoring LIFE_API_BASE_URL: {err}");
                Self::new(DEFAULT_BASE_URL)
            })?,
            Err(_) => Self::new(DEFAULT_BASE_URL)?,
        };

        config.timeout = env::var("LIFE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|value| parse_timeout(&value));

        Ok(config)
    }
}

fn parse_timeout(value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(err) => {
            warn!("ignoring LIFE_API_TIMEOUT_SECS `{value}`: {err}");
            None
        }
    }
}
