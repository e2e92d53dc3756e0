//! Sensor relay notifier.
//!
//! Implements [`Notifier`] by POSTing a small JSON report to the relay
//! that drives the remote sensor panel. Delivery is best effort: one
//! attempt, bounded by a timeout, no retries.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::app::ports::{Notifier, NotifyError};

const REPORTER: &str = "uberswitch";
const TOPIC: &str = "actions";

/// Envelope the relay expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorReport {
    pub reporter: String,
    pub topic: String,
    pub sensors: BTreeMap<String, String>,
}

impl SensorReport {
    pub fn toggle_screen() -> Self {
        Self {
            reporter: REPORTER.into(),
            topic: TOPIC.into(),
            sensors: BTreeMap::from([("toggle_screen".to_string(), "1".to_string())]),
        }
    }
}

pub struct RelayNotifier {
    client: reqwest::Client,
    url: String,
}

impl RelayNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Notifier for RelayNotifier {
    async fn toggle_screen(&self) -> Result<(), NotifyError> {
        if self.url.is_empty() {
            return Err(NotifyError::NotConfigured);
        }
        let response = self
            .client
            .post(&self.url)
            .json(&SensorReport::toggle_screen())
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
