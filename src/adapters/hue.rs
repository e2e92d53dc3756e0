//! Philips Hue motion sensor adapter.
//!
//! Implements [`PresenceSensor`] with a GET against the sensor's REST
//! resource, which answers `{"state": {"presence": bool, "lastupdated": ..}, ..}`.

use std::time::Duration;

use serde::Deserialize;

use crate::app::ports::{PresenceSensor, SensorError};

#[derive(Debug, Default, Deserialize)]
struct HueState {
    #[serde(default)]
    presence: bool,
}

#[derive(Debug, Deserialize)]
struct HueResponse {
    state: HueState,
}

pub struct HueSensor {
    client: reqwest::Client,
    url: String,
}

impl HueSensor {
    /// Every request is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SensorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Pull the presence flag out of a sensor resource body.
pub fn parse_presence(body: &[u8]) -> Result<bool, SensorError> {
    serde_json::from_slice::<HueResponse>(body)
        .map(|r| r.state.presence)
        .map_err(|e| SensorError::Decode(e.to_string()))
}

impl PresenceSensor for HueSensor {
    async fn fetch(&mut self) -> Result<bool, SensorError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SensorError::Status(status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        parse_presence(&body)
    }
}
