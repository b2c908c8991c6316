//! `reqwest` implementation of the aquarium controller API.

use crate::backend::config::BackendConfig;
use crate::backend::payload::{Command, CommandResponse, StatusData, StatusResponse};
use crate::backend::traits::Backend;
use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use tracing::debug;

/// HTTP client for the aquarium controller.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Build a client for the configured backend.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    async fn post_command(&self, path: &str, command: &Command) -> Result<Response> {
        let url = self.config.endpoint(path);
        debug!("POST {} {:?}", url, command);

        let response = self.client.post(&url).json(command).send().await?;
        ensure_success(response)
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DashboardError::http_status(status.as_u16()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn request_ph_reading(&self) -> Result<()> {
        self.post_command("/api", &Command::ReadPh).await?;
        Ok(())
    }

    async fn fetch_status(&self) -> Result<StatusData> {
        let url = self.config.endpoint("/api");
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let body: StatusResponse = ensure_success(response)?.json().await?;
        body.into_data()
    }

    async fn feed_fish(&self) -> Result<()> {
        let command = Command::FeedFish {
            override_detection: true,
        };
        let body: CommandResponse = self
            .post_command("/api/feed_fish", &command)
            .await?
            .json()
            .await?;
        body.into_result("Motor control failed")
    }

    async fn set_auto_mode(&self, enabled: bool) -> Result<()> {
        let body: CommandResponse = self
            .post_command("/api", &Command::SetAutoMode { enabled })
            .await?
            .json()
            .await?;
        body.into_result("Failed to set auto mode")
    }
}
