use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use common::{Error, NotificationSink, Report, Result};

/// Posts reports to a chat webhook as a single embed.
///
/// This is the only component that talks to the notification endpoint.
pub struct WebhookSink {
    url: String,
    username: String,
    http: Client,
}

impl WebhookSink {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        let sink = Self {
            url: url.into(),
            username: username.into(),
            http,
        };
        info!(username = %sink.username, "WebhookSink initialized");
        Ok(sink)
    }

    fn payload<'a>(&'a self, report: &'a Report) -> WebhookPayload<'a> {
        WebhookPayload {
            username: &self.username,
            embeds: vec![Embed {
                title: &report.title,
                description: report.body(),
                color: report.severity.rgb(),
            }],
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, report: &Report) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(&self.payload(report))
            .send()
            .await
            .map_err(|e| Error::Webhook(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Webhook(format!("HTTP {status}: {body}")));
        }
        debug!(title = %report.title, "Report delivered");
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    embeds: Vec<Embed<'a>>,
}

#[derive(Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: String,
    color: u32,
}
