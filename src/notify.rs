//! Stale NAV alert over a chat webhook
//!
//! One POST per run with a `{"text": ...}` JSON body, the payload shape
//! accepted by Slack-style incoming webhooks. Only the status code is
//! checked; there is no retry.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::NavError;
use crate::reports::StalenessReport;

/// JSON body posted to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub text: String,
}

/// Result of a delivered notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub status: StatusCode,
}

/// Plain-text summary of the stale funds in a report
pub fn format_stale_summary(report: &StalenessReport, base_currency: &str) -> String {
    let as_of = report.as_of.format("%d %b %Y");

    if !report.has_stale() {
        return format!(
            "All {} fund(s) updated their NAV on {}.",
            report.total(),
            as_of
        );
    }

    let mut text = format!(
        "{} fund(s) have not updated their NAV on {}.",
        report.stale.len(),
        as_of
    );

    for r in &report.stale {
        let nav_date = r
            .record
            .nav_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let nav = r
            .nav_base
            .map(|v| format!("{:.2} {}", v, base_currency))
            .unwrap_or_else(|| "n/a".to_string());

        text.push_str(&format!(
            "\n• {} ({}): NAV date {}, NAV {}",
            r.record.fund, r.record.currency, nav_date, nav
        ));
    }

    text
}

pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("navwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(url, client))
    }

    pub fn with_client(url: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            client,
        }
    }

    /// Post `text` once; any non-2xx status is an error
    pub async fn send(&self, text: &str) -> Result<NotifyOutcome> {
        let payload = WebhookPayload {
            text: text.to_string(),
        };
        info!("Posting stale NAV alert to webhook");
        debug!("Webhook payload: {:?}", payload);

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request to webhook")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NavError::WebhookRejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        info!("Webhook accepted the alert ({})", status);
        Ok(NotifyOutcome { status })
    }
}
