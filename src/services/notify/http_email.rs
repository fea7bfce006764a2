use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{Email, Notifier};

/// Sends mail through an HTTP relay that accepts a JSON payload with bearer auth.
pub struct HttpEmailNotifier {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

impl HttpEmailNotifier {
    pub fn new(
        api_url: String,
        api_key: String,
        from: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_url,
            api_key,
            from,
            client,
        })
    }
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    async fn send_email(&self, email: &Email) -> anyhow::Result<()> {
        let payload = EmailPayload {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: email.text_body.as_deref(),
            reply_to: email.reply_to.as_deref(),
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to reach email relay")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("email relay error ({status}): {body}");
        }

        Ok(())
    }
}
