use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::MailConfig;

/// Transactional mail, used only by the newsletter subscribe flow. Send
/// failures are logged by the caller and never fail the request.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, to: &str) -> anyhow::Result<()>;
}

/// Client for an HTTP transactional-mail API with a bounded
/// exponential-backoff retry (1s, 2s) around each send.
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_token: String,
    sender: String,
}

const SEND_RETRIES: u32 = 2;

impl HttpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            sender: config.sender.clone(),
        })
    }

    async fn post_message(&self, message: &MailMessage<'_>) -> anyhow::Result<()> {
        self.http
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_welcome(&self, to: &str) -> anyhow::Result<()> {
        let message = MailMessage {
            from: &self.sender,
            to,
            subject: "Welcome to Flaire",
            html: WELCOME_HTML,
        };

        let mut last_err = None;
        for attempt in 0..=SEND_RETRIES {
            match self.post_message(&message).await {
                Ok(()) => {
                    tracing::info!(to = %to, "welcome email sent");
                    return Ok(());
                }
                Err(err) => {
                    if attempt < SEND_RETRIES {
                        let delay = Duration::from_secs(1 << attempt);
                        tracing::warn!(
                            to = %to,
                            attempt = attempt + 1,
                            error = %err,
                            "mail send failed, retrying in {:?}",
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("mail send failed")))
    }
}

/// Used when no mail credentials are configured, and by tests.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send_welcome(&self, to: &str) -> anyhow::Result<()> {
        tracing::debug!(to = %to, "mail not configured, skipping welcome email");
        Ok(())
    }
}

const WELCOME_HTML: &str = r#"<html>
  <body style="font-family:Inter,Arial,sans-serif;">
    <h1>Flaire.</h1>
    <p>Ditch the Fashion. Embrace the Style.</p>
    <h2>You're on the list!</h2>
    <p>Thanks for joining the Flaire newsletter. You'll be the first to hear
       about new collections, exclusive drops, and special offers.</p>
    <p style="color:#999;">If you didn't subscribe, you can safely ignore
       this email.</p>
  </body>
</html>"#;
