pub mod http_email;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, email: &Email) -> anyhow::Result<()>;
}
