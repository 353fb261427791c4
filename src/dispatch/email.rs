use crate::config::SmtpConfig;
use crate::dispatch::ReportDispatcher;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

/// SMTP channel for the hourly report mail.
pub struct EmailChannel {
    sender: Mailbox,
    receiver: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailChannel {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|err| AppError::Config(format!("SENDER_EMAIL: {err}")))?;
        let receiver: Mailbox = config
            .receiver
            .parse()
            .map_err(|err| AppError::Config(format!("RECEIVER_EMAIL: {err}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|err| AppError::Config(format!("SMTP_HOST: {err}")))?
            .credentials(Credentials::new(
                config.sender.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            sender,
            receiver,
            transport,
        })
    }
}

#[async_trait]
impl ReportDispatcher for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, subject: &str, body: &str) -> AppResult<()> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.receiver.clone())
            .subject(subject)
            .body(body.to_string())
            .map_err(|err| AppError::Dispatch(format!("build message: {err}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|err| AppError::Dispatch(format!("smtp send failed: {err}")))?;

        debug!(subject, "email report sent");
        Ok(())
    }
}
