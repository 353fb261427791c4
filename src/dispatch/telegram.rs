use crate::config::TelegramConfig;
use crate::dispatch::ReportDispatcher;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

/// Telegram bot channel. Text reports go through `sendMessage`, file
/// attachments through `sendDocument`.
pub struct TelegramChannel {
    bot_token: String,
    chat_id: i64,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    pub async fn send_document(&self, path: &Path, caption: &str) -> AppResult<()> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| AppError::Io(format!("read {}: {}", path.display(), err)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.xlsx".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .client
            .post(self.endpoint("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| AppError::Dispatch(format!("Telegram request failed: {err}")))?;

        check_status(response).await?;
        debug!(path = %path.display(), "telegram document sent");
        Ok(())
    }
}

#[async_trait]
impl ReportDispatcher for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, _subject: &str, body: &str) -> AppResult<()> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": body,
        });

        let response = self
            .client
            .post(self.endpoint("sendMessage"))
            .json(&payload)
            .send()
            .await
            .map_err(|err| AppError::Dispatch(format!("Telegram request failed: {err}")))?;

        check_status(response).await?;
        debug!("telegram message sent");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> AppResult<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Dispatch(format!(
        "Telegram API returned {status}: {body}"
    )))
}
