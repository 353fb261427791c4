mod email;
mod telegram;

pub use email::EmailChannel;
pub use telegram::TelegramChannel;

use crate::errors::AppResult;
use async_trait::async_trait;

/// External delivery channel for a finished report. Failure must be
/// distinguishable from success so the orchestrator can gate its commit.
#[async_trait]
pub trait ReportDispatcher: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, subject: &str, body: &str) -> AppResult<()>;
}
