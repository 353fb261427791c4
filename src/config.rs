use crate::errors::{AppError, AppResult};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub sender: String,
    pub password: String,
    pub receiver: String,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone)]
pub struct AdzunaConfig {
    pub app_id: String,
    pub app_key: String,
    pub country: String,
}

/// Data locations shared by the prepare and hourly report runs.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub raw_csv_path: PathBuf,
    pub events_db_path: PathBuf,
    pub state_path: PathBuf,
}

impl DataPaths {
    pub fn from_env() -> Self {
        Self {
            raw_csv_path: optional("RAW_CSV_PATH", "data/raw/ecommerce_clickstream_transactions.csv").into(),
            events_db_path: optional("EVENTS_DB_PATH", "data/processed/events.db").into(),
            state_path: optional("STATE_PATH", "state.json").into(),
        }
    }
}

/// Paths and credentials for the hourly clickstream job.
#[derive(Debug, Clone)]
pub struct HourlyJobConfig {
    pub paths: DataPaths,
    pub smtp: SmtpConfig,
}

impl HourlyJobConfig {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            paths: DataPaths::from_env(),
            smtp: SmtpConfig {
                host: optional("SMTP_HOST", "smtp.gmail.com"),
                sender: required("SENDER_EMAIL")?,
                password: required("SENDER_PASSWORD")?,
                receiver: required("RECEIVER_EMAIL")?,
            },
        })
    }
}

/// Credentials and schedule for the daily job-market report.
#[derive(Debug, Clone)]
pub struct MarketJobConfig {
    pub adzuna: AdzunaConfig,
    pub telegram: TelegramConfig,
    pub cron: String,
    pub output_dir: PathBuf,
}

impl MarketJobConfig {
    pub fn from_env() -> AppResult<Self> {
        let chat_id_raw = required("CHAT_ID")?;
        let chat_id = chat_id_raw
            .parse::<i64>()
            .map_err(|_| AppError::Config(format!("CHAT_ID must be an integer, got {chat_id_raw:?}")))?;

        Ok(Self {
            adzuna: AdzunaConfig {
                app_id: required("ADZUNA_APP_ID")?,
                app_key: required("ADZUNA_APP_KEY")?,
                country: optional("ADZUNA_COUNTRY", "gb").to_lowercase(),
            },
            telegram: TelegramConfig {
                bot_token: required("BOT_TOKEN")?,
                chat_id,
            },
            cron: optional("MARKET_REPORT_CRON", "0 0 9 * * *"),
            output_dir: optional("REPORT_OUTPUT_DIR", ".").into(),
        })
    }
}

fn required(name: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "missing required environment variable {name}"
        ))),
    }
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
