pub mod spreadsheet;

use crate::config::{AdzunaConfig, MarketJobConfig};
use crate::dispatch::{ReportDispatcher, TelegramChannel};
use crate::errors::{AppError, AppResult};
use crate::models::{MarketReport, RoleStats};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Role queries polled once per round.
pub const ROLES: [&str; 5] = [
    "Data Analyst",
    "Product Analyst",
    "BI Analyst",
    "Data Engineer",
    "ML Engineer",
];

#[derive(Debug, Clone, Copy)]
pub struct CountryMeta {
    pub name: &'static str,
    pub currency: &'static str,
    pub symbol: &'static str,
}

static COUNTRY_META: Lazy<HashMap<&'static str, CountryMeta>> = Lazy::new(|| {
    HashMap::from([
        ("gb", CountryMeta { name: "United Kingdom", currency: "GBP", symbol: "£" }),
        ("us", CountryMeta { name: "United States", currency: "USD", symbol: "$" }),
        ("de", CountryMeta { name: "Germany", currency: "EUR", symbol: "€" }),
        ("fr", CountryMeta { name: "France", currency: "EUR", symbol: "€" }),
        ("nl", CountryMeta { name: "Netherlands", currency: "EUR", symbol: "€" }),
        ("ca", CountryMeta { name: "Canada", currency: "CAD", symbol: "C$" }),
        ("au", CountryMeta { name: "Australia", currency: "AUD", symbol: "A$" }),
        ("in", CountryMeta { name: "India", currency: "INR", symbol: "₹" }),
    ])
});

/// Country display name and currency, falling back to the upper-cased code
/// for countries outside the table.
pub fn country_meta(code: &str) -> (String, String) {
    match COUNTRY_META.get(code) {
        Some(meta) => (meta.name.to_string(), meta.currency.to_string()),
        None => (code.to_uppercase(), String::new()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<JobListing>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobListing {
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub location: Option<JobLocation>,
    pub company: Option<JobCompany>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobLocation {
    #[serde(default)]
    pub area: Vec<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobCompany {
    pub display_name: Option<String>,
}

pub struct AdzunaClient {
    client: reqwest::Client,
    config: AdzunaConfig,
}

impl AdzunaClient {
    pub fn new(config: AdzunaConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| AppError::Internal(format!("build http client: {err}")))?;
        Ok(Self { client, config })
    }

    pub async fn search(&self, what: &str, page: u32, results_per_page: u32) -> AppResult<SearchResponse> {
        let url = format!(
            "https://api.adzuna.com/v1/api/jobs/{}/search/{}",
            self.config.country, page
        );
        let response = self
            .client
            .get(&url)
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("app_key", self.config.app_key.as_str()),
                ("what", what),
                ("results_per_page", &results_per_page.to_string()),
                ("content-type", "application/json"),
            ])
            .send()
            .await
            .map_err(|err| AppError::Dispatch(format!("Adzuna request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Dispatch(format!(
                "Adzuna API returned {status}: {body}"
            )));
        }

        Ok(response.json::<SearchResponse>().await?)
    }
}

/// Salary midpoint; either bound alone stands in for a missing other bound.
pub fn extract_salary(job: &JobListing) -> Option<f64> {
    match (job.salary_min, job.salary_max) {
        (None, None) => None,
        (Some(min), None) => Some(min),
        (None, Some(max)) => Some(max),
        (Some(min), Some(max)) => Some((min + max) / 2.0),
    }
}

/// "Most specific area, country" when the area array narrows past the
/// country; otherwise the display name, with bare country labels dropped.
pub fn extract_location(job: &JobListing) -> Option<String> {
    let location = job.location.as_ref()?;

    if let (Some(country), Some(most_specific)) = (location.area.first(), location.area.last()) {
        if !most_specific.is_empty() && most_specific != country {
            return Some(format!("{most_specific}, {country}"));
        }
    }

    let display_name = location.display_name.as_deref()?;
    let lowered = display_name.trim().to_lowercase();
    if lowered == "uk" || lowered == "united kingdom" {
        return None;
    }
    Some(display_name.to_string())
}

/// Aggregates one search page into per-role statistics.
pub fn role_stats(role: &str, response: &SearchResponse) -> RoleStats {
    let mut salaries = Vec::new();
    let mut locations = Vec::new();
    let mut companies = Vec::new();

    for job in &response.results {
        if let Some(salary) = extract_salary(job) {
            salaries.push(salary);
        }
        if let Some(location) = extract_location(job) {
            locations.push(location);
        }
        if let Some(company) = job
            .company
            .as_ref()
            .and_then(|company| company.display_name.clone())
            .filter(|name| !name.is_empty())
        {
            companies.push(company);
        }
    }

    let sample = response.results.len();
    let avg_salary = if salaries.is_empty() {
        None
    } else {
        let mean = salaries.iter().sum::<f64>() / salaries.len() as f64;
        Some((mean * 100.0).round() / 100.0)
    };
    let salary_share = if sample == 0 {
        0.0
    } else {
        (salaries.len() as f64 / sample as f64 * 1000.0).round() / 10.0
    };

    RoleStats {
        role: role.to_string(),
        total: response.count,
        sample,
        avg_salary,
        salary_share,
        top_locations: most_common(&locations, 3),
        top_companies: most_common(&companies, 3),
    }
}

/// Top-n values by frequency, first occurrence winning ties.
fn most_common(values: &[String], n: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

pub fn flatten_counts(counts: &[(String, usize)]) -> String {
    if counts.is_empty() {
        return "no data".to_string();
    }
    counts
        .iter()
        .map(|(name, count)| format!("{name} ({count})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain-text report: one header line, then one block per role.
pub fn build_report_text(report: &MarketReport) -> String {
    let mut lines = vec![format!(
        "Adzuna daily report ({}) - {}",
        report.country_name, report.date
    )];

    for stats in &report.rows {
        let avg_salary_text = match stats.avg_salary {
            Some(avg) => format!("{:.0} {}", avg, report.currency).trim().to_string(),
            None => "no data".to_string(),
        };
        lines.push(format!(
            "\n{}\ntotal: {}\nsample: {}\navg salary: {}\nsalary share: {}%\ntop locations: {}\ntop companies: {}",
            stats.role,
            stats.total,
            stats.sample,
            avg_salary_text,
            stats.salary_share,
            flatten_counts(&stats.top_locations),
            flatten_counts(&stats.top_companies),
        ));
    }

    lines.join("\n")
}

/// One full round: poll every role, build the text report and workbook,
/// deliver both through the Telegram channel.
pub async fn run_market_report(config: &MarketJobConfig) -> AppResult<()> {
    let run_id = Uuid::new_v4();
    let client = AdzunaClient::new(config.adzuna.clone())?;
    let (country_name, currency) = country_meta(&config.adzuna.country);
    let date = chrono::Local::now().date_naive();

    let mut rows = Vec::with_capacity(ROLES.len());
    for role in ROLES {
        let response = client.search(role, 1, 50).await?;
        let stats = role_stats(role, &response);
        info!(%run_id, role, total = stats.total, sample = stats.sample, "role polled");
        rows.push(stats);
    }

    let report = MarketReport {
        date,
        country_code: config.adzuna.country.clone(),
        country_name,
        currency,
        rows,
    };

    let text = build_report_text(&report);
    let workbook_path = spreadsheet::write_workbook(&report, &config.output_dir)?;

    let telegram = TelegramChannel::new(&config.telegram);
    telegram.send("", &text).await?;

    let caption = format!(
        "Adzuna report - {} - {} - xlsx file",
        report.date, report.country_name
    );
    telegram.send_document(&workbook_path, &caption).await?;

    info!(%run_id, path = %workbook_path.display(), "market report delivered");
    Ok(())
}
