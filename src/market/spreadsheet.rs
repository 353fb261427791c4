use crate::errors::AppResult;
use crate::market::flatten_counts;
use crate::models::MarketReport;
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

const BY_ROLE_HEADERS: [&str; 8] = [
    "role",
    "total",
    "sample",
    "avg_salary",
    "salary_share",
    "top_locations",
    "top_companies",
    "currency",
];

/// Writes the two-sheet workbook (`Summary`, `ByRole`) next to the other
/// report artifacts and returns its path.
pub fn write_workbook(report: &MarketReport, output_dir: &Path) -> AppResult<PathBuf> {
    let filename = format!("adzuna_report_{}_{}.xlsx", report.country_code, report.date);
    let path = output_dir.join(filename);

    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet().set_name("Summary")?;
    for (col, header) in ["date", "country_code", "country_name", "currency", "roles_count"]
        .iter()
        .enumerate()
    {
        summary.write_string(0, col as u16, *header)?;
    }
    summary.write_string(1, 0, report.date.to_string())?;
    summary.write_string(1, 1, &report.country_code)?;
    summary.write_string(1, 2, &report.country_name)?;
    summary.write_string(1, 3, &report.currency)?;
    summary.write_number(1, 4, report.rows.len() as f64)?;

    let by_role = workbook.add_worksheet().set_name("ByRole")?;
    for (col, header) in BY_ROLE_HEADERS.iter().enumerate() {
        by_role.write_string(0, col as u16, *header)?;
    }
    for (index, stats) in report.rows.iter().enumerate() {
        let row = (index + 1) as u32;
        by_role.write_string(row, 0, &stats.role)?;
        by_role.write_number(row, 1, stats.total as f64)?;
        by_role.write_number(row, 2, stats.sample as f64)?;
        match stats.avg_salary {
            Some(avg) => by_role.write_number(row, 3, avg)?,
            None => by_role.write_string(row, 3, "no data")?,
        };
        by_role.write_number(row, 4, stats.salary_share)?;
        by_role.write_string(row, 5, flatten_counts(&stats.top_locations))?;
        by_role.write_string(row, 6, flatten_counts(&stats.top_companies))?;
        by_role.write_string(row, 7, &report.currency)?;
    }

    workbook.save(&path)?;
    Ok(path)
}
