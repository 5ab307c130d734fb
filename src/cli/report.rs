//! CLI commands for summaries, the dashboard and the financial report

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::ai::HttpTextGenerator;
use crate::config::settings::Settings;
use crate::display::{
    format_conclusion, format_flow, format_health, format_metrics, format_summary,
};
use crate::error::{FinanceError, FinanceResult};
use crate::models::{FlowRange, SummaryPeriod};
use crate::reports::{FinancialReport, ReportFormat};
use crate::services::{health_indicators, DashboardService, InsightService, SummaryService};
use crate::storage::Storage;

use super::today;

/// Handle `summary`
///
/// A failed fetch is reported as missing data instead of zero totals.
pub fn handle_summary_command(
    storage: &Storage,
    settings: &Settings,
    period: SummaryPeriod,
    json: bool,
) -> FinanceResult<()> {
    let summary = match SummaryService::new(storage).financial_summary_at(
        settings.user_id,
        period,
        today(),
    ) {
        Ok(summary) => summary,
        Err(e) => {
            println!("No data available: {}", e);
            return Ok(());
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&summary)?;
        println!("{}", text);
    } else {
        print!("{}", format_summary(&summary, settings.currency_symbol()));
    }

    Ok(())
}

/// Handle `dashboard`
pub fn handle_dashboard_command(
    storage: &Storage,
    settings: &Settings,
    range: FlowRange,
) -> FinanceResult<()> {
    let service = DashboardService::new(storage, settings.user_id);
    let symbol = settings.currency_symbol();
    let today = today();

    let metrics = service.monthly_metrics(today)?;
    let flows = service.monthly_flow(range, today)?;
    let conclusion = service.conclusion(today)?;

    println!("Financial Dashboard");
    println!("{}", "=".repeat(60));
    println!();
    print!("{}", format_metrics(&metrics, symbol));
    println!();
    print!("{}", format_flow(&flows, range, symbol));
    if !flows.is_empty() {
        println!();
        print!("{}", format_health(&health_indicators(&flows)));
    }
    println!();
    print!("{}", format_conclusion(&conclusion, symbol));

    Ok(())
}

/// Handle `report`
///
/// Insights come from the text generator unless `no_ai` is set; a
/// generator failure leaves a note in the report instead of failing it.
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    period: SummaryPeriod,
    format: ReportFormat,
    output: Option<PathBuf>,
    no_ai: bool,
) -> FinanceResult<()> {
    let report = match FinancialReport::generate(storage, settings.user_id, period, today()) {
        Ok(report) => report,
        Err(e) => {
            println!("No data available: {}", e);
            return Ok(());
        }
    };

    let report = if no_ai {
        report
    } else {
        let insights = HttpTextGenerator::from_settings(settings).and_then(|generator| {
            InsightService::new(storage, &generator).narrate_summary(&report.summary)
        });
        match insights {
            Ok(text) => report.with_insights(text),
            Err(e) => {
                warn!(error = %e, "insights unavailable for report");
                report.with_insights(format!("AI insights unavailable: {}", e))
            }
        }
    };

    let symbol = settings.currency_symbol();
    match output {
        Some(path) => {
            let file = File::create(&path).map_err(|e| {
                FinanceError::Export(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let mut writer = BufWriter::new(file);
            report.write(format, &mut writer, symbol)?;
            writer.flush()?;
            println!("Report written to: {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            report.write(format, &mut handle, symbol)?;
            handle.flush()?;
        }
    }

    Ok(())
}
