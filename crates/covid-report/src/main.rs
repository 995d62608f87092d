mod bootstrap;

use anyhow::{Context, Result};
use report_core::error::ReportError;
use report_core::settings::{LastUsedParams, Settings};
use report_data::snapshot::save_snapshot;
use report_data::source::{HttpRecordSource, SourcePayload, StaticRecordSource};
use report_runtime::fetcher::RecordFetcher;
use report_runtime::pipeline::{ReportAssembler, ReportPipeline};
use report_ui::app::{App, TableKind};

/// Fetch the department's records from `--input` or the remote dataset.
fn fetch_records(settings: &Settings, department: &str) -> report_core::error::Result<SourcePayload> {
    match &settings.input {
        Some(path) => {
            tracing::info!(path = %path.display(), "reading records from local snapshot");
            let source =
                StaticRecordSource::from_snapshot(path)?.allow_partial(settings.allow_partial);
            RecordFetcher::new(source).fetch(department)
        }
        None => {
            tracing::info!(department, rows = settings.rows, "fetching records from dataset");
            let source = HttpRecordSource::new(settings.rows)?.allow_partial(settings.allow_partial);
            RecordFetcher::new(source).fetch(department)
        }
    }
}

fn ask_department() -> Result<String> {
    let stdin = std::io::stdin();
    bootstrap::prompt_department(&mut stdin.lock(), &mut std::io::stdout())
}

#[tokio::main]
async fn main() -> Result<()> {
    let result = run().await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "report generation failed");
    }
    result
}

async fn run() -> Result<()> {
    let settings = Settings::load_with_last_used();
    settings.validate()?;

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("COVID report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Output: {}, View: {}, Theme: {}",
        settings.output_dir.display(),
        settings.view,
        settings.theme
    );

    let mut department = match settings.department.clone() {
        Some(d) => d,
        None => ask_department()?,
    };

    // The HTTP client is blocking, so retrieval runs off the async runtime.
    let payload = loop {
        let worker_settings = settings.clone();
        let worker_department = department.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            fetch_records(&worker_settings, &worker_department)
        })
        .await
        .context("record retrieval task panicked")?;

        match outcome {
            Ok(payload) => break payload,
            Err(ReportError::DepartmentNotFound(name)) => {
                tracing::warn!(department = %name, "department not found");
                println!("No records found for department '{name}'.");
                department = ask_department()?;
            }
            Err(e) => return Err(e.into()),
        }
    };

    if payload.is_truncated() {
        println!(
            "Warning: only {} of {} records for {} were retrieved; totals cover the newest records only.",
            payload.records.len(),
            payload.nhits,
            department
        );
    }

    save_snapshot(&payload, &settings.output_dir)?;

    let tables = ReportPipeline::run(&payload.raw_records())?;

    let today = chrono::Local::now().date_naive();
    let written = ReportAssembler::with_default_sinks(settings.sigma).assemble(
        &department,
        &tables,
        today,
        &settings.output_dir,
    )?;

    settings.remember_department(&department, &LastUsedParams::config_path());

    println!(
        "{}: {} records, {} months, {} files written to {}",
        department,
        tables.daily_count,
        tables.monthly.len(),
        written.len(),
        settings.output_dir.display()
    );

    match TableKind::from_name(&settings.view) {
        Some(kind) => {
            let app = App::new(
                &settings.theme,
                kind,
                department,
                tables.monthly,
                tables.cumulative,
            );
            app.run()
                .await
                .map_err(|e| ReportError::Terminal(e.to_string()))?;
        }
        None => tracing::info!("table viewer disabled"),
    }

    Ok(())
}
