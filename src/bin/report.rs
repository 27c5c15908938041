#![cfg(not(tarpaulin_include))]

use log::{error, info};
use stay_or_skip::{
    DashboardConfig, DatasetCache, MetricsReport, OutputFormat, demo_event_log, report_to_csv,
    report_to_xlsx,
};
use std::path::Path;

/// Prints the dashboard metrics for one dataset
///
/// # Usage
/// `report [--data FILE] [--month YYYY-MM] [--top N] [--window DAYS]
///  [--lookback DAYS] [--steps a,b,c] [--seed N] [--json] [--xlsx FILE] [--csv FILE]
///  [--charts DIR]`
///
/// The dataset path falls back to `STAY_OR_SKIP_DATA`, then to
/// `spotify_merged.xlsx`. Logging follows `RUST_LOG`.
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> stay_or_skip::Result<()> {
    let config = DashboardConfig::from_env()?;

    let cache = DatasetCache::new(&config.data_path);
    let dataset = cache.load_or_get()?;
    let log = demo_event_log(config.seed)?;

    let report = MetricsReport::build(&dataset, &log, &config)?;

    match config.output {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if let Some(path) = &config.xlsx_out {
        std::fs::write(path, report_to_xlsx(&report)?)?;
        info!("wrote {}", path.display());
    }
    if let Some(path) = &config.csv_out {
        std::fs::write(path, report_to_csv(&report))?;
        info!("wrote {}", path.display());
    }
    if let Some(dir) = &config.charts_dir {
        write_charts(&report, dir)?;
    }

    Ok(())
}

#[cfg(feature = "charts")]
fn write_charts(report: &MetricsReport, dir: &Path) -> stay_or_skip::Result<()> {
    stay_or_skip::graph::write_report_charts(report, dir).map(|_| ())
}

#[cfg(not(feature = "charts"))]
fn write_charts(_report: &MetricsReport, dir: &Path) -> stay_or_skip::Result<()> {
    Err(stay_or_skip::Error::Config(format!(
        "--charts {} needs a build with the `charts` feature",
        dir.display()
    )))
}
