#![cfg(feature = "charts")]
use crate::metrics::{FunnelStep, MonthlyRevenue, PlanUsers, RetentionPoint};
use crate::report::MetricsReport;
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

const BRAND_GREEN: RGBColor = RGBColor(0x1D, 0xB9, 0x54);
const FREE_GREY: RGBColor = RGBColor(0xBF, 0xBF, 0xBF);
const SKY: RGBColor = RGBColor(0x80, 0xDE, 0xEA);

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Chart".to_string(),
            x_label: String::new(),
            y_label: String::new(),
            width: 800,
            height: 450,
        }
    }
}

/// Monthly revenue as a line with point markers
///
/// # Returns
/// * A Result containing the PNG image data as bytes or an error
pub fn revenue_trend_chart(
    months: &[MonthlyRevenue],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let labels: Vec<String> = months.iter().map(|m| m.month.clone()).collect();
    let values: Vec<f64> = months.iter().map(|m| m.revenue).collect();
    render_png(options, |root| {
        category_line(root, &labels, &values, None, &BRAND_GREEN, options)
    })
}

/// Step-over-step conversion, y axis fixed at 0..105
pub fn funnel_chart(
    steps: &[FunnelStep],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let labels: Vec<String> = steps.iter().map(|s| s.step.clone()).collect();
    let values: Vec<f64> = steps.iter().map(|s| s.conversion_pct).collect();
    render_png(options, |root| {
        category_line(root, &labels, &values, Some(105.0), &BRAND_GREEN, options)
    })
}

pub fn retention_chart(
    points: &[RetentionPoint],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let labels: Vec<String> = points.iter().map(|p| p.date.format("%m-%d").to_string()).collect();
    let values: Vec<f64> = points.iter().map(|p| p.ratio).collect();
    render_png(options, |root| {
        category_line(root, &labels, &values, Some(105.0), &SKY, options)
    })
}

/// Distinct users per plan as bars, Premium in brand green and the rest in grey
pub fn plan_users_chart(
    users: &[PlanUsers],
    options: &ChartOptions,
) -> Result<Vec<u8>, Box<dyn Error>> {
    render_png(options, |root| {
        let n = users.len().max(1);
        let top = users.iter().map(|u| u.users).max().unwrap_or(0) as f64 * 1.15;
        let labels: Vec<String> = users.iter().map(|u| u.plan.clone()).collect();
        let formatter = |x: &f64| category_label(&labels, *x);

        let mut chart = ChartBuilder::on(root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..top.max(1.0))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&formatter)
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(users.iter().enumerate().map(|(i, u)| {
            let color = if u.plan.contains("Premium") {
                BRAND_GREEN
            } else {
                FREE_GREY
            };
            let x = i as f64;
            Rectangle::new([(x - 0.3, 0.0), (x + 0.3, u.users as f64)], color.filled())
        }))?;

        Ok(())
    })
}

/// Renders the four dashboard charts of a report into `dir`
///
/// Files are named `revenue_by_month.png`, `active_users_by_plan.png`,
/// `funnel.png` and `retention_proxy.png`. The directory is created when
/// missing. Returns the written paths in that order.
pub fn write_report_charts(report: &MetricsReport, dir: &Path) -> crate::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let titled = |title: &str, x: &str, y: &str| ChartOptions {
        title: title.to_string(),
        x_label: x.to_string(),
        y_label: y.to_string(),
        ..ChartOptions::default()
    };
    let month = report.active_month.as_deref().unwrap_or("-");

    let charts = [
        (
            "revenue_by_month",
            revenue_trend_chart(
                &report.revenue_by_month,
                &titled("Monthly revenue", "Month", "Revenue"),
            ),
        ),
        (
            "active_users_by_plan",
            plan_users_chart(
                &report.active_users_by_plan,
                &titled(&format!("Active users by plan ({})", month), "Plan", "Users"),
            ),
        ),
        (
            "funnel",
            funnel_chart(&report.funnel, &titled("Funnel conversion", "Step", "Conversion (%)")),
        ),
        (
            "retention_proxy",
            retention_chart(
                &report.retention_proxy,
                &titled("Retention proxy (not cohort retention)", "Date", "Ratio (%)"),
            ),
        ),
    ];

    let mut written = Vec::with_capacity(charts.len());
    for (name, png) in charts {
        let png = png.map_err(|e| crate::Error::Chart(format!("{}: {}", name, e)))?;
        let path = dir.join(format!("{}.png", name));
        std::fs::write(&path, png)?;
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() < 1e-6 && i >= 0.0 {
        labels.get(i as usize).cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

fn category_line(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    labels: &[String],
    values: &[f64],
    y_max: Option<f64>,
    color: &RGBColor,
    options: &ChartOptions,
) -> Result<(), Box<dyn Error>> {
    let n = values.len().max(1);
    let top = y_max
        .unwrap_or_else(|| values.iter().cloned().fold(0.0, f64::max) * 1.15)
        .max(1.0);
    let formatter = |x: &f64| category_label(labels, *x);

    let mut chart = ChartBuilder::on(root)
        .caption(&options.title, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..top)?;

    chart
        .configure_mesh()
        .x_labels(n.min(12))
        .x_label_formatter(&formatter)
        .x_desc(&options.x_label)
        .y_desc(&options.y_label)
        .draw()?;

    chart.draw_series(LineSeries::new(
        values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
        color,
    ))?;
    chart.draw_series(
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Circle::new((i as f64, v), 3, color.filled())),
    )?;

    Ok(())
}

/// Draws into a temporary PNG file and reads the bytes back
fn render_png<F>(options: &ChartOptions, draw: F) -> Result<Vec<u8>, Box<dyn Error>>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), Box<dyn Error>>,
{
    let file = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let root =
            BitMapBackend::new(file.path(), (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }

    let mut buffer = Vec::new();
    std::fs::File::open(file.path())?.read_to_end(&mut buffer)?;
    Ok(buffer)
}
