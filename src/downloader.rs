use crate::error::Result;
use crate::report::MetricsReport;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

/// Convert a report to CSV format
///
/// Each metric becomes its own block: a `# name` line, a header row and the
/// data rows, with a blank line between blocks. Cells containing commas,
/// quotes or newlines are quoted.
///
/// # Arguments
/// * `report` - Reference to the report to convert
///
/// # Returns
/// * `String` - CSV content
///
/// # Examples
/// ```no_run
/// use stay_or_skip::{DashboardConfig, MetricsReport, Table, demo_event_log, report_to_csv};
///
/// let dataset = Table::new(["userid", "month", "revenue", "subscription_plan"]);
/// let log = demo_event_log(42).unwrap();
/// let report = MetricsReport::build(&dataset, &log, &DashboardConfig::default()).unwrap();
/// println!("{}", report_to_csv(&report));
/// ```
pub fn report_to_csv(report: &MetricsReport) -> String {
    let mut csv_content = String::new();
    for (i, sheet) in sheets(report).iter().enumerate() {
        if i > 0 {
            csv_content.push('\n');
        }
        csv_content.push_str(&format!("# {}\n", sheet.name));
        push_csv_row(&mut csv_content, sheet.header.iter().map(|h| h.to_string()));
        for row in &sheet.rows {
            push_csv_row(&mut csv_content, row.iter().map(|c| c.to_string()));
        }
    }
    csv_content
}

/// Convert a report to XLSX format
///
/// One worksheet per metric, header row in bold, numbers written as
/// numbers. Undefined percentages are left blank.
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
pub fn report_to_xlsx(report: &MetricsReport) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for sheet in sheets(report) {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(sheet.name)?;

        for (c, title) in sheet.header.iter().enumerate() {
            worksheet.write_string_with_format(0, c as u16, *title, &bold)?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = (r + 1) as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s.as_str())?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, c, *n)?;
                    }
                    Cell::Blank => {}
                }
            }
        }
        workbook.push_worksheet(worksheet);
    }

    Ok(workbook.save_to_buffer()?)
}

enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Blank => Ok(()),
        }
    }
}

struct Sheet {
    name: &'static str,
    header: Vec<&'static str>,
    rows: Vec<Vec<Cell>>,
}

fn sheets(report: &MetricsReport) -> Vec<Sheet> {
    vec![
        Sheet {
            name: "revenue_by_month",
            header: vec!["month", "revenue"],
            rows: report
                .revenue_by_month
                .iter()
                .map(|m| vec![Cell::Text(m.month.clone()), Cell::Number(m.revenue)])
                .collect(),
        },
        Sheet {
            name: "plan_revenue_share",
            header: vec!["subscription_plan", "revenue", "percentage"],
            rows: report
                .plan_revenue_share
                .iter()
                .map(|p| {
                    vec![
                        Cell::Text(p.plan.clone()),
                        Cell::Number(p.share.revenue),
                        p.share.percentage.map(Cell::Number).unwrap_or(Cell::Blank),
                    ]
                })
                .collect(),
        },
        Sheet {
            name: "active_users_by_plan",
            header: vec!["subscription_plan", "users"],
            rows: report
                .active_users_by_plan
                .iter()
                .map(|p| vec![Cell::Text(p.plan.clone()), Cell::Number(p.users as f64)])
                .collect(),
        },
        Sheet {
            name: "missing_values",
            header: vec!["column", "missing"],
            rows: report
                .missing_values
                .iter()
                .map(|m| vec![Cell::Text(m.column.clone()), Cell::Number(m.missing as f64)])
                .collect(),
        },
        Sheet {
            name: "funnel",
            header: vec!["step", "count", "conversion_pct"],
            rows: report
                .funnel
                .iter()
                .map(|s| {
                    vec![
                        Cell::Text(s.step.clone()),
                        Cell::Number(s.count as f64),
                        Cell::Number(s.conversion_pct),
                    ]
                })
                .collect(),
        },
        Sheet {
            name: "retention_proxy",
            header: vec!["date", "ratio"],
            rows: report
                .retention_proxy
                .iter()
                .map(|p| vec![Cell::Text(p.date.to_string()), Cell::Number(p.ratio)])
                .collect(),
        },
        Sheet {
            name: "ltv",
            header: vec!["total_revenue", "active_surrogate", "arpu"],
            rows: vec![vec![
                Cell::Number(report.ltv.total_revenue),
                Cell::Number(report.ltv.active_surrogate as f64),
                Cell::Number(report.ltv.arpu),
            ]],
        },
    ]
}

fn push_csv_row(out: &mut String, cells: impl Iterator<Item = String>) {
    for (i, value) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        // Handle value - escape commas, quotes, newlines as needed
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            let escaped = value.replace('"', "\"\"");
            out.push_str(&format!("\"{}\"", escaped));
        } else {
            out.push_str(&value);
        }
    }
    out.push('\n');
}
