use chrono::NaiveDate;
use std::path::PathBuf;
use stay_or_skip::config::DEFAULT_DATA_PATH;
use stay_or_skip::schema::{PLAN_FREE, PLAN_PREMIUM};
use stay_or_skip::{
    Channel, DashboardConfig, Error, Event, EventLog, MetricsReport, OutputFormat, Table, Value,
    demo_event_log, report_to_csv, report_to_xlsx,
};

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn dataset() -> Table {
    let row = |user: i64, month: &str, revenue: f64, plan: &str| {
        vec![
            Value::from(user),
            Value::from(month),
            Value::from(revenue),
            Value::from(plan),
        ]
    };
    Table::from_rows(
        ["userid", "month", "revenue", "subscription_plan"],
        vec![
            row(1, "2023-05", 10990.0, PLAN_PREMIUM),
            row(2, "2023-05", 0.0, PLAN_FREE),
            row(1, "2023-06", 10990.0, PLAN_PREMIUM),
            row(2, "2023-06", 0.0, PLAN_FREE),
            row(3, "2023-06", 0.0, PLAN_FREE),
        ],
    )
    .unwrap()
}

fn funnel_log() -> EventLog {
    let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let mut events = Vec::new();
    for (stage, n) in [("visit", 10), ("signup", 5), ("first_play", 2), ("subscribe", 1)] {
        for _ in 0..n {
            events.push(Event {
                date,
                channel: Channel::Search,
                event: stage.to_string(),
                amount: 2.0,
            });
        }
    }
    EventLog::new(events)
}

#[test]
fn default_config_matches_the_dashboard() {
    let config = DashboardConfig::default();
    assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    assert_eq!(config.top_n, 5);
    assert_eq!(config.window_days, 7);
    assert_eq!(config.lookback_days, 30);
    assert_eq!(config.seed, 42);
    assert_eq!(config.funnel_steps, args(&["visit", "signup", "first_play", "subscribe"]));
    assert_eq!(config.output, OutputFormat::Text);
}

#[test]
fn flags_override_the_environment() {
    let from_env = DashboardConfig::from_sources(&[], Some("env.csv".to_string())).unwrap();
    assert_eq!(from_env.data_path, PathBuf::from("env.csv"));

    let config = DashboardConfig::from_sources(
        &args(&[
            "--data", "flag.xlsx", "--month", "2023-03", "--top", "3", "--window", "14",
            "--lookback", "7", "--steps", "visit, subscribe", "--seed", "9", "--json", "--xlsx",
            "out.xlsx", "--charts", "charts",
        ]),
        Some("env.csv".to_string()),
    )
    .unwrap();

    assert_eq!(config.data_path, PathBuf::from("flag.xlsx"));
    assert_eq!(config.month.as_deref(), Some("2023-03"));
    assert_eq!(config.top_n, 3);
    assert_eq!(config.window_days, 14);
    assert_eq!(config.lookback_days, 7);
    assert_eq!(config.funnel_steps, args(&["visit", "subscribe"]));
    assert_eq!(config.seed, 9);
    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.xlsx_out, Some(PathBuf::from("out.xlsx")));
    assert_eq!(config.csv_out, None);
    assert_eq!(config.charts_dir, Some(PathBuf::from("charts")));
}

#[test]
fn bad_flags_are_config_errors() {
    let bad = [
        vec!["--top", "many"],
        vec!["--window", "0"],
        vec!["--seed"],
        vec!["--steps", " , "],
        vec!["--verbose"],
        vec!["--charts"],
    ];
    for raw in bad {
        assert!(
            matches!(
                DashboardConfig::from_sources(&args(&raw), None),
                Err(Error::Config(_))
            ),
            "{:?} should be rejected",
            raw
        );
    }
}

#[test]
fn report_defaults_to_the_latest_month() {
    let report = MetricsReport::build(&dataset(), &funnel_log(), &DashboardConfig::default()).unwrap();

    assert_eq!(report.overview.rows, 5);
    assert_eq!(report.overview.distinct_users, 3);
    assert_eq!(report.preview.len(), 5);
    assert_eq!(report.active_month.as_deref(), Some("2023-06"));
    assert_eq!(report.active_users_by_plan[0].plan, PLAN_FREE);
    assert_eq!(report.active_users_by_plan[0].users, 2);

    let plans: Vec<&str> = report.plan_revenue_share.iter().map(|p| p.plan.as_str()).collect();
    assert_eq!(plans, vec![PLAN_FREE, PLAN_PREMIUM]);
    assert_eq!(report.plan_revenue_share[1].share.percentage, Some(100.0));

    assert_eq!(report.funnel[3].conversion_pct, 50.0);
    assert_eq!(report.retention_proxy.len(), 1);
    assert_eq!(report.ltv.total_revenue, 36.0);
    assert_eq!(report.ltv.active_surrogate, 400);
    assert!(report.missing_values.is_empty());
}

#[test]
fn report_month_can_be_pinned() {
    let config = DashboardConfig {
        month: Some("2023-05".to_string()),
        ..DashboardConfig::default()
    };
    let report = MetricsReport::build(&dataset(), &funnel_log(), &config).unwrap();
    let total: usize = report.active_users_by_plan.iter().map(|p| p.users).sum();
    assert_eq!(total, 2);
}

#[test]
fn huge_lookback_from_flags_spans_the_whole_log() {
    let config = DashboardConfig::from_sources(&args(&["--lookback", "4000000000"]), None).unwrap();
    assert_eq!(config.lookback_days, 4_000_000_000);

    let report = MetricsReport::build(&dataset(), &funnel_log(), &config).unwrap();
    assert_eq!(report.ltv.total_revenue, 36.0);
}

#[test]
fn report_over_an_empty_dataset() {
    let empty = Table::new(["userid", "month", "revenue", "subscription_plan"]);
    let report = MetricsReport::build(&empty, &EventLog::default(), &DashboardConfig::default()).unwrap();

    assert_eq!(report.active_month, None);
    assert!(report.active_users_by_plan.is_empty());
    assert!(report.revenue_by_month.is_empty());
    assert!(report.plan_revenue_share.is_empty());
    assert!(report.funnel.iter().all(|s| s.count == 0));
    assert_eq!(report.ltv.active_surrogate, 1);
}

#[test]
fn report_renders_as_json_and_text() {
    let report = MetricsReport::build(&dataset(), &funnel_log(), &DashboardConfig::default()).unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["funnel"][0]["conversion_pct"], 100.0);
    assert_eq!(json["revenue_by_month"][1]["month"], "2023-06");
    assert_eq!(json["plan_revenue_share"][0]["plan"], PLAN_FREE);
    assert_eq!(json["plan_revenue_share"][0]["percentage"], 0.0);
    assert_eq!(json["preview"]["columns"][0], "userid");

    let text = report.to_text();
    assert!(text.contains("== Funnel"));
    assert!(text.contains("no missing data"));
    assert!(text.contains("not cohort retention"));
}

#[test]
fn report_exports_to_csv_and_xlsx() {
    let report = MetricsReport::build(&dataset(), &funnel_log(), &DashboardConfig::default()).unwrap();

    let csv = report_to_csv(&report);
    assert!(csv.contains("# funnel\nstep,count,conversion_pct\nvisit,10,100\nsignup,5,50\n"));
    assert!(csv.contains("# revenue_by_month\nmonth,revenue\n2023-05,10990\n"));
    assert!(csv.contains("\nFree (ad-supported),0,0\n"));

    let xlsx = report_to_xlsx(&report).unwrap();
    assert!(xlsx.starts_with(b"PK"), "xlsx output should be a zip archive");
}

#[test]
fn demo_report_builds_end_to_end() {
    let log = demo_event_log(42).unwrap();
    let report = MetricsReport::build(&dataset(), &log, &DashboardConfig::default()).unwrap();

    assert_eq!(report.funnel.len(), 4);
    assert_eq!(report.funnel[0].conversion_pct, 100.0);
    assert_eq!(report.funnel.iter().map(|s| s.count).sum::<usize>(), 1000);
    assert!(report.retention_proxy.iter().take(6).all(|p| p.ratio == 0.0));
    assert!(report.retention_proxy.iter().all(|p| p.ratio >= 0.0 && p.ratio <= 100.0));
}
