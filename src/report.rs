use crate::config::DashboardConfig;
use crate::error::Result;
use crate::events::EventLog;
use crate::metrics::{
    self, DatasetOverview, FunnelStep, LtvSnapshot, MissingCount, MonthlyRevenue, PlanShare,
    PlanUsers, RetentionPoint,
};
use crate::schema::PLAN_ORDER;
use crate::table::Table;
use serde::Serialize;
use std::fmt::Write as _;

/// Rows of the dataset preview
pub const PREVIEW_ROWS: usize = 5;

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct PlanShareRow {
    pub plan: String,
    #[serde(flatten)]
    pub share: PlanShare,
}

/// Every figure the dashboard shows, in display order
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MetricsReport {
    pub overview: DatasetOverview,
    pub preview: Table,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    /// Free before Premium, then any other plan
    pub plan_revenue_share: Vec<PlanShareRow>,
    /// Month the plan mix was computed for; `None` on an empty dataset
    pub active_month: Option<String>,
    pub active_users_by_plan: Vec<PlanUsers>,
    pub missing_values: Vec<MissingCount>,
    pub funnel: Vec<FunnelStep>,
    pub retention_proxy: Vec<RetentionPoint>,
    pub ltv: LtvSnapshot,
}

impl MetricsReport {
    pub fn build(dataset: &Table, log: &EventLog, config: &DashboardConfig) -> Result<Self> {
        let active_month = match &config.month {
            Some(month) => Some(month.clone()),
            None => metrics::latest_month(dataset)?,
        };
        let active_users_by_plan = match &active_month {
            Some(month) => metrics::active_users_by_plan(dataset, month)?,
            None => Vec::new(),
        };

        let plan_revenue_share = metrics::plan_revenue_share(dataset)?
            .in_order(&PLAN_ORDER)
            .into_iter()
            .map(|(plan, share)| PlanShareRow { plan, share })
            .collect();

        Ok(MetricsReport {
            overview: metrics::dataset_overview(dataset)?,
            preview: dataset.head(PREVIEW_ROWS),
            revenue_by_month: metrics::revenue_by_month(dataset)?,
            plan_revenue_share,
            active_month,
            active_users_by_plan,
            missing_values: metrics::missing_value_summary(dataset, config.top_n),
            funnel: metrics::funnel_conversion(log, &config.funnel_steps),
            retention_proxy: metrics::retention_proxy(log, config.window_days)?,
            ltv: metrics::ltv_snapshot(log, config.lookback_days),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain text rendering for terminals
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let o = &self.overview;

        let _ = writeln!(out, "== Dataset");
        let _ = writeln!(
            out,
            "{} rows x {} columns, {} users, {} ~ {}",
            o.rows,
            o.columns,
            o.distinct_users,
            o.first_month.as_deref().unwrap_or("-"),
            o.last_month.as_deref().unwrap_or("-")
        );

        let _ = writeln!(out, "\n== Monthly revenue");
        for m in &self.revenue_by_month {
            let _ = writeln!(out, "{:<10} {:>16.0}", m.month, m.revenue);
        }

        let _ = writeln!(out, "\n== Revenue share by plan");
        for row in &self.plan_revenue_share {
            let pct = match row.share.percentage {
                Some(p) => format!("{:.1}%", p),
                None => "n/a".to_string(),
            };
            let _ = writeln!(out, "{:<30} {:>16.0} {:>7}", row.plan, row.share.revenue, pct);
        }

        let _ = writeln!(
            out,
            "\n== Active users by plan ({})",
            self.active_month.as_deref().unwrap_or("-")
        );
        for p in &self.active_users_by_plan {
            let _ = writeln!(out, "{:<30} {:>8}", p.plan, p.users);
        }

        let _ = writeln!(out, "\n== Missing values");
        if self.missing_values.is_empty() {
            let _ = writeln!(out, "no missing data");
        }
        for m in &self.missing_values {
            let _ = writeln!(out, "{:<30} {:>8}", m.column, m.missing);
        }

        let _ = writeln!(out, "\n== Funnel");
        for s in &self.funnel {
            let _ = writeln!(out, "{:<12} {:>6} {:>6.1}%", s.step, s.count, s.conversion_pct);
        }

        let _ = writeln!(out, "\n== Retention proxy (rolling activity ratio, not cohort retention)");
        for p in &self.retention_proxy {
            let _ = writeln!(out, "{} {:>6.1}", p.date, p.ratio);
        }

        let _ = writeln!(out, "\n== LTV snapshot (illustrative)");
        let _ = writeln!(out, "revenue ${:.0}", self.ltv.total_revenue);
        let _ = writeln!(
            out,
            "arpu    ${:.2} (over surrogate active count {})",
            self.ltv.arpu, self.ltv.active_surrogate
        );
        out
    }
}
