//! Aggregate metrics over the subscription dataset and the event log.
//!
//! Every function here is a pure computation over borrowed input: no I/O,
//! no hidden state, and the same input always yields the same output.
//! Missing cells are skipped by the aggregations (they are what
//! [`missing_value_summary`] reports); cells of the wrong type fail with
//! [`Error::TypeMismatch`].

use crate::error::{Error, Result};
use crate::events::EventLog;
use crate::schema;
use crate::table::{Table, Value};
use chrono::{Duration, NaiveDate};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Added to the rolling maximum so an all-zero window never divides by zero
pub const RETENTION_EPSILON: f64 = 1e-9;

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct PlanShare {
    pub revenue: f64,
    /// Share of total revenue in percent, one decimal; `None` when the total is zero
    pub percentage: Option<f64>,
}

/// Revenue per plan label, keyed alphabetically
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
pub struct PlanShares {
    pub shares: BTreeMap<String, PlanShare>,
}

impl PlanShares {
    pub fn get(&self, plan: &str) -> Option<&PlanShare> {
        self.shares.get(plan)
    }

    pub fn total_revenue(&self) -> f64 {
        self.shares.values().map(|s| s.revenue).sum()
    }

    /// Lists the plans in the caller's preferred order
    ///
    /// Plans named in `order` come first, in that order; any plan not named
    /// follows alphabetically. Names in `order` absent from the data are skipped.
    pub fn in_order(&self, order: &[&str]) -> Vec<(String, PlanShare)> {
        let mut out: Vec<(String, PlanShare)> = order
            .iter()
            .filter_map(|plan| self.shares.get(*plan).map(|s| (plan.to_string(), s.clone())))
            .collect();
        for (plan, share) in &self.shares {
            if !order.contains(&plan.as_str()) {
                out.push((plan.clone(), share.clone()));
            }
        }
        out
    }
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct PlanUsers {
    pub plan: String,
    pub users: usize,
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct FunnelStep {
    pub step: String,
    pub count: usize,
    /// Conversion from the previous step in percent; the first step is 100 by convention
    pub conversion_pct: f64,
}

/// Daily activity smoothness, a stand-in for real retention
///
/// This is not cohort retention: it is the rolling mean of daily event
/// counts over their rolling maximum, in percent.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct RetentionPoint {
    pub date: NaiveDate,
    pub ratio: f64,
}

/// Revenue over a trailing window and the ARPU derived from it
///
/// `active_surrogate` is not a user count. The event log has no user id,
/// so it is the number of distinct event stages seen in the window times
/// 100, floored at 1. Treat `arpu` as illustrative only.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct LtvSnapshot {
    pub total_revenue: f64,
    pub active_surrogate: usize,
    pub arpu: f64,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    pub distinct_users: usize,
    pub first_month: Option<String>,
    pub last_month: Option<String>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Labels of a categorical column, `None` for missing cells
fn labels(table: &Table, column: &str) -> Result<Vec<Option<String>>> {
    Ok(table.column(column)?.map(Value::label).collect())
}

/// Sums revenue per month, months ascending
///
/// Months with no rows are absent rather than zero. Rows with a missing
/// month are skipped; a missing revenue cell adds nothing.
pub fn revenue_by_month(dataset: &Table) -> Result<Vec<MonthlyRevenue>> {
    let months = labels(dataset, schema::MONTH)?;
    let revenue = dataset.numbers(schema::REVENUE)?;

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (month, amount) in months.into_iter().zip(revenue) {
        if let Some(month) = month {
            *totals.entry(month).or_insert(0.0) += amount.unwrap_or(0.0);
        }
    }

    debug!("revenue_by_month: {} months", totals.len());
    Ok(totals
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect())
}

/// Revenue per subscription plan and its share of the total
pub fn plan_revenue_share(dataset: &Table) -> Result<PlanShares> {
    let plans = labels(dataset, schema::SUBSCRIPTION_PLAN)?;
    let revenue = dataset.numbers(schema::REVENUE)?;

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (plan, amount) in plans.into_iter().zip(revenue) {
        if let Some(plan) = plan {
            *sums.entry(plan).or_insert(0.0) += amount.unwrap_or(0.0);
        }
    }

    let total: f64 = sums.values().sum();
    let shares = sums
        .into_iter()
        .map(|(plan, revenue)| {
            let percentage = if total > 0.0 {
                Some(round1(revenue / total * 100.0))
            } else {
                None
            };
            (
                plan,
                PlanShare {
                    revenue,
                    percentage,
                },
            )
        })
        .collect();

    Ok(PlanShares { shares })
}

/// Distinct users per plan within one month
///
/// Sorted by user count descending, ties by plan label ascending. An
/// unknown month gives an empty result.
pub fn active_users_by_plan(dataset: &Table, month: &str) -> Result<Vec<PlanUsers>> {
    let months = labels(dataset, schema::MONTH)?;
    let plans = labels(dataset, schema::SUBSCRIPTION_PLAN)?;
    let users = labels(dataset, schema::USER_ID)?;

    let mut per_plan: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for ((m, plan), user) in months.into_iter().zip(plans).zip(users) {
        if m.as_deref() != Some(month) {
            continue;
        }
        if let Some(plan) = plan {
            let set = per_plan.entry(plan).or_default();
            if let Some(user) = user {
                set.insert(user);
            }
        }
    }

    let mut out: Vec<PlanUsers> = per_plan
        .into_iter()
        .map(|(plan, set)| PlanUsers {
            plan,
            users: set.len(),
        })
        .collect();
    // BTreeMap already yields plans ascending; the stable sort keeps that for ties
    out.sort_by(|a, b| b.users.cmp(&a.users));
    Ok(out)
}

/// Columns with at least one missing cell, most missing first, at most `top_n`
///
/// Equal counts keep the table's column order.
pub fn missing_value_summary(dataset: &Table, top_n: usize) -> Vec<MissingCount> {
    let mut counts: Vec<MissingCount> = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| MissingCount {
            column: column.clone(),
            missing: dataset.rows().iter().filter(|row| row[idx].is_null()).count(),
        })
        .filter(|c| c.missing > 0)
        .collect();

    counts.sort_by(|a, b| b.missing.cmp(&a.missing));
    counts.truncate(top_n);
    counts
}

/// Step-over-step funnel conversion for the caller's stage order
///
/// `conversion_pct[i] = round(count[i] / count[i-1] * 100, 1)`, or 0 when
/// the previous step has no events. The first step is always 100.
pub fn funnel_conversion<S: AsRef<str>>(log: &EventLog, steps: &[S]) -> Vec<FunnelStep> {
    let counts: Vec<usize> = steps
        .iter()
        .map(|step| {
            log.events()
                .iter()
                .filter(|e| e.event == step.as_ref())
                .count()
        })
        .collect();

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let conversion_pct = if i == 0 {
                100.0
            } else if counts[i - 1] > 0 {
                round1(counts[i] as f64 / counts[i - 1] as f64 * 100.0)
            } else {
                0.0
            };
            FunnelStep {
                step: step.as_ref().to_string(),
                count: counts[i],
                conversion_pct,
            }
        })
        .collect()
}

/// Rolling activity ratio per observed date
///
/// Counts events per date (only dates that occur, no calendar filling),
/// then divides the rolling mean by the rolling maximum over the last
/// `window_days` observations, current one included. The first
/// `window_days - 1` dates have no full window and report 0.
pub fn retention_proxy(log: &EventLog, window_days: usize) -> Result<Vec<RetentionPoint>> {
    if window_days == 0 {
        return Err(Error::InvalidParameter(
            "retention window must be at least one day".to_string(),
        ));
    }

    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for e in log.events() {
        *daily.entry(e.date).or_insert(0) += 1;
    }
    let counts: Vec<f64> = daily.values().map(|&c| c as f64).collect();

    let points = daily
        .keys()
        .enumerate()
        .map(|(i, &date)| {
            let ratio = if i + 1 >= window_days {
                let window = &counts[i + 1 - window_days..=i];
                let mean = window.iter().sum::<f64>() / window_days as f64;
                let max = window.iter().cloned().fold(f64::MIN, f64::max);
                let ratio = mean / (max + RETENTION_EPSILON) * 100.0;
                if ratio.is_finite() { ratio } else { 0.0 }
            } else {
                0.0
            };
            RetentionPoint { date, ratio }
        })
        .collect();

    Ok(points)
}

/// Revenue and surrogate ARPU over the last `lookback_days` of the log
///
/// The window is anchored on the latest date in the log and includes both
/// ends, so a 30 day lookback spans 31 calendar dates. See [`LtvSnapshot`]
/// for the meaning of the active surrogate.
pub fn ltv_snapshot(log: &EventLog, lookback_days: u32) -> LtvSnapshot {
    let Some(latest) = log.max_date() else {
        return LtvSnapshot {
            total_revenue: 0.0,
            active_surrogate: 1,
            arpu: 0.0,
        };
    };
    // A lookback reaching past the earliest representable date covers the whole log
    let cutoff = latest.checked_sub_signed(Duration::days(i64::from(lookback_days)));

    let mut total_revenue = 0.0;
    let mut stages: BTreeSet<&str> = BTreeSet::new();
    for e in log.events().iter().filter(|e| cutoff.is_none_or(|c| e.date >= c)) {
        total_revenue += e.amount;
        stages.insert(e.event.as_str());
    }

    let active_surrogate = (stages.len() * 100).max(1);
    LtvSnapshot {
        total_revenue,
        active_surrogate,
        arpu: total_revenue / active_surrogate as f64,
    }
}

/// The greatest month label present, used as the default reporting month
pub fn latest_month(dataset: &Table) -> Result<Option<String>> {
    Ok(labels(dataset, schema::MONTH)?.into_iter().flatten().max())
}

/// Shape of the dataset plus its user count and month range
pub fn dataset_overview(dataset: &Table) -> Result<DatasetOverview> {
    let users: BTreeSet<String> = labels(dataset, schema::USER_ID)?.into_iter().flatten().collect();
    let months: BTreeSet<String> = labels(dataset, schema::MONTH)?.into_iter().flatten().collect();

    Ok(DatasetOverview {
        rows: dataset.len(),
        columns: dataset.columns().len(),
        distinct_users: users.len(),
        first_month: months.first().cloned(),
        last_month: months.last().cloned(),
    })
}
