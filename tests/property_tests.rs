//! Property-based tests for the metrics layer
//!
//! Random subscription tables and event logs are generated to check the
//! invariants the dashboard relies on.

use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeSet;
use stay_or_skip::schema::{FUNNEL_STEPS, PLAN_FREE, PLAN_PREMIUM};
use stay_or_skip::{
    Channel, Event, EventLog, Table, Value, active_users_by_plan, funnel_conversion,
    missing_value_summary, plan_revenue_share, retention_proxy, revenue_by_month,
};

/// (userid, month index, revenue, premium?, genre present?)
type Row = (u8, u8, u32, bool, bool);

fn arbitrary_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (0u8..30, 1u8..7, 0u32..20_000, any::<bool>(), any::<bool>()),
        0..80,
    )
}

fn to_table(rows: &[Row]) -> Table {
    Table::from_rows(
        ["userid", "month", "revenue", "subscription_plan", "fav_music_genre"],
        rows.iter().map(|&(user, month, revenue, premium, genre)| {
            vec![
                Value::from(user as i64),
                Value::from(format!("2023-{:02}", month)),
                Value::from(revenue as f64),
                Value::from(if premium { PLAN_PREMIUM } else { PLAN_FREE }),
                Value::from(if genre { Some("Pop") } else { None }),
            ]
        }),
    )
    .unwrap()
}

fn arbitrary_log() -> impl Strategy<Value = EventLog> {
    prop::collection::vec((1u32..28, 0usize..4, 0u32..5000), 0..200).prop_map(|rows| {
        EventLog::new(
            rows.into_iter()
                .map(|(d, stage, cents)| Event {
                    date: NaiveDate::from_ymd_opt(2025, 1, d).unwrap(),
                    channel: Channel::Ad,
                    event: FUNNEL_STEPS[stage].to_string(),
                    amount: cents as f64 / 100.0,
                })
                .collect(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: grouping by month never loses or invents revenue
    #[test]
    fn monthly_revenue_preserves_the_total(rows in arbitrary_rows()) {
        let table = to_table(&rows);
        let grouped: f64 = revenue_by_month(&table).unwrap().iter().map(|m| m.revenue).sum();
        let direct: f64 = rows.iter().map(|r| r.2 as f64).sum();
        prop_assert!((grouped - direct).abs() < 1e-6);
    }

    /// Property: plan shares add up to 100 within rounding when revenue exists
    #[test]
    fn plan_shares_sum_to_one_hundred(rows in arbitrary_rows()) {
        let shares = plan_revenue_share(&to_table(&rows)).unwrap();
        if shares.total_revenue() > 0.0 {
            let sum: f64 = shares.shares.values().map(|s| s.percentage.unwrap()).sum();
            prop_assert!((sum - 100.0).abs() <= 0.1 + 1e-9, "sum was {}", sum);
        } else {
            prop_assert!(shares.shares.values().all(|s| s.percentage.is_none()));
        }
    }

    /// Property: no plan has more active users than the month itself
    #[test]
    fn active_users_bounded_by_month_users(rows in arbitrary_rows(), month in 1u8..8) {
        let label = format!("2023-{:02}", month);
        let users = active_users_by_plan(&to_table(&rows), &label).unwrap();
        let distinct: BTreeSet<u8> = rows.iter().filter(|r| r.1 == month).map(|r| r.0).collect();

        for pair in users.windows(2) {
            prop_assert!(pair[0].users >= pair[1].users);
        }
        for plan in &users {
            prop_assert!(plan.users <= distinct.len());
        }
        if distinct.is_empty() {
            prop_assert!(users.is_empty());
        }
    }

    /// Property: the missing summary never lists a complete column
    #[test]
    fn missing_summary_has_no_zero_counts(rows in arbitrary_rows(), top in 0usize..6) {
        let summary = missing_value_summary(&to_table(&rows), top);
        prop_assert!(summary.len() <= top);
        prop_assert!(summary.iter().all(|m| m.missing > 0));
    }

    /// Property: the first funnel step is always the 100 percent baseline
    #[test]
    fn funnel_baseline_is_one_hundred(log in arbitrary_log()) {
        let funnel = funnel_conversion(&log, &FUNNEL_STEPS);
        prop_assert_eq!(funnel[0].conversion_pct, 100.0);
        prop_assert_eq!(funnel.iter().map(|s| s.count).sum::<usize>(), log.len());
    }

    /// Property: the retention proxy stays within 0..100 and is repeatable
    #[test]
    fn retention_ratio_is_bounded_and_repeatable(log in arbitrary_log(), window in 1usize..10) {
        let first = retention_proxy(&log, window).unwrap();
        let second = retention_proxy(&log, window).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.iter().all(|p| p.ratio >= 0.0 && p.ratio <= 100.0));
        prop_assert!(first.windows(2).all(|w| w[0].date < w[1].date));
    }
}
