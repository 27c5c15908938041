//! Column names and category labels shared by the loader and the metrics.
//!
//! The merged Spotify dataset has one row per user per month. Only the
//! columns listed here are read by the metrics; any other column is carried
//! along untouched and only shows up in the missing-value summary.

use crate::error::{Error, Result};
use crate::table::Table;

/// User identifier, repeats once per month
pub const USER_ID: &str = "userid";
/// Period label such as `2023-01`
pub const MONTH: &str = "month";
/// Monthly revenue attributed to the user
pub const REVENUE: &str = "revenue";
/// Subscription plan label, see [`PLAN_FREE`] and [`PLAN_PREMIUM`]
pub const SUBSCRIPTION_PLAN: &str = "subscription_plan";

/// Columns every dataset handed to the metrics must carry
pub const DATASET_COLUMNS: [&str; 4] = [USER_ID, MONTH, REVENUE, SUBSCRIPTION_PLAN];

pub const PLAN_FREE: &str = "Free (ad-supported)";
pub const PLAN_PREMIUM: &str = "Premium (paid subscription)";

/// Display order for plan charts: Free before Premium
pub const PLAN_ORDER: [&str; 2] = [PLAN_FREE, PLAN_PREMIUM];

// Event log columns
pub const DATE: &str = "date";
pub const CHANNEL: &str = "channel";
pub const EVENT: &str = "event";
pub const AMOUNT: &str = "amount";

pub const EVENT_LOG_COLUMNS: [&str; 4] = [DATE, CHANNEL, EVENT, AMOUNT];

/// Funnel stages in the order the dashboard reports them
pub const FUNNEL_STEPS: [&str; 4] = ["visit", "signup", "first_play", "subscribe"];

/// Checks that every named column is present, reporting the first one that is not
pub fn require_columns(table: &Table, columns: &[&str]) -> Result<()> {
    for column in columns {
        if table.column_index(column).is_none() {
            return Err(Error::missing_column(column));
        }
    }
    Ok(())
}
