/*!
# Stay or Skip

Descriptive metrics for a Spotify-style subscription dataset, built in Rust.

## Overview

The dashboard this crate backs answers a handful of questions about a
merged user-behaviour and revenue spreadsheet (one row per user per month)
and about a synthetic behaviour log: how revenue moves month to month, how
it splits between the Free and Premium plans, how many distinct users each
plan has in a month, where the data has holes, and how visitors convert
through the visit → signup → first_play → subscribe funnel.

## Architecture

### Data Layer
- **loader**: spreadsheet ingestion (CSV, XLSX) into an in-memory [`Table`]
- **cache**: [`DatasetCache`], read the source file once per process
- **events**: typed [`EventLog`] rows (date, channel, event, amount)
- **demo**: the seeded synthetic event log

### Metrics Layer
- **metrics**: pure aggregations with no I/O and no hidden state
  - revenue by month, plan revenue share, active users by plan
  - missing value summary
  - funnel conversion, retention proxy, LTV snapshot

### Output Layer
- **report**: every metric bundled into one serialisable [`MetricsReport`]
- **downloader**: CSV and XLSX export of a report
- **graph** (feature `charts`): PNG charts rendered with plotters

## Caveats

The retention proxy is a rolling activity ratio, not cohort retention, and
the LTV snapshot divides by a surrogate active count because the event log
carries no user id. Both are labelled as such wherever they are shown.
*/

pub mod cache;
pub mod config;
pub mod demo;
pub mod downloader;
pub mod error;
pub mod events;
#[cfg(feature = "charts")]
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod schema;
pub mod table;

/// Re-export the everyday types so callers need a single import
pub use cache::DatasetCache;
pub use config::{DashboardConfig, OutputFormat};
pub use demo::demo_event_log;
pub use downloader::{report_to_csv, report_to_xlsx};
pub use error::{Error, Result};
pub use events::{Channel, Event, EventLog};
pub use metrics::*;
pub use report::MetricsReport;
pub use table::{Table, Value};
