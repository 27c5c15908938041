//! Synthetic behaviour log shown on the AARRR dashboard.
//!
//! The sample is regenerated from a fixed seed on every run, so two runs
//! with the same seed always produce the same log.

use crate::error::{Error, Result};
use crate::events::{Channel, Event, EventLog};
use crate::schema::FUNNEL_STEPS;
use chrono::{Duration, NaiveDate};
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Gamma;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_ROWS: usize = 1000;
pub const DEFAULT_DAYS: i64 = 60;

const CHANNEL_WEIGHTS: [f64; 3] = [0.45, 0.35, 0.20];
const EVENT_WEIGHTS: [f64; 4] = [0.45, 0.25, 0.20, 0.10];
const AMOUNT_SHAPE: f64 = 2.2;
const AMOUNT_SCALE: f64 = 6.0;

/// Shape of the generated sample
#[derive(Clone, Debug, PartialEq)]
pub struct DemoOptions {
    pub seed: u64,
    pub rows: usize,
    pub start: NaiveDate,
    pub days: i64,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            rows: DEFAULT_ROWS,
            start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            days: DEFAULT_DAYS,
        }
    }
}

/// The dashboard's sample log: 1000 events over 60 days from 2025-01-01
pub fn demo_event_log(seed: u64) -> Result<EventLog> {
    generate_event_log(&DemoOptions {
        seed,
        ..DemoOptions::default()
    })
}

pub fn generate_event_log(options: &DemoOptions) -> Result<EventLog> {
    if options.days < 1 {
        return Err(Error::InvalidParameter(format!(
            "demo log needs at least one day, got {}",
            options.days
        )));
    }
    let last_day = Duration::try_days(options.days - 1)
        .and_then(|span| options.start.checked_add_signed(span));
    if last_day.is_none() {
        return Err(Error::InvalidParameter(format!(
            "demo log of {} days from {} runs past the calendar",
            options.days, options.start
        )));
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let channels = WeightedIndex::new(CHANNEL_WEIGHTS)
        .map_err(|e| Error::InvalidParameter(format!("channel weights: {}", e)))?;
    let stages = WeightedIndex::new(EVENT_WEIGHTS)
        .map_err(|e| Error::InvalidParameter(format!("event weights: {}", e)))?;
    let amounts = Gamma::new(AMOUNT_SHAPE, AMOUNT_SCALE)
        .map_err(|e| Error::InvalidParameter(format!("amount distribution: {}", e)))?;

    let events: Vec<Event> = (0..options.rows)
        .map(|_| {
            let date = options.start + Duration::days(rng.gen_range(0..options.days));
            let channel = Channel::ALL[channels.sample(&mut rng)];
            let event = FUNNEL_STEPS[stages.sample(&mut rng)].to_string();
            let amount = (amounts.sample(&mut rng) * 100.0).round() / 100.0;
            Event {
                date,
                channel,
                event,
                amount,
            }
        })
        .collect();

    debug!("demo log: {} events, seed {}", events.len(), options.seed);
    Ok(EventLog::new(events))
}
