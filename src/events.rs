use crate::error::{Error, Result};
use crate::schema;
use crate::table::{Table, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Acquisition channel of an event
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    #[serde(rename = "SNS")]
    Sns,
    Search,
    Ad,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Sns, Channel::Search, Channel::Ad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sns => "SNS",
            Channel::Search => "Search",
            Channel::Ad => "Ad",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SNS" => Ok(Channel::Sns),
            "SEARCH" => Ok(Channel::Search),
            "AD" => Ok(Channel::Ad),
            _ => Err(s.to_string()),
        }
    }
}

/// One row of the behaviour log
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Event {
    pub date: NaiveDate,
    pub channel: Channel,
    /// Funnel stage label such as `visit` or `subscribe`
    pub event: String,
    pub amount: f64,
}

/// Date-stamped funnel events; no uniqueness constraint between rows
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new(events: Vec<Event>) -> Self {
        EventLog { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.events.iter().map(|e| e.date).max()
    }

    /// Converts a loaded sheet into a typed log
    ///
    /// Every cell of the four event columns must be present and well typed:
    /// dates as `YYYY-MM-DD` text (a trailing time part is ignored), a known
    /// channel, a non-empty stage label and a finite non-negative amount.
    pub fn from_table(table: &Table) -> Result<Self> {
        schema::require_columns(table, &schema::EVENT_LOG_COLUMNS)?;

        let mut events = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let date = parse_date(cell_at(table, row, schema::DATE))
                .ok_or_else(|| Error::type_mismatch(schema::DATE, cell_at(table, row, schema::DATE)))?;

            let channel = match cell_at(table, row, schema::CHANNEL) {
                Value::Text(s) => s
                    .parse::<Channel>()
                    .map_err(|bad| Error::type_mismatch(schema::CHANNEL, bad))?,
                other => return Err(Error::type_mismatch(schema::CHANNEL, other)),
            };

            let event = match cell_at(table, row, schema::EVENT) {
                Value::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
                other => return Err(Error::type_mismatch(schema::EVENT, other)),
            };

            let amount = match cell_at(table, row, schema::AMOUNT) {
                Value::Number(n) if n.is_finite() && *n >= 0.0 => *n,
                other => return Err(Error::type_mismatch(schema::AMOUNT, other)),
            };

            events.push(Event {
                date,
                channel,
                event,
                amount,
            });
        }

        Ok(EventLog { events })
    }

    /// Flattens the log back into a sheet with the standard event columns
    pub fn to_table(&self) -> Result<Table> {
        Table::from_rows(
            schema::EVENT_LOG_COLUMNS,
            self.events.iter().map(|e| {
                vec![
                    Value::from(e.date.format("%Y-%m-%d").to_string()),
                    Value::from(e.channel.as_str()),
                    Value::from(e.event.as_str()),
                    Value::from(e.amount),
                ]
            }),
        )
    }
}

fn cell_at<'a>(table: &'a Table, row: usize, column: &str) -> &'a Value {
    table.get(row, column).unwrap_or(&Value::Null)
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Text(s) => {
            let s = s.trim();
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}
