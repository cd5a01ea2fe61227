//! Per-request date decoding.
//!
//! A `DateDecodeStrategy` travels with each `RequestConfig`. While a response
//! is decoded the strategy is installed in a thread-local scope, and every
//! [`Timestamp`] inside the target type reads it from there. Decoding is
//! synchronous, so the scope never spans an `.await` and concurrent requests
//! with different strategies cannot observe each other's setting.

use std::cell::RefCell;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const REFERENCE_DATE_OFFSET_SECS: f64 = 978_307_200.0;

/// How date values in a response body are represented.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateDecodeStrategy {
    /// Seconds since 2001-01-01T00:00:00Z.
    #[default]
    DeferredToDate,
    SecondsSince1970,
    MillisecondsSince1970,
    /// RFC 3339 strings.
    Iso8601,
    /// A `chrono` format string. Values without an offset are read as UTC.
    Formatted(String),
}

thread_local! {
    static ACTIVE: RefCell<Option<DateDecodeStrategy>> = const { RefCell::new(None) };
}

struct ScopeGuard {
    previous: Option<DateDecodeStrategy>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

/// Run `f` with `strategy` active for any `Timestamp` decoded inside it.
/// `None` leaves the current strategy untouched.
pub fn with_strategy<R>(strategy: Option<&DateDecodeStrategy>, f: impl FnOnce() -> R) -> R {
    let Some(strategy) = strategy else {
        return f();
    };
    let previous = ACTIVE.with(|active| active.borrow_mut().replace(strategy.clone()));
    let _guard = ScopeGuard { previous };
    f()
}

fn active_strategy() -> DateDecodeStrategy {
    ACTIVE.with(|active| active.borrow().clone().unwrap_or_default())
}

/// A UTC instant decoded according to the active `DateDecodeStrategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawDate::deserialize(deserializer)?;
        let strategy = active_strategy();
        let parsed = match (&strategy, raw) {
            (DateDecodeStrategy::DeferredToDate, RawDate::Number(secs)) => {
                from_millis((secs + REFERENCE_DATE_OFFSET_SECS) * 1000.0)
            }
            (DateDecodeStrategy::SecondsSince1970, RawDate::Number(secs)) => from_millis(secs * 1000.0),
            (DateDecodeStrategy::MillisecondsSince1970, RawDate::Number(millis)) => from_millis(millis),
            (DateDecodeStrategy::Iso8601, RawDate::Text(text)) => DateTime::parse_from_rfc3339(&text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            (DateDecodeStrategy::Formatted(format), RawDate::Text(text)) => parse_formatted(&text, format),
            (strategy, _) => {
                return Err(de::Error::custom(format!(
                    "date value has the wrong shape for {strategy:?}"
                )));
            }
        };
        parsed
            .map(Timestamp)
            .ok_or_else(|| de::Error::custom(format!("invalid date for {strategy:?}")))
    }
}

fn from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64)
}

fn parse_formatted(text: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(text, format) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
