//! Type inference over sampled column values.
//!
//! Detectors run in a fixed priority order, most specific first. Each detector
//! reports the ratio of sampled values matching its pattern; the first one to
//! clear its acceptance threshold wins and the ratio becomes the column's
//! confidence. `string` is the universal fallback. The pass is fully
//! deterministic: no randomness, no wall-clock reads.

use crate::profile::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

/// Winning type and its match ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeInference {
    pub column_type: ColumnType,
    pub confidence: f64,
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static IP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .expect("valid regex")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://\S+$").expect("valid regex"));

static GEO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?\d{1,2}(\.\d+)?,\s*[-+]?\d{1,3}(\.\d+)?$").expect("valid regex")
});

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

struct Detector {
    column_type: ColumnType,
    threshold: f64,
    matches: fn(&str) -> bool,
}

/// Priority order is load-bearing: when two detectors would both clear their
/// threshold, the earlier entry wins. The numeric family sits between date and
/// json; rating requires every sampled value in range.
static DETECTORS: [Detector; 12] = [
    Detector { column_type: ColumnType::Uuid, threshold: 0.98, matches: is_uuid },
    Detector { column_type: ColumnType::Email, threshold: 0.95, matches: is_email },
    Detector { column_type: ColumnType::Ip, threshold: 0.98, matches: is_ip },
    Detector { column_type: ColumnType::Url, threshold: 0.95, matches: is_url },
    Detector { column_type: ColumnType::Phone, threshold: 0.90, matches: is_phone },
    Detector { column_type: ColumnType::Date, threshold: 0.90, matches: is_date_like },
    Detector { column_type: ColumnType::Currency, threshold: 0.90, matches: is_currency },
    Detector { column_type: ColumnType::Percentage, threshold: 0.90, matches: is_percentage },
    Detector { column_type: ColumnType::Rating, threshold: 1.0, matches: is_rating },
    Detector { column_type: ColumnType::Number, threshold: 0.90, matches: is_number },
    Detector { column_type: ColumnType::Json, threshold: 0.90, matches: is_json },
    Detector { column_type: ColumnType::Geo, threshold: 0.95, matches: is_geo },
];

/// Infer the semantic type of a column from its non-null values.
///
/// Sampling is capped at the first `sample_size` values.
pub fn infer(values: &[Value], sample_size: usize) -> TypeInference {
    let sample: Vec<Cow<'_, str>> = values.iter().take(sample_size).map(render).collect();

    if sample.is_empty() {
        return TypeInference {
            column_type: ColumnType::String,
            confidence: 1.0,
        };
    }

    for detector in DETECTORS.iter() {
        let matched = sample.iter().filter(|v| (detector.matches)(v)).count();
        let ratio = matched as f64 / sample.len() as f64;
        if ratio >= detector.threshold {
            let column_type = match detector.column_type {
                ColumnType::Date => date_or_timestamp(&sample),
                other => other,
            };
            return TypeInference {
                column_type,
                confidence: ratio,
            };
        }
    }

    TypeInference {
        column_type: ColumnType::String,
        confidence: 1.0,
    }
}

/// Re-validation matcher for a winning type, used by the consistency pass
pub fn matches_type(column_type: ColumnType, raw: &str) -> bool {
    match column_type {
        ColumnType::Uuid => is_uuid(raw),
        ColumnType::Email => is_email(raw),
        ColumnType::Ip => is_ip(raw),
        ColumnType::Url => is_url(raw),
        ColumnType::Phone => is_phone(raw),
        ColumnType::Date | ColumnType::Timestamp => is_date_like(raw),
        ColumnType::Currency => is_currency(raw),
        ColumnType::Percentage => is_percentage(raw),
        ColumnType::Rating => is_rating(raw),
        ColumnType::Number => is_number(raw),
        ColumnType::Json => is_json(raw),
        ColumnType::Geo => is_geo(raw),
        ColumnType::String => true,
    }
}

/// Fraction of values that re-validate against the inferred type, in [0, 1]
pub fn consistency_ratio(column_type: ColumnType, values: &[Value]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let matched = values
        .iter()
        .filter(|v| matches_type(column_type, &render(v)))
        .count();
    matched as f64 / values.len() as f64
}

/// Render a raw cell for pattern matching
pub fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

fn date_or_timestamp(sample: &[Cow<'_, str>]) -> ColumnType {
    let has_time = sample
        .iter()
        .any(|v| matches!(date_kind(v), Some(DateKind::Timestamp)));
    if has_time {
        ColumnType::Timestamp
    } else {
        ColumnType::Date
    }
}

enum DateKind {
    Date,
    Timestamp,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
];

fn date_kind(raw: &str) -> Option<DateKind> {
    let raw = raw.trim();
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return Some(DateKind::Timestamp);
    }
    for format in DATETIME_FORMATS {
        if NaiveDateTime::parse_from_str(raw, format).is_ok() {
            return Some(DateKind::Timestamp);
        }
    }
    for format in DATE_FORMATS {
        if NaiveDate::parse_from_str(raw, format).is_ok() {
            return Some(DateKind::Date);
        }
    }
    None
}

fn is_uuid(raw: &str) -> bool {
    UUID_RE.is_match(raw.trim())
}

fn is_email(raw: &str) -> bool {
    EMAIL_RE.is_match(raw.trim())
}

fn is_ip(raw: &str) -> bool {
    IP_RE.is_match(raw.trim())
}

fn is_url(raw: &str) -> bool {
    URL_RE.is_match(raw.trim())
}

/// Digits with common separators, 7-15 digits total, optional leading +
fn is_phone(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return false;
    }
    for (i, c) in raw.char_indices() {
        let separator = matches!(c, ' ' | '-' | '.' | '(' | ')');
        let plus = c == '+' && i == 0;
        if !c.is_ascii_digit() && !separator && !plus {
            return false;
        }
    }
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
    (7..=15).contains(&digits)
}

fn is_date_like(raw: &str) -> bool {
    date_kind(raw).is_some()
}

fn is_currency(raw: &str) -> bool {
    let raw = raw.trim();
    raw.contains(&CURRENCY_SYMBOLS[..]) && crate::stats::parse_numeric(raw).is_some()
}

fn is_percentage(raw: &str) -> bool {
    let raw = raw.trim();
    raw.ends_with('%') && crate::stats::parse_numeric(raw).is_some()
}

fn is_rating(raw: &str) -> bool {
    match strict_number(raw) {
        Some(n) => (0.0..=5.0).contains(&n),
        None => false,
    }
}

fn is_number(raw: &str) -> bool {
    strict_number(raw).is_some()
}

fn is_json(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw).is_ok()
}

fn is_geo(raw: &str) -> bool {
    GEO_RE.is_match(raw.trim())
}

fn strict_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
