//! # Stats Decoding
//!
//! Purpose: Decode the small YAML subset beanstalkd uses for `stats*` and
//! `list-tubes*` bodies into typed, order-preserving values.
//!
//! ## Format
//!
//! ```text
//! ---                      list-tubes body
//! - default
//! - emails
//!
//! ---                      stats-tube body
//! name: default
//! current-jobs-ready: 3
//! pause: 0
//! ```
//!
//! ## Notes
//! - Values that parse as numbers are coerced: integral values become
//!   [`StatsValue::Int`], the rest [`StatsValue::Float`].
//! - [`decode_names`] reads list documents without coercion, for tube names.
//! - A document mixing `- item` lines with `key: value` lines is rejected
//!   with [`ProtoError::MixedStats`].

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ProtoError, ProtoResult};

const DOCUMENT_MARKER: &str = "---";

/// One decoded scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl StatsValue {
    /// Coerces raw text: integer, then finite float, then string.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(value) = raw.parse::<i64>() {
            return StatsValue::Int(value);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => integral(value)
                .map(StatsValue::Int)
                .unwrap_or(StatsValue::Float(value)),
            _ => StatsValue::Str(raw.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StatsValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatsValue::Int(value) => Some(*value as f64),
            StatsValue::Float(value) => Some(*value),
            StatsValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatsValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for StatsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsValue::Int(value) => write!(f, "{}", value),
            StatsValue::Float(value) => write!(f, "{}", value),
            StatsValue::Str(value) => f.write_str(value),
        }
    }
}

fn integral(value: f64) -> Option<i64> {
    // i64::MAX is not representable in f64; the bound is exclusive.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if value.fract() == 0.0 && value >= -LIMIT && value < LIMIT {
        Some(value as i64)
    } else {
        None
    }
}

/// A decoded stats document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Stats {
    /// `- item` lines, in order.
    List(Vec<StatsValue>),
    /// `key: value` lines, in order.
    Map(IndexMap<String, StatsValue>),
}

impl Stats {
    /// Looks up `key` in a map document.
    pub fn get(&self, key: &str) -> Option<&StatsValue> {
        match self {
            Stats::Map(map) => map.get(key),
            Stats::List(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Stats::List(items) => items.len(),
            Stats::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns list items; an empty map counts as an empty list.
    pub fn into_list(self) -> Option<Vec<StatsValue>> {
        match self {
            Stats::List(items) => Some(items),
            Stats::Map(map) if map.is_empty() => Some(Vec::new()),
            Stats::Map(_) => None,
        }
    }

    pub fn into_map(self) -> Option<IndexMap<String, StatsValue>> {
        match self {
            Stats::Map(map) => Some(map),
            Stats::List(_) => None,
        }
    }
}

/// Decodes a stats body.
///
/// Everything up to and including the `---` marker is skipped; without a
/// marker only the first line is.
pub fn decode_stats(body: &[u8]) -> ProtoResult<Stats> {
    let document = Document::parse(body)?;
    if !document.items.is_empty() {
        let items = document.items.into_iter().map(StatsValue::coerce).collect();
        return Ok(Stats::List(items));
    }
    let map = document
        .pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), StatsValue::coerce(value)))
        .collect();
    Ok(Stats::Map(map))
}

/// Decodes a list body into names, without numeric coercion.
///
/// Tube names such as `007` or `1e3` must survive unchanged.
pub fn decode_names(body: &[u8]) -> ProtoResult<Vec<String>> {
    let document = Document::parse(body)?;
    if !document.pairs.is_empty() {
        return Err(ProtoError::ExpectedList);
    }
    Ok(document.items.into_iter().map(str::to_string).collect())
}

/// Raw lines of a stats document, split into list items and pairs.
struct Document<'a> {
    items: Vec<&'a str>,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Document<'a> {
    fn parse(body: &'a [u8]) -> ProtoResult<Self> {
        let text = std::str::from_utf8(body).map_err(|_| ProtoError::StatsEncoding)?;
        let lines: Vec<&str> = text
            .trim_end()
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let start = lines
            .iter()
            .position(|line| *line == DOCUMENT_MARKER)
            .map_or(1, |marker| marker + 1);

        let mut document = Document {
            items: Vec::new(),
            pairs: Vec::new(),
        };
        for line in lines.into_iter().skip(start) {
            if line.is_empty() {
                continue;
            }
            if line.starts_with('-') {
                document.items.push(line.get(2..).unwrap_or(""));
            } else {
                document.pairs.push(split_pair(line)?);
            }
        }

        if !document.items.is_empty() && !document.pairs.is_empty() {
            return Err(ProtoError::MixedStats);
        }
        Ok(document)
    }
}

fn split_pair(line: &str) -> ProtoResult<(&str, &str)> {
    if let Some(pair) = line.split_once(": ") {
        return Ok(pair);
    }
    match line.strip_suffix(':') {
        Some(key) => Ok((key, "")),
        None => Err(ProtoError::MalformedStats(line.to_string())),
    }
}
