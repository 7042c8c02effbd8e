//! Lenient readers for curator-authored metadata JSON.
//!
//! Catalogue metadata is hand-edited and frequently sloppy: fields go missing,
//! strings hold numbers, lists hold scalars. Every accessor here coerces what
//! it can and falls back to a caller-supplied default instead of failing the
//! whole manuscript.

use serde_json::Value;

/// Walk nested objects by key. Returns `None` as soon as a segment is absent
/// or the current value is not an object.
pub fn get_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a value to a string, falling back to `default` when the value is
/// missing, null, or an empty string.
pub fn ensure_str(value: Option<&Value>, default: &str) -> String {
    match value {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) if s.is_empty() => default.to_string(),
        Some(other) => scalar_string(other),
    }
}

/// Coerce a value to a list of strings. Missing, null, and empty-list values
/// fall back to `default`; scalar values are wrapped in a single-element list.
pub fn ensure_string_list(value: Option<&Value>, default: &[&str]) -> Vec<String> {
    let fallback = || default.iter().map(|s| s.to_string()).collect();
    match value {
        None | Some(Value::Null) => fallback(),
        Some(Value::Array(items)) if items.is_empty() => fallback(),
        Some(Value::Array(items)) => items.iter().map(scalar_string).collect(),
        Some(Value::String(s)) if s.is_empty() => fallback(),
        Some(other) => vec![scalar_string(other)],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start_year: i64,
    pub end_year: i64,
}

fn year_of(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64() {
        if f.is_finite() {
            return Some(f.trunc() as i64);
        }
        return None;
    }
    value.as_str()?.trim().parse::<i64>().ok()
}

/// Parse a `[start, end]` date range. A single element means a point date.
/// Any unparseable element drops the whole range.
pub fn parse_date_range(value: Option<&Value>) -> Option<DateRange> {
    let items = value?.as_array()?;
    let first = items.first()?;
    let start_year = year_of(first)?;
    let end_year = match items.get(1) {
        Some(second) => year_of(second)?,
        None => start_year,
    };
    Some(DateRange {
        start_year,
        end_year,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

fn number_of(value: &Value) -> Option<f64> {
    if let Some(f) = value.as_f64() {
        return Some(f);
    }
    value.as_str()?.trim().parse::<f64>().ok()
}

/// Parse `[latitude, longitude]`, rejecting values outside the valid ranges.
pub fn parse_coordinates(value: Option<&Value>) -> Option<GeoPoint> {
    let items = value?.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let latitude = number_of(&items[0])?;
    let longitude = number_of(&items[1])?;
    let in_bounds = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
    if !in_bounds {
        return None;
    }
    Some(GeoPoint {
        latitude,
        longitude,
    })
}
