// src/validation.rs
// Payloads are read from a JSON object one field at a time. Every failure is
// recorded as a FieldError instead of aborting, so a caller gets the full
// list of problems in one response.
use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// One segment of the path to an offending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Loc {
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<Loc>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// Non-empty list of field errors for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(loc: Vec<Loc>, msg: impl Into<String>, kind: &'static str) -> Self {
        Self(vec![FieldError {
            loc,
            msg: msg.into(),
            kind,
        }])
    }

    pub fn not_an_object() -> Self {
        Self::single(vec![], "Input should be a valid dictionary or object", "object_type")
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let path: Vec<String> = e
                .loc
                .iter()
                .map(|l| match l {
                    Loc::Field(name) => (*name).to_owned(),
                    Loc::Index(i) => i.to_string(),
                })
                .collect();
            write!(f, "{}: {}", path.join("."), e.msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A payload that can be built from a JSON object.
pub trait Payload: Sized {
    fn validate(object: &Map<String, Value>) -> Result<Self, ValidationErrors>;
}

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Accepts ISO-8601 date-times with or without seconds, with a `T` or a
/// space, naive or with an offset (normalised to UTC), and bare dates as
/// midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.naive_utc());
    }

    // A trailing `Z` is UTC, which is what naive values are stored as.
    let naive = s.strip_suffix(|c: char| c.eq_ignore_ascii_case(&'z')).unwrap_or(s);
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Lax boolean: JSON booleans, `0`/`1`, and the usual yes/no strings.
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
            "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Lax integer: JSON integers, floats without a fractional part, and
/// numeric strings.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads typed fields out of a JSON object, collecting errors as it goes.
///
/// Getters return `None` whenever they record an error, so a payload
/// constructor can gather all fields first and bail once at the end.
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
    prefix: Vec<Loc>,
    errors: Vec<FieldError>,
}

impl<'a> Fields<'a> {
    pub fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            prefix: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn loc(&self, key: &'static str) -> Vec<Loc> {
        let mut loc = self.prefix.clone();
        loc.push(Loc::Field(key));
        loc
    }

    fn push(&mut self, loc: Vec<Loc>, msg: impl Into<String>, kind: &'static str) {
        self.errors.push(FieldError {
            loc,
            msg: msg.into(),
            kind,
        });
    }

    /// Absent and `null` are treated the same.
    fn value(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    fn required(&mut self, key: &'static str) -> Option<&'a Value> {
        let value = self.value(key);
        if value.is_none() {
            self.push(self.loc(key), "Field required", "missing");
        }
        value
    }

    /// Record an error that is not tied to a single field.
    pub fn reject(&mut self, msg: impl Into<String>, kind: &'static str) {
        self.push(self.prefix.clone(), msg, kind);
    }

    pub fn string(&mut self, key: &'static str, len: RangeInclusive<usize>) -> Option<String> {
        let value = self.required(key)?;
        self.check_string(key, value, Some(len))
    }

    pub fn optional_string(
        &mut self,
        key: &'static str,
        len: Option<RangeInclusive<usize>>,
    ) -> Option<String> {
        let value = self.value(key)?;
        self.check_string(key, value, len)
    }

    fn check_string(
        &mut self,
        key: &'static str,
        value: &Value,
        len: Option<RangeInclusive<usize>>,
    ) -> Option<String> {
        let Some(s) = value.as_str() else {
            self.push(self.loc(key), "Input should be a valid string", "string_type");
            return None;
        };
        if let Some(len) = len {
            let count = s.chars().count();
            if count < *len.start() {
                let msg = format!(
                    "String should have at least {} character{}",
                    len.start(),
                    plural(*len.start())
                );
                self.push(self.loc(key), msg, "string_too_short");
                return None;
            }
            if count > *len.end() {
                let msg = format!(
                    "String should have at most {} character{}",
                    len.end(),
                    plural(*len.end())
                );
                self.push(self.loc(key), msg, "string_too_long");
                return None;
            }
        }
        Some(s.to_owned())
    }

    pub fn datetime(&mut self, key: &'static str) -> Option<NaiveDateTime> {
        let value = self.required(key)?;
        self.check_datetime(key, value)
    }

    pub fn optional_datetime(&mut self, key: &'static str) -> Option<NaiveDateTime> {
        let value = self.value(key)?;
        self.check_datetime(key, value)
    }

    fn check_datetime(&mut self, key: &'static str, value: &Value) -> Option<NaiveDateTime> {
        let parsed = value.as_str().and_then(parse_datetime);
        if parsed.is_none() {
            self.push(self.loc(key), "Input should be a valid datetime", "datetime_type");
        }
        parsed
    }

    pub fn bool_or(&mut self, key: &'static str, default: bool) -> bool {
        self.optional_bool(key).unwrap_or(default)
    }

    pub fn optional_bool(&mut self, key: &'static str) -> Option<bool> {
        let value = self.value(key)?;
        let b = coerce_bool(value);
        if b.is_none() {
            self.push(self.loc(key), "Input should be a valid boolean", "bool_type");
        }
        b
    }

    pub fn optional_int(&mut self, key: &'static str) -> Option<i64> {
        let value = self.value(key)?;
        let n = coerce_int(value);
        if n.is_none() {
            self.push(self.loc(key), "Input should be a valid integer", "int_type");
        }
        n
    }

    /// Reads a list of objects, validating each element with `item`.
    pub fn list<T>(
        &mut self,
        key: &'static str,
        min_items: usize,
        mut item: impl FnMut(&mut Fields<'a>) -> Option<T>,
    ) -> Option<Vec<T>> {
        let value = self.required(key)?;
        let Some(elements) = value.as_array() else {
            self.push(self.loc(key), "Input should be a valid list", "list_type");
            return None;
        };

        let mut items = Vec::with_capacity(elements.len());
        let mut valid = true;
        for (i, element) in elements.iter().enumerate() {
            let mut loc = self.loc(key);
            loc.push(Loc::Index(i));
            let Some(object) = element.as_object() else {
                self.push(loc, "Input should be a valid dictionary or object", "object_type");
                valid = false;
                continue;
            };
            let mut child = Fields {
                object,
                prefix: loc,
                errors: Vec::new(),
            };
            match item(&mut child) {
                Some(parsed) if child.errors.is_empty() => items.push(parsed),
                _ => valid = false,
            }
            self.errors.append(&mut child.errors);
        }

        if elements.len() < min_items {
            let msg = format!(
                "List should have at least {} item{} after validation, not {}",
                min_items,
                plural(min_items),
                elements.len()
            );
            self.push(self.loc(key), msg, "too_short");
            valid = false;
        }

        valid.then_some(items)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Yields `value` unless an error has been recorded. Getters record an
    /// error whenever they return `None`, so a `None` here is never silent.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ValidationErrors(self.errors)),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
