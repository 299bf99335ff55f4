//! Request parsing and field coercion for `POST /predict`.
//!
//! Checks run in a fixed order: presence of both keys, coercion of
//! `current_quantity`, coercion of `month`, then the month range. Presence
//! and range failures are client errors; coercion failures are not.

use crate::error::{ServingError, ServingResult};
use serde_json::Value;
use std::num::IntErrorKind;

/// A validated prediction request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRequest {
    /// Quantity observed for the current month
    pub current_quantity: f64,

    /// Calendar month, 1-12
    pub month: u32,
}

impl PredictionRequest {
    /// Parse a raw request body.
    ///
    /// An empty body counts as absent. A body that is not valid JSON takes
    /// the generic error path.
    pub fn from_body(body: &[u8]) -> ServingResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ServingError::missing_fields());
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ServingError::MalformedBody(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Validate an already parsed JSON document.
    pub fn from_value(value: &Value) -> ServingResult<Self> {
        let fields = match value.as_object() {
            Some(map) if !map.is_empty() => map,
            _ => return Err(ServingError::missing_fields()),
        };
        let (Some(quantity), Some(month)) = (fields.get("current_quantity"), fields.get("month"))
        else {
            return Err(ServingError::missing_fields());
        };

        let current_quantity = coerce_float("current_quantity", quantity)?;
        let month = coerce_int("month", month)?;
        if !(1..=12).contains(&month) {
            return Err(ServingError::month_out_of_range());
        }

        Ok(Self {
            current_quantity,
            month: month as u32,
        })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Coerce a JSON value to a float: numbers, booleans and numeric strings.
fn coerce_float(field: &str, value: &Value) -> ServingResult<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            ServingError::type_coercion(format!("{field} is not representable as a float: {n}"))
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            ServingError::type_coercion(format!("could not convert string to float: '{s}'"))
        }),
        other => Err(ServingError::type_coercion(format!(
            "{field} must be a number or a numeric string, not {}",
            kind_of(other)
        ))),
    }
}

/// Coerce a JSON value to an integer: integers, floats (truncated toward
/// zero), booleans and integer strings.
///
/// Integral values beyond `i64` saturate, so they reach the range check as
/// out-of-range months rather than failing coercion.
fn coerce_int(field: &str, value: &Value) -> ServingResult<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.as_u64().is_some() {
                return Ok(i64::MAX);
            }
            match n.as_f64() {
                // `as` saturates at the i64 bounds.
                Some(f) if f.is_finite() => Ok(f.trunc() as i64),
                _ => Err(ServingError::type_coercion(format!(
                    "cannot convert {field} {n} to an integer"
                ))),
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(i),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Ok(i64::MAX),
                IntErrorKind::NegOverflow => Ok(i64::MIN),
                _ => Err(ServingError::type_coercion(format!(
                    "invalid literal for integer with base 10: '{s}'"
                ))),
            },
        },
        other => Err(ServingError::type_coercion(format!(
            "{field} must be an integer or an integer string, not {}",
            kind_of(other)
        ))),
    }
}
