//! Conversion of raw user data into canonical tensors.
//!
//! Numeric inputs become floating tensors and receive leading axes according
//! to their role:
//! - observed data gets one leading sample axis (it is later broadcast against
//!   the number of posterior samples) and is padded to rank 4;
//! - latent placeholder values get both a sample and a datapoint axis.
//!
//! Discrete collections are passed through as opaque symbols.

use br_core::{Error, Result, Tensor, Value};
use ndarray::{ArrayD, IxDyn};
use serde_json::Value as Json;

use crate::shape::{reshape, unsqueeze};

/// Input kinds accepted by [`coerce_to_dtype`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    /// An existing floating tensor.
    Tensor(Tensor),
    /// An integer array.
    IntArray(ArrayD<i64>),
    /// A floating scalar.
    Float(f64),
    /// An integer scalar.
    Int(i64),
    /// A list of symbols.
    List(Vec<String>),
    /// A single string symbol.
    Text(String),
    /// Untyped JSON, classified at coercion time.
    Json(Json),
}

impl From<Tensor> for RawData {
    fn from(t: Tensor) -> Self {
        RawData::Tensor(t)
    }
}

impl From<ArrayD<i64>> for RawData {
    fn from(a: ArrayD<i64>) -> Self {
        RawData::IntArray(a)
    }
}

impl From<f64> for RawData {
    fn from(x: f64) -> Self {
        RawData::Float(x)
    }
}

impl From<i64> for RawData {
    fn from(x: i64) -> Self {
        RawData::Int(x)
    }
}

impl From<Vec<String>> for RawData {
    fn from(v: Vec<String>) -> Self {
        RawData::List(v)
    }
}

impl From<&str> for RawData {
    fn from(s: &str) -> Self {
        RawData::Text(s.to_string())
    }
}

impl From<Json> for RawData {
    fn from(v: Json) -> Self {
        RawData::Json(v)
    }
}

/// Convert `data` into its canonical representation.
///
/// # Errors
///
/// [`Error::InvalidDtype`] for input kinds with no canonical form (JSON
/// `null`, booleans, ragged or mixed arrays).
pub fn coerce_to_dtype(data: impl Into<RawData>, is_observed: bool) -> Result<Value> {
    let tensor = match data.into() {
        RawData::Tensor(t) => t,
        RawData::IntArray(a) => a.mapv(|v| v as f64),
        RawData::Float(x) => scalar_tensor(x),
        RawData::Int(x) => scalar_tensor(x as f64),
        RawData::List(symbols) => return Ok(Value::Symbols(symbols)),
        RawData::Text(s) => return Ok(Value::Symbols(vec![s])),
        RawData::Json(json) => match classify_json(json)? {
            Classified::Numeric(t) => t,
            Classified::Symbols(symbols) => return Ok(Value::Symbols(symbols)),
        },
    };
    Ok(Value::Tensor(reformat_tensor(tensor, is_observed)?))
}

/// Parse `text` as JSON and coerce the result.
pub fn coerce_json_str(text: &str, is_observed: bool) -> Result<Value> {
    let json: Json = serde_json::from_str(text)?;
    coerce_to_dtype(json, is_observed)
}

fn scalar_tensor(x: f64) -> Tensor {
    Tensor::from_elem(IxDyn(&[1, 1]), x)
}

fn reformat_tensor(tensor: Tensor, is_observed: bool) -> Result<Tensor> {
    if !is_observed {
        return unsqueeze(unsqueeze(tensor, 0)?, 1);
    }
    let result = unsqueeze(tensor, 0)?;
    let mut shape = result.shape().to_vec();
    match shape.len() {
        2 => shape.extend([1, 1]),
        3 => shape.push(1),
        _ => return Ok(result),
    }
    reshape(&result, &shape)
}

enum Classified {
    Numeric(Tensor),
    Symbols(Vec<String>),
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn classify_json(json: Json) -> Result<Classified> {
    match json {
        Json::Number(n) => {
            let x = n.as_f64().ok_or_else(|| Error::InvalidDtype(format!("number {}", n)))?;
            Ok(Classified::Numeric(scalar_tensor(x)))
        }
        Json::String(s) => Ok(Classified::Symbols(vec![s])),
        Json::Object(map) => Ok(Classified::Symbols(map.into_iter().map(|(k, _)| k).collect())),
        Json::Array(items) if !items.is_empty() && items.iter().all(Json::is_string) => {
            Ok(Classified::Symbols(
                items.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            ))
        }
        Json::Array(items) => {
            let mut shape = Vec::new();
            let mut values = Vec::new();
            collect_numeric(&Json::Array(items), 0, &mut shape, &mut values)?;
            Ok(Classified::Numeric(Tensor::from_shape_vec(IxDyn(&shape), values)?))
        }
        other => Err(Error::InvalidDtype(json_kind(&other).to_string())),
    }
}

fn collect_numeric(
    json: &Json,
    depth: usize,
    shape: &mut Vec<usize>,
    values: &mut Vec<f64>,
) -> Result<()> {
    match json {
        Json::Number(n) => {
            if depth != shape.len() {
                return Err(Error::InvalidDtype("ragged array".to_string()));
            }
            let x = n.as_f64().ok_or_else(|| Error::InvalidDtype(format!("number {}", n)))?;
            values.push(x);
            Ok(())
        }
        Json::Array(items) => {
            if depth == shape.len() {
                // First visit at this depth fixes the axis length.
                if !values.is_empty() {
                    return Err(Error::InvalidDtype("ragged array".to_string()));
                }
                shape.push(items.len());
            } else if depth > shape.len() || shape[depth] != items.len() {
                return Err(Error::InvalidDtype("ragged array".to_string()));
            }
            for item in items {
                collect_numeric(item, depth + 1, shape, values)?;
            }
            Ok(())
        }
        other => Err(Error::InvalidDtype(format!("mixed array containing {}", json_kind(other)))),
    }
}
