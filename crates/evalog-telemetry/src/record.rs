//! Experiment records and normalization.
//!
//! A [`Record`] is a partial, caller-built set of fields describing one
//! evaluation run. [`normalize`] expands it to exactly the fields of a
//! [`FieldSchema`], in schema order.

use std::collections::BTreeMap;
use std::fmt;

use evalog_common::schema::field;
use evalog_common::{prompt_hash, FieldSchema};
use serde::{Deserialize, Serialize};

/// A single cell value.
///
/// Values are stored as given; normalization never coerces between variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// The placeholder used for absent fields.
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    /// True only for empty text.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write_float(f, *x),
            FieldValue::Bool(true) => f.write_str("True"),
            FieldValue::Bool(false) => f.write_str("False"),
        }
    }
}

// Shortest round-trip digits. Integral floats keep a trailing ".0"; values
// with a decimal exponent below -4 or at least 16 use `<m>e<sign><dd>` form.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }

    let sci = format!("{:e}", x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if x != 0.0 && !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        write!(f, "{:?}", x)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<f32> for FieldValue {
    fn from(x: f32) -> Self {
        FieldValue::Float(f64::from(x))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// A partial experiment record.
///
/// Any subset of the schema's fields may be set, plus keys the schema does
/// not know about; those are dropped during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for any field name.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Whether `name` is present with a non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn run_id(self, id: impl Into<String>) -> Self {
        self.set(field::RUN_ID, FieldValue::Text(id.into()))
    }

    pub fn timestamp(self, ts: impl Into<String>) -> Self {
        self.set(field::TIMESTAMP, FieldValue::Text(ts.into()))
    }

    pub fn task(self, task: impl Into<String>) -> Self {
        self.set(field::TASK, FieldValue::Text(task.into()))
    }

    pub fn model(self, model: impl Into<String>) -> Self {
        self.set(field::MODEL, FieldValue::Text(model.into()))
    }

    pub fn prompt_hash(self, hash: impl Into<String>) -> Self {
        self.set(field::PROMPT_HASH, FieldValue::Text(hash.into()))
    }

    /// Set `prompt_hash` from the raw prompt text.
    pub fn prompt(self, prompt: &str) -> Self {
        self.set(field::PROMPT_HASH, prompt_hash(prompt))
    }

    pub fn temperature(self, temperature: f64) -> Self {
        self.set(field::TEMPERATURE, temperature)
    }

    pub fn input_tokens(self, tokens: i64) -> Self {
        self.set(field::INPUT_TOKENS, tokens)
    }

    pub fn output_tokens(self, tokens: i64) -> Self {
        self.set(field::OUTPUT_TOKENS, tokens)
    }

    pub fn latency_ms(self, latency: f64) -> Self {
        self.set(field::LATENCY_MS, latency)
    }

    pub fn score_relevance(self, score: f64) -> Self {
        self.set(field::SCORE_RELEVANCE, score)
    }

    pub fn score_factuality(self, score: f64) -> Self {
        self.set(field::SCORE_FACTUALITY, score)
    }

    pub fn notes(self, notes: impl Into<String>) -> Self {
        self.set(field::NOTES, FieldValue::Text(notes.into()))
    }

    /// Record a failed run.
    pub fn error(self, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        self.set(field::ERROR_TYPE, FieldValue::Text(error_type.into()))
            .set(field::ERROR_MESSAGE, FieldValue::Text(message.into()))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A record expanded to exactly the fields of a schema, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord<'s> {
    schema: &'s FieldSchema,
    values: Vec<FieldValue>,
}

impl<'s> NormalizedRecord<'s> {
    /// Values in schema order.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.position(name).map(|i| &self.values[i])
    }

    /// `(field, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.schema
            .fields()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// The on-disk text of each cell, in schema order.
    pub fn to_row(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }

    /// JSON object keyed by field name.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(k, v)| {
                let value = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
                (k.to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Expand a partial record to the schema's fields.
///
/// Absent fields become empty text, present values pass through unchanged,
/// and keys unknown to the schema are dropped.
pub fn normalize<'s>(schema: &'s FieldSchema, record: &Record) -> NormalizedRecord<'s> {
    let values = schema
        .fields()
        .iter()
        .map(|name| record.get(name).cloned().unwrap_or_else(FieldValue::empty))
        .collect();
    NormalizedRecord { schema, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_float_rendering() {
        assert_eq!(FieldValue::from(1.0).to_string(), "1.0");
        assert_eq!(FieldValue::from(123.4).to_string(), "123.4");
        assert_eq!(FieldValue::from(0.0).to_string(), "0.0");
        assert_eq!(FieldValue::from(f64::NAN).to_string(), "nan");
        assert_eq!(FieldValue::from(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(FieldValue::from(-0.0).to_string(), "-0.0");
    }

    #[test]
    fn test_float_exponent_form() {
        assert_eq!(FieldValue::from(1e16).to_string(), "1e+16");
        assert_eq!(FieldValue::from(1e-7).to_string(), "1e-07");
        assert_eq!(FieldValue::from(1.5e-7).to_string(), "1.5e-07");
        assert_eq!(FieldValue::from(-2.5e300).to_string(), "-2.5e+300");
        assert_eq!(FieldValue::from(1e-5).to_string(), "1e-05");
        // Boundaries stay positional.
        assert_eq!(FieldValue::from(1e15).to_string(), "1000000000000000.0");
        assert_eq!(FieldValue::from(0.0001).to_string(), "0.0001");
    }

    #[test]
    fn test_record_from_pairs() {
        let record: Record = [("task", "qa"), ("model", "m")].into_iter().collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("task"), Some(&FieldValue::from("qa")));
    }

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(FieldValue::from(42).to_string(), "42");
        assert_eq!(FieldValue::from(true).to_string(), "True");
        assert_eq!(FieldValue::from("a,b").to_string(), "a,b");
        assert!(FieldValue::empty().is_empty());
        assert!(!FieldValue::from(0).is_empty());
    }

    #[test]
    fn test_empty_record_normalizes_to_placeholders() {
        let schema = FieldSchema::v1();
        let normalized = normalize(&schema, &Record::new());
        assert_eq!(normalized.values().len(), 14);
        assert!(normalized.values().iter().all(FieldValue::is_empty));
    }

    #[test]
    fn test_normalize_preserves_values_and_order() {
        let schema = FieldSchema::v1();
        let record = Record::new()
            .model("x")
            .task("smoke_test")
            .score_relevance(1.0)
            .input_tokens(42);
        let normalized = normalize(&schema, &record);

        let names: Vec<&str> = normalized.iter().map(|(k, _)| k).collect();
        assert_eq!(names, evalog_common::FIELD_ORDER.to_vec());
        assert_eq!(normalized.get("task"), Some(&FieldValue::from("smoke_test")));
        assert_eq!(normalized.get("score_relevance"), Some(&FieldValue::Float(1.0)));
        assert_eq!(normalized.get("input_tokens"), Some(&FieldValue::Int(42)));
        assert_eq!(normalized.get("notes"), Some(&FieldValue::empty()));
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let schema = FieldSchema::v1();
        let record = Record::new().task("t").set("judge", "gpt");
        let normalized = normalize(&schema, &record);
        assert!(normalized.get("judge").is_none());
        assert_eq!(normalized.values().len(), schema.len());
        assert!(!normalized.to_row().contains(&"gpt".to_string()));
    }

    #[test]
    fn test_prompt_sets_hash() {
        let record = Record::new().prompt("hello");
        assert_eq!(
            record.get("prompt_hash"),
            Some(&FieldValue::Text(prompt_hash("hello")))
        );
    }

    #[test]
    fn test_error_sets_both_fields() {
        let record = Record::new().error("Timeout", "no response after 30s");
        assert!(record.has_value("error_type"));
        assert!(record.has_value("error_message"));
    }

    #[test]
    fn test_has_value_treats_empty_text_as_absent() {
        let record = Record::new().run_id("");
        assert!(!record.has_value("run_id"));
        assert!(!record.has_value("timestamp"));
    }

    #[test]
    fn test_to_json_keeps_types() {
        let schema = FieldSchema::v1();
        let record = Record::new().temperature(0.7).output_tokens(17);
        let json = normalize(&schema, &record).to_json();
        assert_eq!(json["temperature"], serde_json::json!(0.7));
        assert_eq!(json["output_tokens"], serde_json::json!(17));
        assert_eq!(json["task"], serde_json::json!(""));
    }

    fn field_subset() -> impl Strategy<Value = Vec<(usize, String)>> {
        proptest::collection::vec((0usize..20, "[a-z ,\"]{0,8}"), 0..20)
    }

    proptest! {
        #[test]
        fn normalize_is_complete(entries in field_subset()) {
            let schema = FieldSchema::v1();
            let mut record = Record::new();
            for (idx, value) in &entries {
                // Indices past the schema produce unknown keys.
                let name = schema
                    .fields()
                    .get(*idx)
                    .cloned()
                    .unwrap_or_else(|| format!("extra_{}", idx));
                record.insert(name, value.clone());
            }

            let normalized = normalize(&schema, &record);
            prop_assert_eq!(normalized.values().len(), schema.len());
            for (name, value) in normalized.iter() {
                match record.get(name) {
                    Some(original) => {
                        prop_assert_eq!(value, original);
                    }
                    None => {
                        prop_assert!(value.is_empty());
                    }
                }
            }
        }
    }
}
