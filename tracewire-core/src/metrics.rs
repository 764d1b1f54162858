use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Flat, provider-independent metrics keyed by canonical name.
///
/// Only numbers can be stored, so a `Metrics` value is always safe to hand to
/// a span sink. Keys are ordered, which keeps logged payloads stable
/// regardless of the field order the provider used.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, Number>);

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Number) {
        self.0.insert(name.into(), value);
    }

    pub fn insert_u64(&mut self, name: impl Into<String>, value: u64) {
        self.insert(name, Number::from(value));
    }

    /// Non-finite floats have no JSON representation and are dropped.
    pub fn insert_f64(&mut self, name: impl Into<String>, value: f64) {
        if let Some(number) = Number::from_f64(value) {
            self.insert(name, number);
        }
    }

    /// Stores `value` when it is a JSON number; anything else is ignored.
    pub fn insert_value(&mut self, name: impl Into<String>, value: &Value) -> bool {
        match value {
            Value::Number(number) => {
                self.insert(name, number.clone());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Number> {
        self.0.get(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Number::as_f64)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Number::as_u64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Number)> {
        self.0.iter()
    }

    /// Entries from `other` win on key collisions.
    pub fn merge(&mut self, other: Metrics) {
        self.0.extend(other.0);
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, number)| (name.clone(), Value::Number(number.clone())))
                .collect(),
        )
    }
}

impl FromIterator<(String, Number)> for Metrics {
    fn from_iter<T: IntoIterator<Item = (String, Number)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Metrics {
    type Item = (String, Number);
    type IntoIter = std::collections::btree_map::IntoIter<String, Number>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
