use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::{id_string, Resource};

/// A catalog item sold through the payments service. Amounts are in minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "id_string", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit_amount: i64,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Either plain strings or `{ "name": ... }` objects, kept as sent.
    #[serde(default)]
    pub marketing_features: Vec<Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_interval() -> String {
    "month".to_string()
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            unit_amount: 0,
            total_amount: 0,
            currency: default_currency(),
            discount_percentage: 0.0,
            interval: default_interval(),
            marketing_features: Vec::new(),
        }
    }
}

impl Product {
    /// Display names of the marketing features.
    pub fn feature_names(&self) -> Vec<String> {
        self.marketing_features
            .iter()
            .filter_map(|feature| match feature {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .collect()
    }
}

impl Resource for Product {
    const PATH: &'static str = "/api/payments/products/";

    fn id(&self) -> &str {
        &self.id
    }
}
