use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::resource::{id_string, optional_id_string, Edge, EdgeKind, Relatable, Resource};

/// A place. List filters: `city`, `travel`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    #[serde(default, deserialize_with = "id_string", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub avg_rating: Option<f64>,
}

impl Resource for Landmark {
    const PATH: &'static str = "/api/landmarks/";

    fn id(&self) -> &str {
        &self.id
    }

    /// Like state and ratings are server-owned and never written back.
    fn to_body(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "name": self.name,
            "city": self.city,
            "category": self.category,
            "short_description": self.short_description,
            "opening_hours": self.opening_hours,
            "price_range": self.price_range,
            "verified": self.verified,
        }))
    }
}

impl Relatable for Landmark {
    const EDGE: EdgeKind = EdgeKind::Like;

    fn edge(&self) -> Edge {
        Edge {
            kind: Self::EDGE,
            object_id: self.id.clone(),
            active: self.is_liked,
            counter: self.likes,
        }
    }
}
