use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::optional_id_string;

/// One stop of an itinerary.
///
/// `visited` and `skipped` are independent flags; nothing here keeps them
/// mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NestedItem {
    /// `None` until the server has stored the stop.
    pub id: Option<String>,
    pub parent_id: String,
    pub order: u32,
    pub visited: bool,
    pub skipped: bool,
    /// The referenced place.
    pub reference_id: String,
    pub reference_name: Option<String>,
}

impl NestedItem {
    pub fn new(reference_id: impl Into<String>, order: u32) -> Self {
        Self {
            reference_id: reference_id.into(),
            order,
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Wire form: `{ id?, visit_order, visited, skipped, landmark }`.
impl Serialize for NestedItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.id.is_some() { 5 } else { 4 };
        let mut state = serializer.serialize_struct("NestedItem", len)?;
        if let Some(id) = &self.id {
            state.serialize_field("id", id)?;
        }
        state.serialize_field("visit_order", &self.order)?;
        state.serialize_field("visited", &self.visited)?;
        state.serialize_field("skipped", &self.skipped)?;
        state.serialize_field("landmark", &self.reference_id)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct NestedItemWire {
    #[serde(default, deserialize_with = "optional_id_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "optional_id_string")]
    trip: Option<String>,
    #[serde(default)]
    visit_order: Option<u32>,
    #[serde(default)]
    visited: Option<bool>,
    #[serde(default)]
    skipped: Option<bool>,
    #[serde(default)]
    landmark: Option<Value>,
    #[serde(default, deserialize_with = "optional_id_string")]
    landmark_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl<'de> Deserialize<'de> for NestedItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = NestedItemWire::deserialize(deserializer)?;

        let (reference_id, embedded_name) = match wire.landmark {
            Some(Value::String(id)) if !id.is_empty() => (Some(id), None),
            Some(Value::Number(id)) => (Some(id.to_string()), None),
            Some(Value::Object(map)) => {
                let id = match map.get("id") {
                    Some(Value::String(id)) => Some(id.clone()),
                    Some(Value::Number(id)) => Some(id.to_string()),
                    _ => None,
                };
                let name = map.get("name").and_then(Value::as_str).map(str::to_string);
                (id, name)
            }
            _ => (None, None),
        };

        let reference_id = reference_id
            .or(wire.landmark_id)
            .ok_or_else(|| de::Error::custom("stop without a landmark reference"))?;

        Ok(NestedItem {
            id: wire.id,
            parent_id: wire.trip.unwrap_or_default(),
            order: wire.visit_order.unwrap_or(0),
            visited: wire.visited.unwrap_or(false),
            skipped: wire.skipped.unwrap_or(false),
            reference_id,
            reference_name: embedded_name.or(wire.name),
        })
    }
}
