use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::nested::NestedItem;
use crate::resource::{id_string, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TripStatus {
    #[default]
    #[serde(rename = "SC")]
    Scheduled,
    #[serde(rename = "IP")]
    InProgress,
    #[serde(rename = "CO")]
    Completed,
    #[serde(rename = "CA")]
    Cancelled,
}

impl TripStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "Scheduled",
            TripStatus::InProgress => "In Progress",
            TripStatus::Completed => "Completed",
            TripStatus::Cancelled => "Cancelled",
        }
    }
}

/// A travel itinerary with its ordered stops.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default, deserialize_with = "id_string", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default)]
    pub landmarks: Vec<NestedItem>,
}

impl Resource for Trip {
    const PATH: &'static str = "/api/trips/";
    const NESTED_FIELD: Option<&'static str> = Some("landmarks");

    fn id(&self) -> &str {
        &self.id
    }

    fn to_body(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "title": self.title,
            "status": self.status,
            "landmarks": self.landmarks,
        }))
    }
}
