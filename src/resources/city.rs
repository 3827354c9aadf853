use serde::{Deserialize, Serialize};

use crate::resource::{id_string, Resource};

/// A city. Read-only in the console.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct City {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for City {
    const PATH: &'static str = "/api/cities/";

    fn id(&self) -> &str {
        &self.id
    }
}
