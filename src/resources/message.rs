use serde::{Deserialize, Serialize};

use crate::resource::{id_string, Resource};

/// A contact-form submission addressed to the administrators.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default, deserialize_with = "id_string", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub date: Option<String>,
    /// `New`, `Read` or `Replied`.
    #[serde(default)]
    pub status: String,
}

impl Resource for ContactMessage {
    const PATH: &'static str = "/api/contact/";

    fn id(&self) -> &str {
        &self.id
    }
}
