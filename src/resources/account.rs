use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::resource::{id_string, Edge, EdgeKind, Relatable, Resource, UpdateMethod};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "id_string", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub is_following: bool,
}

fn default_role() -> String {
    "user".to_string()
}

impl Resource for Account {
    const PATH: &'static str = "/api/users/";
    const UPDATE: UpdateMethod = UpdateMethod::Full;

    fn id(&self) -> &str {
        &self.id
    }

    /// Only the profile fields are writable; empty optional text goes out as `null`.
    fn to_body(&self) -> Result<Value, serde_json::Error> {
        let blank_to_null = |field: &Option<String>| field.clone().filter(|text| !text.is_empty());
        Ok(json!({
            "nickname": self.nickname,
            "email": self.email,
            "username": self.username,
            "birthday": blank_to_null(&self.birthday),
            "country": blank_to_null(&self.country),
            "role": self.role,
        }))
    }
}

impl Relatable for Account {
    const EDGE: EdgeKind = EdgeKind::Follow;

    fn edge(&self) -> Edge {
        Edge {
            kind: Self::EDGE,
            object_id: self.id.clone(),
            active: self.is_following,
            counter: self.followers,
        }
    }
}
