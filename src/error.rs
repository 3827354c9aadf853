use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// How a caller should react to a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No usable response. Keep prior state, let the operator retry.
    Transient,
    /// The server refused the request (4xx). Show the detail, keep the edit open.
    Rejected,
    /// The server failed mid-write (5xx). The mutation may or may not have
    /// been persisted, so resynchronize instead of guessing.
    Uncertain,
}

/// Error returned by every [`Transport`](crate::Transport) call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("network error: {0}")]
    Network(String),
    /// 4xx with an optional per-field breakdown.
    #[error("request rejected ({status}): {detail}")]
    Rejected {
        status: u16,
        detail: String,
        fields: BTreeMap<String, Vec<String>>,
    },
    /// 5xx.
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },
    /// The response did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build an error from a non-success status and its (possibly empty) body.
    ///
    /// The detail is taken from `detail`, then `message`, then a bare string
    /// body, and finally the JSON text of the body itself. Object members whose
    /// values are strings or string arrays are collected as field errors.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| format!("HTTP {}", status));

        if status >= 500 {
            return TransportError::Server { status, detail };
        }

        TransportError::Rejected {
            status,
            detail,
            fields: extract_fields(body),
        }
    }

    /// Shorthand for a 404 rejection.
    pub fn not_found(what: impl Into<String>) -> Self {
        TransportError::Rejected {
            status: 404,
            detail: what.into(),
            fields: BTreeMap::new(),
        }
    }

    /// The HTTP-like status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Rejected { status, .. } | TransportError::Server { status, .. } => {
                Some(*status)
            }
            TransportError::Network(_) | TransportError::Decode(_) => None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            TransportError::Network(_) | TransportError::Decode(_) => ErrorClass::Transient,
            TransportError::Rejected { .. } => ErrorClass::Rejected,
            TransportError::Server { .. } => ErrorClass::Uncertain,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Field-level messages attached to a rejection.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            TransportError::Rejected { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}

/// Error returned by [`FormSession`](crate::FormSession) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("no form is open")]
    NotOpen,
    #[error("the form is read-only")]
    ReadOnly,
    /// A load, submit or delete of this session is still in flight.
    #[error("another request is still in flight")]
    Busy,
    #[error("no deletion is awaiting confirmation")]
    NoPendingDelete,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FormError {
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            FormError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        FormError::Transport(err.into())
    }
}

fn extract_detail(body: &Value) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => ["detail", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(body.to_string())),
        other => Some(other.to_string()),
    }
}

fn extract_fields(body: &Value) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    let Value::Object(map) = body else {
        return fields;
    };

    for (name, value) in map {
        if name == "detail" || name == "message" {
            continue;
        }
        let messages: Vec<String> = match value {
            Value::String(text) => vec![text.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        if !messages.is_empty() {
            fields.insert(name.clone(), messages);
        }
    }

    fields
}
