//! HttpTransport - the console REST API over reqwest.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Transport;
use crate::config::SyncConfig;
use crate::error::TransportError;
use crate::query::PageQuery;
use crate::resource::Resource;
use crate::resources::{Landmark, Trip};
use crate::session::{Credentials, Session};

const TOKEN_PATH: &str = "/api/auth/token/";
const TOKEN_REFRESH_PATH: &str = "/api/auth/token/refresh/";
const LOGOUT_PATH: &str = "/api/auth/logout/";

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// REST client for the console API.
///
/// Every request carries the injected [`Session`]'s access token as a
/// bearer token when one is present. Clones share the connection pool
/// and the session.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    session: Session,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig, session: Session) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self::with_client(client, &config.base_url, session))
    }

    pub fn with_client(client: Client, base_url: &str, session: Session) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Exchange credentials for a token pair and store it in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), TransportError> {
        let body = json!({ "username": email, "password": password });
        let request = self.request(Method::POST, TOKEN_PATH).json(&body);
        let tokens: TokenPair = serde_json::from_value(self.send(request).await?)?;
        self.session
            .acquire(Credentials::new(tokens.access, tokens.refresh));
        info!("logged in as {}", email);
        Ok(())
    }

    /// Trade the refresh token for a new access token.
    pub async fn refresh_access(&self) -> Result<(), TransportError> {
        let refresh = self.session.refresh_token().ok_or_else(|| TransportError::Rejected {
            status: 401,
            detail: "no refresh token".to_string(),
            fields: Default::default(),
        })?;
        let body = json!({ "refresh": refresh });
        let request = self.request(Method::POST, TOKEN_REFRESH_PATH).json(&body);
        let tokens: TokenPair = serde_json::from_value(self.send(request).await?)?;
        self.session.set_access(tokens.access);
        debug!("access token refreshed");
        Ok(())
    }

    /// End the server session. Local credentials are dropped whether or not
    /// the server call succeeds.
    pub async fn logout(&self) -> Result<(), TransportError> {
        let result = self.send(self.request(Method::GET, LOGOUT_PATH)).await;
        self.session.clear();
        match result {
            Ok(_) => {
                info!("logged out");
                Ok(())
            }
            Err(err) => {
                warn!("logout call failed, session cleared anyway: {}", err);
                Err(err)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(body) => body,
                Err(err) if status.is_success() => return Err(err.into()),
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::from_response(status.as_u16(), &body))
        }
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), TransportError> {
        self.send(request).await.map(|_| ())
    }
}

fn detail_path(path: &str, id: &str) -> String {
    format!("{}{}/", path, id)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn list(&self, path: &str, query: &PageQuery) -> Result<Value, TransportError> {
        let request = self.request(Method::GET, path).query(&query.params());
        self.send(request).await
    }

    async fn get_by_id(&self, path: &str, id: &str) -> Result<Value, TransportError> {
        self.send(self.request(Method::GET, &detail_path(path, id))).await
    }

    async fn create(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.send(self.request(Method::POST, path).json(&body)).await
    }

    async fn update(&self, path: &str, id: &str, body: Value) -> Result<Value, TransportError> {
        let request = self.request(Method::PUT, &detail_path(path, id)).json(&body);
        self.send(request).await
    }

    async fn partial_update(
        &self,
        path: &str,
        id: &str,
        body: Value,
    ) -> Result<Value, TransportError> {
        let request = self.request(Method::PATCH, &detail_path(path, id)).json(&body);
        self.send(request).await
    }

    async fn remove(&self, path: &str, id: &str) -> Result<(), TransportError> {
        self.send_unit(self.request(Method::DELETE, &detail_path(path, id))).await
    }

    async fn follow(&self, user_id: &str) -> Result<(), TransportError> {
        self.send_unit(
            self.request(Method::POST, "/api/users/follow/")
                .json(&json!({ "id": user_id })),
        )
        .await
    }

    async fn unfollow(&self, user_id: &str) -> Result<(), TransportError> {
        self.send_unit(
            self.request(Method::POST, "/api/users/unfollow/")
                .json(&json!({ "id": user_id })),
        )
        .await
    }

    async fn like(&self, record_id: &str) -> Result<(), TransportError> {
        let path = format!("{}{}/like/", Landmark::PATH, record_id);
        self.send_unit(self.request(Method::GET, &path)).await
    }

    async fn unlike(&self, record_id: &str) -> Result<(), TransportError> {
        let path = format!("{}{}/unlike/", Landmark::PATH, record_id);
        self.send_unit(self.request(Method::GET, &path)).await
    }

    async fn list_nested(&self, parent_id: &str) -> Result<Value, TransportError> {
        let path = format!("{}{}/get_landmarks/", Trip::PATH, parent_id);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn remove_nested(&self, item_id: &str) -> Result<(), TransportError> {
        let path = format!("{}landmarks/{}/", Trip::PATH, item_id);
        self.send_unit(self.request(Method::DELETE, &path)).await
    }
}
