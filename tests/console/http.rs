//! HTTP transport integration tests.
//!
//! Starts an axum server that imitates the console API and exercises it
//! through HttpTransport.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use console_sync::resources::{Landmark, Trip};
use console_sync::{
    ErrorClass, HttpTransport, LoadOutcome, NestedEditor, PageQuery, Resource, ResourceList,
    Session, SyncConfig, Transport, TransportError,
};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Seen {
    method: Method,
    path: String,
    query: Option<String>,
    auth: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Api {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Api {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn last(&self, path: &str) -> Seen {
        self.seen()
            .into_iter()
            .rev()
            .find(|seen| seen.path == path)
            .unwrap()
    }
}

async fn handle(
    State(api): State<Api>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    api.seen.lock().unwrap().push(Seen {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        auth: auth.clone(),
        body: body.clone(),
    });

    match (method, uri.path()) {
        (Method::POST, "/api/auth/token/") => {
            if body["username"] == "ana@example.com" && body["password"] == "secret" {
                Json(json!({ "access": "A1", "refresh": "R1" })).into_response()
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "detail": "No active account found with the given credentials" })),
                )
                    .into_response()
            }
        }
        (Method::POST, "/api/auth/token/refresh/") => {
            Json(json!({ "access": format!("A2-{}", body["refresh"].as_str().unwrap_or("")) }))
                .into_response()
        }
        (Method::GET, "/api/auth/logout/") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response()
        }
        (Method::GET, "/api/landmarks/") => Json(json!({
            "count": 31,
            "results": [{
                "id": 1,
                "name": "Colosseum",
                "city": { "id": 3, "name": "Rome" },
                "likes": 5,
                "is_liked": false,
                "avg_rating": 4.5
            }]
        }))
        .into_response(),
        (Method::GET, "/api/landmarks/1/like/") => {
            Json(json!({ "detail": "liked" })).into_response()
        }
        (Method::POST, "/api/users/follow/") => match auth {
            Some(_) => StatusCode::NO_CONTENT.into_response(),
            None => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Authentication credentials were not provided." })),
            )
                .into_response(),
        },
        (Method::PATCH, "/api/trips/t1/") => {
            if body["title"] == "" {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "title": ["This field may not be blank."] })),
                )
                    .into_response()
            } else {
                let mut record = body;
                record["id"] = json!("t1");
                Json(record).into_response()
            }
        }
        (Method::GET, "/api/trips/t1/get_landmarks/") => Json(json!([
            { "id": 11, "trip": "t1", "visit_order": 1, "landmark": { "id": 1, "name": "Colosseum" } },
            { "id": 12, "trip": "t1", "visit_order": 2, "landmark": 2 }
        ]))
        .into_response(),
        (Method::GET, "/api/trips/broken/") => "<html>not json</html>".into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}

/// Bind to port 0 and return the actual address.
async fn start_server(api: Api) -> String {
    let app = Router::new().fallback(handle).with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client() -> (Api, Arc<HttpTransport>) {
    let api = Api::default();
    let base = start_server(api.clone()).await;
    let config = SyncConfig {
        base_url: base,
        ..SyncConfig::default()
    };
    let transport = HttpTransport::new(&config, Session::new()).unwrap();
    (api, Arc::new(transport))
}

#[tokio::test]
async fn login_stores_tokens_and_authorizes_calls() {
    let (api, transport) = client().await;

    let err = transport.follow("u1").await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    transport.login("ana@example.com", "secret").await.unwrap();
    assert!(transport.session().is_authenticated());

    transport.follow("u1").await.unwrap();
    let follow = api.last("/api/users/follow/");
    assert_eq!(follow.auth.as_deref(), Some("Bearer A1"));
    assert_eq!(follow.body, json!({ "id": "u1" }));
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let (_api, transport) = client().await;

    let err = transport.login("ana@example.com", "nope").await.unwrap_err();
    assert_eq!(err.class(), ErrorClass::Rejected);
    assert_eq!(
        err,
        TransportError::Rejected {
            status: 401,
            detail: "No active account found with the given credentials".into(),
            fields: Default::default(),
        }
    );
    assert!(!transport.session().is_authenticated());
}

#[tokio::test]
async fn refresh_keeps_the_refresh_token() {
    let (api, transport) = client().await;
    transport.login("ana@example.com", "secret").await.unwrap();

    transport.refresh_access().await.unwrap();
    assert_eq!(transport.session().access_token().as_deref(), Some("A2-R1"));
    assert_eq!(transport.session().refresh_token().as_deref(), Some("R1"));
    assert_eq!(api.last("/api/auth/token/refresh/").body, json!({ "refresh": "R1" }));
}

#[tokio::test]
async fn logout_clears_the_session_even_when_the_server_fails() {
    let (_api, transport) = client().await;
    transport.login("ana@example.com", "secret").await.unwrap();

    let err = transport.logout().await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Server {
            status: 500,
            detail: "oops".into(),
        }
    );
    assert!(!transport.session().is_authenticated());
}

#[tokio::test]
async fn list_sends_page_search_and_filters() {
    let (api, transport) = client().await;
    let list: ResourceList<Landmark, HttpTransport> =
        ResourceList::new(transport, &SyncConfig::default());

    let query = PageQuery::new(10)
        .with_search("col")
        .with_filter("city", Some("3".into()))
        .with_page(2);
    assert_eq!(list.load(query).await, LoadOutcome::Applied);

    let seen = api.last("/api/landmarks/");
    assert_eq!(seen.method, Method::GET);
    let params = seen.query.unwrap();
    for expected in ["page=2", "page_size=10", "search=col", "city=3"] {
        assert!(params.split('&').any(|pair| pair == expected), "{params}");
    }

    let items = list.items();
    let place = &items[0];
    assert_eq!(place.id, "1");
    assert_eq!(place.city.as_deref(), Some("3"));
    assert_eq!(list.page().total_count, 31);
    assert_eq!(list.page().total_pages, 4);
}

#[tokio::test]
async fn field_errors_are_parsed() {
    let (_api, transport) = client().await;

    let err = transport
        .partial_update(Trip::PATH, "t1", json!({ "title": "" }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.field_errors().unwrap()["title"],
        vec!["This field may not be blank.".to_string()]
    );
}

#[tokio::test]
async fn nested_stops_round_trip_over_http() {
    let (api, transport) = client().await;

    let mut editor = NestedEditor::fetch::<Trip, _>(transport.as_ref(), "t1")
        .await
        .unwrap();
    assert_eq!(editor.keys(), vec!["11", "12"]);
    assert_eq!(editor.get("12").unwrap().reference_id, "2");

    editor.remove("11");
    editor
        .commit(transport.as_ref(), json!({ "title": "Rome" }))
        .await
        .unwrap();

    let removal = api.last("/api/trips/landmarks/11/");
    assert_eq!(removal.method, Method::DELETE);
    let patch = api.last("/api/trips/t1/");
    assert_eq!(patch.method, Method::PATCH);
    assert_eq!(
        patch.body["landmarks"],
        json!([{ "id": "12", "visit_order": 2, "visited": false, "skipped": false, "landmark": "2" }])
    );
}

#[tokio::test]
async fn like_accepts_a_json_acknowledgement() {
    let (api, transport) = client().await;
    transport.like("1").await.unwrap();
    assert_eq!(api.last("/api/landmarks/1/like/").method, Method::GET);
}

#[tokio::test]
async fn non_json_success_is_a_decode_error() {
    let (_api, transport) = client().await;
    let err = transport.list("/api/trips/broken/", &PageQuery::new(10)).await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
    assert_eq!(err.class(), ErrorClass::Transient);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let config = SyncConfig {
        base_url: "http://127.0.0.1:1".into(),
        ..SyncConfig::default()
    };
    let transport = HttpTransport::new(&config, Session::new()).unwrap();
    let err = transport.get_by_id(Trip::PATH, "t1").await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
    assert_eq!(err.status(), None);
}
