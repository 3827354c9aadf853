//! Test transport: the in-memory backend behind configurable latency.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use console_sync::resource::Resource;
use console_sync::resources::{Account, City, Landmark, Trip};
use console_sync::{Call, InMemoryTransport, PageQuery, SyncConfig, Transport, TransportError};
use serde_json::{json, Value};

type Latency = Box<dyn Fn(&Call) -> Duration + Send + Sync>;

/// Wraps [`InMemoryTransport`], sleeping before each call for as long as
/// `latency` says. Run under `start_paused` so the sleeps are virtual.
pub struct SlowTransport {
    pub backend: InMemoryTransport,
    latency: Latency,
}

impl SlowTransport {
    pub fn new<F>(backend: InMemoryTransport, latency: F) -> Arc<Self>
    where
        F: Fn(&Call) -> Duration + Send + Sync + 'static,
    {
        Arc::new(Self {
            backend,
            latency: Box::new(latency),
        })
    }

    async fn pause(&self, call: Call) {
        let delay = (self.latency)(&call);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Transport for SlowTransport {
    async fn list(&self, path: &str, query: &PageQuery) -> Result<Value, TransportError> {
        self.pause(Call::List {
            path: path.into(),
            query: query.clone(),
        })
        .await;
        self.backend.list(path, query).await
    }

    async fn get_by_id(&self, path: &str, id: &str) -> Result<Value, TransportError> {
        self.pause(Call::Get {
            path: path.into(),
            id: id.into(),
        })
        .await;
        self.backend.get_by_id(path, id).await
    }

    async fn create(&self, path: &str, body: Value) -> Result<Value, TransportError> {
        self.backend.create(path, body).await
    }

    async fn update(&self, path: &str, id: &str, body: Value) -> Result<Value, TransportError> {
        self.backend.update(path, id, body).await
    }

    async fn partial_update(
        &self,
        path: &str,
        id: &str,
        body: Value,
    ) -> Result<Value, TransportError> {
        self.backend.partial_update(path, id, body).await
    }

    async fn remove(&self, path: &str, id: &str) -> Result<(), TransportError> {
        self.backend.remove(path, id).await
    }

    async fn follow(&self, user_id: &str) -> Result<(), TransportError> {
        self.pause(Call::Follow(user_id.into())).await;
        self.backend.follow(user_id).await
    }

    async fn unfollow(&self, user_id: &str) -> Result<(), TransportError> {
        self.pause(Call::Unfollow(user_id.into())).await;
        self.backend.unfollow(user_id).await
    }

    async fn like(&self, record_id: &str) -> Result<(), TransportError> {
        self.pause(Call::Like(record_id.into())).await;
        self.backend.like(record_id).await
    }

    async fn unlike(&self, record_id: &str) -> Result<(), TransportError> {
        self.pause(Call::Unlike(record_id.into())).await;
        self.backend.unlike(record_id).await
    }

    async fn list_nested(&self, parent_id: &str) -> Result<Value, TransportError> {
        self.backend.list_nested(parent_id).await
    }

    async fn remove_nested(&self, item_id: &str) -> Result<(), TransportError> {
        self.backend.remove_nested(item_id).await
    }
}

pub fn config() -> SyncConfig {
    SyncConfig::default()
}

/// 25 places, odd ids in Rome and even ids in Paris.
pub fn places() -> InMemoryTransport {
    let backend = InMemoryTransport::new();
    backend.seed(
        Landmark::PATH,
        (1..=25).map(|n| {
            json!({
                "id": format!("l{}", n),
                "name": format!("Place {}", n),
                "city": if n % 2 == 0 { "paris" } else { "rome" },
                "likes": n,
                "is_liked": false,
            })
        }),
    );
    backend
}

pub fn cities(names: &[&str]) -> InMemoryTransport {
    let backend = InMemoryTransport::new();
    backend.seed(
        City::PATH,
        names
            .iter()
            .enumerate()
            .map(|(n, name)| json!({ "id": n + 1, "name": name })),
    );
    backend
}

pub fn account(followers: u64, is_following: bool) -> InMemoryTransport {
    let backend = InMemoryTransport::new();
    backend.seed(
        Account::PATH,
        [json!({
            "id": "u1",
            "nickname": "ana",
            "followers": followers,
            "is_following": is_following,
        })],
    );
    backend
}

/// One trip with stops A(1), B(2), C(3).
pub fn trip() -> InMemoryTransport {
    let backend = InMemoryTransport::new();
    backend.seed(
        Trip::PATH,
        [json!({
            "id": "t1",
            "title": "Rome weekend",
            "status": "SC",
            "landmarks": [
                { "id": "a", "trip": "t1", "visit_order": 1, "landmark": { "id": "l1", "name": "Colosseum" } },
                { "id": "b", "trip": "t1", "visit_order": 2, "landmark": { "id": "l2", "name": "Pantheon" } },
                { "id": "c", "trip": "t1", "visit_order": 3, "landmark": { "id": "l3", "name": "Trevi" } },
            ]
        })],
    );
    backend
}

pub fn list_calls(backend: &InMemoryTransport) -> Vec<PageQuery> {
    backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::List { query, .. } => Some(query),
            _ => None,
        })
        .collect()
}
