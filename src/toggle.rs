//! RelationshipToggle - optimistic follow / like switches.
//!
//! A flip is written to the local view before the mutation is sent, then
//! replaced by the server's record once the mutation succeeds. A failed
//! mutation leaves the optimistic value in place until the list is
//! refreshed; there is no automatic rollback. Once the list has reloaded,
//! its rows are authoritative again.
//!
//! ## Example
//!
//! ```ignore
//! let toggles = RelationshipToggle::new(transport.clone());
//! let account: Account = accounts.find("u1").unwrap();
//! let shown = toggles.view_in(&accounts, &account);
//! match toggles.flip_in(&accounts, &shown).await? {
//!     FlipOutcome::Reconciled(edge) => assert!(edge.active),
//!     other => log::debug!("flip skipped: {:?}", other),
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::error::TransportError;
use crate::list::ResourceList;
use crate::resource::{Edge, EdgeKind, Relatable};
use crate::transport::Transport;

type EdgeKey = (EdgeKind, String);

/// Result of a successful `flip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Mutation sent and the edge re-read from the server.
    Reconciled(Edge),
    /// Mutation sent but the re-read failed; the optimistic edge stands.
    Unconfirmed(Edge),
    /// The list has not reloaded since this edge was flipped and the
    /// caller's row predates the flip. Nothing was sent.
    AlreadySet(Edge),
    /// A flip of the same edge is still in flight. Nothing was sent.
    Busy,
}

/// Locally held edge. `generation` is the list generation the flip was
/// made against; `None` for flips outside a list.
struct Overlay {
    edge: Edge,
    generation: Option<u64>,
}

#[derive(Default)]
struct ToggleView {
    edges: HashMap<EdgeKey, Overlay>,
    in_flight: HashSet<EdgeKey>,
}

pub struct RelationshipToggle<T: ?Sized> {
    transport: Arc<T>,
    view: Mutex<ToggleView>,
}

impl<T: Transport + ?Sized> RelationshipToggle<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            view: Mutex::new(ToggleView::default()),
        }
    }

    /// Last edge this manager wrote for `object_id`, if any.
    pub fn edge(&self, kind: EdgeKind, object_id: &str) -> Option<Edge> {
        self.view()
            .edges
            .get(&(kind, object_id.to_string()))
            .map(|overlay| overlay.edge.clone())
    }

    /// The edge to display for `record`: the optimistic edge while its flip
    /// is in flight, otherwise the record's own flag and counter.
    pub fn view_of<R: Relatable>(&self, record: &R) -> Edge {
        let edge = record.edge();
        let key: EdgeKey = (edge.kind, edge.object_id.clone());
        let view = self.view();
        match view.edges.get(&key) {
            Some(overlay) if view.in_flight.contains(&key) => overlay.edge.clone(),
            _ => edge,
        }
    }

    pub fn is_pending(&self, kind: EdgeKind, object_id: &str) -> bool {
        self.view().in_flight.contains(&(kind, object_id.to_string()))
    }

    /// Drop every locally held edge that is not in flight.
    pub fn clear(&self) {
        let mut view = self.view();
        let ToggleView { edges, in_flight } = &mut *view;
        edges.retain(|key, _| in_flight.contains(key));
    }

    /// Invert `edge`, taking it as the current state.
    ///
    /// The flipped edge (flag inverted, counter moved by one) is visible
    /// through [`edge`](Self::edge) before the mutation is sent. On success
    /// the record is re-read and its edge replaces the optimistic one.
    pub async fn flip<R: Relatable>(&self, edge: &Edge) -> Result<FlipOutcome, TransportError> {
        self.run::<R>(edge, None).await
    }

    async fn run<R: Relatable>(
        &self,
        edge: &Edge,
        generation: Option<u64>,
    ) -> Result<FlipOutcome, TransportError> {
        let key: EdgeKey = (edge.kind, edge.object_id.clone());
        let optimistic = {
            let mut view = self.view();
            if view.in_flight.contains(&key) {
                debug!("{:?} {} already in flight", edge.kind, edge.object_id);
                return Ok(FlipOutcome::Busy);
            }
            if let Some(known) = view.edges.get(&key) {
                let same_rows = generation.is_some() && known.generation == generation;
                if same_rows && known.edge.active != edge.active {
                    return Ok(FlipOutcome::AlreadySet(known.edge.clone()));
                }
            }
            let optimistic = edge.flipped();
            view.edges.insert(
                key.clone(),
                Overlay {
                    edge: optimistic.clone(),
                    generation,
                },
            );
            view.in_flight.insert(key.clone());
            optimistic
        };

        let sent = self.send(&optimistic).await;
        if let Err(err) = sent {
            self.view().in_flight.remove(&key);
            warn!(
                "{:?} {} failed, keeping optimistic state: {}",
                edge.kind, edge.object_id, err
            );
            return Err(err);
        }
        info!("{:?} {} -> {}", edge.kind, edge.object_id, optimistic.active);

        let fetched = match self.transport.get_by_id(R::PATH, &edge.object_id).await {
            Ok(body) => serde_json::from_value::<R>(body).map_err(TransportError::from),
            Err(err) => Err(err),
        };

        let mut view = self.view();
        view.in_flight.remove(&key);
        match fetched {
            Ok(record) => {
                let canonical = record.edge();
                view.edges.insert(
                    key,
                    Overlay {
                        edge: canonical.clone(),
                        generation,
                    },
                );
                Ok(FlipOutcome::Reconciled(canonical))
            }
            Err(err) => {
                warn!("could not re-read {}{}: {}", R::PATH, edge.object_id, err);
                Ok(FlipOutcome::Unconfirmed(optimistic))
            }
        }
    }

    async fn send(&self, target: &Edge) -> Result<(), TransportError> {
        let id = target.object_id.as_str();
        match (target.kind, target.active) {
            (EdgeKind::Follow, true) => self.transport.follow(id).await,
            (EdgeKind::Follow, false) => self.transport.unfollow(id).await,
            (EdgeKind::Like, true) => self.transport.like(id).await,
            (EdgeKind::Like, false) => self.transport.unlike(id).await,
        }
    }

    fn view(&self) -> MutexGuard<'_, ToggleView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport + ?Sized + 'static> RelationshipToggle<T> {
    /// The edge to display for a row of `list`.
    ///
    /// The local edge wins while its flip is in flight and, after the flip
    /// settled, until `list` loads again. A failed flip therefore keeps
    /// showing its optimistic state until the next refresh.
    pub fn view_in<R: Relatable>(&self, list: &ResourceList<R, T>, record: &R) -> Edge {
        let edge = record.edge();
        let key: EdgeKey = (edge.kind, edge.object_id.clone());
        let current = Some(list.generation());
        let view = self.view();
        match view.edges.get(&key) {
            Some(overlay) if view.in_flight.contains(&key) || overlay.generation == current => {
                overlay.edge.clone()
            }
            _ => edge,
        }
    }

    /// Flip an edge shown in `list` and, if the mutation went through,
    /// refresh `list`.
    ///
    /// `edge` is taken as current unless `list` has not reloaded since
    /// this edge was last flipped and `edge` disagrees with the local one,
    /// in which case the row is stale and nothing is sent.
    pub async fn flip_in<R: Relatable>(
        &self,
        list: &ResourceList<R, T>,
        edge: &Edge,
    ) -> Result<FlipOutcome, TransportError> {
        let outcome = self.run::<R>(edge, Some(list.generation())).await?;
        if matches!(
            outcome,
            FlipOutcome::Reconciled(_) | FlipOutcome::Unconfirmed(_)
        ) {
            list.refresh().await;
        }
        Ok(outcome)
    }
}
