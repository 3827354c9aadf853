//! Optimistic relationship flips.

use std::sync::Arc;
use std::time::Duration;

use console_sync::resources::{Account, Landmark};
use console_sync::{
    Call, Edge, EdgeKind, FlipOutcome, InMemoryTransport, Relatable, Resource, ResourceList,
    RelationshipToggle, TransportError,
};

use crate::support::{account, config, places, SlowTransport};

fn follow_edge(active: bool, counter: u64) -> Edge {
    Edge {
        kind: EdgeKind::Follow,
        object_id: "u1".into(),
        active,
        counter,
    }
}

#[tokio::test(start_paused = true)]
async fn flip_is_visible_before_the_server_answers() {
    let transport = SlowTransport::new(account(10, false), |call| match call {
        Call::Follow(_) => Duration::from_millis(200),
        _ => Duration::ZERO,
    });
    let toggles = Arc::new(RelationshipToggle::new(transport.clone()));

    let flip = tokio::spawn({
        let toggles = toggles.clone();
        async move { toggles.flip::<Account>(&follow_edge(false, 10)).await }
    });
    tokio::task::yield_now().await;

    assert_eq!(toggles.edge(EdgeKind::Follow, "u1"), Some(follow_edge(true, 11)));
    assert!(toggles.is_pending(EdgeKind::Follow, "u1"));
    let stored = transport.backend.record(Account::PATH, "u1").unwrap();
    assert_eq!(stored["followers"], 10);

    // The button is disabled while the flip is outstanding.
    assert_eq!(
        toggles.flip::<Account>(&follow_edge(true, 11)).await.unwrap(),
        FlipOutcome::Busy
    );

    let outcome = flip.await.unwrap().unwrap();
    assert_eq!(outcome, FlipOutcome::Reconciled(follow_edge(true, 11)));
    assert_eq!(toggles.edge(EdgeKind::Follow, "u1"), Some(follow_edge(true, 11)));
    assert_eq!(
        transport
            .backend
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::Follow(_)))
            .count(),
        1
    );
}

#[tokio::test]
async fn reconciliation_adopts_server_counter() {
    let backend = account(10, false);
    let toggles = RelationshipToggle::new(Arc::new(backend.clone()));

    // The row is stale and shows an older follower count.
    let mut row: Account = serde_json::from_value(backend.record(Account::PATH, "u1").unwrap())
        .unwrap();
    row.followers = 9;

    let outcome = toggles.flip::<Account>(&row.edge()).await.unwrap();
    assert_eq!(outcome, FlipOutcome::Reconciled(follow_edge(true, 11)));
}

#[tokio::test]
async fn failed_flip_holds_until_the_next_refresh() {
    let backend = places();
    let transport = Arc::new(backend.clone());
    let list: ResourceList<Landmark, InMemoryTransport> =
        ResourceList::new(transport.clone(), &config());
    list.refresh().await;
    let toggles = RelationshipToggle::new(transport);
    let like = |active, counter| Edge {
        kind: EdgeKind::Like,
        object_id: "l3".into(),
        active,
        counter,
    };

    backend.fail_when(
        |call| matches!(call, Call::Like(_)),
        TransportError::Server {
            status: 500,
            detail: "boom".into(),
        },
    );
    let place = list.find("l3").unwrap();
    assert!(toggles.flip_in(&list, &place.edge()).await.is_err());

    // No rollback: the optimistic like stays on screen.
    assert_eq!(toggles.view_in(&list, &place), like(true, 4));
    assert_eq!(list.generation(), 1);

    list.refresh().await;
    let place = list.find("l3").unwrap();
    assert_eq!(toggles.view_in(&list, &place), like(false, 3));
    assert_eq!(toggles.view_of(&place), like(false, 3));

    backend.clear_calls();
    let outcome = toggles.flip_in(&list, &place.edge()).await.unwrap();
    assert_eq!(outcome, FlipOutcome::Reconciled(like(true, 4)));
    assert_eq!(backend.calls()[0], Call::Like("l3".into()));
    assert!(list.find("l3").unwrap().is_liked);
}

#[tokio::test]
async fn flip_in_refreshes_the_list() {
    let backend = places();
    let transport = Arc::new(backend.clone());
    let list: ResourceList<Landmark, InMemoryTransport> =
        ResourceList::new(transport.clone(), &config());
    list.refresh().await;
    let toggles = RelationshipToggle::new(transport);

    let place = list.find("l1").unwrap();
    toggles.flip_in(&list, &place.edge()).await.unwrap();

    let refreshed = list.find("l1").unwrap();
    assert!(refreshed.is_liked);
    assert_eq!(refreshed.likes, 2);
    assert_eq!(list.generation(), 2);
}
