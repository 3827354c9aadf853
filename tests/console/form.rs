//! Form sessions against a slow backend.

use std::sync::Arc;
use std::time::Duration;

use console_sync::resources::{City, Trip, TripStatus};
use console_sync::{
    Call, CloseReason, DeleteOutcome, FormSession, FormStatus, ListStatus, PageQuery,
    ResourceList, Resource, SubmitOutcome, TransportError,
};

use crate::support::{cities, config, trip, SlowTransport};

fn row() -> Trip {
    Trip {
        id: "t1".into(),
        title: "Rome weekend".into(),
        ..Trip::default()
    }
}

#[tokio::test(start_paused = true)]
async fn cancelling_while_opening_discards_the_detail() {
    let transport = SlowTransport::new(trip(), |call| match call {
        Call::Get { .. } => Duration::from_millis(300),
        _ => Duration::ZERO,
    });
    let form: FormSession<Trip, SlowTransport> =
        FormSession::new(ResourceList::new(transport, &config()));

    let opening = tokio::spawn({
        let form = form.clone();
        async move { form.open_edit(row()).await }
    });
    tokio::task::yield_now().await;
    assert_eq!(form.status(), FormStatus::Opening);

    assert!(form.cancel());
    opening.await.unwrap().unwrap();

    assert_eq!(form.status(), FormStatus::Closed(Some(CloseReason::Cancelled)));
    assert!(form.draft().is_none());
}

#[tokio::test(start_paused = true)]
async fn reopening_keeps_only_the_latest_record() {
    let backend = trip();
    backend.seed(Trip::PATH, [serde_json::json!({ "id": "t2", "title": "Paris" })]);
    let transport = SlowTransport::new(backend, |call| match call {
        Call::Get { id, .. } if id == "t1" => Duration::from_millis(300),
        _ => Duration::ZERO,
    });
    let form: FormSession<Trip, SlowTransport> =
        FormSession::new(ResourceList::new(transport, &config()));

    let first = tokio::spawn({
        let form = form.clone();
        async move { form.open_edit(row()).await }
    });
    tokio::task::yield_now().await;

    let paris = Trip {
        id: "t2".into(),
        ..Trip::default()
    };
    form.open_edit(paris).await.unwrap();
    first.await.unwrap().unwrap();

    assert_eq!(form.status(), FormStatus::Open);
    assert_eq!(form.draft().unwrap().title, "Paris");
}

#[tokio::test]
async fn nested_fallback_uses_the_detail_record() {
    let backend = trip();
    backend.fail_when(
        |call| matches!(call, Call::ListNested(_)),
        TransportError::Network("offline".into()),
    );
    let form: FormSession<Trip, _> =
        FormSession::new(ResourceList::new(Arc::new(backend), &config()));

    form.open_edit(row()).await.unwrap();
    let stops = form.nested().unwrap();
    assert_eq!(stops.keys(), vec!["a", "b", "c"]);
    assert_eq!(stops.parent_id(), "t1");
}

#[tokio::test]
async fn create_submits_stops_with_the_parent() {
    let backend = trip();
    let form: FormSession<Trip, _> =
        FormSession::new(ResourceList::new(Arc::new(backend.clone()), &config()));

    form.open_create(Trip {
        title: "Lisbon".into(),
        status: TripStatus::Scheduled,
        ..Trip::default()
    })
    .unwrap();
    form.edit_nested(|stops| {
        stops.add("l7", 1);
        stops.add("l8", 2);
    })
    .unwrap();

    let SubmitOutcome::Committed(Some(created)) = form.submit().await.unwrap() else {
        panic!("expected the created trip");
    };
    assert_eq!(created.title, "Lisbon");
    assert_eq!(created.landmarks.len(), 2);
    assert!(created.landmarks.iter().all(|stop| stop.is_persisted()));

    let body = backend
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::Create { body, .. } => Some(body),
            _ => None,
        })
        .unwrap();
    assert_eq!(body["landmarks"][0]["landmark"], "l7");
    assert!(body["landmarks"][0].get("id").is_none());
    assert_eq!(body["status"], "SC");
}

#[tokio::test]
async fn server_error_on_delete_still_refreshes() {
    let backend = trip();
    backend.fail_when(
        |call| matches!(call, Call::Remove { .. }),
        TransportError::Server {
            status: 500,
            detail: "boom".into(),
        },
    );
    let form: FormSession<Trip, _> =
        FormSession::new(ResourceList::new(Arc::new(backend.clone()), &config()));

    form.request_delete(row()).unwrap();
    let outcome = form.confirm_delete().await.unwrap();
    assert!(matches!(outcome, DeleteOutcome::Uncertain(_)));
    assert!(form.pending_delete().is_none());
    assert!(matches!(backend.calls().last(), Some(Call::List { .. })));
    assert_eq!(form.list().items().len(), 1);
}

#[tokio::test]
async fn deleting_the_last_row_of_the_last_page_moves_back() {
    let backend = cities(&["Rome", "Paris", "Lisbon"]);
    let list: ResourceList<City, _> = ResourceList::new(Arc::new(backend.clone()), &config());
    list.load(PageQuery::new(2).with_page(2)).await;
    let lisbon = list.find("3").unwrap();
    let form = FormSession::new(list.clone());

    form.request_delete(lisbon).unwrap();
    assert_eq!(form.confirm_delete().await.unwrap(), DeleteOutcome::Deleted);

    let names: Vec<String> = list.items().into_iter().map(|city| city.name).collect();
    assert_eq!(names, vec!["Rome", "Paris"]);
    assert_eq!(list.status(), ListStatus::Populated);
    assert_eq!(list.error(), None);
    assert_eq!(list.page().page_number, 1);
    assert_eq!(list.page().total_count, 2);
}
