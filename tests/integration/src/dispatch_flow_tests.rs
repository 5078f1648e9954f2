//! End-to-end dispatch flow tests
//!
//! Covers:
//! - the nearest-unit worked example with the upstream distance/ETA contract
//! - the full accept -> arrive -> complete lifecycle
//! - decline cascades that exhaust the candidate pool
//! - feed-to-journal audit capture

use lifelink_core::{EventJournal, JournalRecord};
use lifelink_domain::{EmergencyStatus, Priority, UnitStatus};
use lifelink_dispatch::DispatchOutcome;

use crate::test_utils::{request_at, DispatchHarness};

#[tokio::test]
async fn test_worked_example_city_hall_unit_wins() {
    let harness = DispatchHarness::new();
    harness.add_ready_unit("u-city-hall", 40.7128, -74.0060).await;
    harness.add_ready_unit("u-brooklyn", 40.6782, -73.9442).await;

    let outcome = harness
        .engine
        .create_emergency(request_at(40.7580, -73.9855, Priority::Critical))
        .await
        .unwrap();

    let DispatchOutcome::Assigned(assignment) = outcome else {
        panic!("expected an assignment");
    };

    // City hall to Times Square is 5.31 km by great-circle; at the
    // critical 80 km/h that rounds up to a four-minute ETA.
    assert_eq!(assignment.unit_id, "u-city-hall");
    assert_eq!(format!("{:.2} km", assignment.distance_km), "5.31 km");
    assert_eq!(assignment.eta.minutes, 4);
    assert_eq!(assignment.eta.to_string(), "0:04");

    let loser = harness.board.unit_snapshot("u-brooklyn").await.unwrap();
    assert_eq!(loser.status, UnitStatus::Available);
    assert!(loser.active_emergency_id.is_none());
}

#[tokio::test]
async fn test_full_lifecycle_round_trip() {
    let harness = DispatchHarness::new();
    harness.add_ready_unit("u1", 40.76, -73.99).await;

    let outcome = harness
        .engine
        .create_emergency(request_at(40.758, -73.9855, Priority::High))
        .await
        .unwrap();
    let DispatchOutcome::Assigned(assignment) = outcome else {
        panic!("expected an assignment");
    };
    let emergency_id = assignment.emergency_id;

    harness.lifecycle.accept(&emergency_id, "u1").await.unwrap();
    harness
        .lifecycle
        .mark_arrival(&emergency_id, "u1", None)
        .await
        .unwrap();
    harness
        .lifecycle
        .complete(&emergency_id, "u1")
        .await
        .unwrap();

    let record = harness.board.emergency_snapshot(&emergency_id).await.unwrap();
    assert_eq!(record.status, EmergencyStatus::Completed);
    assert_eq!(record.assigned_unit_id.as_deref(), Some("u1"));

    let dispatched_at = record.dispatched_at.unwrap();
    let arrived_at = record.arrived_at.unwrap();
    let completed_at = record.completed_at.unwrap();
    assert!(record.created_at <= dispatched_at);
    assert!(dispatched_at <= arrived_at);
    assert!(arrived_at <= completed_at);

    let unit = harness.board.unit_snapshot("u1").await.unwrap();
    assert_eq!(unit.status, UnitStatus::Available);
    assert!(unit.active_emergency_id.is_none());
    // The arrival pinned the unit to the scene.
    assert_eq!(unit.location, Some(record.location));
}

#[tokio::test]
async fn test_decline_cascade_exhausts_pool() {
    let harness = DispatchHarness::new();
    harness.add_ready_unit("u-near", 40.757, -73.985).await;
    harness.add_ready_unit("u-far", 40.70, -74.01).await;

    let outcome = harness
        .engine
        .create_emergency(request_at(40.758, -73.9855, Priority::High))
        .await
        .unwrap();
    let emergency_id = outcome.emergency_id().to_string();
    assert!(outcome.is_assigned());

    let outcome = harness
        .lifecycle
        .decline(&emergency_id, "u-near")
        .await
        .unwrap();
    let DispatchOutcome::Assigned(assignment) = outcome else {
        panic!("expected a reassignment");
    };
    assert_eq!(assignment.unit_id, "u-far");

    let outcome = harness
        .lifecycle
        .decline(&emergency_id, "u-far")
        .await
        .unwrap();
    assert!(!outcome.is_assigned());

    let record = harness.board.emergency_snapshot(&emergency_id).await.unwrap();
    assert_eq!(record.status, EmergencyStatus::Pending);
    assert!(record.assigned_unit_id.is_none());
    assert_eq!(
        record.declined_by,
        vec!["u-near".to_string(), "u-far".to_string()]
    );

    for id in ["u-near", "u-far"] {
        let unit = harness.board.unit_snapshot(id).await.unwrap();
        assert_eq!(unit.status, UnitStatus::Available);
        assert!(unit.active_emergency_id.is_none());
    }

    // Both candidates are burned; a manual retry still queues.
    let retried = harness.engine.redispatch(&emergency_id).await.unwrap();
    assert!(!retried.is_assigned());
}

#[tokio::test]
async fn test_feed_events_land_in_journal() {
    let harness = DispatchHarness::new();
    let mut events = harness.feed.subscribe();
    harness.add_ready_unit("u1", 40.76, -73.99).await;

    let outcome = harness
        .engine
        .create_emergency(request_at(40.758, -73.9855, Priority::High))
        .await
        .unwrap();
    let emergency_id = outcome.emergency_id().to_string();
    harness.lifecycle.accept(&emergency_id, "u1").await.unwrap();
    harness
        .lifecycle
        .mark_arrival(&emergency_id, "u1", None)
        .await
        .unwrap();
    harness
        .lifecycle
        .complete(&emergency_id, "u1")
        .await
        .unwrap();

    // Drain the broadcast backlog into an audit journal the way the
    // gateway's journal task does.
    let mut journal = EventJournal::open_in_memory().unwrap();
    while let Ok(event) = events.try_recv() {
        journal
            .append(&JournalRecord {
                recorded_at: event.occurred_at(),
                kind: event.kind().to_string(),
                emergency_id: event.emergency_id().map(str::to_string),
                unit_id: event.unit_id().map(str::to_string),
                payload: serde_json::to_string(&event).unwrap(),
            })
            .unwrap();
    }

    let kinds: Vec<String> = journal
        .for_emergency(&emergency_id)
        .unwrap()
        .into_iter()
        .map(|record| record.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            "emergency_reported",
            "unit_assigned",
            "unit_en_route",
            "unit_arrived",
            "emergency_completed",
        ]
    );

    let rows = journal.for_emergency(&emergency_id).unwrap();
    for row in &rows {
        let payload: serde_json::Value = serde_json::from_str(&row.payload).unwrap();
        assert_eq!(payload["event"], row.kind.as_str());
    }
}
