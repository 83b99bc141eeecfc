//! Reconcile-flow scenarios against the in-memory store.
//!
//! Covers the lifecycle a live cluster would exercise: initial creation,
//! repeated convergence, a mid-sequence failure, deletion, and status-write
//! failure handling.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use etcd_operator::controller::reconciler::{ReconcileOutcome, reconcile_cluster};

use crate::mock_store::{MockClusterStore, Op, test_cluster};

#[tokio::test]
async fn test_first_reconcile_creates_all_objects() {
    let cluster = test_cluster("demo");
    let store = MockClusterStore::new();

    let outcome = reconcile_cluster(&cluster, &store).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Initialized);

    let counts = store.counts();
    assert_eq!(counts.configmap_creates, 1);
    assert_eq!(counts.service_creates, 1);
    assert_eq!(counts.statefulset_creates, 1);
    assert_eq!(counts.status_patches, 1);

    let status = store.recorded_status().unwrap();
    assert_eq!(status.conditions.len(), 1);
    let condition = &status.conditions[0];
    assert_eq!(condition.r#type, "Initialized");
    assert_eq!(condition.status, "True");
    assert_eq!(condition.reason, "InitializationComplete");
}

#[tokio::test]
async fn test_second_reconcile_creates_nothing_new() {
    let mut cluster = test_cluster("demo");
    let store = MockClusterStore::new();

    reconcile_cluster(&cluster, &store).await.unwrap();
    // the watch redelivers the object carrying the status the first pass wrote
    cluster.status = store.recorded_status();

    let outcome = reconcile_cluster(&cluster, &store).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged);

    let counts = store.counts();
    assert_eq!(counts.configmap_creates, 1);
    assert_eq!(counts.service_creates, 1);
    assert_eq!(counts.statefulset_creates, 1);
    // the existing statefulset is refreshed in place, never recreated
    assert_eq!(counts.statefulset_replaces, 1);
}

#[tokio::test]
async fn test_midway_failure_leaves_initialized_false() {
    let cluster = test_cluster("demo");
    let store = MockClusterStore::new();
    store.fail_with(Op::GetService, 500);

    let err = reconcile_cluster(&cluster, &store).await.unwrap_err();
    assert!(err.to_string().starts_with("cannot get cluster service"));

    // the configmap step ran; the statefulset step was never reached
    let counts = store.counts();
    assert_eq!(counts.configmap_creates, 1);
    assert_eq!(counts.statefulset_gets, 0);
    assert_eq!(counts.statefulset_creates, 0);
    assert!(store.statefulset().is_none());

    // status was still written, with initialization incomplete
    let status = store.recorded_status().unwrap();
    let condition = &status.conditions[0];
    assert_eq!(condition.r#type, "Initialized");
    assert_eq!(condition.status, "False");
    assert_eq!(condition.reason, "InitializationStarted");
}

#[tokio::test]
async fn test_deletion_short_circuits_without_any_calls() {
    let mut cluster = test_cluster("demo");
    cluster.metadata.deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
    let store = MockClusterStore::new();

    let outcome = reconcile_cluster(&cluster, &store).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Skipped);

    assert_eq!(store.counts().total(), 0);
    assert!(store.recorded_status().is_none());
}

#[tokio::test]
async fn test_status_write_failure_is_not_reported_as_success() {
    let cluster = test_cluster("demo");
    let store = MockClusterStore::new();
    store.fail_with(Op::PatchStatus, 500);

    // objects come up fine, but the run must not complete as Initialized
    // when the condition recording it was never persisted
    let err = reconcile_cluster(&cluster, &store).await.unwrap_err();
    assert!(err.to_string().starts_with("cannot update cluster status"));
    assert_eq!(store.counts().statefulset_creates, 1);
}

#[tokio::test]
async fn test_status_write_conflict_is_swallowed() {
    let cluster = test_cluster("demo");
    let store = MockClusterStore::new();
    store.fail_with(Op::PatchStatus, 409);

    // a conflicting concurrent writer is benign; the next event retries
    let outcome = reconcile_cluster(&cluster, &store).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Initialized);
}
