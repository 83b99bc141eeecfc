//! Reconciliation loop for EtcdCluster.
//!
//! Drives the observed cluster toward the declared spec: seeds the
//! Initialized condition, ensures the owned objects exist, completes the
//! condition, and persists status. The whole sequence is idempotent; the
//! runtime redelivers on error and the next run converges from wherever the
//! previous one stopped.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use kube::{ResourceExt, runtime::controller::Action};
use tracing::{debug, error, info, warn};

use crate::{
    controller::{
        conditions::{TransitionStamping, find_condition, is_condition_true, upsert_condition},
        context::Context,
        ensure::ensure_cluster_objects,
        error::Error,
        store::{ClusterStore, KubeClusterStore},
    },
    crd::{Condition, ConditionType, EtcdCluster, EtcdClusterStatus},
};

/// What to do with a failed status write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteDisposition {
    /// Swallow the error; the next delivered event retries naturally.
    RetrySilently,
    /// Surface the error to the runtime for backoff and redelivery.
    Propagate,
}

/// Classify a status-write failure.
///
/// Optimistic-concurrency conflicts are expected under concurrent writers
/// and are the only locally recovered case; everything else propagates.
pub fn status_write_disposition(err: &kube::Error) -> WriteDisposition {
    match err {
        kube::Error::Api(e) if e.code == 409 => WriteDisposition::RetrySilently,
        _ => WriteDisposition::Propagate,
    }
}

/// Check whether a cluster is marked for deletion.
///
/// Owned objects are garbage-collected through owner references; the loop
/// itself does nothing on deletion.
pub fn is_being_deleted(cluster: &EtcdCluster) -> bool {
    cluster.metadata.deletion_timestamp.is_some()
}

/// Outcome of a reconcile pass that did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReconcileOutcome {
    /// The cluster is marked for deletion; nothing was touched.
    Skipped,
    /// The Initialized condition reached True on this pass and the status
    /// write recording it succeeded.
    Initialized,
    /// The cluster was already initialized and converged again.
    Unchanged,
}

/// Reconcile a cluster against a store.
///
/// Status is persisted on every exit path past the deletion check, success
/// or failure, so a partial failure never leaves stale conditions behind.
pub async fn reconcile_cluster<S: ClusterStore + Sync>(
    cluster: &EtcdCluster,
    store: &S,
) -> Result<ReconcileOutcome, Error> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());

    if is_being_deleted(cluster) {
        debug!(name = %name, "Cluster is being deleted, skipping reconciliation");
        return Ok(ReconcileOutcome::Skipped);
    }

    let generation = cluster.metadata.generation;
    let initialized_type = ConditionType::Initialized.to_string();

    let mut conditions = cluster
        .status
        .as_ref()
        .map(|s| s.conditions.clone())
        .unwrap_or_default();
    let was_initialized = is_condition_true(&conditions, &initialized_type);

    if find_condition(&conditions, &initialized_type).is_none() {
        upsert_condition(
            &mut conditions,
            Condition::initialized(
                false,
                "InitializationStarted",
                "Cluster initialization has started",
                generation,
            ),
            TransitionStamping::Always,
        );
    }

    let ensure_result = ensure_cluster_objects(cluster, store).await;

    if ensure_result.is_ok() {
        upsert_condition(
            &mut conditions,
            Condition::initialized(
                true,
                "InitializationComplete",
                "Cluster initialization is complete",
                generation,
            ),
            TransitionStamping::Always,
        );
    }

    // Finalization: the status write runs on both the success and the
    // failure path, with whatever the condition list looks like now.
    let status_result = persist_status(store, &namespace, &name, conditions).await;

    match ensure_result {
        Ok(()) => {
            status_result?;
            if was_initialized {
                Ok(ReconcileOutcome::Unchanged)
            } else {
                Ok(ReconcileOutcome::Initialized)
            }
        }
        Err(e) => {
            warn!(name = %name, error = %e, "Cannot create cluster auxiliary objects");
            if let Err(status_err) = status_result {
                // the ensure error wins; the next delivery retries the write
                warn!(name = %name, error = %status_err, "Status write failed after ensure error");
            }
            Err(e)
        }
    }
}

/// Reconcile an EtcdCluster.
///
/// Thin wrapper over [`reconcile_cluster`] that wires in the live API
/// store, publishes events, and records metrics. The success event goes
/// out only once the condition is durably recorded.
pub async fn reconcile(cluster: Arc<EtcdCluster>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start_time = Instant::now();
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());

    debug!(name = %name, namespace = %namespace, "Reconciling EtcdCluster");

    let store = KubeClusterStore::new(ctx.client.clone());

    match reconcile_cluster(&cluster, &store).await {
        Ok(ReconcileOutcome::Skipped) => Ok(Action::await_change()),
        Ok(outcome) => {
            if outcome == ReconcileOutcome::Initialized {
                info!(name = %name, "Cluster initialization complete");
                ctx.publish_normal_event(
                    &cluster,
                    "InitializationComplete",
                    "Reconciling",
                    Some("Cluster auxiliary objects created".to_string()),
                )
                .await;
            }

            // Record metrics
            if let Some(ref health_state) = ctx.health_state {
                let duration = start_time.elapsed().as_secs_f64();
                health_state
                    .metrics
                    .record_reconcile(&namespace, &name, duration);
                health_state.last_reconcile.store(
                    jiff::Timestamp::now().as_second().max(0) as u64,
                    Ordering::Relaxed,
                );
            }

            Ok(Action::await_change())
        }
        Err(e) => {
            ctx.publish_warning_event(
                &cluster,
                "ReconcileFailed",
                "Reconciling",
                Some(e.to_string()),
            )
            .await;
            Err(e)
        }
    }
}

/// Error policy for the controller
pub fn error_policy(cluster: Arc<EtcdCluster>, error: &Error, ctx: Arc<Context>) -> Action {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());

    // Record error metric
    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_error(&namespace, &name);
    }

    if error.is_not_found() {
        // Expected after deletion when watch events for owned objects still
        // trigger reconciliation of the vanished cluster.
        debug!(name = %name, "Cluster not found (likely deleted)");
        return Action::await_change();
    }

    if error.is_retryable() {
        warn!(name = %name, error = %error, "Retryable error, will retry");
        Action::requeue(error.requeue_after())
    } else {
        error!(name = %name, error = %error, "Non-retryable error");
        Action::requeue(error.requeue_after())
    }
}

/// Persist cluster status, classifying write failures.
async fn persist_status<S: ClusterStore + Sync>(
    store: &S,
    namespace: &str,
    name: &str,
    conditions: Vec<Condition>,
) -> Result<(), Error> {
    let status = EtcdClusterStatus { conditions };

    match store.patch_cluster_status(namespace, name, &status).await {
        Ok(()) => Ok(()),
        Err(err) => match status_write_disposition(&err) {
            WriteDisposition::RetrySilently => {
                debug!(name = %name, error = %err, "Status write conflict, retrying on next event");
                Ok(())
            }
            WriteDisposition::Propagate => Err(Error::api("cannot update cluster status", err)),
        },
    }
}
