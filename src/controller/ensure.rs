//! Idempotent ensure steps for cluster-owned resources.
//!
//! Each step follows the same read-or-create pattern: get the object by its
//! derived name, create it when absent, and leave it alone (or update the
//! one mutable field) when present. NotFound is the only read outcome handled
//! locally; everything else surfaces with operation context so the runtime
//! retries the whole sequence. Re-running the full sequence is the recovery
//! mechanism; nothing is rolled back on a later step's failure.

use kube::ResourceExt;
use tracing::{debug, info};

use crate::controller::error::{Error, Result};
use crate::controller::store::ClusterStore;
use crate::crd::EtcdCluster;
use crate::resources::configmap::generate_state_configmap;
use crate::resources::services::generate_headless_service;
use crate::resources::statefulset::{apply_storage_size, generate_statefulset};

/// Ensure all objects owned by a cluster exist and are up to date.
///
/// Order matters: the StatefulSet's pod environment is sourced from the
/// cluster-state ConfigMap, so the ConfigMap is ensured first and its name
/// is threaded through to the StatefulSet step.
pub async fn ensure_cluster_objects<S: ClusterStore + Sync>(
    cluster: &EtcdCluster,
    store: &S,
) -> Result<()> {
    let state_configmap = ensure_cluster_state_configmap(cluster, store).await?;
    ensure_headless_service(cluster, store).await?;
    ensure_statefulset(cluster, store, &state_configmap).await?;
    Ok(())
}

/// Ensure the cluster-state ConfigMap exists, returning its name.
///
/// Created once with the "new" bootstrap state; an existing ConfigMap is
/// never touched.
pub async fn ensure_cluster_state_configmap<S: ClusterStore + Sync>(
    cluster: &EtcdCluster,
    store: &S,
) -> Result<String> {
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    let name = crate::resources::common::cluster_state_configmap_name(&cluster.name_any());

    match store.get_configmap(&namespace, &name).await {
        Ok(Some(_)) => {
            debug!(name = %name, "Cluster state configmap exists, skipping");
            Ok(name)
        }
        Ok(None) => {
            let configmap = generate_state_configmap(cluster)?;
            store
                .create_configmap(&namespace, &configmap)
                .await
                .map_err(|e| Error::api("cannot create cluster state configmap", e))?;
            info!(name = %name, "Created cluster state configmap");
            Ok(name)
        }
        Err(e) => Err(Error::api("cannot get cluster state configmap", e)),
    }
}

/// Ensure the headless Service exists.
///
/// The service spec is not reconciled after creation.
pub async fn ensure_headless_service<S: ClusterStore + Sync>(
    cluster: &EtcdCluster,
    store: &S,
) -> Result<()> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());

    match store.get_service(&namespace, &name).await {
        Ok(Some(_)) => {
            debug!(name = %name, "Cluster service exists, skipping");
            Ok(())
        }
        Ok(None) => {
            let service = generate_headless_service(cluster)?;
            store
                .create_service(&namespace, &service)
                .await
                .map_err(|e| Error::api("cannot create cluster service", e))?;
            info!(name = %name, "Created cluster service");
            Ok(())
        }
        Err(e) => Err(Error::api("cannot get cluster service", e)),
    }
}

/// Ensure the StatefulSet exists and carries the current storage size.
///
/// A missing StatefulSet is built from scratch with the bootstrap topology
/// baked in; an existing one keeps its immutable fields (selector, replica
/// count, startup arguments) and only has its data volume size refreshed.
/// `state_configmap` must name an already-ensured ConfigMap.
pub async fn ensure_statefulset<S: ClusterStore + Sync>(
    cluster: &EtcdCluster,
    store: &S,
    state_configmap: &str,
) -> Result<()> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());

    let (mut statefulset, existed) = match store.get_statefulset(&namespace, &name).await {
        Ok(Some(existing)) => (existing, true),
        Ok(None) => (generate_statefulset(cluster, state_configmap)?, false),
        Err(e) => return Err(Error::api("cannot get cluster statefulset", e)),
    };

    // Replica resize is not supported yet; only the volume size tracks the
    // spec after creation.
    apply_storage_size(&mut statefulset, &cluster.spec.storage.size);

    if existed {
        store
            .replace_statefulset(&namespace, &name, &statefulset)
            .await
            .map_err(|e| Error::api("cannot update statefulset", e))?;
        debug!(name = %name, "Updated cluster statefulset");
    } else {
        store
            .create_statefulset(&namespace, &statefulset)
            .await
            .map_err(|e| Error::api("cannot create statefulset", e))?;
        info!(name = %name, replicas = cluster.spec.replicas, "Created cluster statefulset");
    }

    Ok(())
}
