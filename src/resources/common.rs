//! Common resource generation utilities.
//!
//! The fixed naming and labelling conventions shared by every managed
//! resource live here, as functions rather than scattered literals, so the
//! rest of the crate (and its tests) can assert on them in one place.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;

use crate::controller::error::Error;
use crate::crd::EtcdCluster;

/// Value of the `app.kubernetes.io/managed-by` label on all managed resources.
pub const MANAGED_BY: &str = "etcd-operator";

/// ConfigMap key declaring the bootstrap state of the cluster.
pub const CLUSTER_STATE_KEY: &str = "ETCD_INITIAL_CLUSTER_STATE";

/// Bootstrap state written at creation. A future transition to "existing"
/// once the cluster has formed is a stated extension point; this loop never
/// mutates the record after creation.
pub const CLUSTER_STATE_NEW: &str = "new";

/// Standard labels applied to all managed resources.
///
/// The same triple is used as the pod selector, so it must stay stable for
/// the lifetime of a cluster.
pub fn standard_labels(resource: &EtcdCluster) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app.kubernetes.io/name".to_string(), "etcd".to_string());
    labels.insert(
        "app.kubernetes.io/instance".to_string(),
        resource.name_any(),
    );
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    labels
}

/// Name of the cluster-state ConfigMap for a cluster.
pub fn cluster_state_configmap_name(cluster_name: &str) -> String {
    format!("{cluster_name}-cluster-state")
}

/// Create a controller owner reference for an EtcdCluster.
///
/// Fails when the resource has no uid (e.g. an object that was never
/// persisted); a child created without an owner would leak on deletion.
pub fn owner_reference(resource: &EtcdCluster) -> Result<OwnerReference, Error> {
    let uid = resource
        .uid()
        .ok_or_else(|| Error::MissingField("metadata.uid".to_string()))?;

    Ok(OwnerReference {
        api_version: "etcd.aenix.io/v1alpha1".to_string(),
        kind: "EtcdCluster".to_string(),
        name: resource.name_any(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}
