//! Cluster-state ConfigMap generation.
//!
//! The cluster-state ConfigMap is a one-entry record telling freshly
//! started members whether they are bootstrapping a new cluster or joining
//! an existing one. It is created once per cluster and intentionally never
//! updated by the reconcile loop.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;

use crate::controller::error::Error;
use crate::crd::EtcdCluster;
use crate::resources::common::{
    CLUSTER_STATE_KEY, CLUSTER_STATE_NEW, cluster_state_configmap_name, owner_reference,
    standard_labels,
};

/// Generate the cluster-state ConfigMap for an EtcdCluster.
pub fn generate_state_configmap(resource: &EtcdCluster) -> Result<ConfigMap, Error> {
    let name = cluster_state_configmap_name(&resource.name_any());

    Ok(ConfigMap {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: resource.namespace(),
            labels: Some(standard_labels(resource)),
            owner_references: Some(vec![owner_reference(resource)?]),
            ..Default::default()
        },
        data: Some({
            let mut data = BTreeMap::new();
            data.insert(CLUSTER_STATE_KEY.to_string(), CLUSTER_STATE_NEW.to_string());
            data
        }),
        ..Default::default()
    })
}
