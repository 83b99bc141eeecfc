//! EtcdCluster Custom Resource Definition.
//!
//! Defines the EtcdCluster CRD for bootstrapping etcd clusters on
//! Kubernetes. The spec is intentionally small: topology (replicas) and
//! storage sizing. Everything else about the cluster is derived by the
//! controller.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// EtcdCluster is a custom resource for deploying etcd clusters.
///
/// Example:
/// ```yaml
/// apiVersion: etcd.aenix.io/v1alpha1
/// kind: EtcdCluster
/// metadata:
///   name: demo
/// spec:
///   replicas: 3
///   storage:
///     size: 4Gi
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "etcd.aenix.io",
    version = "v1alpha1",
    kind = "EtcdCluster",
    plural = "etcdclusters",
    shortname = "etcd",
    status = "EtcdClusterStatus",
    namespaced,
    // Print columns for kubectl get
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Storage", "type":"string", "jsonPath":".spec.storage.size"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EtcdClusterSpec {
    /// Number of etcd members (default 3).
    /// Fixed at StatefulSet creation; resizing an existing cluster is not
    /// supported yet.
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Storage configuration for member data directories.
    #[serde(default)]
    pub storage: StorageSpec,
}

impl Default for EtcdClusterSpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            storage: StorageSpec::default(),
        }
    }
}

fn default_replicas() -> i32 {
    3
}

/// Storage configuration for etcd members.
///
/// Data is kept on an emptyDir volume; only the size limit is configurable
/// and it is the one field the controller keeps in sync after creation.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Size limit of the data volume as a Kubernetes quantity (default: 4Gi).
    #[serde(default = "default_storage_size")]
    pub size: String,
}

impl Default for StorageSpec {
    fn default() -> Self {
        Self {
            size: default_storage_size(),
        }
    }
}

fn default_storage_size() -> String {
    "4Gi".to_string()
}

/// Status of an EtcdCluster.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EtcdClusterStatus {
    /// Conditions describing the progress of cluster reconciliation.
    /// At most one condition per type.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition describes the state of a cluster at a certain point.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition.
    pub r#type: String,
    /// Status of the condition ("True", "False", "Unknown").
    pub status: String,
    /// Machine-readable reason for the condition's last transition.
    pub reason: String,
    /// Human-readable message indicating details about last transition.
    pub message: String,
    /// Last time the condition transitioned from one status to another.
    pub last_transition_time: String,
    /// The generation of the resource this condition was observed for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    /// Create a new condition.
    pub fn new(
        condition_type: &str,
        status: bool,
        reason: &str,
        message: &str,
        generation: Option<i64>,
    ) -> Self {
        Self {
            r#type: condition_type.to_string(),
            status: if status {
                "True".to_string()
            } else {
                "False".to_string()
            },
            reason: reason.to_string(),
            message: message.to_string(),
            last_transition_time: jiff::Timestamp::now().to_string(),
            observed_generation: generation,
        }
    }

    /// Create an "Initialized" condition.
    pub fn initialized(status: bool, reason: &str, message: &str, generation: Option<i64>) -> Self {
        Self::new(
            &ConditionType::Initialized.to_string(),
            status,
            reason,
            message,
            generation,
        )
    }
}

/// Types of conditions for EtcdCluster.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// Bootstrap resources for the cluster have been created.
    Initialized,
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionType::Initialized => write!(f, "Initialized"),
        }
    }
}

/// etcd peer port.
pub const PEER_PORT: i32 = 2380;

/// etcd client port.
pub const CLIENT_PORT: i32 = 2379;
