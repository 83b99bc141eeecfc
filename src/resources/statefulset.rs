//! StatefulSet generation for etcd clusters.
//!
//! Creates a StatefulSet with the configuration etcd needs to bootstrap:
//! - Stable per-member identity via the headless service
//! - Parallel pod management so all members start discovering each other
//! - The initial-cluster topology baked into the startup command
//! - Bootstrap state sourced from the cluster-state ConfigMap
//!
//! Everything except the data volume size limit is immutable after
//! creation: the selector and naming scheme because Kubernetes forbids
//! changing them, the replica count and topology string because resizing a
//! bootstrapped cluster is not supported yet.

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, Container, ContainerPort, EmptyDirVolumeSource, EnvFromSource, EnvVar,
    EnvVarSource, HTTPGetAction, ObjectFieldSelector, PodSpec, PodTemplateSpec, Probe, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use crate::controller::error::Error;
use crate::crd::{CLIENT_PORT, EtcdCluster, PEER_PORT};
use crate::resources::common::{owner_reference, standard_labels};
use crate::resources::topology::{initial_cluster, initial_cluster_token};

/// etcd container image.
const ETCD_IMAGE: &str = "quay.io/coreos/etcd:v3.5.12";
/// Name of the data volume.
const DATA_VOLUME: &str = "data";
/// Mount path of the data volume.
const DATA_MOUNT_PATH: &str = "/var/run/etcd";
/// Initial delay before the first health probe, in seconds.
const PROBE_INITIAL_DELAY: i32 = 5;
/// Interval between health probes, in seconds.
const PROBE_PERIOD: i32 = 5;

/// Generate a StatefulSet for an EtcdCluster.
///
/// `state_configmap` is the name of the cluster-state ConfigMap the pod
/// environment is sourced from; callers must have ensured it exists before
/// the StatefulSet is created, which is why it is an explicit argument
/// rather than a derived name.
pub fn generate_statefulset(
    resource: &EtcdCluster,
    state_configmap: &str,
) -> Result<StatefulSet, Error> {
    let name = resource.name_any();
    let namespace = resource.namespace().unwrap_or_else(|| "default".to_string());
    let labels = standard_labels(resource);

    Ok(StatefulSet {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: resource.namespace(),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner_reference(resource)?]),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(resource.spec.replicas),
            service_name: Some(name.clone()),
            // Parallel startup: members must come up together to form quorum
            pod_management_policy: Some("Parallel".to_string()),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![generate_etcd_container(
                        resource,
                        &name,
                        &namespace,
                        state_configmap,
                    )],
                    volumes: Some(vec![generate_data_volume(&resource.spec.storage.size)]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Apply the current storage size to a StatefulSet's data volume.
///
/// This is the single mutable field of an existing StatefulSet; the same
/// function serves freshly built and fetched objects so creation and
/// in-place update share one code path.
pub fn apply_storage_size(statefulset: &mut StatefulSet, size: &str) {
    let volume = statefulset
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .and_then(|pod| pod.volumes.as_mut())
        .and_then(|volumes| volumes.iter_mut().find(|v| v.name == DATA_VOLUME));

    if let Some(volume) = volume {
        volume.empty_dir = Some(EmptyDirVolumeSource {
            size_limit: Some(Quantity(size.to_string())),
            ..Default::default()
        });
    }
}

/// Generate the etcd container with the full bootstrap command line.
fn generate_etcd_container(
    resource: &EtcdCluster,
    name: &str,
    namespace: &str,
    state_configmap: &str,
) -> Container {
    Container {
        name: "etcd".to_string(),
        image: Some(ETCD_IMAGE.to_string()),
        command: Some(vec![
            "etcd".to_string(),
            "--name=$(POD_NAME)".to_string(),
            format!("--listen-peer-urls=https://0.0.0.0:{PEER_PORT}"),
            // Client access stays plaintext for now; peer traffic is TLS
            format!("--listen-client-urls=http://0.0.0.0:{CLIENT_PORT}"),
            format!(
                "--initial-advertise-peer-urls=https://$(POD_NAME).{name}.$(POD_NAMESPACE).svc:{PEER_PORT}"
            ),
            format!("--data-dir={DATA_MOUNT_PATH}/default.etcd"),
            format!(
                "--initial-cluster={}",
                initial_cluster(name, namespace, resource.spec.replicas)
            ),
            format!(
                "--initial-cluster-token={}",
                initial_cluster_token(name, namespace)
            ),
            "--auto-tls".to_string(),
            "--peer-auto-tls".to_string(),
            format!(
                "--advertise-client-urls=http://$(POD_NAME).{name}.$(POD_NAMESPACE).svc:{CLIENT_PORT}"
            ),
        ]),
        ports: Some(vec![
            ContainerPort {
                container_port: PEER_PORT,
                name: Some("peer".to_string()),
                ..Default::default()
            },
            ContainerPort {
                container_port: CLIENT_PORT,
                name: Some("client".to_string()),
                ..Default::default()
            },
        ]),
        env_from: Some(vec![EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: state_configmap.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        env: Some(vec![
            downward_api_env("POD_NAME", "metadata.name"),
            downward_api_env("POD_NAMESPACE", "metadata.namespace"),
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: DATA_VOLUME.to_string(),
            mount_path: DATA_MOUNT_PATH.to_string(),
            read_only: Some(false),
            ..Default::default()
        }]),
        liveness_probe: Some(generate_health_probe()),
        readiness_probe: Some(generate_health_probe()),
        ..Default::default()
    }
}

/// Environment variable populated from the downward API.
fn downward_api_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// HTTP probe against the etcd health endpoint on the client port.
fn generate_health_probe() -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some("/health".to_string()),
            port: IntOrString::Int(CLIENT_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(PROBE_INITIAL_DELAY),
        period_seconds: Some(PROBE_PERIOD),
        ..Default::default()
    }
}

/// The data volume, an emptyDir capped at the spec's storage size.
fn generate_data_volume(size: &str) -> Volume {
    Volume {
        name: DATA_VOLUME.to_string(),
        // TODO: move to a PVC template once persistent storage is supported
        empty_dir: Some(EmptyDirVolumeSource {
            size_limit: Some(Quantity(size.to_string())),
            ..Default::default()
        }),
        ..Default::default()
    }
}
