//! Service generation for etcd clusters.
//!
//! A single headless Service provides stable per-member DNS names
//! (`<cluster>-<i>.<cluster>.<ns>.svc`) for peer discovery. There is no
//! client-facing load-balanced service; clients address members directly.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;

use crate::controller::error::Error;
use crate::crd::{CLIENT_PORT, EtcdCluster, PEER_PORT};
use crate::resources::common::{owner_reference, standard_labels};

/// Generate the headless Service for an EtcdCluster.
///
/// The service provides:
/// - DNS records for each pod (`<cluster>-0.<cluster>.<ns>.svc`)
/// - No load balancing (direct member access)
/// - `publishNotReadyAddresses: true` so peers resolve each other during
///   bootstrap, before any member passes its readiness probe
pub fn generate_headless_service(resource: &EtcdCluster) -> Result<Service, Error> {
    let name = resource.name_any();
    let labels = standard_labels(resource);

    Ok(Service {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: resource.namespace(),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner_reference(resource)?]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            // Headless service (no cluster IP)
            type_: Some("ClusterIP".to_string()),
            cluster_ip: Some("None".to_string()),
            publish_not_ready_addresses: Some(true),
            selector: Some(labels),
            ports: Some(vec![
                ServicePort {
                    port: PEER_PORT,
                    target_port: Some(IntOrString::Int(PEER_PORT)),
                    name: Some("peer".to_string()),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                },
                ServicePort {
                    port: CLIENT_PORT,
                    target_port: Some(IntOrString::Int(CLIENT_PORT)),
                    name: Some("client".to_string()),
                    protocol: Some("TCP".to_string()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::common::tests::test_cluster;

    #[test]
    fn test_generate_headless_service() {
        let cluster = test_cluster("demo");
        let svc = generate_headless_service(&cluster).unwrap();

        assert_eq!(svc.metadata.name, Some("demo".to_string()));
        assert_eq!(svc.metadata.namespace, Some("default".to_string()));

        let spec = svc.spec.unwrap();
        assert_eq!(spec.cluster_ip, Some("None".to_string()));
        assert_eq!(spec.publish_not_ready_addresses, Some(true));
    }

    #[test]
    fn test_headless_service_ports() {
        let cluster = test_cluster("demo");
        let svc = generate_headless_service(&cluster).unwrap();

        let ports = svc.spec.unwrap().ports.unwrap();
        assert_eq!(ports.len(), 2);

        let peer = ports.iter().find(|p| p.name.as_deref() == Some("peer"));
        assert_eq!(peer.unwrap().port, 2380);

        let client = ports.iter().find(|p| p.name.as_deref() == Some("client"));
        assert_eq!(client.unwrap().port, 2379);
    }

    #[test]
    fn test_headless_service_selector_matches_labels() {
        let cluster = test_cluster("demo");
        let svc = generate_headless_service(&cluster).unwrap();

        let selector = svc.spec.unwrap().selector.unwrap();
        assert_eq!(selector, standard_labels(&cluster));
        assert_eq!(
            selector.get("app.kubernetes.io/instance"),
            Some(&"demo".to_string())
        );
    }
}
