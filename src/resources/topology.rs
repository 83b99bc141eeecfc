//! Bootstrap topology computation.
//!
//! etcd members discover each other at startup through the
//! `--initial-cluster` argument: a comma-joined list of peer URLs derived
//! from the StatefulSet naming scheme and the headless service domain. The
//! string is baked into the pod template at StatefulSet creation time and is
//! never recomputed afterwards, so it must be a stable function of its
//! inputs.

use crate::crd::PEER_PORT;

/// Compute the initial peer-member list for a cluster.
///
/// Produces one `<name>-<i>=https://<name>-<i>.<name>.<namespace>.svc:2380`
/// entry per member, in ascending index order. Zero replicas produce an
/// empty string.
pub fn initial_cluster(cluster_name: &str, namespace: &str, replicas: i32) -> String {
    (0..replicas.max(0))
        .map(|i| {
            format!(
                "{cluster_name}-{i}=https://{cluster_name}-{i}.{cluster_name}.{namespace}.svc:{PEER_PORT}"
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the initial-cluster token, unique per cluster identity.
pub fn initial_cluster_token(cluster_name: &str, namespace: &str) -> String {
    format!("{cluster_name}-{namespace}")
}
