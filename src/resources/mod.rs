//! Kubernetes resource generation for etcd clusters.
//!
//! Pure builders for the three objects owned by an EtcdCluster:
//! - Cluster-state ConfigMap (bootstrap state record)
//! - Headless Service (peer discovery)
//! - StatefulSet (the etcd members themselves)

pub mod common;
pub mod configmap;
pub mod services;
pub mod statefulset;
pub mod topology;
