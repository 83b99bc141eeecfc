//! Custom Resource Definitions (CRDs) for etcd-operator.
//!
//! - `EtcdCluster`: Declare desired etcd cluster topology and storage

mod etcd_cluster;

pub use etcd_cluster::*;
