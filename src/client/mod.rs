//! Client utilities for talking to managed etcd clusters.

mod health;

pub use health::{endpoint_healthy, health_url, is_cluster_healthy};
