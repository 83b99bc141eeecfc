//! In-memory store for simulating the API server in functional tests.
//!
//! `MockClusterStore` holds at most one object of each owned kind, counts
//! every operation, and can be told to fail a single operation with a given
//! HTTP status code. It only simulates the external state; all decisions
//! (read-or-create, condition transitions, status disposition) stay in the
//! production code under test.

use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;

use etcd_operator::controller::store::ClusterStore;
use etcd_operator::crd::{EtcdCluster, EtcdClusterSpec, EtcdClusterStatus, StorageSpec};

/// Operations the mock can be told to fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    GetConfigMap,
    CreateConfigMap,
    GetService,
    CreateService,
    GetStatefulSet,
    CreateStatefulSet,
    ReplaceStatefulSet,
    PatchStatus,
}

/// Per-operation call counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpCounts {
    pub configmap_gets: usize,
    pub configmap_creates: usize,
    pub service_gets: usize,
    pub service_creates: usize,
    pub statefulset_gets: usize,
    pub statefulset_creates: usize,
    pub statefulset_replaces: usize,
    pub status_patches: usize,
}

impl OpCounts {
    /// Total number of operations seen by the store.
    pub fn total(&self) -> usize {
        self.configmap_gets
            + self.configmap_creates
            + self.service_gets
            + self.service_creates
            + self.statefulset_gets
            + self.statefulset_creates
            + self.statefulset_replaces
            + self.status_patches
    }
}

#[derive(Default)]
struct Inner {
    configmap: Option<ConfigMap>,
    service: Option<Service>,
    statefulset: Option<StatefulSet>,
    status: Option<EtcdClusterStatus>,
    counts: OpCounts,
    failure: Option<(Op, u16)>,
}

/// Recorded in-memory stand-in for the API server.
pub struct MockClusterStore {
    inner: Mutex<Inner>,
}

impl MockClusterStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Make one operation fail with the given HTTP status code.
    pub fn fail_with(&self, op: Op, code: u16) {
        self.inner.lock().unwrap().failure = Some((op, code));
    }

    pub fn counts(&self) -> OpCounts {
        self.inner.lock().unwrap().counts
    }

    /// The status the last successful patch recorded, if any.
    pub fn recorded_status(&self) -> Option<EtcdClusterStatus> {
        self.inner.lock().unwrap().status.clone()
    }

    pub fn statefulset(&self) -> Option<StatefulSet> {
        self.inner.lock().unwrap().statefulset.clone()
    }
}

fn api_error(code: u16) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "injected".to_string(),
        reason: "injected".to_string(),
        code,
    })
}

fn check_failure(inner: &Inner, op: Op) -> kube::Result<()> {
    if let Some((fail_op, code)) = inner.failure {
        if fail_op == op {
            return Err(api_error(code));
        }
    }
    Ok(())
}

#[async_trait]
impl ClusterStore for MockClusterStore {
    async fn get_configmap(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> kube::Result<Option<ConfigMap>> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.configmap_gets += 1;
        check_failure(&inner, Op::GetConfigMap)?;
        Ok(inner.configmap.clone())
    }

    async fn create_configmap(&self, _namespace: &str, configmap: &ConfigMap) -> kube::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.configmap_creates += 1;
        check_failure(&inner, Op::CreateConfigMap)?;
        inner.configmap = Some(configmap.clone());
        Ok(())
    }

    async fn get_service(&self, _namespace: &str, _name: &str) -> kube::Result<Option<Service>> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.service_gets += 1;
        check_failure(&inner, Op::GetService)?;
        Ok(inner.service.clone())
    }

    async fn create_service(&self, _namespace: &str, service: &Service) -> kube::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.service_creates += 1;
        check_failure(&inner, Op::CreateService)?;
        inner.service = Some(service.clone());
        Ok(())
    }

    async fn get_statefulset(
        &self,
        _namespace: &str,
        _name: &str,
    ) -> kube::Result<Option<StatefulSet>> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.statefulset_gets += 1;
        check_failure(&inner, Op::GetStatefulSet)?;
        Ok(inner.statefulset.clone())
    }

    async fn create_statefulset(
        &self,
        _namespace: &str,
        statefulset: &StatefulSet,
    ) -> kube::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.statefulset_creates += 1;
        check_failure(&inner, Op::CreateStatefulSet)?;
        inner.statefulset = Some(statefulset.clone());
        Ok(())
    }

    async fn replace_statefulset(
        &self,
        _namespace: &str,
        _name: &str,
        statefulset: &StatefulSet,
    ) -> kube::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.statefulset_replaces += 1;
        check_failure(&inner, Op::ReplaceStatefulSet)?;
        inner.statefulset = Some(statefulset.clone());
        Ok(())
    }

    async fn patch_cluster_status(
        &self,
        _namespace: &str,
        _name: &str,
        status: &EtcdClusterStatus,
    ) -> kube::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.status_patches += 1;
        check_failure(&inner, Op::PatchStatus)?;
        inner.status = Some(status.clone());
        Ok(())
    }
}

/// Build a persisted-looking cluster object for reconcile tests.
pub fn test_cluster(name: &str) -> EtcdCluster {
    EtcdCluster {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            uid: Some("test-uid".to_string()),
            generation: Some(1),
            ..Default::default()
        },
        spec: EtcdClusterSpec {
            replicas: 3,
            storage: StorageSpec {
                size: "4Gi".to_string(),
            },
        },
        status: None,
    }
}
