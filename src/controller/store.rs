//! API access seam for cluster-owned objects.
//!
//! The reconcile path goes through this trait instead of holding `Api`
//! handles directly, so the read-or-create ordering and status finalization
//! can run against a recorded in-memory store in tests. NotFound on reads is
//! folded into `Ok(None)`; every other error passes through raw for the
//! caller to classify and wrap.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};

use crate::controller::context::FIELD_MANAGER;
use crate::crd::{EtcdCluster, EtcdClusterStatus};

/// Operations the reconciler performs against the API server.
#[async_trait]
pub trait ClusterStore {
    async fn get_configmap(&self, namespace: &str, name: &str)
    -> kube::Result<Option<ConfigMap>>;

    async fn create_configmap(&self, namespace: &str, configmap: &ConfigMap) -> kube::Result<()>;

    async fn get_service(&self, namespace: &str, name: &str) -> kube::Result<Option<Service>>;

    async fn create_service(&self, namespace: &str, service: &Service) -> kube::Result<()>;

    async fn get_statefulset(
        &self,
        namespace: &str,
        name: &str,
    ) -> kube::Result<Option<StatefulSet>>;

    async fn create_statefulset(
        &self,
        namespace: &str,
        statefulset: &StatefulSet,
    ) -> kube::Result<()>;

    async fn replace_statefulset(
        &self,
        namespace: &str,
        name: &str,
        statefulset: &StatefulSet,
    ) -> kube::Result<()>;

    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        status: &EtcdClusterStatus,
    ) -> kube::Result<()>;
}

/// Production store backed by the Kubernetes API server.
pub struct KubeClusterStore {
    client: Client,
}

impl KubeClusterStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn ok_if_missing<T>(result: kube::Result<T>) -> kube::Result<Option<T>> {
    match result {
        Ok(obj) => Ok(Some(obj)),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ClusterStore for KubeClusterStore {
    async fn get_configmap(
        &self,
        namespace: &str,
        name: &str,
    ) -> kube::Result<Option<ConfigMap>> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        ok_if_missing(api.get(name).await)
    }

    async fn create_configmap(&self, namespace: &str, configmap: &ConfigMap) -> kube::Result<()> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), configmap).await?;
        Ok(())
    }

    async fn get_service(&self, namespace: &str, name: &str) -> kube::Result<Option<Service>> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        ok_if_missing(api.get(name).await)
    }

    async fn create_service(&self, namespace: &str, service: &Service) -> kube::Result<()> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), service).await?;
        Ok(())
    }

    async fn get_statefulset(
        &self,
        namespace: &str,
        name: &str,
    ) -> kube::Result<Option<StatefulSet>> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        ok_if_missing(api.get(name).await)
    }

    async fn create_statefulset(
        &self,
        namespace: &str,
        statefulset: &StatefulSet,
    ) -> kube::Result<()> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), statefulset).await?;
        Ok(())
    }

    async fn replace_statefulset(
        &self,
        namespace: &str,
        name: &str,
        statefulset: &StatefulSet,
    ) -> kube::Result<()> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        api.replace(name, &PostParams::default(), statefulset)
            .await?;
        Ok(())
    }

    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        status: &EtcdClusterStatus,
    ) -> kube::Result<()> {
        let api: Api<EtcdCluster> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
