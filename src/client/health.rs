//! etcd cluster health checking.
//!
//! Ancillary utility for verification tooling; the reconcile path does not
//! call it. Each endpoint is queried over a short-lived HTTP connection
//! against etcd's `/health` endpoint, and the cluster counts as healthy
//! only when every queried endpoint reports healthy.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

/// Per-request timeout for health queries.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Response body of etcd's `/health` endpoint.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    health: String,
}

/// Build the health URL for an endpoint address.
///
/// Accepts endpoints with or without a scheme or trailing slash.
pub fn health_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/health")
    } else {
        format!("http://{base}/health")
    }
}

/// Check the health of every endpoint of a cluster.
///
/// Returns true only if every endpoint responds and reports no errors. An
/// unreachable endpoint counts as unhealthy, not as an error.
pub async fn is_cluster_healthy(endpoints: &[String]) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(HEALTH_CHECK_TIMEOUT)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Failed to build health check client");
            return false;
        }
    };

    for endpoint in endpoints {
        if !endpoint_healthy(&client, endpoint).await {
            return false;
        }
    }
    !endpoints.is_empty()
}

/// Query the status of a single endpoint.
pub async fn endpoint_healthy(client: &reqwest::Client, endpoint: &str) -> bool {
    let url = health_url(endpoint);
    match client.get(&url).send().await {
        Ok(response) => match response.json::<HealthResponse>().await {
            Ok(body) if body.health == "true" => {
                debug!(endpoint = %endpoint, "Endpoint is healthy");
                true
            }
            Ok(body) => {
                warn!(endpoint = %endpoint, health = %body.health, "Endpoint reported unhealthy");
                false
            }
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Failed to parse health response");
                false
            }
        },
        Err(e) => {
            warn!(endpoint = %endpoint, error = %e, "Failed to query endpoint health");
            false
        }
    }
}
