use std::path::Path;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::*;

use crate::kube::error::KubeError;
use crate::kube::types::{
    AddressType, ConfigMap, NodeListResponse, Pod, PodListResponse, Service,
    ServiceListResponse, Workload, WorkloadListResponse,
};
use crate::kube::ControlPlane;
use crate::retry::{retry_with_fixed_delay, RetryConfig};

/// Talks to the Kubernetes API server directly with a bearer token.
pub struct KubeAgent {
    kube_api_server: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

/// Loads a PEM CA bundle, e.g. `/var/run/secrets/kubernetes.io/serviceaccount/ca.crt`.
pub fn load_certificate(path: &Path) -> Result<reqwest::Certificate, KubeError> {
    let pem = std::fs::read(path)?;
    Ok(reqwest::Certificate::from_pem(&pem)?)
}

/// Bodies can carry client ids, so only their size is logged.
fn response_summary(endpoint: &str, body: &str) -> String {
    format!("Kubernetes API response from {}: {} bytes", endpoint, body.len())
}

impl KubeAgent {
    pub fn new(
        kube_api_server: String,
        token: String,
        certificate: Option<reqwest::Certificate>,
        retry: RetryConfig,
        timeout: Duration,
    ) -> Result<Self, KubeError> {
        let mut headers = HeaderMap::new();
        if !token.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| KubeError::ParseError(format!("Invalid bearer token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout);
        if let Some(cert) = certificate {
            builder = builder.add_root_certificate(cert);
        }

        Ok(KubeAgent {
            kube_api_server: kube_api_server.trim_end_matches('/').to_string(),
            client: builder.build()?,
            retry,
        })
    }

    pub async fn make_request(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<String, KubeError> {
        let url = format!("{}{}", self.kube_api_server, endpoint);
        let url = url.as_str();

        retry_with_fixed_delay(&self.retry, url, || self.request_once(url, query)).await
    }

    async fn request_once(&self, url: &str, query: &[(&str, &str)]) -> Result<String, KubeError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| {
                error!("Error sending request to Kubernetes API server: {}", err);
                KubeError::from(err)
            })?
            .error_for_status()?;

        response.text().await.map_err(|err| {
            error!("Error reading response body: {}", err);
            KubeError::from(err)
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, KubeError> {
        let response = self.make_request(endpoint, query).await?;

        debug!("{}", response_summary(endpoint, &response));

        serde_json::from_str(&response).map_err(|e| {
            error!("Error parsing JSON response: {}", e);
            KubeError::from(e)
        })
    }

    async fn nodes(&self) -> Result<NodeListResponse, KubeError> {
        self.get_json("/api/v1/nodes", &[]).await
    }
}

impl ControlPlane for KubeAgent {
    async fn node_names(&self) -> Result<Vec<String>, KubeError> {
        Ok(self.nodes().await?.names())
    }

    async fn node_addresses(&self, address_type: AddressType) -> Result<Vec<String>, KubeError> {
        Ok(self.nodes().await?.addresses(address_type))
    }

    async fn config_map_entry(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Option<String>, KubeError> {
        let config_map = self.config_map(namespace, name).await?;
        Ok(config_map.entry(key).map(str::to_string))
    }

    async fn config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, KubeError> {
        let endpoint = format!("/api/v1/namespaces/{}/configmaps/{}", namespace, name);
        self.get_json(&endpoint, &[]).await
    }

    async fn daemon_sets(&self, namespace: &str) -> Result<Vec<Workload>, KubeError> {
        let endpoint = format!("/apis/apps/v1/namespaces/{}/daemonsets", namespace);
        let list: WorkloadListResponse = self.get_json(&endpoint, &[]).await?;
        Ok(list.items)
    }

    async fn deployments(&self, namespace: &str) -> Result<Vec<Workload>, KubeError> {
        let endpoint = format!("/apis/apps/v1/namespaces/{}/deployments", namespace);
        let list: WorkloadListResponse = self.get_json(&endpoint, &[]).await?;
        Ok(list.items)
    }

    async fn services(&self, namespace: &str) -> Result<Vec<Service>, KubeError> {
        let endpoint = format!("/api/v1/namespaces/{}/services", namespace);
        let list: ServiceListResponse = self.get_json(&endpoint, &[]).await?;
        Ok(list.items)
    }

    async fn pods(&self, namespace: &str, selector: Option<&str>) -> Result<Vec<Pod>, KubeError> {
        let endpoint = format!("/api/v1/namespaces/{}/pods", namespace);
        let list: PodListResponse = match selector {
            Some(selector) => self.get_json(&endpoint, &[("labelSelector", selector)]).await?,
            None => self.get_json(&endpoint, &[]).await?,
        };
        Ok(list.items)
    }

    async fn read_pod_file(
        &self,
        _namespace: &str,
        _pod: &str,
        _path: &str,
    ) -> Result<String, KubeError> {
        // exec needs a websocket upgrade, plain GETs can't do it
        Err(KubeError::Unsupported("reading files from a pod"))
    }
}
