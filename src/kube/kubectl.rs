use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::*;

use crate::kube::error::KubeError;
use crate::kube::types::{
    AddressType, ConfigMap, Pod, PodListResponse, Service, ServiceListResponse, Workload,
    WorkloadListResponse,
};
use crate::kube::ControlPlane;
use crate::retry::{retry_with_fixed_delay, RetryConfig};

/// Talks to the cluster through the `kubectl` binary and whatever kubeconfig it picks up.
pub struct Kubectl {
    binary: String,
    retry: RetryConfig,
    timeout: Duration,
}

impl Kubectl {
    pub fn new(binary: String, retry: RetryConfig, timeout: Duration) -> Self {
        Kubectl {
            binary,
            retry,
            timeout,
        }
    }

    /// Runs `kubectl <args>` under the retry policy and returns its stdout.
    pub async fn run(&self, args: &[&str]) -> Result<String, KubeError> {
        let command = format!("{} {}", self.binary, args.join(" "));
        let command = command.as_str();

        retry_with_fixed_delay(&self.retry, command, || self.run_once(command, args)).await
    }

    async fn run_once(&self, command: &str, args: &[&str]) -> Result<String, KubeError> {
        debug!("Running {}", command);

        let mut cmd = Command::new(&self.binary);
        cmd.args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(KubeError::Timeout {
                    command: command.to_string(),
                    after: self.timeout,
                })
            }
        };

        if !output.status.success() {
            return Err(KubeError::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| {
            KubeError::ParseError(format!("`{}` printed non UTF-8 output: {}", command, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, KubeError> {
        let output = self.run(args).await?;

        serde_json::from_str(&output).map_err(|e| {
            error!("Error parsing kubectl JSON output: {}", e);
            KubeError::from(e)
        })
    }
}

/// jsonpath needs literal dots in map keys escaped, e.g. `config.json`.
fn jsonpath_key(key: &str) -> String {
    key.replace('.', "\\.")
}

impl ControlPlane for Kubectl {
    async fn node_names(&self) -> Result<Vec<String>, KubeError> {
        let output = self
            .run(&["get", "nodes", "-o", "jsonpath={.items[*].metadata.name}"])
            .await?;

        Ok(output.split_whitespace().map(str::to_string).collect())
    }

    async fn node_addresses(&self, address_type: AddressType) -> Result<Vec<String>, KubeError> {
        let jsonpath = format!(
            "jsonpath={{.items[*].status.addresses[?(@.type==\"{}\")].address}}",
            address_type.as_str()
        );
        let output = self.run(&["get", "nodes", "-o", &jsonpath]).await?;

        Ok(output.split_whitespace().map(str::to_string).collect())
    }

    async fn config_map_entry(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Option<String>, KubeError> {
        let jsonpath = format!("jsonpath={{.data.{}}}", jsonpath_key(key));
        let output = self
            .run(&["get", "configmap", name, "-n", namespace, "-o", &jsonpath])
            .await?;

        let output = output.trim();
        Ok((!output.is_empty()).then(|| output.to_string()))
    }

    async fn config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, KubeError> {
        self.get_json(&["get", "configmap", name, "-n", namespace, "-o", "json"])
            .await
    }

    async fn daemon_sets(&self, namespace: &str) -> Result<Vec<Workload>, KubeError> {
        let list: WorkloadListResponse = self
            .get_json(&["get", "daemonsets", "-n", namespace, "-o", "json"])
            .await?;
        Ok(list.items)
    }

    async fn deployments(&self, namespace: &str) -> Result<Vec<Workload>, KubeError> {
        let list: WorkloadListResponse = self
            .get_json(&["get", "deployments", "-n", namespace, "-o", "json"])
            .await?;
        Ok(list.items)
    }

    async fn services(&self, namespace: &str) -> Result<Vec<Service>, KubeError> {
        let list: ServiceListResponse = self
            .get_json(&["get", "services", "-n", namespace, "-o", "json"])
            .await?;
        Ok(list.items)
    }

    async fn pods(&self, namespace: &str, selector: Option<&str>) -> Result<Vec<Pod>, KubeError> {
        let list: PodListResponse = match selector {
            Some(selector) => {
                self.get_json(&["get", "pods", "-n", namespace, "-l", selector, "-o", "json"])
                    .await?
            }
            None => {
                self.get_json(&["get", "pods", "-n", namespace, "-o", "json"])
                    .await?
            }
        };
        Ok(list.items)
    }

    async fn read_pod_file(
        &self,
        namespace: &str,
        pod: &str,
        path: &str,
    ) -> Result<String, KubeError> {
        self.run(&["exec", "-n", namespace, pod, "--", "cat", path])
            .await
    }
}
