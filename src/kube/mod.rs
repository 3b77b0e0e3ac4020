pub mod api;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod kubectl;
pub mod types;

pub use api::KubeAgent;
pub use error::KubeError;
pub use kubectl::Kubectl;

use types::{AddressType, ConfigMap, Pod, Service, Workload};

/// The questions discovery asks the cluster.
///
/// Every method is a single read. Errors are returned as-is; whether an error
/// means "no data" is up to the caller.
#[allow(async_fn_in_trait)]
pub trait ControlPlane {
    /// `metadata.name` of every node.
    async fn node_names(&self) -> Result<Vec<String>, KubeError>;

    /// Every node address of the given type, in node order.
    async fn node_addresses(&self, address_type: AddressType) -> Result<Vec<String>, KubeError>;

    /// A single `data` entry of a ConfigMap, `None` when the key is empty or missing.
    async fn config_map_entry(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Option<String>, KubeError>;

    /// The whole ConfigMap object.
    async fn config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, KubeError>;

    async fn daemon_sets(&self, namespace: &str) -> Result<Vec<Workload>, KubeError>;

    async fn deployments(&self, namespace: &str) -> Result<Vec<Workload>, KubeError>;

    async fn services(&self, namespace: &str) -> Result<Vec<Service>, KubeError>;

    async fn pods(&self, namespace: &str, selector: Option<&str>) -> Result<Vec<Pod>, KubeError>;

    /// Contents of `path` inside the first container of a running pod.
    async fn read_pod_file(
        &self,
        namespace: &str,
        pod: &str,
        path: &str,
    ) -> Result<String, KubeError>;
}
