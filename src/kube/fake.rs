//! In-memory `ControlPlane` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::kube::error::KubeError;
use crate::kube::types::{AddressType, ConfigMap, Pod, Service, Workload};
use crate::kube::ControlPlane;

pub fn failure() -> KubeError {
    KubeError::CommandFailed {
        command: "kubectl".to_string(),
        code: Some(1),
        stderr: "connection refused".to_string(),
    }
}

/// In-memory cluster. `None` means the query fails.
#[derive(Default)]
pub struct FakeCluster {
    pub node_names: Option<Vec<String>>,
    pub external: Option<Vec<String>>,
    pub internal: Option<Vec<String>>,
    pub config_entry: Option<Option<String>>,
    pub config_map: Option<ConfigMap>,
    pub daemon_sets: Option<Vec<Workload>>,
    pub deployments: Option<Vec<Workload>>,
    pub services: Option<Vec<Service>>,
    pub pods: Option<Vec<Pod>>,
    pub pod_files: HashMap<String, String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn answer<T: Clone>(value: &Option<T>) -> Result<T, KubeError> {
    value.clone().ok_or_else(failure)
}

impl ControlPlane for FakeCluster {
    async fn node_names(&self) -> Result<Vec<String>, KubeError> {
        self.record("node_names");
        answer(&self.node_names)
    }

    async fn node_addresses(
        &self,
        address_type: AddressType,
    ) -> Result<Vec<String>, KubeError> {
        self.record(address_type.as_str());
        match address_type {
            AddressType::ExternalIp => answer(&self.external),
            AddressType::InternalIp => answer(&self.internal),
        }
    }

    async fn config_map_entry(
        &self,
        _namespace: &str,
        _name: &str,
        _key: &str,
    ) -> Result<Option<String>, KubeError> {
        self.record("config_map_entry");
        answer(&self.config_entry)
    }

    async fn config_map(&self, _namespace: &str, _name: &str) -> Result<ConfigMap, KubeError> {
        self.record("config_map");
        answer(&self.config_map)
    }

    async fn daemon_sets(&self, _namespace: &str) -> Result<Vec<Workload>, KubeError> {
        self.record("daemon_sets");
        answer(&self.daemon_sets)
    }

    async fn deployments(&self, _namespace: &str) -> Result<Vec<Workload>, KubeError> {
        self.record("deployments");
        answer(&self.deployments)
    }

    async fn services(&self, _namespace: &str) -> Result<Vec<Service>, KubeError> {
        self.record("services");
        answer(&self.services)
    }

    async fn pods(
        &self,
        _namespace: &str,
        selector: Option<&str>,
    ) -> Result<Vec<Pod>, KubeError> {
        self.record(&format!("pods({})", selector.unwrap_or("-")));
        answer(&self.pods)
    }

    async fn read_pod_file(
        &self,
        _namespace: &str,
        pod: &str,
        _path: &str,
    ) -> Result<String, KubeError> {
        self.record(&format!("read_pod_file({})", pod));
        self.pod_files.get(pod).cloned().ok_or_else(failure)
    }
}
