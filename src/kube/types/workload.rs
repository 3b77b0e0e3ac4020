use serde::{Deserialize, Serialize};

use super::ObjectMeta;

// DaemonSet and Deployment lists share the parts discovery reads.
// (/apis/apps/v1/namespaces/{ns}/daemonsets, .../deployments)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadListResponse {
    pub items: Vec<Workload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workload {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Option<WorkloadSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    #[serde(default)]
    pub spec: Option<PodTemplateBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodTemplateBody {
    #[serde(default)]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    // Unset when the variable comes from `valueFrom`.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerPort {
    #[serde(rename = "containerPort")]
    pub container_port: u16,
}

impl Workload {
    fn containers(&self) -> &[Container] {
        self.spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .map(|body| body.containers.as_slice())
            .unwrap_or_default()
    }

    /// First non-empty literal value of `name` across the pod template's containers.
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.containers()
            .iter()
            .flat_map(|container| container.env.iter())
            .filter(|var| var.name == name)
            .find_map(|var| var.value.as_deref().filter(|value| !value.is_empty()))
    }

    /// The first container's first declared port.
    pub fn container_port(&self) -> Option<u16> {
        self.containers()
            .first()
            .and_then(|container| container.ports.first())
            .map(|port| port.container_port)
    }
}

// Service API Response (/api/v1/namespaces/{ns}/services)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListResponse {
    pub items: Vec<Service>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Option<ServiceSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: u16,
    #[serde(rename = "nodePort", default)]
    pub node_port: Option<u16>,
}

impl Service {
    pub fn node_port(&self) -> Option<u16> {
        self.spec
            .as_ref()?
            .ports
            .iter()
            .find_map(|port| port.node_port)
            .filter(|port| *port != 0)
    }
}
