pub mod addresses;
pub mod parameters;
pub mod prompt;

pub use addresses::{address_from_node_name, is_public_ipv4_candidate, AddressStrategy};
pub use parameters::{ParameterSource, ProxyParameters};
pub use prompt::{parse_manual_addresses, OperatorPrompt, StdinPrompt};

use tracing::*;

use crate::kube::error::KubeError;
use crate::kube::types::{AddressType, Pod, Workload};
use crate::kube::ControlPlane;

/// Names and locations of the objects describing the V2Ray deployment.
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub namespace: String,
    pub config_map: String,
    pub config_key: String,
    /// Substring that identifies the DaemonSet/Deployment and its Service.
    pub workload_marker: String,
    pub pod_selector: String,
    pub pod_config_path: String,
    /// Container environment variable holding the client id.
    pub identifier_env: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        DiscoverySettings {
            namespace: "v2ray".to_string(),
            config_map: "v2ray-config".to_string(),
            config_key: "config.json".to_string(),
            workload_marker: "v2ray".to_string(),
            pod_selector: "app=v2ray".to_string(),
            pod_config_path: "/etc/v2ray/config.json".to_string(),
            identifier_env: "V2RAY_UUID".to_string(),
        }
    }
}

pub struct Discovery<C> {
    cluster: C,
    settings: DiscoverySettings,
}

/// A failed query counts as "no data".
fn ok_or_warn<T>(result: Result<T, KubeError>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to {}: {}", what, e);
            None
        }
    }
}

impl<C: ControlPlane> Discovery<C> {
    pub fn new(cluster: C, settings: DiscoverySettings) -> Self {
        Discovery { cluster, settings }
    }

    /// Node addresses from the first strategy that finds any, else from the operator.
    pub async fn discover_addresses<P: OperatorPrompt>(&self, prompt: &mut P) -> Vec<String> {
        for strategy in AddressStrategy::ORDER {
            if let Some(addresses) = self.addresses_from(strategy).await {
                info!("Found node addresses via {:?}: {:?}", strategy, addresses);
                return addresses;
            }
            info!("No usable node address via {:?}", strategy);
        }

        warn!("Automatic address discovery exhausted, asking the operator");
        let addresses = prompt
            .ask_addresses()
            .await
            .map(|input| parse_manual_addresses(&input))
            .unwrap_or_default();
        info!("Operator supplied node addresses: {:?}", addresses);
        addresses
    }

    async fn addresses_from(&self, strategy: AddressStrategy) -> Option<Vec<String>> {
        let addresses: Vec<String> = match strategy {
            AddressStrategy::NodeNames => {
                let names = ok_or_warn(self.cluster.node_names().await, "list node names")?;
                names
                    .iter()
                    .filter_map(|name| address_from_node_name(name))
                    .collect()
            }
            AddressStrategy::ExternalIp => self.typed_addresses(AddressType::ExternalIp).await?,
            AddressStrategy::InternalIp => self.typed_addresses(AddressType::InternalIp).await?,
        };

        (!addresses.is_empty()).then_some(addresses)
    }

    async fn typed_addresses(&self, address_type: AddressType) -> Option<Vec<String>> {
        let addresses = ok_or_warn(
            self.cluster.node_addresses(address_type).await,
            "list node addresses",
        )?;

        Some(
            addresses
                .into_iter()
                .filter(|address| is_public_ipv4_candidate(address))
                .collect(),
        )
    }

    /// Parameters from the first source that yields a complete set, else the fallback.
    pub async fn discover_parameters(&self) -> ProxyParameters {
        for source in ParameterSource::ORDER {
            if let Some(params) = self.parameters_from(source).await {
                info!(
                    "Using V2Ray parameters from {}: port {}, network {}",
                    source, params.port, params.network
                );
                return params;
            }
            info!("No V2Ray parameters from {}", source);
        }

        warn!("Falling back to built-in V2Ray parameters");
        ProxyParameters::fallback()
    }

    async fn parameters_from(&self, source: ParameterSource) -> Option<ProxyParameters> {
        match source {
            ParameterSource::ConfigMap => self.from_config_map().await,
            ParameterSource::DaemonSet | ParameterSource::Deployment => {
                self.from_workload(source).await
            }
        }
    }

    async fn from_config_map(&self) -> Option<ProxyParameters> {
        let s = &self.settings;

        let direct = ok_or_warn(
            self.cluster
                .config_map_entry(&s.namespace, &s.config_map, &s.config_key)
                .await,
            "query ConfigMap entry",
        )
        .flatten();

        let document = match direct {
            Some(document) => document,
            None => {
                debug!("Direct ConfigMap query was empty, reading the full object");
                let config_map = ok_or_warn(
                    self.cluster.config_map(&s.namespace, &s.config_map).await,
                    "get ConfigMap",
                )?;
                config_map.entry(&s.config_key)?.to_string()
            }
        };

        match ProxyParameters::from_v2ray_config(&document) {
            Ok(params) => Some(params),
            Err(e) => {
                warn!(
                    "ConfigMap {}/{} holds an unusable config: {}",
                    s.namespace, s.config_map, e
                );
                None
            }
        }
    }

    async fn from_workload(&self, source: ParameterSource) -> Option<ProxyParameters> {
        let s = &self.settings;

        let workloads = match source {
            ParameterSource::DaemonSet => self.cluster.daemon_sets(&s.namespace).await,
            _ => self.cluster.deployments(&s.namespace).await,
        };
        let workloads = ok_or_warn(workloads, "list workloads")?;
        let Some(workload) = workloads
            .iter()
            .find(|w| w.metadata.name.contains(&s.workload_marker))
        else {
            debug!(
                "No {} in {} matches {:?}",
                source, s.namespace, s.workload_marker
            );
            return None;
        };

        let port = self.workload_port(workload).await;

        if let Some(id) = workload.env_value(&s.identifier_env) {
            debug!("Client id taken from {} of {}", s.identifier_env, workload.metadata.name);
            return Some(ProxyParameters {
                port,
                id: id.to_string(),
                ..ProxyParameters::fallback()
            });
        }

        let pod = self.pick_pod(source).await?;
        let document = ok_or_warn(
            self.cluster
                .read_pod_file(&s.namespace, &pod.metadata.name, &s.pod_config_path)
                .await,
            "read live V2Ray config",
        )?;

        match ProxyParameters::from_v2ray_config(&document) {
            Ok(live) => Some(ProxyParameters { port, ..live }),
            Err(e) => {
                warn!(
                    "Live config in pod {} is unusable: {}",
                    pod.metadata.name, e
                );
                None
            }
        }
    }

    /// Service node port, else the declared container port, else the default.
    async fn workload_port(&self, workload: &Workload) -> u16 {
        let s = &self.settings;
        let name = &workload.metadata.name;

        let services =
            ok_or_warn(self.cluster.services(&s.namespace).await, "list services")
                .unwrap_or_default();
        let node_port = services
            .iter()
            .find(|svc| &svc.metadata.name == name)
            .or_else(|| {
                services
                    .iter()
                    .find(|svc| svc.metadata.name.contains(&s.workload_marker))
            })
            .and_then(|svc| svc.node_port());

        node_port
            .or_else(|| workload.container_port())
            .unwrap_or(parameters::DEFAULT_PORT)
    }

    async fn pick_pod(&self, source: ParameterSource) -> Option<Pod> {
        let s = &self.settings;
        let selector = match source {
            ParameterSource::DaemonSet => Some(s.pod_selector.as_str()),
            _ => None,
        };

        let mut pods = ok_or_warn(self.cluster.pods(&s.namespace, selector).await, "list pods")?;
        if pods.is_empty() {
            debug!("No pod to read the live config from");
            return None;
        }

        match source {
            // selected pods: the first running one, else the first listed
            ParameterSource::DaemonSet => {
                let index = pods.iter().position(Pod::is_running).unwrap_or(0);
                Some(pods.swap_remove(index))
            }
            _ => pods.into_iter().next(),
        }
    }
}
