use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::discovery::DiscoverySettings;
use crate::retry::RetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Shell out to `kubectl`
    Kubectl,
    /// Talk to the API server over HTTPS
    Api,
}

pub struct Environment {
    pub backend: Backend,
    pub kubectl_bin: String,
    pub kube_api_server: String,
    pub kube_token: String,
    pub kube_ca_cert: Option<PathBuf>,
    pub discovery: DiscoverySettings,
    pub output_file: PathBuf,
    pub retry: RetryConfig,
    pub command_timeout: Duration,
}

fn string_var(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            debug!("{} loaded from environment", name);
            value.trim().to_string()
        }
        _ => {
            debug!("{} not set, defaulting to {:?}", name, default);
            default.to_string()
        }
    }
}

fn number_var<T: FromStr + std::fmt::Display + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => {
                debug!("{} loaded from environment", name);
                value
            }
            Err(_) => {
                warn!("{}={:?} is not a valid number, using {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

impl Environment {
    pub fn new() -> Self {
        let backend = match std::env::var("DISCOVERY_BACKEND") {
            Ok(val) => match val.to_lowercase().as_str() {
                "api" => Backend::Api,
                "kubectl" | "" => Backend::Kubectl,
                other => {
                    warn!("Unknown DISCOVERY_BACKEND {:?}, using kubectl", other);
                    Backend::Kubectl
                }
            },
            Err(_) => {
                debug!("DISCOVERY_BACKEND not set, defaulting to kubectl");
                Backend::Kubectl
            }
        };
        info!("Discovery backend: {:?}", backend);

        let kube_api_server = match std::env::var("KUBE_API_SERVER") {
            Ok(server) => {
                debug!("KUBE_API_SERVER loaded from environment");
                server
            }
            Err(_) => {
                if backend == Backend::Api {
                    warn!("KUBE_API_SERVER not found in environment, using default localhost");
                }
                "https://localhost:6443".to_string()
            }
        };

        let kube_token = match std::env::var("KUBE_TOKEN") {
            Ok(token) => {
                debug!("KUBE_TOKEN loaded from environment");
                token
            }
            Err(_) => {
                if backend == Backend::Api {
                    warn!("KUBE_TOKEN not found in environment, requests will be anonymous");
                }
                String::new()
            }
        };

        let kube_ca_cert = std::env::var("KUBE_CA_CERT").ok().map(PathBuf::from);

        let defaults = DiscoverySettings::default();
        let discovery = DiscoverySettings {
            namespace: string_var("V2RAY_NAMESPACE", &defaults.namespace),
            config_map: string_var("V2RAY_CONFIGMAP", &defaults.config_map),
            config_key: string_var("V2RAY_CONFIG_KEY", &defaults.config_key),
            workload_marker: string_var("V2RAY_WORKLOAD_MARKER", &defaults.workload_marker),
            pod_selector: string_var("V2RAY_POD_SELECTOR", &defaults.pod_selector),
            pod_config_path: string_var("V2RAY_POD_CONFIG_PATH", &defaults.pod_config_path),
            identifier_env: string_var("V2RAY_UUID_ENV", &defaults.identifier_env),
        };

        let retry_defaults = RetryConfig::default();
        let retry = RetryConfig::new(
            number_var("COMMAND_RETRIES", retry_defaults.max_attempts),
            Duration::from_secs(number_var(
                "COMMAND_RETRY_DELAY_SECS",
                retry_defaults.delay.as_secs(),
            )),
        );

        Environment {
            backend,
            kubectl_bin: string_var("KUBECTL_BIN", "kubectl"),
            kube_api_server,
            kube_token,
            kube_ca_cert,
            discovery,
            output_file: PathBuf::from(string_var(
                "CLIENT_CONFIG_FILE",
                "v2ray_client_config.json",
            )),
            retry,
            command_timeout: Duration::from_secs(number_var("COMMAND_TIMEOUT_SECS", 30u64)),
        }
    }
}
