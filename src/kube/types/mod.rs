pub mod config_map;
pub mod nodes;
pub mod pod;
pub mod workload;

use serde::{Deserialize, Serialize};

pub use config_map::ConfigMap;
pub use nodes::{AddressType, NodeListResponse};
pub use pod::{Pod, PodListResponse};
pub use workload::{Service, ServiceListResponse, Workload, WorkloadListResponse};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}
