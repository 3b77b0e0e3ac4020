use serde::{Deserialize, Serialize};

use super::ObjectMeta;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: Option<PodStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodListResponse {
    pub items: Vec<Pod>,
}

impl Pod {
    pub fn is_running(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            == Some("Running")
    }
}
