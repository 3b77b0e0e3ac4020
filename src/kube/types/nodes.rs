use serde::{Deserialize, Serialize};

use super::ObjectMeta;

// Node API Response (/api/v1/nodes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeListResponse {
    pub items: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: Option<NodeStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub addresses: Vec<NodeAddressEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAddressEntry {
    #[serde(rename = "type")]
    pub type_field: String,
    pub address: String,
}

/// The `status.addresses[].type` values discovery asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    ExternalIp,
    InternalIp,
}

impl AddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::ExternalIp => "ExternalIP",
            AddressType::InternalIp => "InternalIP",
        }
    }
}

impl NodeListResponse {
    pub fn names(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|node| node.metadata.name.clone())
            .collect()
    }

    /// All addresses of the given type, in node order.
    pub fn addresses(&self, address_type: AddressType) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|node| node.status.as_ref())
            .flat_map(|status| status.addresses.iter())
            .filter(|entry| entry.type_field == address_type.as_str())
            .map(|entry| entry.address.clone())
            .collect()
    }
}
