pub mod error;
pub mod link;

pub use error::RenderError;
pub use link::ShareLink;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::*;

use crate::discovery::ProxyParameters;

pub const REMARKS_PREFIX: &str = "V2Ray-";

/// One client-side server entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub address: String,
    pub port: u16,
    pub id: String,
    pub alter_id: u32,
    pub security: String,
    pub network: String,
    pub remarks: String,
    pub header_type: String,
    pub request_host: String,
    pub path: String,
    pub stream_security: String,
}

impl ServerRecord {
    pub fn new(address: &str, params: &ProxyParameters) -> Self {
        ServerRecord {
            address: address.to_string(),
            port: params.port,
            id: params.id.clone(),
            alter_id: params.alter_id,
            security: "auto".to_string(),
            network: params.network.clone(),
            remarks: format!("{}{}", REMARKS_PREFIX, address),
            header_type: "none".to_string(),
            request_host: String::new(),
            path: String::new(),
            stream_security: String::new(),
        }
    }
}

/// The file handed to clients: every server, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "v2ray_servers")]
    pub servers: Vec<ServerRecord>,
}

impl ClientConfig {
    pub fn from_addresses(
        addresses: &[String],
        params: &ProxyParameters,
    ) -> Result<Self, RenderError> {
        if addresses.is_empty() {
            return Err(RenderError::NoAddresses);
        }

        Ok(ClientConfig {
            servers: addresses
                .iter()
                .map(|address| ServerRecord::new(address, params))
                .collect(),
        })
    }

    /// Pretty-printed with two-space indentation; replaces any existing file.
    pub async fn write_to(&self, path: &Path) -> Result<(), RenderError> {
        let document = serde_json::to_string_pretty(self)?;

        tokio::fs::write(path, document)
            .await
            .map_err(|source| RenderError::WriteError {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Wrote {} servers to {}", self.servers.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn params() -> ProxyParameters {
        ProxyParameters {
            port: 30800,
            id: "abc".to_string(),
            alter_id: 64,
            network: "tcp".to_string(),
            security: "auto".to_string(),
        }
    }

    fn addresses() -> Vec<String> {
        vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()]
    }

    #[test]
    fn one_record_per_address_in_order() {
        let config = ClientConfig::from_addresses(&addresses(), &params()).unwrap();

        let remarks: Vec<&str> = config.servers.iter().map(|s| s.remarks.as_str()).collect();
        assert_eq!(remarks, vec!["V2Ray-1.2.3.4", "V2Ray-5.6.7.8"]);
        assert!(config.servers.iter().all(|s| s.security == "auto"
            && s.header_type == "none"
            && s.stream_security.is_empty()));
    }

    #[test]
    fn duplicates_are_kept() {
        let addresses = vec!["1.2.3.4".to_string(), "1.2.3.4".to_string()];
        let config = ClientConfig::from_addresses(&addresses, &params()).unwrap();
        assert_eq!(config.servers.len(), 2);
    }

    #[test]
    fn empty_address_list_is_rejected() {
        let err = ClientConfig::from_addresses(&[], &params()).unwrap_err();
        assert!(matches!(err, RenderError::NoAddresses));
    }

    #[test]
    fn record_serializes_with_client_field_names() {
        let value = serde_json::to_value(ServerRecord::new("1.2.3.4", &params())).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "address": "1.2.3.4",
                "port": 30800,
                "id": "abc",
                "alterId": 64,
                "security": "auto",
                "network": "tcp",
                "remarks": "V2Ray-1.2.3.4",
                "headerType": "none",
                "requestHost": "",
                "path": "",
                "streamSecurity": ""
            })
        );
    }

    #[tokio::test]
    async fn written_file_is_pretty_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v2ray_client_config.json");
        std::fs::write(&path, "stale content that is much longer than nothing").unwrap();

        let config = ClientConfig::from_addresses(&addresses(), &params()).unwrap();
        config.write_to(&path).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        config.write_to(&path).await.unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("{\n  \"v2ray_servers\": [\n    {\n      \"address\": \"1.2.3.4\""));
        let parsed: ClientConfig = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn share_links_follow_record_order() {
        let config = ClientConfig::from_addresses(&addresses(), &params()).unwrap();

        let added: Vec<String> = config
            .servers
            .iter()
            .map(|server| {
                let link = ShareLink::for_record(server).unwrap().to_string();
                let encoded = link.strip_prefix("vmess://").unwrap();
                let payload: serde_json::Value =
                    serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
                payload["add"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(added, addresses());
    }
}
