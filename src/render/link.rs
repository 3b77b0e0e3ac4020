use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use super::ServerRecord;
use crate::render::error::RenderError;

pub const SHARE_LINK_SCHEME: &str = "vmess://";

/// VMess share link payload, "v2" format. Numbers are carried as strings.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VmessLink<'a> {
    pub v: &'a str,
    pub ps: &'a str,
    pub add: &'a str,
    pub port: String,
    pub id: &'a str,
    pub aid: String,
    pub net: &'a str,
    #[serde(rename = "type")]
    pub header_type: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub tls: &'a str,
}

impl<'a> VmessLink<'a> {
    pub fn from_record(record: &'a ServerRecord) -> Self {
        VmessLink {
            v: "2",
            ps: &record.remarks,
            add: &record.address,
            port: record.port.to_string(),
            id: &record.id,
            aid: record.alter_id.to_string(),
            net: &record.network,
            header_type: "none",
            host: "",
            path: "",
            tls: "",
        }
    }
}

/// `vmess://` followed by the base64 of the compact JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink(String);

impl ShareLink {
    pub fn for_record(record: &ServerRecord) -> Result<Self, RenderError> {
        let payload = serde_json::to_string(&VmessLink::from_record(record))?;
        Ok(ShareLink(format!(
            "{}{}",
            SHARE_LINK_SCHEME,
            STANDARD.encode(payload.as_bytes())
        )))
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ProxyParameters;

    fn decode(link: &ShareLink) -> serde_json::Value {
        let link = link.to_string();
        let encoded = link.strip_prefix(SHARE_LINK_SCHEME).unwrap();
        serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap()
    }

    #[test]
    fn payload_carries_record_fields_as_strings() {
        let params = ProxyParameters {
            port: 30800,
            id: "abc".to_string(),
            alter_id: 64,
            network: "tcp".to_string(),
            security: "auto".to_string(),
        };
        let record = ServerRecord::new("1.2.3.4", &params);

        let link = ShareLink::for_record(&record).unwrap();

        assert!(link.to_string().starts_with("vmess://"));
        assert_eq!(
            decode(&link),
            serde_json::json!({
                "v": "2",
                "ps": "V2Ray-1.2.3.4",
                "add": "1.2.3.4",
                "port": "30800",
                "id": "abc",
                "aid": "64",
                "net": "tcp",
                "type": "none",
                "host": "",
                "path": "",
                "tls": ""
            })
        );
    }

    #[test]
    fn payload_is_compact_json_in_fixed_field_order() {
        let record = ServerRecord::new("5.6.7.8", &ProxyParameters::fallback());
        let link = ShareLink::for_record(&record).unwrap().to_string();

        let encoded = link.strip_prefix(SHARE_LINK_SCHEME).unwrap();
        let payload = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();

        assert_eq!(
            payload,
            r#"{"v":"2","ps":"V2Ray-5.6.7.8","add":"5.6.7.8","port":"30800","id":"939b17c4-229d-427b-8a3e-340036847800","aid":"64","net":"tcp","type":"none","host":"","path":"","tls":""}"#
        );
    }
}
