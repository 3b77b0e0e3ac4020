use std::fmt;

use serde_json::Value;

/// Connection parameters of the deployed V2Ray workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyParameters {
    pub port: u16,
    pub id: String,
    /// VMess alterId
    pub alter_id: u32,
    pub network: String,
    pub security: String,
}

pub const DEFAULT_PORT: u16 = 30800;
pub const DEFAULT_ID: &str = "939b17c4-229d-427b-8a3e-340036847800";
pub const DEFAULT_ALTER_ID: u32 = 64;
pub const DEFAULT_NETWORK: &str = "tcp";
pub const DEFAULT_SECURITY: &str = "auto";

/// Where parameters may come from, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterSource {
    ConfigMap,
    DaemonSet,
    Deployment,
}

impl ParameterSource {
    pub const ORDER: [ParameterSource; 3] = [
        ParameterSource::ConfigMap,
        ParameterSource::DaemonSet,
        ParameterSource::Deployment,
    ];
}

impl fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSource::ConfigMap => write!(f, "ConfigMap"),
            ParameterSource::DaemonSet => write!(f, "DaemonSet"),
            ParameterSource::Deployment => write!(f, "Deployment"),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    JsonParseError(serde_json::Error),
    MissingField(&'static str),
    InvalidField { field: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::JsonParseError(err) => write!(f, "JSON parsing error: {}", err),
            ConfigError::MissingField(field) => write!(f, "missing field {}", field),
            ConfigError::InvalidField { field, value } => {
                write!(f, "invalid value for {}: {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::JsonParseError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::JsonParseError(err)
    }
}

const PORT: &str = "/inbounds/0/port";
const CLIENT_ID: &str = "/inbounds/0/settings/clients/0/id";
const ALTER_ID: &str = "/inbounds/0/settings/clients/0/alterId";
const NETWORK: &str = "/inbounds/0/streamSettings/network";
const SECURITY: &str = "/inbounds/0/streamSettings/security";

impl ProxyParameters {
    /// Used when nothing in the cluster describes the workload.
    pub fn fallback() -> Self {
        ProxyParameters {
            port: DEFAULT_PORT,
            id: DEFAULT_ID.to_string(),
            alter_id: DEFAULT_ALTER_ID,
            network: DEFAULT_NETWORK.to_string(),
            security: DEFAULT_SECURITY.to_string(),
        }
    }

    /// Reads the first inbound's first client out of a V2Ray server config.
    ///
    /// `port`, the client `id` and `alterId`, and the stream `network` and
    /// `security` must all be present; anything missing or mistyped is an error.
    pub fn from_v2ray_config(document: &str) -> Result<Self, ConfigError> {
        let config: Value = serde_json::from_str(document)?;

        let port = match config.pointer(PORT) {
            Some(Value::Number(n)) => n.as_u64().map(|n| n.to_string()),
            // v2ray also accepts the port as a string
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => return Err(ConfigError::MissingField("inbounds[0].port")),
        };
        let port = port
            .as_deref()
            .and_then(|p| p.trim().parse::<u16>().ok())
            .filter(|p| *p != 0)
            .ok_or_else(|| ConfigError::InvalidField {
                field: "inbounds[0].port",
                value: config.pointer(PORT).map(Value::to_string).unwrap_or_default(),
            })?;

        let id = config
            .pointer(CLIENT_ID)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingField("inbounds[0].settings.clients[0].id"))?
            .to_string();

        let alter_id = match config.pointer(ALTER_ID) {
            None | Some(Value::Null) => {
                return Err(ConfigError::MissingField(
                    "inbounds[0].settings.clients[0].alterId",
                ))
            }
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| ConfigError::InvalidField {
                    field: "inbounds[0].settings.clients[0].alterId",
                    value: value.to_string(),
                })?,
        };

        Ok(ProxyParameters {
            port,
            id,
            alter_id,
            network: required_string(&config, NETWORK, "inbounds[0].streamSettings.network")?,
            security: required_string(&config, SECURITY, "inbounds[0].streamSettings.security")?,
        })
    }
}

fn required_string(
    config: &Value,
    pointer: &str,
    field: &'static str,
) -> Result<String, ConfigError> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Err(ConfigError::MissingField(field)),
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(other) => Err(ConfigError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_CONFIG: &str = r#"{
        "log": {"loglevel": "warning"},
        "inbounds": [{
            "port": 10086,
            "protocol": "vmess",
            "settings": {"clients": [
                {"id": "b831381d-6324-4d53-ad4f-8cda48b30811", "alterId": 32},
                {"id": "second-client", "alterId": 0}
            ]},
            "streamSettings": {"network": "ws", "security": "none"}
        }],
        "outbounds": [{"protocol": "freedom"}]
    }"#;

    #[test]
    fn reads_first_client_of_first_inbound() {
        let params = ProxyParameters::from_v2ray_config(SERVER_CONFIG).unwrap();

        assert_eq!(
            params,
            ProxyParameters {
                port: 10086,
                id: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                alter_id: 32,
                network: "ws".to_string(),
                security: "none".to_string(),
            }
        );
    }

    #[test]
    fn missing_stream_settings_are_an_error() {
        let err = ProxyParameters::from_v2ray_config(
            r#"{"inbounds": [{"port": 10086, "settings": {"clients": [{"id": "abc", "alterId": 0}]}}]}"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::MissingField("inbounds[0].streamSettings.network")
        ));
    }

    #[test]
    fn missing_alter_id_is_an_error() {
        let err = ProxyParameters::from_v2ray_config(
            r#"{"inbounds": [{"port": 10086,
                "settings": {"clients": [{"id": "abc"}]},
                "streamSettings": {"network": "tcp", "security": "none"}}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn mistyped_security_is_an_error() {
        let err = ProxyParameters::from_v2ray_config(
            r#"{"inbounds": [{"port": "30800",
                "settings": {"clients": [{"id": "abc", "alterId": 0}]},
                "streamSettings": {"network": "tcp", "security": 1}}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn missing_client_id_is_an_error() {
        let err = ProxyParameters::from_v2ray_config(
            r#"{"inbounds": [{"port": 10086, "settings": {"clients": []}}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn out_of_range_port_is_an_error() {
        for port in ["0", "65536", "\"1000-2000\""] {
            let document = format!(
                r#"{{"inbounds": [{{"port": {}, "settings": {{"clients": [{{"id": "abc"}}]}}}}]}}"#,
                port
            );
            let err = ProxyParameters::from_v2ray_config(&document).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidField { .. }),
                "port {} accepted",
                port
            );
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = ProxyParameters::from_v2ray_config("{\"inbounds\": [").unwrap_err();
        assert!(matches!(err, ConfigError::JsonParseError(_)));
    }

    #[test]
    fn fallback_literal() {
        let params = ProxyParameters::fallback();

        assert_eq!(params.port, 30800);
        assert_eq!(params.id, "939b17c4-229d-427b-8a3e-340036847800");
        assert_eq!(params.alter_id, 64);
        assert_eq!(params.network, "tcp");
        assert_eq!(params.security, "auto");
    }
}
