use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum KubeError {
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    Timeout {
        command: String,
        after: Duration,
    },
    Io(std::io::Error),
    HttpError(reqwest::Error),
    JsonParseError(serde_json::Error),
    ParseError(String),
    Unsupported(&'static str),
}

impl fmt::Display for KubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KubeError::CommandFailed {
                command,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "`{}` exited with {}: {}", command, code, stderr),
                None => write!(f, "`{}` terminated by signal: {}", command, stderr),
            },
            KubeError::Timeout { command, after } => {
                write!(f, "`{}` timed out after {:?}", command, after)
            }
            KubeError::Io(err) => write!(f, "I/O error: {}", err),
            KubeError::HttpError(err) => write!(f, "HTTP request error: {}", err),
            KubeError::JsonParseError(err) => write!(f, "JSON parsing error: {}", err),
            KubeError::ParseError(err) => write!(f, "Parse error: {}", err),
            KubeError::Unsupported(what) => write!(f, "Unsupported by this backend: {}", what),
        }
    }
}

impl std::error::Error for KubeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KubeError::Io(err) => Some(err),
            KubeError::HttpError(err) => Some(err),
            KubeError::JsonParseError(err) => Some(err),
            KubeError::CommandFailed { .. }
            | KubeError::Timeout { .. }
            | KubeError::ParseError(_)
            | KubeError::Unsupported(_) => None,
        }
    }
}

impl From<std::io::Error> for KubeError {
    fn from(err: std::io::Error) -> Self {
        KubeError::Io(err)
    }
}

impl From<reqwest::Error> for KubeError {
    fn from(err: reqwest::Error) -> Self {
        KubeError::HttpError(err)
    }
}

impl From<serde_json::Error> for KubeError {
    fn from(err: serde_json::Error) -> Self {
        KubeError::JsonParseError(err)
    }
}
