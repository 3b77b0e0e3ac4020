use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum RenderError {
    NoAddresses,
    WriteError { path: PathBuf, source: std::io::Error },
    JsonError(serde_json::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoAddresses => write!(f, "No node addresses to render"),
            RenderError::WriteError { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            RenderError::JsonError(err) => write!(f, "JSON serialization error: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::NoAddresses => None,
            RenderError::WriteError { source, .. } => Some(source),
            RenderError::JsonError(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::JsonError(err)
    }
}
