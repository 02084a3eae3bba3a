use crate::daemon::ConnectionState;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    /// Nothing answered on the RPC endpoint, or it answered with a non-2xx status.
    #[error("daemon not launched: {endpoint} ({reason})")]
    DaemonNotLaunched { endpoint: String, reason: String },

    /// The response body was missing the named field or it had the wrong shape.
    #[error("response mismatch: missing or invalid `{0}`")]
    ResponseMismatch(String),

    #[error("a daemon subprocess is already tracked")]
    SubprocessStateInconsistent,

    /// The launch that asked for a spawn no longer owns the state.
    #[error("launch superseded: state is now {0}")]
    LaunchSuperseded(ConnectionState),

    #[error("no daemon executable found (searched {} paths)", .searched.len())]
    ExecutableNotFound { searched: Vec<PathBuf> },

    #[error("failed to launch {}: {source}", .path.display())]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A batch call succeeded but the entry for `url` carried an error marker.
    #[error("failed to resolve {url}: {reason}")]
    ResourceResolveFailed { url: String, reason: String },

    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl SdkError {
    pub fn mismatch(field: impl Into<String>) -> Self {
        Self::ResponseMismatch(field.into())
    }

    /// True for failures that mean the daemon is not answering at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::DaemonNotLaunched { .. })
    }
}

pub type Result<T> = std::result::Result<T, SdkError>;
