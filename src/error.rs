use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene list '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scene list '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures inside the background media workers. These never stop playback;
/// the affected asset simply never becomes ready.
#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("fetch failed for '{uri}': {reason}")]
    Fetch { uri: String, reason: String },

    #[error("io error for '{uri}': {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("decode failed for '{uri}': {reason}")]
    Decode { uri: String, reason: String },

    #[error("failed to start ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
}

impl MediaError {
    pub fn fetch(uri: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(uri: &str, reason: impl ToString) -> Self {
        Self::Decode {
            uri: uri.to_string(),
            reason: reason.to_string(),
        }
    }
}
