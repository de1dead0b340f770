use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Non-200 status, or a body that is not JSON.
    #[error("Failed to fetch from {url} with params {params}\n\nStatus code: {status}\nBody:\n{body}")]
    Http {
        url: String,
        params: String,
        status: u16,
        body: String,
    },

    #[error("cannot reach {url}: {message}")]
    Transport { url: String, message: String },

    /// Valid JSON without the expected shape.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScrapeError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
