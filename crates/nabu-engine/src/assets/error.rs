use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// Strict lookup of a name that was never registered.
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse font: {0}")]
    Font(String),
}
