//! Common error types used throughout postergrid.
//!
//! Every stage of a run (catalog fetch, compositing, encoding, publishing)
//! reports failures through this one enum. Most of them are not fatal: the
//! caller records them as a skip and carries on with the rest of the run.

/// Common error type for postergrid.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote endpoint answered with a non-success status.
    #[error("Remote returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL with credentials stripped.
        url: String,
    },

    /// Image decoding or encoding failed inside the `image` crate.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// An encoder outside the `image` crate failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// An object-storage upload failed.
    #[error("Upload error: {0}")]
    Upload(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Encode error.
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a new Upload error.
    pub fn upload<S: Into<String>>(msg: S) -> Self {
        Self::Upload(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a Status error from a status code and URL.
    pub fn status<S: Into<String>>(status: u16, url: S) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("TMDB_API_KEY not set");
        assert_eq!(err.to_string(), "Configuration error: TMDB_API_KEY not set");

        let err = Error::upload("bucket refused");
        assert_eq!(err.to_string(), "Upload error: bucket refused");

        let err = Error::status(404, "https://api.themoviedb.org/3/movie/popular");
        assert_eq!(
            err.to_string(),
            "Remote returned 404 for https://api.themoviedb.org/3/movie/popular"
        );

        let err = Error::invalid_input("zero-sized tile");
        assert_eq!(err.to_string(), "Invalid input: zero-sized tile");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_image() {
        let img_err = image::load_from_memory(b"not an image").unwrap_err();
        let err = Error::from(img_err);
        assert!(matches!(err, Error::Image(_)));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::encode("x"), Error::Encode(_)));
        assert!(matches!(Error::internal("x"), Error::Internal(_)));
        assert!(matches!(Error::status(500, "u"), Error::Status { status: 500, .. }));
    }
}
