use thiserror::Error;

/// Errors surfaced by the library.
///
/// Hosted-backend failures keep the service's own message so it can be shown
/// to the user as-is. Nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid numeric values in: {}", .0.join(", "))]
    InvalidNumbers(Vec<String>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The hosted backend URL or key is missing; only static data is served.
    #[error("Backend not configured")]
    NotConfigured,

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Local storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = Error::MissingFields(vec!["title".into(), "price".into()]);
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: title, price"
        );
    }

    #[test]
    fn backend_message_is_kept_verbatim() {
        let err = Error::Backend {
            status: 409,
            message: "duplicate key value".into(),
        };
        assert!(err.to_string().ends_with("duplicate key value"));
    }
}
