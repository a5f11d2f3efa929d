//! Error types shared by the provider and the fleet driver.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ShotError {
    /// The provider rejected or failed a request.
    #[error("{operation} failed: {source}")]
    Client {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("waiting for {instance_id} to become {target} failed: {message}")]
    Wait {
        instance_id: String,
        target: &'static str,
        message: String,
    },

    #[error("{resource} returned without {field}")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },

    #[error("AWS profile files: {0}")]
    Profile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShotError {
    pub fn client<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ShotError::Client {
            operation,
            source: Box::new(source),
        }
    }

    /// Errors of this class are recoverable per instance in batch operations.
    pub fn is_client(&self) -> bool {
        matches!(self, ShotError::Client { .. })
    }
}

pub type Result<T> = std::result::Result<T, ShotError>;
