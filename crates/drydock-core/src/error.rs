use miette::Diagnostic;
use thiserror::Error;

/// Core error type for Drydock operations
#[derive(Error, Debug, Diagnostic)]
pub enum DrydockError {
    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(drydock::serialization_error),
        help("Ensure the document is valid JSON or YAML")
    )]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unknown instance group role
    #[error("Unknown instance group role: {role}")]
    #[diagnostic(
        code(drydock::invalid_role),
        help("Supported roles: control-plane, apiserver, node, bastion")
    )]
    InvalidRole { role: String },

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(drydock::internal_error),
        help("This is likely a bug. Please report it with the full error details")
    )]
    InternalError { message: String },
}

/// Result type alias for Drydock core operations
pub type Result<T> = std::result::Result<T, DrydockError>;

impl DrydockError {
    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create an InvalidRole error
    pub fn invalid_role(role: impl Into<String>) -> Self {
        Self::InvalidRole { role: role.into() }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DrydockError::invalid_role("edge");
        assert!(matches!(err, DrydockError::InvalidRole { .. }));
        assert!(err.to_string().contains("edge"));

        let err = DrydockError::serialization_error("bad yaml", None);
        assert!(matches!(err, DrydockError::SerializationError { .. }));
    }
}
