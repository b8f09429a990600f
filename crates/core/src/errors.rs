use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("transcript invariant violation: {0}")]
    TranscriptInvariant(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("model call timed out: {0}")]
    ModelTimeout(String),
    #[error("model call failed: {0}")]
    ModelFailure(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("upstream model failed: {message}")]
    UpstreamFailure { message: String, correlation_id: String },
    #[error("upstream model timed out: {message}")]
    UpstreamTimeout { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::UpstreamFailure { .. } => {
                "The coffee expert is unavailable right now. Please retry shortly."
            }
            Self::UpstreamTimeout { .. } => {
                "The coffee expert took too long to answer. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::UpstreamFailure { correlation_id, .. }
            | Self::UpstreamTimeout { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::UpstreamFailure { correlation_id: id, .. }
            | InterfaceError::UpstreamTimeout { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::ModelTimeout(message) => {
                Self::UpstreamTimeout { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::ModelFailure(message) => {
                Self::UpstreamFailure { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn model_timeout_maps_to_upstream_timeout_with_correlation_id() {
        let interface =
            ApplicationError::ModelTimeout("30s elapsed".to_owned()).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::UpstreamTimeout {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.correlation_id(), "req-1");
    }

    #[test]
    fn model_failure_maps_to_upstream_failure() {
        let interface =
            ApplicationError::ModelFailure("status 429".to_owned()).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::UpstreamFailure { .. }));
        assert_eq!(
            interface.user_message(),
            "The coffee expert is unavailable right now. Please retry shortly."
        );
    }

    #[test]
    fn domain_error_maps_to_internal_error() {
        let interface = ApplicationError::from(DomainError::TranscriptInvariant(
            "index 0 is not a system message".to_owned(),
        ))
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
