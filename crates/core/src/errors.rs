use thiserror::Error;

use crate::approvals::ApprovalError;

/// Failures as the service layer sees them: engine verdicts plus the
/// infrastructure concerns underneath it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

/// Transport-facing shape. The engine has no notion of HTTP status codes;
/// this layer is where its taxonomy picks up one, along with a user-safe
/// message and the correlation id for log cross-referencing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::NotFound { .. } => "The requested record does not exist.",
            Self::Conflict { .. } => "The decision was already recorded.",
            Self::Forbidden { .. } => "You are not the assigned approver for this step.",
            Self::Unprocessable { message, .. } => message,
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::NotFound { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::Forbidden { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            ApplicationError::Approval(ApprovalError::NotFound) => InterfaceError::NotFound {
                message: "approval request or decision row not found".to_string(),
                correlation_id,
            },
            ApplicationError::Approval(ApprovalError::AlreadyDecided) => InterfaceError::Conflict {
                message: "decision already recorded or request terminal".to_string(),
                correlation_id,
            },
            ApplicationError::Approval(ApprovalError::Unauthorized) => InterfaceError::Forbidden {
                message: "caller is not the assigned approver".to_string(),
                correlation_id,
            },
            ApplicationError::Approval(ApprovalError::Validation(message)) => {
                InterfaceError::Unprocessable { message, correlation_id }
            }
            ApplicationError::Persistence(message) => {
                InterfaceError::ServiceUnavailable { message, correlation_id }
            }
            ApplicationError::Configuration(message) => {
                InterfaceError::Internal { message, correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, InterfaceError};
    use crate::approvals::ApprovalError;

    #[test]
    fn engine_taxonomy_maps_onto_distinct_interface_variants() {
        let cases = [
            (ApprovalError::NotFound, "not found"),
            (ApprovalError::AlreadyDecided, "conflict"),
            (ApprovalError::Unauthorized, "forbidden"),
            (ApprovalError::Validation("x".to_string()), "unprocessable"),
        ];
        for (error, prefix) in cases {
            let mapped = ApplicationError::from(error).into_interface("req-9");
            assert!(mapped.to_string().starts_with(prefix), "{mapped}");
            assert_eq!(mapped.correlation_id(), "req-9");
        }
    }

    #[test]
    fn persistence_failure_is_unavailable_with_safe_message() {
        let mapped =
            ApplicationError::Persistence("database lock timeout".to_string()).into_interface("r1");
        assert!(matches!(mapped, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            mapped.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn validation_message_is_passed_through_to_the_user() {
        let mapped = ApplicationError::from(ApprovalError::Validation(
            "a denial requires a non-empty comment".to_string(),
        ))
        .into_interface("r2");
        assert_eq!(mapped.user_message(), "a denial requires a non-empty comment");
    }
}
