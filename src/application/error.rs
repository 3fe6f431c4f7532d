use std::error::Error as StdError;

use thiserror::Error;

use crate::application::repos::{LocalStateError, RepoError};
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Error message chain captured for the final report.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn summary(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    LocalState(#[from] LocalStateError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("sign in required")]
    SignInRequired,
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// True for errors caught before any remote call was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_) | AppError::Domain(DomainError::Validation { .. })
        )
    }

    /// Text shown inline next to the control that failed.
    pub fn presentation_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::Validation { message }) | AppError::Validation(message) => {
                message.clone()
            }
            AppError::Domain(DomainError::NotFound { .. }) | AppError::NotFound => {
                "Not found".to_string()
            }
            AppError::Repo(err) => err.user_message(),
            AppError::SignInRequired => "Please log in to continue".to_string(),
            AppError::LocalState(_) => "Local settings are unavailable".to_string(),
            AppError::Infra(InfraError::Configuration { .. }) => {
                "Client is misconfigured".to_string()
            }
            AppError::Infra(_) | AppError::Unexpected(_) => "Unexpected error occurred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let err = InfraError::from(std::io::Error::other("disk full"));
        let report = ErrorReport::from_error("test", &err);
        assert_eq!(report.messages[0], "io error: disk full");
        assert!(report.summary().starts_with("io error"));
    }

    #[test]
    fn rejected_calls_surface_backend_message() {
        let err = AppError::from(RepoError::Rejected {
            status: 400,
            message: "Invalid login credentials".into(),
        });
        assert_eq!(err.presentation_message(), "Invalid login credentials");
        assert!(!err.is_validation());
    }

    #[test]
    fn validation_errors_are_flagged() {
        let err = AppError::from(DomainError::validation("Title is required"));
        assert!(err.is_validation());
        assert_eq!(err.presentation_message(), "Title is required");
    }
}
