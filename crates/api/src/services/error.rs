//! Domain workflow error types.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;

/// Message used for every missing required field.
pub const MISSING_FIELD: &str = "Missing data for required field.";

/// Validation messages keyed by request field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    /// Create an empty set of field errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Returns true if no field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Turn a required value into an error entry when absent.
    pub fn require<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, MISSING_FIELD);
        }
        value
    }
}

/// Errors returned by the bookstore workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The acting user does not own a referenced entity.
    #[error("{0}")]
    Forbidden(String),

    /// The entity is in a state that does not allow the operation.
    #[error("{0}")]
    InvalidState(String),

    /// The operation would duplicate an existing entry.
    #[error("{0}")]
    Conflict(String),

    /// Request fields failed validation.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// `"<Entity> not found."`
    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found."))
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
