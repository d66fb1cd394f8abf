use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unit not found: {0}")]
    UnitNotFound(i64),

    #[error("No readings found for unit: {0}")]
    NoReadingsForUnit(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
