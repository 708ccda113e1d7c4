//! Operator-facing forms validated before any gateway call.

use thiserror::Error;
use validator::ValidationErrors;

pub mod audience;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid name")]
    InvalidName,

    #[error("invalid phone number")]
    InvalidPhoneNumber,

    #[error("invalid country code")]
    InvalidCountryCode,

    #[error("import file is empty")]
    EmptyFile,

    #[error("import file exceeds {0} bytes")]
    FileTooLarge(usize),

    #[error("unsupported import file type: {0}")]
    UnsupportedFileType(String),
}
