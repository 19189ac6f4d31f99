//! Payload definitions backing the leads routes.

use thiserror::Error;
use validator::ValidationErrors;

pub mod leads;

#[derive(Debug, Error)]
/// Errors that can occur when processing request payloads.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid lead id")]
    InvalidLeadId,

    #[error("invalid user id")]
    InvalidUserId,

    #[error("invalid phone")]
    InvalidPhone,

    #[error("invalid wechat")]
    InvalidWechat,

    #[error("intention level must be between 1 and 5")]
    InvalidIntentionLevel,
}
