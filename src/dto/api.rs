//! JSON envelopes returned by every API endpoint.
//!
//! Business failures (missing rights, missing lead) travel as a failure
//! envelope with HTTP 200; only transport-level problems change the status.

use serde::Serialize;

use crate::dto::leads::LeadsPage;

pub const CODE_OK: u16 = 200;
pub const CODE_FAIL: u16 = 400;
pub const CODE_NOT_FOUND: u16 = 404;
pub const CODE_UNPROCESSABLE: u16 = 422;
pub const CODE_INTERNAL: u16 = 500;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub msg: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(code: u16, msg: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code,
            msg: msg.into(),
            data,
            total: None,
            page: None,
            page_size: None,
        }
    }

    /// Success envelope carrying `data`.
    pub fn success(msg: impl Into<String>, data: T) -> Self {
        Self::new(CODE_OK, msg, Some(data))
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Success envelope for one page of a listing.
    pub fn paged(page: LeadsPage<T>) -> Self {
        Self {
            total: Some(page.total),
            page: Some(page.page),
            page_size: Some(page.page_size),
            ..Self::new(CODE_OK, "OK", Some(page.items))
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope without a payload.
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::new(CODE_OK, msg, None)
    }

    /// Failure envelope with the given code.
    pub fn failure(code: u16, msg: impl Into<String>) -> Self {
        Self::new(code, msg, None)
    }
}
