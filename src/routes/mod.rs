//! HTTP surface of the service.

use actix_web::error::InternalError;
use actix_web::{HttpResponse, get, web};

use crate::dto::api::{ApiResponse, CODE_FAIL, CODE_INTERNAL, CODE_NOT_FOUND, CODE_UNPROCESSABLE};
use crate::services::ServiceError;

pub mod leads;

fn unprocessable(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(ApiResponse::failure(CODE_UNPROCESSABLE, msg))
}

/// JSON body extractor settings answering malformed bodies with a 422 envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = unprocessable(err.to_string());
        InternalError::from_response(err, response).into()
    })
}

/// Query string extractor settings answering malformed queries with a 422 envelope.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = unprocessable(err.to_string());
        InternalError::from_response(err, response).into()
    })
}

/// Business failure: HTTP 200 with a code 400 envelope.
pub fn fail(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::failure(CODE_FAIL, msg))
}

/// Maps a service error to its response. `denied` is the message used when
/// the caller is not a superuser.
pub fn error_response(err: ServiceError, denied: &str) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => fail(denied),
        ServiceError::Forbidden => fail("forbidden"),
        ServiceError::LeadNotFound => fail("lead not found"),
        ServiceError::UserNotFound => HttpResponse::NotFound()
            .json(ApiResponse::failure(CODE_NOT_FOUND, "user not found")),
        ServiceError::Form(message) | ServiceError::TypeConstraint(message) => {
            unprocessable(message)
        }
        ServiceError::Repository(err) => {
            log::error!("Repository failure: {err}");
            HttpResponse::InternalServerError()
                .json(ApiResponse::failure(CODE_INTERNAL, "internal server error"))
        }
    }
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok("OK"))
}
