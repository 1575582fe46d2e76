use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::{ErrorResponse, ValidationError};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request data: {0}")]
    InvalidRequest(String),
    #[error("Already voted")]
    DuplicateVote,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Method not allowed")]
    MethodNotSupported,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::InvalidRequest(_) => Status::BadRequest,
            ApiError::DuplicateVote => Status::Conflict,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::StoreUnavailable(_) => Status::InternalServerError,
            ApiError::MethodNotSupported => Status::MethodNotAllowed,
        }
    }

    /// Client-facing body. Store failure details stay in the logs.
    pub fn body(&self) -> ErrorResponse {
        match self {
            ApiError::DuplicateVote => {
                ErrorResponse::with_message("Already voted", "You have already voted")
            }
            ApiError::StoreUnavailable(_) => ErrorResponse::new("Store unavailable"),
            other => ErrorResponse::new(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::StoreUnavailable(e.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();

        rocket::Response::build_from(Json(self.body()).respond_to(req)?)
            .status(status)
            .ok()
    }
}
