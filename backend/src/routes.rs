use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, options, patch, post, put, State};
use shared::{CastVoteRequest, CastVoteResponse, DeviceHeader, SetVideoUrlRequest, SetVideoUrlResponse, Tally};
use tracing::debug;

use crate::error::ApiError;
use crate::processor::VotingService;

fn parse_body<T>(body: Result<Json<T>, json::Error<'_>>) -> Result<T, ApiError> {
    body.map(Json::into_inner).map_err(|e| {
        debug!("Unreadable request body: {}", e);
        ApiError::InvalidRequest("malformed JSON body".into())
    })
}

#[get("/voting")]
pub async fn get_tally(service: &State<VotingService>) -> Result<Json<Tally>, ApiError> {
    service.get_tally().await.map(Json)
}

#[post("/voting", data = "<body>")]
pub async fn cast_vote(
    service: &State<VotingService>,
    device: DeviceHeader,
    body: Result<Json<CastVoteRequest>, json::Error<'_>>,
) -> Result<Json<CastVoteResponse>, ApiError> {
    let request = parse_body(body)?;
    let device_id = device.resolve(&request.device_id);

    service.cast_vote(device_id, request.video_choice).await.map(Json)
}

#[post("/videos/url", data = "<body>")]
pub async fn set_video_url(
    service: &State<VotingService>,
    body: Result<Json<SetVideoUrlRequest>, json::Error<'_>>,
) -> Result<Json<SetVideoUrlResponse>, ApiError> {
    let request = parse_body(body)?;

    service
        .set_video_url(request.video_id, &request.video_url)
        .await
        .map(Json)
}

#[get("/videos/url")]
pub fn reject_get_video_url() -> ApiError {
    ApiError::MethodNotSupported
}

#[options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[put("/<_..>")]
pub fn reject_put() -> ApiError {
    ApiError::MethodNotSupported
}

#[patch("/<_..>")]
pub fn reject_patch() -> ApiError {
    ApiError::MethodNotSupported
}

#[delete("/<_..>")]
pub fn reject_delete() -> ApiError {
    ApiError::MethodNotSupported
}
