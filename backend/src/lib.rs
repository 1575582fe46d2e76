pub mod catchers;
pub mod config;
pub mod cors;
pub mod error;
pub mod processor;
pub mod queries;
pub mod routes;
pub mod store;
pub use shared::{models::*, error::*, device::*};

use rocket::{Build, Rocket};

use crate::{
    catchers::{bad_request, internal_error, not_found},
    cors::Cors,
    processor::VotingService,
    routes::{
        all_options, cast_vote, get_tally, reject_delete, reject_get_video_url, reject_patch,
        reject_put, set_video_url,
    },
};

/// Assembles the HTTP surface around an already-configured service.
pub fn build_rocket(service: VotingService) -> Rocket<Build> {
    rocket::build()
        .attach(Cors)
        .manage(service)
        .mount(
            "/api",
            rocket::routes![
                get_tally,
                cast_vote,
                set_video_url,
                all_options,
                reject_get_video_url,
                reject_put,
                reject_patch,
                reject_delete
            ],
        )
        .register(
            "/",
            rocket::catchers![
                bad_request,
                internal_error,
                not_found
            ],
        )
}

#[cfg(test)]
mod tests;
