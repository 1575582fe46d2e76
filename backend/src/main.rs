use std::sync::Arc;

use backend::{config::VotingConfig, processor::VotingService, queries::PgStore};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::info;

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting video poll server");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let config = VotingConfig::from_secrets(&secret_store);
    info!("Store timeout set to {:?}", config.store_timeout);

    let service = VotingService::new(config, Arc::new(PgStore::new(pool)));

    Ok(backend::build_rocket(service).into())
}
