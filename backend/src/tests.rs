use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use shared::models::CandidateTally;

use crate::build_rocket;
use crate::config::VotingConfig;
use crate::error::ApiError;
use crate::processor::VotingService;
use crate::store::{MemoryStore, StoreError, VoteRecord, VoteStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn memory_service() -> (VotingService, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::seeded());
    let service = VotingService::new(VotingConfig::default(), store.clone());
    (service, store)
}

async fn client() -> (Client, Arc<MemoryStore>) {
    let (service, store) = memory_service();
    let client = Client::tracked(build_rocket(service))
        .await
        .expect("valid rocket instance");
    (client, store)
}

async fn post_vote(client: &Client, body: Value) -> (Status, Value) {
    let response = client
        .post("/api/voting")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    let body = response.into_json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_tally(client: &Client) -> Value {
    let response = client.get("/api/voting").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json::<Value>().await.expect("tally body")
}

fn counts(tally: &Value) -> Vec<(i64, i64)> {
    tally["videos"]
        .as_array()
        .expect("videos array")
        .iter()
        .map(|v| (v["id"].as_i64().unwrap(), v["vote_count"].as_i64().unwrap()))
        .collect()
}

/// Store whose calls never complete.
struct StalledStore;

#[rocket::async_trait]
impl VoteStore for StalledStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateTally>, StoreError> {
        std::future::pending().await
    }

    async fn find_vote(&self, _: &str) -> Result<Option<VoteRecord>, StoreError> {
        std::future::pending().await
    }

    async fn insert_vote_if_absent(&self, _: &str, _: i32) -> Result<bool, StoreError> {
        std::future::pending().await
    }

    async fn set_video_url(&self, _: i32, _: &str) -> Result<bool, StoreError> {
        std::future::pending().await
    }
}

/// Store that fails every call.
struct BrokenStore;

#[rocket::async_trait]
impl VoteStore for BrokenStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateTally>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn find_vote(&self, _: &str) -> Result<Option<VoteRecord>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn insert_vote_if_absent(&self, _: &str, _: i32) -> Result<bool, StoreError> {
        Err(StoreError::LockFailed)
    }

    async fn set_video_url(&self, _: i32, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::LockFailed)
    }
}

#[rocket::async_test]
async fn voting_scenario() {
    let (client, _) = client().await;

    let tally = get_tally(&client).await;
    assert_eq!(counts(&tally), vec![(1, 0), (2, 0)]);
    assert_eq!(tally["total_votes"], 0);
    assert_eq!(tally["videos"][0]["title"], "Video 1");

    let (status, body) = post_vote(&client, json!({"deviceId": "dev-A", "videoChoice": 1})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["success"], true);
    assert_eq!(body["statistics"]["total_votes"], 1);
    assert_eq!(counts(&body["statistics"]), vec![(1, 1), (2, 0)]);

    let (status, body) = post_vote(&client, json!({"deviceId": "dev-A", "videoChoice": 2})).await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Already voted");
    assert!(body["message"].is_string());
    assert_eq!(counts(&get_tally(&client).await), vec![(1, 1), (2, 0)]);

    let (status, body) = post_vote(&client, json!({"deviceId": "dev-B", "videoChoice": 2})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(counts(&body["statistics"]), vec![(1, 1), (2, 1)]);

    let tally = get_tally(&client).await;
    assert_eq!(counts(&tally), vec![(1, 1), (2, 1)]);
    assert_eq!(tally["total_votes"], 2);
}

#[rocket::async_test]
async fn invalid_ballots_are_rejected_without_mutation() {
    let (client, store) = client().await;

    for body in [
        json!({"deviceId": "dev-A", "videoChoice": 3}),
        json!({"deviceId": "dev-A", "videoChoice": 0}),
        json!({"deviceId": "", "videoChoice": 1}),
        json!({"videoChoice": 1}),
        json!({"deviceId": "dev-A"}),
        json!({"deviceId": "dev-A", "videoChoice": "1"}),
    ] {
        let (status, response) = post_vote(&client, body.clone()).await;
        assert_eq!(status, Status::BadRequest, "body: {}", body);
        assert!(response["error"].is_string());
    }

    let response = client
        .post("/api/voting")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    assert_eq!(store.vote_count(), 0);
    assert_eq!(get_tally(&client).await["total_votes"], 0);
}

#[rocket::async_test]
async fn device_ids_are_compared_byte_for_byte() {
    let (client, store) = client().await;

    for device in ["dev-A", "dev-A ", " dev-A", "   "] {
        let (status, body) = post_vote(&client, json!({"deviceId": device, "videoChoice": 1})).await;
        assert_eq!(status, Status::Ok, "device {:?}: {}", device, body);
    }
    for device in ["dev-A", "dev-A ", " dev-A", "   "] {
        let (status, _) = post_vote(&client, json!({"deviceId": device, "videoChoice": 2})).await;
        assert_eq!(status, Status::Conflict, "device {:?}", device);
    }

    assert_eq!(store.vote_count(), 4);
    assert_eq!(counts(&get_tally(&client).await), vec![(1, 4), (2, 0)]);
}

#[rocket::async_test]
async fn device_id_header_is_used_as_fallback() {
    let (client, _) = client().await;

    let response = client
        .post("/api/voting")
        .header(ContentType::JSON)
        .header(Header::new("X-Device-Id", "dev-header"))
        .body(json!({"videoChoice": 2}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let (status, _) = post_vote(&client, json!({"deviceId": "dev-header", "videoChoice": 1})).await;
    assert_eq!(status, Status::Conflict);
}

#[rocket::async_test]
async fn cors_and_method_handling() {
    let (client, _) = client().await;

    let response = client.options("/api/voting").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(response.headers().get_one("Access-Control-Max-Age"), Some("86400"));
    assert!(response
        .headers()
        .get_one("Access-Control-Allow-Headers")
        .unwrap_or_default()
        .contains("X-Device-Id"));
    assert!(response.into_string().await.unwrap_or_default().is_empty());

    let response = client.get("/api/voting").dispatch().await;
    assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));

    for response in [
        client.put("/api/voting").dispatch().await,
        client.delete("/api/voting").dispatch().await,
        client.patch("/api/voting").dispatch().await,
    ] {
        assert_eq!(response.status(), Status::MethodNotAllowed);
        assert_eq!(response.headers().get_one("Access-Control-Allow-Origin"), Some("*"));
        let body = response.into_json::<Value>().await.expect("error body");
        assert_eq!(body["error"], "Method not allowed");
    }

    let response = client.get("/api/videos/url").dispatch().await;
    assert_eq!(response.status(), Status::MethodNotAllowed);
    let body = response.into_json::<Value>().await.expect("error body");
    assert_eq!(body["error"], "Method not allowed");

    let response = client.get("/api/nowhere").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body = response.into_json::<Value>().await.expect("error body");
    assert_eq!(body, json!({"error": "The requested resource was not found."}));
}

#[rocket::async_test]
async fn video_url_is_persisted() {
    let (client, _) = client().await;

    let response = client
        .post("/api/videos/url")
        .header(ContentType::JSON)
        .body(json!({"videoId": 2, "videoUrl": "https://cdn.example.com/v2.mp4"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body = response.into_json::<Value>().await.expect("body");
    assert_eq!(body["success"], true);
    assert_eq!(body["videoId"], 2);

    let tally = get_tally(&client).await;
    assert_eq!(tally["videos"][1]["video_url"], "https://cdn.example.com/v2.mp4");
    assert!(tally["videos"][0]["video_url"].is_null());

    let response = client
        .post("/api/videos/url")
        .header(ContentType::JSON)
        .body(json!({"videoId": 5, "videoUrl": "https://cdn.example.com/v5.mp4"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn video_url_for_missing_row_is_not_found() {
    init_tracing();
    let service = VotingService::new(VotingConfig::default(), Arc::new(MemoryStore::new(Vec::new())));

    let result = service.set_video_url(1, "https://cdn.example.com/v1.mp4").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_votes_from_one_device() {
    let (service, store) = memory_service();
    let service = Arc::new(service);

    let handles = (0..32).map(|i| {
        let service = service.clone();
        tokio::spawn(async move { service.cast_vote("dev-race", 1 + (i % 2)).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::DuplicateVote)))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 31);
    assert_eq!(store.vote_count(), 1);
    assert_eq!(service.get_tally().await.unwrap().total_votes, 1);
}

#[tokio::test]
async fn tally_matches_distinct_successful_devices() {
    let (service, _) = memory_service();

    let mut accepted = std::collections::HashSet::new();
    let attempts = [
        ("a", 1), ("b", 2), ("a", 2), ("c", 2), ("", 1), ("d", 3), ("c", 1), ("e", 1),
    ];
    for (device, choice) in attempts {
        if service.cast_vote(device, choice).await.is_ok() {
            assert!(accepted.insert(device));
        }
    }

    let tally = service.get_tally().await.unwrap();
    let sum: i64 = tally.videos.iter().map(|v| v.vote_count).sum();
    assert_eq!(tally.total_votes, sum);
    assert_eq!(sum, accepted.len() as i64);
    assert_eq!(tally.videos[0].vote_count, 2);
    assert_eq!(tally.videos[1].vote_count, 2);
}

#[tokio::test]
async fn store_timeout_is_store_unavailable() {
    init_tracing();
    let config = VotingConfig {
        store_timeout: Duration::from_millis(20),
        ..VotingConfig::default()
    };
    let service = VotingService::new(config, Arc::new(StalledStore));

    assert!(matches!(service.get_tally().await, Err(ApiError::StoreUnavailable(_))));
    assert!(matches!(
        service.cast_vote("dev-A", 1).await,
        Err(ApiError::StoreUnavailable(_))
    ));
    // Validation happens before the store is touched.
    assert!(matches!(
        service.cast_vote("dev-A", 9).await,
        Err(ApiError::InvalidRequest(_))
    ));
}

#[rocket::async_test]
async fn store_failures_map_to_500() {
    init_tracing();
    let service = VotingService::new(VotingConfig::default(), Arc::new(BrokenStore));
    let client = Client::tracked(build_rocket(service)).await.expect("valid rocket instance");

    let response = client.get("/api/voting").dispatch().await;
    assert_eq!(response.status(), Status::InternalServerError);
    let body = response.into_json::<Value>().await.expect("error body");
    assert_eq!(body["error"], "Store unavailable");

    let (status, _) = post_vote(&client, json!({"deviceId": "dev-A", "videoChoice": 1})).await;
    assert_eq!(status, Status::InternalServerError);
}
