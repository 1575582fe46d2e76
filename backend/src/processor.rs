use std::future::Future;
use std::sync::Arc;

use shared::models::*;
use shared::validation::{validate_choice, validate_device_id, validate_video_url};
use tracing::{debug, error, info, instrument, warn};

use crate::config::VotingConfig;
use crate::error::ApiError;
use crate::store::{StoreError, VoteStore};

pub const VOTE_ACCEPTED_MESSAGE: &str = "Vote accepted!";
pub const VIDEO_URL_UPDATED_MESSAGE: &str = "Video URL updated successfully";

/// One-vote-per-device poll over the two candidate videos.
#[derive(Clone)]
pub struct VotingService {
    config: VotingConfig,
    store: Arc<dyn VoteStore>,
}

impl VotingService {
    pub fn new(config: VotingConfig, store: Arc<dyn VoteStore>) -> Self {
        Self { config, store }
    }

    /// Runs a store call under the configured timeout.
    async fn guarded<T, F>(&self, operation: &'static str, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Store call {} failed: {}", operation, e);
                Err(e.into())
            }
            Err(_) => {
                warn!("Store call {} timed out after {:?}", operation, self.config.store_timeout);
                Err(ApiError::StoreUnavailable(format!("{} timed out", operation)))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_tally(&self) -> Result<Tally, ApiError> {
        let videos = self.guarded("list_candidates", self.store.list_candidates()).await?;
        Ok(Tally::from_candidates(videos))
    }

    /// Records a single vote for `device_id`. Input is validated before any
    /// store access.
    #[instrument(skip(self, device_id))]
    pub async fn cast_vote(&self, device_id: &str, choice: i64) -> Result<CastVoteResponse, ApiError> {
        let (device_id, choice) = validate_device_id(device_id, self.config.max_device_id_length)
            .and_then(|device_id| Ok((device_id, validate_choice(choice)?)))
            .map_err(|e| {
                debug!("Rejected ballot: {}", e);
                ApiError::from(e)
            })?;

        if let Some(existing) = self.guarded("find_vote", self.store.find_vote(device_id)).await? {
            debug!("Device already voted at {}", existing.created_at);
            return Err(ApiError::DuplicateVote);
        }

        // A concurrent request for the same device may have won since the lookup.
        let inserted = self
            .guarded("insert_vote", self.store.insert_vote_if_absent(device_id, choice))
            .await?;
        if !inserted {
            debug!("Lost insert race for device");
            return Err(ApiError::DuplicateVote);
        }

        info!("Recorded vote for video {}", choice);

        let tally = self.get_tally().await?;
        Ok(CastVoteResponse {
            success: true,
            message: VOTE_ACCEPTED_MESSAGE.into(),
            statistics: TallySummary::from(&tally),
        })
    }

    #[instrument(skip(self, video_url))]
    pub async fn set_video_url(
        &self,
        video_id: i64,
        video_url: &str,
    ) -> Result<SetVideoUrlResponse, ApiError> {
        let video_id = validate_choice(video_id)?;
        let video_url = validate_video_url(video_url, self.config.max_video_url_length)?;

        let updated = self
            .guarded("set_video_url", self.store.set_video_url(video_id, video_url))
            .await?;
        if !updated {
            return Err(ApiError::NotFound(format!("Video {}", video_id)));
        }

        info!("Stored video URL for video {}", video_id);

        Ok(SetVideoUrlResponse {
            success: true,
            message: VIDEO_URL_UPDATED_MESSAGE.into(),
            video_id,
            video_url: video_url.to_string(),
        })
    }
}
