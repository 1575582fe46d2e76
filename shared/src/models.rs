use serde::{Deserialize, Serialize};

/// Ids of the two videos competing in the poll.
pub const CANDIDATE_IDS: [i32; 2] = [1, 2];

/// A candidate video together with the number of votes it has received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
pub struct CandidateTally {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub youtube_url: String,
    pub thumbnail: String,
    pub video_url: Option<String>,
    pub vote_count: i64,
}

/// Full poll state as served by `GET /api/voting`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tally {
    pub videos: Vec<CandidateTally>,
    pub total_votes: i64,
}

impl Tally {
    pub fn from_candidates(videos: Vec<CandidateTally>) -> Self {
        let total_votes = videos.iter().map(|v| v.vote_count).sum();
        Self { videos, total_votes }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteCount {
    pub id: i32,
    pub vote_count: i64,
}

/// Counts-only view of a [`Tally`], returned after a vote is cast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallySummary {
    pub videos: Vec<VoteCount>,
    pub total_votes: i64,
}

impl From<&Tally> for TallySummary {
    fn from(tally: &Tally) -> Self {
        Self {
            videos: tally
                .videos
                .iter()
                .map(|v| VoteCount { id: v.id, vote_count: v.vote_count })
                .collect(),
            total_votes: tally.total_votes,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CastVoteRequest {
    pub device_id: String,
    pub video_choice: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastVoteResponse {
    pub success: bool,
    pub message: String,
    pub statistics: TallySummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetVideoUrlRequest {
    pub video_id: i64,
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetVideoUrlResponse {
    pub success: bool,
    pub message: String,
    pub video_id: i32,
    pub video_url: String,
}
