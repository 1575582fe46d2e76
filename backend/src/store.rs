use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use shared::models::CandidateTally;
use time::OffsetDateTime;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to acquire store lock")]
    LockFailed,
}

/// A persisted vote row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct VoteRecord {
    pub id: i32,
    pub device_fingerprint: String,
    pub video_choice: i32,
    pub created_at: OffsetDateTime,
}

/// Persistence seam for the poll. Implementations must make
/// `insert_vote_if_absent` atomic with respect to the device fingerprint.
#[rocket::async_trait]
pub trait VoteStore: Send + Sync {
    /// All candidates ordered by id, each with its vote count, read in one
    /// snapshot.
    async fn list_candidates(&self) -> Result<Vec<CandidateTally>, StoreError>;

    async fn find_vote(&self, device_fingerprint: &str) -> Result<Option<VoteRecord>, StoreError>;

    /// Returns `false` when a vote for this fingerprint already exists.
    async fn insert_vote_if_absent(
        &self,
        device_fingerprint: &str,
        video_choice: i32,
    ) -> Result<bool, StoreError>;

    /// Returns `false` when no candidate has this id.
    async fn set_video_url(&self, video_id: i32, video_url: &str) -> Result<bool, StoreError>;
}

#[derive(Debug)]
struct MemoryState {
    candidates: BTreeMap<i32, CandidateTally>,
    votes: HashMap<String, VoteRecord>,
    next_vote_id: i32,
}

/// In-process store, mirroring the constraints of the SQL schema.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(candidates: Vec<CandidateTally>) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|c| (c.id, CandidateTally { vote_count: 0, ..c }))
            .collect();

        Self {
            state: Mutex::new(MemoryState {
                candidates,
                votes: HashMap::new(),
                next_vote_id: 1,
            }),
        }
    }

    /// Same two rows the migration seeds.
    pub fn seeded() -> Self {
        Self::new(
            shared::models::CANDIDATE_IDS
                .iter()
                .map(|&id| CandidateTally {
                    id,
                    title: format!("Video {}", id),
                    description: String::new(),
                    youtube_url: String::new(),
                    thumbnail: String::new(),
                    video_url: None,
                    vote_count: 0,
                })
                .collect(),
        )
    }

    #[cfg(test)]
    pub fn vote_count(&self) -> usize {
        self.state.lock().map(|s| s.votes.len()).unwrap_or(0)
    }
}

#[rocket::async_trait]
impl VoteStore for MemoryStore {
    async fn list_candidates(&self) -> Result<Vec<CandidateTally>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::LockFailed)?;

        let mut counts: HashMap<i32, i64> = HashMap::new();
        for vote in state.votes.values() {
            *counts.entry(vote.video_choice).or_default() += 1;
        }

        Ok(state
            .candidates
            .values()
            .map(|c| CandidateTally {
                vote_count: counts.get(&c.id).copied().unwrap_or(0),
                ..c.clone()
            })
            .collect())
    }

    async fn find_vote(&self, device_fingerprint: &str) -> Result<Option<VoteRecord>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::LockFailed)?;
        Ok(state.votes.get(device_fingerprint).cloned())
    }

    async fn insert_vote_if_absent(
        &self,
        device_fingerprint: &str,
        video_choice: i32,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockFailed)?;
        if state.votes.contains_key(device_fingerprint) {
            return Ok(false);
        }

        let id = state.next_vote_id;
        state.next_vote_id += 1;
        state.votes.insert(
            device_fingerprint.to_string(),
            VoteRecord {
                id,
                device_fingerprint: device_fingerprint.to_string(),
                video_choice,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        Ok(true)
    }

    async fn set_video_url(&self, video_id: i32, video_url: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockFailed)?;
        match state.candidates.get_mut(&video_id) {
            Some(candidate) => {
                candidate.video_url = Some(video_url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
