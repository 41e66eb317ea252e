use crate::domain::model::{AstralObject, GoalMap, RunSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote megaverse operations. Implemented over HTTP by `ApiClient`.
#[async_trait]
pub trait MegaverseApi: Send + Sync {
    async fn create_object(&self, object: &AstralObject, candidate_id: &str) -> Result<()>;
    async fn delete_object(&self, object: &AstralObject, candidate_id: &str) -> Result<()>;
    /// Current state of the candidate's map, `None` when the API has nothing yet.
    async fn get_current_map(&self, candidate_id: &str) -> Result<Option<GoalMap>>;
    /// Raw goal payload, `{"goal": [[...]]}`.
    async fn get_goal_map(&self, candidate_id: &str) -> Result<serde_json::Value>;
}

pub trait ConfigProvider: Send + Sync {
    fn candidate_id(&self) -> Option<&str>;
    fn request_delay(&self) -> Duration;
    fn goal_file(&self) -> &str;
}

pub trait ProgressObserver: Send + Sync {
    fn on_start(&self, _total: usize) {}
    fn on_progress(&self, _current: usize, _total: usize, _object: &AstralObject, _success: bool) {}
    fn on_complete(&self, _summary: &RunSummary) {}
}
