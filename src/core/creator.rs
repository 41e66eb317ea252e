use crate::core::{goal_loader, object_factory};
use crate::domain::model::{AstralObject, CreationPreview, GoalMap, RunSummary};
use crate::domain::ports::{ConfigProvider, MegaverseApi, ProgressObserver};
use crate::utils::error::{MegaverseError, Result};
use crate::utils::validation;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Create,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Delete => "delete",
        }
    }
}

/// Difference between a goal map and the live map.
#[derive(Debug, Clone, Default)]
pub struct MapDiff {
    /// Goal objects not yet on the map, in creation order.
    pub missing: Vec<AstralObject>,
    /// Objects on the map that the goal does not contain.
    pub unexpected: Vec<AstralObject>,
}

impl MapDiff {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Drives goal loading, ordering and the sequential API calls.
pub struct MegaverseCreator<A: MegaverseApi, C: ConfigProvider> {
    api: A,
    config: C,
    observers: Vec<Arc<dyn ProgressObserver>>,
}

impl<A: MegaverseApi, C: ConfigProvider> MegaverseCreator<A, C> {
    pub fn new(api: A, config: C) -> Self {
        Self {
            api,
            config,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn configured_candidate(&self) -> Result<&str> {
        let candidate_id =
            self.config
                .candidate_id()
                .ok_or_else(|| MegaverseError::MissingConfigError {
                    field: "candidate_id".to_string(),
                })?;
        validation::validate_candidate_id(candidate_id)?;
        Ok(candidate_id)
    }

    pub async fn create_from_file<P: AsRef<Path>>(&self, goal_file: P) -> Result<RunSummary> {
        let candidate_id = self.configured_candidate()?;
        let goal_map = goal_loader::load_from_file(goal_file)?;
        self.create_from_goal(&goal_map, candidate_id).await
    }

    pub async fn create_from_api(&self, candidate_id: &str) -> Result<RunSummary> {
        let goal_map = goal_loader::load_from_api(&self.api, candidate_id).await?;
        self.create_from_goal(&goal_map, candidate_id).await
    }

    /// Creates every object of `goal_map`: polyanets, then soloons, then comeths.
    pub async fn create_from_goal(&self, goal_map: &GoalMap, candidate_id: &str) -> Result<RunSummary> {
        let stats = goal_loader::statistics(goal_map);
        tracing::info!(
            "Goal map {}x{}: {} objects ({} POLYANET, {} SOLOON, {} COMETH)",
            stats.rows,
            stats.columns,
            stats.total_objects,
            stats.type_counts.get("POLYANET").copied().unwrap_or(0),
            stats.type_counts.get("SOLOON").copied().unwrap_or(0),
            stats.type_counts.get("COMETH").copied().unwrap_or(0)
        );

        let objects = object_factory::create_from_map(goal_map)?;
        let ordered = object_factory::creation_order(&objects);
        Ok(self.run_objects(&ordered, candidate_id, Action::Create).await)
    }

    /// Like `create_from_goal`, but skips cells that already hold the goal object.
    pub async fn create_missing(&self, goal_map: &GoalMap, candidate_id: &str) -> Result<RunSummary> {
        let diff = self.diff(goal_map, candidate_id).await?;
        tracing::info!(
            "{} of the goal objects are missing from the current map",
            diff.missing.len()
        );
        if !diff.unexpected.is_empty() {
            tracing::warn!(
                "{} objects on the current map are not part of the goal",
                diff.unexpected.len()
            );
        }
        Ok(self
            .run_objects(&diff.missing, candidate_id, Action::Create)
            .await)
    }

    pub async fn diff(&self, goal_map: &GoalMap, candidate_id: &str) -> Result<MapDiff> {
        match self.api.get_current_map(candidate_id).await? {
            Some(current) => {
                let missing = object_factory::missing_objects(goal_map, &current)?;
                let unexpected = object_factory::unexpected_objects(goal_map, &current)?;
                Ok(MapDiff {
                    missing: object_factory::creation_order(&missing),
                    unexpected,
                })
            }
            None => {
                let objects = object_factory::create_from_map(goal_map)?;
                Ok(MapDiff {
                    missing: object_factory::creation_order(&objects),
                    unexpected: Vec::new(),
                })
            }
        }
    }

    /// Removes every object on the candidate's current map, comeths first.
    pub async fn delete_all(&self, candidate_id: &str) -> Result<RunSummary> {
        let current = match self.api.get_current_map(candidate_id).await? {
            Some(current) => current,
            None => {
                tracing::info!("No current map found, nothing to delete");
                let mut summary = RunSummary::new(0);
                summary.finish();
                return Ok(summary);
            }
        };

        let objects = object_factory::create_from_map(&current)?;
        let ordered = object_factory::deletion_order(&objects);
        Ok(self.run_objects(&ordered, candidate_id, Action::Delete).await)
    }

    pub fn preview_creation<P: AsRef<Path>>(&self, goal_file: P) -> Result<CreationPreview> {
        let goal_map = goal_loader::load_from_file(goal_file)?;
        self.preview_goal(&goal_map)
    }

    /// Plan for `goal_map` without touching the API.
    pub fn preview_goal(&self, goal_map: &GoalMap) -> Result<CreationPreview> {
        let statistics = goal_loader::statistics(goal_map);
        let objects = object_factory::creation_order(&object_factory::create_from_map(goal_map)?);
        let groups = object_factory::group_by_type(&objects);
        let estimated_time = u32::try_from(objects.len())
            .ok()
            .and_then(|count| self.config.request_delay().checked_mul(count))
            .unwrap_or(Duration::MAX);

        Ok(CreationPreview {
            statistics,
            objects,
            groups,
            estimated_time,
        })
    }

    async fn run_objects(
        &self,
        objects: &[AstralObject],
        candidate_id: &str,
        action: Action,
    ) -> RunSummary {
        let total = objects.len();
        let delay = self.config.request_delay();
        let mut summary = RunSummary::new(total);

        for observer in &self.observers {
            observer.on_start(total);
        }

        for (index, object) in objects.iter().enumerate() {
            let current = index + 1;
            let result = match action {
                Action::Create => self.api.create_object(object, candidate_id).await,
                Action::Delete => self.api.delete_object(object, candidate_id).await,
            };

            let success = match result {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Failed to {} {}: {}", action.verb(), object, e);
                    false
                }
            };
            summary.record(object, success);

            for observer in &self.observers {
                observer.on_progress(current, total, object, success);
            }

            if current < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        summary.finish();
        for observer in &self.observers {
            observer.on_complete(&summary);
        }
        summary
    }
}
