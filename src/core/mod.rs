pub mod creator;
pub mod goal_loader;
pub mod object_factory;
pub mod retry;

pub use crate::domain::model::{AstralObject, GoalMap, RunSummary};
pub use crate::domain::ports::{ConfigProvider, MegaverseApi, ProgressObserver};
pub use crate::utils::error::Result;
