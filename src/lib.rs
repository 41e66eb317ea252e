pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::http::ApiClient;
pub use app::progress::ConsoleProgressObserver;
pub use config::Settings;
pub use core::creator::MegaverseCreator;
pub use domain::model::{AstralObject, Cell, GoalMap, RunSummary};
pub use utils::error::{MegaverseError, Result};
