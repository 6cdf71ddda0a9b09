pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};

pub use crate::adapters::command::TemplateCommandExecutor;
pub use crate::adapters::memory::InMemoryRepository;
pub use crate::config::{cli::LocalStorage, toml_config::RelationsConfig};
pub use crate::core::batch::{BatchReport, BatchSettings, BatchUpdater, CursorStore};
pub use crate::core::presentation::{PresentationAssembler, PresentationRequest};
pub use crate::core::relations::{build_asset_relations, RelationBuilder, RelationContext};
pub use crate::core::vocabulary::AssetDataChecker;
pub use crate::core::zipper::zip_directory;
pub use crate::utils::error::{RelationsError, Result};
