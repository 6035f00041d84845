//! romshelf - a personal ROM library organizer
//!
//! This library matches loose cover art files to ROM files by name
//! similarity, sorts ROMs into region folders, and resolves per-device
//! destination paths from a master file so that libraries can be copied to
//! or deleted from removable media.

pub mod cli;
pub mod config_store;
pub mod destinations;
pub mod drives;
pub mod fs_ops;
pub mod logging;
pub mod organizer;
pub mod output;
pub mod prompt;
pub mod regions;
pub mod settings;
pub mod similarity;

pub use config_store::{ConfigDocument, ConfigError, ConfigStore};
pub use destinations::{DestinationResolver, ResolvedDestinationSet, Role, Target};
pub use fs_ops::{FileOps, StdFileOps};
pub use organizer::{ArtworkOrganizer, DeleteOutcome, MatchReport, MatchResult, OrganizeError, RestoreReport, TransferReport};
pub use regions::{Region, RegionReport};
pub use settings::Settings;
pub use similarity::SimilarityMatcher;

pub use cli::{Cli, Command, run};
