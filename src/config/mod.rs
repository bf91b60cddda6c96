//! `config.toml` handling.

mod errors;
mod io;
mod types;

pub use errors::ConfigError;
pub use io::{load_from, load_or_default, save_to_path};
pub use types::{PathsConfig, ResolvedPaths, ScoringConfig, Settings, TrainingConfig};
