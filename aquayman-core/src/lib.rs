//! aquayman core library — desired-state types, YAML persistence, validation.
//!
//! - [`types`] — the organization document and its enums
//! - [`store`] — load / save
//! - [`error`] — [`ConfigError`]

pub mod error;
pub mod store;
pub mod types;
mod validate;

pub use error::ConfigError;
pub use store::{load_from_file, save_to_file};
pub use types::{
    is_robot_username, robot_full_name, robot_short_name, Config, RepositoryConfig,
    RepositoryRole, RobotConfig, TeamConfig, TeamRole, Visibility,
};
