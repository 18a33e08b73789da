//! # aquayman-publisher
//!
//! Pushes robot credentials to a secret store outside the registry.
//!
//! The engine only needs the [`Publisher`] trait; [`VaultPublisher`] is the
//! implementation the CLI wires up.

pub mod error;
pub mod vault;

use aquayman_core::RobotConfig;

pub use error::PublishError;
pub use vault::VaultPublisher;

/// A sink for robot tokens.
///
/// Both calls are no-ops for robots without a configured secret address, and
/// both must be safe to repeat.
pub trait Publisher {
    /// Store or refresh `token` for `robot`.
    fn update_robot(&self, robot: &RobotConfig, token: &str) -> Result<(), PublishError>;

    /// Remove whatever was published for `robot`.
    fn delete_robot(&self, robot: &RobotConfig) -> Result<(), PublishError>;
}
