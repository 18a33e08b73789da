//! # aquayman-sync
//!
//! Converges a quay.io organization onto a declared [`Config`].
//!
//! [`sync`] runs the robot, team and repository passes against any
//! [`RegistryClient`]; [`export_configuration`] goes the other way and turns
//! live state into a document.
//!
//! [`Config`]: aquayman_core::Config
//! [`RegistryClient`]: aquayman_quay::RegistryClient

pub mod cancel;
pub mod error;
pub mod export;
pub mod matcher;
pub mod names;
pub mod pipeline;
pub mod report;

mod repositories;
mod robots;
mod teams;

pub use cancel::Cancellation;
pub use error::{Phase, SyncError};
pub use export::export_configuration;
pub use matcher::match_repository;
pub use names::check_names;
pub use pipeline::{sync, SyncOptions};
pub use report::{Action, Change, SyncReport, Target};
