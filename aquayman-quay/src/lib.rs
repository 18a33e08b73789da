//! # aquayman-quay
//!
//! Live-state access to a quay.io organization.
//!
//! The engine only ever sees the [`RegistryClient`] trait. Two implementations
//! ship here: [`QuayClient`] talks HTTP, [`MemoryRegistry`] keeps everything
//! in memory and records what it was asked to change.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use client::RegistryClient;
pub use error::{ApiError, QuayError};
pub use http::QuayClient;
pub use memory::{MemoryRegistry, Mutation, RegistryState};
pub use types::{
    CreateRepository, Permission, PermissionKind, Repository, Robot, Team, TeamMember, User,
};
