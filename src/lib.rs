//! Conversational workflow engine for a student partner-matching service.
//!
//! The crate turns transport-neutral [`events::InboundEvent`]s into
//! [`events::OutboundRender`] instructions: registration, job-request
//! lifecycle and partner browsing for students, plus taxonomy management,
//! account moderation and an audit trail for admins. The hosting process
//! owns the actual chat transport and persistence wiring; everything here
//! works against the [`repository::Repository`] trait.

pub mod access;
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod events;
pub mod flows;
pub mod pagination;
pub mod repository;
pub mod session;
pub mod telemetry;
pub mod token;

pub use config::{AppConfig, ConfigError};
pub use dispatch::Dispatcher;
pub use error::AppError;
pub use flows::{Engine, FlowState};
pub use repository::{MemoryRepository, Repository, RepositoryError};
pub use telemetry::TelemetryError;
