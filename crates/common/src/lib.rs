//! Common utilities and shared types for pollhub.
//!
//! This crate provides foundational components used across all pollhub crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID/UUID identifiers via [`IdGenerator`]
//! - **Logging**: `tracing` subscriber setup via [`logging::init`]
//!
//! # Example
//!
//! ```no_run
//! use pollhub_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     pollhub_common::logging::init(&config.logging)?;
//!     let id_gen = IdGenerator::new();
//!     println!("Generated ID: {}", id_gen.generate());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod logging;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
