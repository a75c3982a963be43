//! # Stratus - Cloud Telemetry Sync for EV Charging Stations
//!
//! A Rust implementation of a cloud sync core for EV charging stations,
//! aggregating telemetry and state from the vendor's end-user cloud API
//! into one normalized, immutable per-station snapshot per poll cycle.
//!
//! ## Features
//!
//! - **Async-first**: Tokio runtime with per-station pipelines running
//!   concurrently inside one cycle
//! - **Atomic snapshots**: every entity is rebuilt from fresh API responses
//!   each cycle and published exactly once, so partial updates are never
//!   visible to consumers
//! - **Graceful degradation**: sub-resource failures are absorbed at the
//!   lowest level with a safe fallback instead of hiding whole stations
//! - **Per-phase telemetry**: multi-phase readings are decomposed into
//!   normalized per-phase records
//! - **Safe configuration writes**: commits go through the reliable action
//!   endpoint, gated by a fixed allow-list of writable keys
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of
//! concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `api`: Typed access to the vendor cloud API
//! - `model`: Immutable domain model and snapshots
//! - `sync`: Poll-cycle orchestration, phase decomposition, identity
//!   resolution, and configuration commits

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod sync;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, StratusError};
pub use sync::SyncCoordinator;
