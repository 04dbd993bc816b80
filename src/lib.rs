//! taskboard - Project and Task Board Client Library
//!
//! This library provides cached, API-backed stores for projects, tasks and
//! users, and keeps each project's status in line with its tasks.
//!
//! # Core Concepts
//!
//! - **Status Rule**: a project's status is derived from its tasks
//! - **Stores**: in-memory caches with `loading`/`error` state over the REST API
//! - **Task changes**: task mutations publish events that drive project status sync
//! - **Board**: explicit composition of one store of each kind
//!
//! # Module Organization
//!
//! - `api`: Request interface, HTTP and in-memory transports, resource endpoints
//! - `board`: Store composition root
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.taskboard.toml`
//! - `error`: Error types and result aliases
//! - `events`: JSONL event output
//! - `model`: Projects, tasks, users and their payloads
//! - `output`: Human and JSON command output
//! - `status`: Project status derivation
//! - `store`: Project, task and user stores
//! - `sync`: Task change events and the project status synchronizer

pub mod api;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod output;
pub mod status;
pub mod store;
pub mod sync;

pub use board::Board;
pub use error::{Error, Result};
