//! # Hall Dispatch
//!
//! A race-free task claiming and dispatch engine for marketplace workloads.
//!
//! This library coordinates a pool of tasks that many workers compete to
//! claim: a task board where posted work must end up with exactly one
//! worker, survive concurrent claim attempts, and optionally be offered
//! out automatically to the best-ranked eligible workers.
//!
//! ## Core Problem Solved
//!
//! Marketplace task boards fail in predictable ways when claiming is naive:
//!
//! - **Double Claims**: Two workers read "open" and both believe they won
//! - **Lost Updates**: A cancellation races a completion and one overwrites the other
//! - **Stale Offers**: Auto-dispatch keeps offering a task someone already took
//! - **Silent Drops**: Interested parties never learn the task changed hands
//!
//! ## Key Features
//!
//! - **Compare-and-Transition Store**: Every mutation states the status it
//!   expects; stale writers get a conflict instead of clobbering state
//! - **Race-Free Claiming**: Exactly one concurrent claimant wins, the rest
//!   get a typed rejection rather than an error
//! - **Auto-Dispatch**: A scheduler offers open tasks to ranked eligible
//!   workers with acknowledgement windows and bounded escalation
//! - **Filtered Notifications**: At-least-once event fan-out with per-task
//!   and per-worker filters; slow consumers are dropped, never retried into
//!
//! ```rust,ignore
//! use hall_dispatch::builders::build_engine;
//! use hall_dispatch::config::EngineConfig;
//! use hall_dispatch::core::InMemoryDirectory;
//! use hall_dispatch::util::clock::SystemClock;
//! use std::sync::Arc;
//!
//! let engine = build_engine(
//!     &EngineConfig::default(),
//!     Arc::new(InMemoryDirectory::new()),
//!     Arc::new(SystemClock),
//!     None,
//! )?;
//! let outcome = engine.coordinator.claim(task_id, worker_id).await?;
//! ```
//!
//! For complete examples, see:
//! - `tests/claim_race_test.rs` - Concurrent claim integration tests
//! - `tests/dispatch_scheduler_test.rs` - Offer/acknowledge flow

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core dispatch abstractions: tasks, claims, scheduling, and events.
pub mod core;
/// Configuration models for the engine and its backends.
pub mod config;
/// Builders to construct engine components from configuration.
pub mod builders;
/// Infrastructure adapters for stores and notification buses.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
