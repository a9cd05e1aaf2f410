//! Core library for the `blobtraf` CLI.
//!
//! This crate provides the building blocks used by the binary: the blob
//! action catalog, per-worker state, the virtual-user runner and the
//! coordinator that drives many of them, plus CLI argument types,
//! configuration parsing and report aggregation. The primary user-facing
//! interface is the `blobtraf` command-line application; library APIs may
//! evolve as the CLI grows.
pub mod agent;
pub mod args;
pub mod config;
pub mod error;
pub mod metrics;
pub mod shutdown;
