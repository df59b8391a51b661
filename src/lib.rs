//! loadset-engine: structural load-case engine
//!
//! This library reads LoadSets (named, unit-tagged collections of load cases
//! holding force/moment values at interface points) and transforms them for
//! downstream finite-element analysis.
//!
//! # Architecture
//!
//! - **Domain model**: [`loads::LoadSet`] with unit conversion, scaling,
//!   enveloping, comparison, JSON I/O and ANSYS deck export
//! - **Tool surface**: [`tools::Session`] runs named, typed tool calls against
//!   an explicit session handle and never fails with anything but a
//!   `success: false` response
//!
//! The agent orchestration layer and its transport stay outside this crate
//! and talk to it only through [`tools`].
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Configuration error types
//! - [`loads`]: LoadSet domain model
//! - [`tools`]: Tool requests, responses and sessions

pub mod config;
pub mod error;
pub mod loads;
pub mod tools;
