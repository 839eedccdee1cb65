//! automate - declarative tool configuration validation
//!
//! This crate loads a YAML configuration document describing a computational
//! tool — its input/output variables per lifecycle step, presets, datasets,
//! execution scripts, runtime environment, and display pages — and validates
//! it into a typed, queryable [`configuration::ToolDefinition`].
//!
//! # Architecture Overview
//!
//! Validation is a cascade: the loader discovers and parses a document, then
//! runs an ordered pipeline of rules over it. Rules recursively re-enter the
//! loader for nested tool composition (`tools` entries) and reach into the
//! variable data loader for preset resolution, backed by a
//! modification-aware LRU cache and a path-template resolver.
//!
//! # Core Modules
//!
//! - [`configuration`] - document discovery, parsing, and the validation
//!   rule pipeline producing [`configuration::ToolDefinition`]
//! - [`variable`] - variable data loading and the pluggable view registry
//! - [`cache`] - bounded modification-aware cache of raw variable data
//! - [`pattern`] - `{suffix}`/`{index}` path-template expansion
//! - [`templating`] - `{variable_id | filter}` substitution for preset
//!   identifiers
//! - [`core`] - the error taxonomy ([`core::FormatError`],
//!   [`core::ConfigurationError`], [`core::DataError`])
//! - [`utils`] - trusted filesystem primitives and path containment checks
//!
//! # Example
//!
//! ```no_run
//! use automate_cli::configuration::load_configuration;
//!
//! # async fn example() -> Result<(), automate_cli::core::LoadError> {
//! let configuration = load_configuration(".").await?;
//! for tool in configuration.runnable_tools() {
//!     println!("{}", tool.slug);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod configuration;
pub mod constants;
pub mod core;
pub mod pattern;
pub mod templating;
pub mod utils;
pub mod variable;
