//! Core types shared across the crate.
//!
//! The error taxonomy lives here: [`FormatError`] for inputs that are not a
//! configuration shape we understand, [`ConfigurationError`] for schema and
//! semantic violations, [`DataError`] for failures loading one variable's
//! concrete value, and [`LoadError`] unifying the three at the public
//! boundary.

pub mod error;

pub use error::{ConfigurationError, DataError, ErrorCode, FormatError, LoadError};
